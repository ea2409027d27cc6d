//! Tracing subscriber setup for binaries.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

use crate::config_manager::LoggingConfig;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Installs a stderr subscriber once per process. `RUST_LOG` overrides the
/// configured level. Stdout stays free for event output.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.level))
            .unwrap_or_else(|_| EnvFilter::new("info"));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false);
        let result = if config.json {
            tracing::subscriber::set_global_default(builder.json().finish())
        } else {
            tracing::subscriber::set_global_default(builder.finish())
        };
        if result.is_err() {
            // Another subscriber is already installed, e.g. by a test harness.
            tracing::debug!("tracing subscriber already set");
        }
    });
}
