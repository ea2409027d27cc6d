//! Drives the capture controller from JSON lines on stdin (see
//! [`capture_core::protocol`]).
//!
//! Every event the controller publishes is written to stdout as one JSON line.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use capture_core::config_manager::{ConfigManager, TomlConfigManager};
use capture_core::logging::init_tracing;
use capture_core::protocol::forward_inputs;
use capture_core::{CaptureControllerBuilder, ChannelEventBus};

#[derive(Debug, Parser)]
#[command(name = "capture_engine", about = "Hand-landmark capture control for sign recognition")]
struct Args {
    /// TOML configuration file; defaults apply when it does not exist.
    #[arg(long, default_value = "capture_config.toml")]
    config: PathBuf,

    /// Overrides `service.base_url`.
    #[arg(long, env = "CAPTURE_SERVICE_URL")]
    base_url: Option<String>,

    /// Overrides `logging.level`.
    #[arg(long)]
    log_level: Option<String>,

    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let manager = TomlConfigManager::new(&args.config);
    let mut config = manager.load().await?;
    if let Some(url) = args.base_url {
        config.service.base_url = url;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    config.logging.json |= args.json_logs;
    config.validate()?;

    init_tracing(&config.logging);
    tracing::info!(
        config = %manager.path().display(),
        service = %config.service.base_url,
        "starting capture engine"
    );

    let bus = Arc::new(ChannelEventBus::new());
    let mut events = bus.subscribe().await;
    let printer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(event) = events.recv().await {
            let mut line = serde_json::to_string(&event)?;
            line.push('\n');
            stdout.write_all(line.as_bytes()).await?;
            stdout.flush().await?;
        }
        anyhow::Ok(())
    });

    let mut controller = CaptureControllerBuilder::new(config)
        .event_bus(bus)
        .http_service()?
        .build()?;
    controller.boot().await?;

    let (input_tx, input_rx) = mpsc::channel(64);
    let clock = Instant::now();
    let reader = tokio::spawn(forward_inputs(
        BufReader::new(tokio::io::stdin()),
        input_tx,
        move || clock.elapsed().as_millis() as u64,
    ));

    let controller = controller.run(input_rx).await?;
    let forwarded = reader.await??;
    tracing::debug!(forwarded, "input reader finished");

    // Dropping the controller releases the last event bus handle.
    drop(controller);
    printer.await??;
    Ok(())
}
