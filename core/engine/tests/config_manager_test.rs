//! Loading configuration from TOML files.

use std::io::Write;

use capture_core::config_manager::{ConfigManager, StaticConfigManager, TomlConfigManager};
use capture_core::{CaptureConfig, ErrorKind, OverflowPolicy, QuotaPolicy};

#[tokio::test]
async fn loads_values_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[service]
base_url = "http://192.168.1.20:5000"
timeout_ms = 2500
health_check = false

[throttle]
interval_ms = 400

[collection]
quota = 50
quota_policy = "advisory"
refresh_delay_ms = 0

[dispatch]
upload_queue_capacity = 8
upload_workers = 2
overflow = "drop_newest"

[logging]
level = "debug"
json = true
"#
    )
    .unwrap();

    let manager = TomlConfigManager::new(file.path());
    let config = manager.load().await.unwrap();

    assert_eq!(config.service.base_url, "http://192.168.1.20:5000");
    assert_eq!(config.service.timeout_ms, 2500);
    assert!(!config.service.health_check);
    assert_eq!(config.throttle.interval_ms, 400);
    assert_eq!(config.collection.quota, 50);
    assert_eq!(config.collection.quota_policy, QuotaPolicy::Advisory);
    assert_eq!(config.dispatch.upload_queue_capacity, 8);
    assert_eq!(config.dispatch.overflow, OverflowPolicy::DropNewest);
    assert_eq!(config.dispatch.predict_workers, 1);
    assert!(config.logging.json);

    assert_eq!(manager.current().await.unwrap(), config);
}

#[tokio::test]
async fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let manager = TomlConfigManager::new(dir.path().join("absent.toml"));
    assert_eq!(manager.load().await.unwrap(), CaptureConfig::default());
}

#[tokio::test]
async fn invalid_toml_is_a_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[throttle]\ninterval_ms = \"soon\"").unwrap();

    let err = TomlConfigManager::new(file.path()).load().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[tokio::test]
async fn static_manager_validates_on_load() {
    let mut config = CaptureConfig::default();
    config.dispatch.upload_workers = 0;
    let manager = StaticConfigManager::new(config.clone());

    assert!(manager.load().await.is_err());
    assert_eq!(manager.current().await.unwrap(), config);
}
