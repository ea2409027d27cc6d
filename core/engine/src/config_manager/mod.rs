//! Runtime configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file is a valid configuration.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::collection::{QuotaPolicy, DEFAULT_QUOTA};
use crate::dispatch::OverflowPolicy;
use crate::error::{CaptureError, CaptureResult};
use crate::throttle::DEFAULT_PREDICT_INTERVAL_MS;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub service: ServiceConfig,
    pub throttle: ThrottleConfig,
    pub collection: CollectionConfig,
    pub dispatch: DispatchConfig,
    pub predictions: PredictionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    /// Probe the service once before the first counts fetch.
    pub health_check: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_ms: 10_000,
            health_check: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    pub interval_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_PREDICT_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    pub quota: u32,
    pub quota_policy: QuotaPolicy,
    /// Delay between stopping a session and re-fetching counts.
    pub refresh_delay_ms: u64,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            quota: DEFAULT_QUOTA,
            quota_policy: QuotaPolicy::default(),
            refresh_delay_ms: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub upload_queue_capacity: usize,
    pub upload_workers: usize,
    pub predict_queue_capacity: usize,
    pub predict_workers: usize,
    pub overflow: OverflowPolicy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            upload_queue_capacity: 64,
            upload_workers: 4,
            predict_queue_capacity: 2,
            predict_workers: 1,
            overflow: OverflowPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Drop responses for frames older than the displayed one.
    pub discard_stale: bool,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            discard_stale: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl CaptureConfig {
    pub fn from_toml_str(content: &str) -> CaptureResult<Self> {
        let config: CaptureConfig = toml::from_str(content)
            .map_err(|e| CaptureError::config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CaptureResult<()> {
        if self.service.base_url.trim().is_empty() {
            return Err(CaptureError::config("service.base_url must not be empty"));
        }
        if self.collection.quota == 0 {
            return Err(CaptureError::config("collection.quota must be at least 1"));
        }
        if self.dispatch.upload_queue_capacity == 0 || self.dispatch.predict_queue_capacity == 0 {
            return Err(CaptureError::config("dispatch queue capacities must be at least 1"));
        }
        if self.dispatch.upload_workers == 0 || self.dispatch.predict_workers == 0 {
            return Err(CaptureError::config("dispatch worker counts must be at least 1"));
        }
        Ok(())
    }
}

#[async_trait]
pub trait ConfigManager: Send + Sync {
    async fn load(&self) -> CaptureResult<CaptureConfig>;
    async fn current(&self) -> CaptureResult<CaptureConfig>;
}

/// Reads the configuration from a TOML file; a missing file yields the defaults.
pub struct TomlConfigManager {
    path: PathBuf,
    loaded: RwLock<Option<CaptureConfig>>,
}

impl TomlConfigManager {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            loaded: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ConfigManager for TomlConfigManager {
    async fn load(&self) -> CaptureResult<CaptureConfig> {
        let config = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => CaptureConfig::from_toml_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    path = %self.path.display(),
                    "config file not found, using defaults"
                );
                CaptureConfig::default()
            }
            Err(e) => {
                return Err(CaptureError::config(format!(
                    "failed to read config file {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        *self.loaded.write().await = Some(config.clone());
        Ok(config)
    }

    async fn current(&self) -> CaptureResult<CaptureConfig> {
        if let Some(config) = self.loaded.read().await.as_ref() {
            return Ok(config.clone());
        }
        self.load().await
    }
}

/// In-memory configuration.
pub struct StaticConfigManager {
    config: CaptureConfig,
}

impl StaticConfigManager {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ConfigManager for StaticConfigManager {
    async fn load(&self) -> CaptureResult<CaptureConfig> {
        self.config.validate()?;
        Ok(self.config.clone())
    }

    async fn current(&self) -> CaptureResult<CaptureConfig> {
        Ok(self.config.clone())
    }
}
