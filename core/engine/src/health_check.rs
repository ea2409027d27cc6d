//! Reachability probe for the landmark service.

use reqwest::Client;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServiceHealth {
    pub is_healthy: bool,
    pub url: String,
    pub error: Option<String>,
}

pub struct HealthChecker {
    http: Client,
}

impl HealthChecker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// Probes the service index (`GET /`). Any 2xx counts as healthy.
    pub async fn check(&self, base_url: &str) -> ServiceHealth {
        let base_url = base_url.trim_end_matches('/');
        let url = format!("{}/", base_url);
        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => ServiceHealth {
                is_healthy: true,
                url: base_url.to_string(),
                error: None,
            },
            Ok(response) => ServiceHealth {
                is_healthy: false,
                url: base_url.to_string(),
                error: Some(format!("HTTP {}", response.status())),
            },
            Err(e) => ServiceHealth {
                is_healthy: false,
                url: base_url.to_string(),
                error: Some(e.to_string()),
            },
        }
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}
