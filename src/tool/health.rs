// src/tool/health.rs

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::{MigradagError, Result};

#[derive(Debug, Deserialize)]
struct HealthBody {
    status: String,
}

/// Probes the collaborator's `GET /healthz` before a run is started.
#[derive(Debug, Clone)]
pub struct HealthProbe {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HealthProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            timeout,
        }
    }

    /// Succeeds only on HTTP 200 with a body of `{"status": "ok"}`.
    pub async fn check(&self) -> Result<()> {
        debug!(url = %self.url, "probing collaborator health");

        let resp = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| MigradagError::HealthCheckFailed(format!("{}: {e}", self.url)))?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(MigradagError::HealthCheckFailed(format!(
                "{} returned HTTP {}: {}",
                self.url,
                status.as_u16(),
                body.trim()
            )));
        }

        let body: HealthBody = resp.json().await.map_err(|e| {
            MigradagError::HealthCheckFailed(format!("{} returned an unreadable body: {e}", self.url))
        })?;

        if body.status != "ok" {
            return Err(MigradagError::HealthCheckFailed(format!(
                "{} reported status '{}'",
                self.url, body.status
            )));
        }

        info!(url = %self.url, "collaborator is healthy");
        Ok(())
    }
}
