// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [migration]
/// project_id = "my-gcp-project"
///
/// [collaborator]
/// endpoint = "http://localhost:8080/tool"
/// health_url = "http://localhost:8081/healthz"
/// request_timeout = "30s"
///
/// [monitor]
/// poll_interval = "5s"
/// ```
///
/// Only `[migration].project_id` is required; everything else has defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub migration: MigrationSection,

    #[serde(default)]
    pub collaborator: CollaboratorSection,

    #[serde(default)]
    pub retry: RetrySection,

    #[serde(default)]
    pub monitor: MonitorSection,

    #[serde(default)]
    pub performance: PerformanceSection,
}

/// `[migration]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MigrationSection {
    /// Cloud project the migration targets. Passed to every tool call.
    #[serde(default)]
    pub project_id: String,
}

/// `[collaborator]` section: where the remote tools live.
#[derive(Debug, Clone, Deserialize)]
pub struct CollaboratorSection {
    /// URL that tool calls are POSTed to.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Health endpoint probed before the workflow starts.
    #[serde(default = "default_health_url")]
    pub health_url: String,

    /// Deadline for a single tool invocation (e.g. `"30s"`).
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,

    /// Environment variable holding a bearer token for the collaborator.
    #[serde(default)]
    pub token_env: Option<String>,
}

fn default_endpoint() -> String {
    "http://localhost:8080/tool".to_string()
}

fn default_health_url() -> String {
    "http://localhost:8081/healthz".to_string()
}

fn default_request_timeout() -> String {
    "30s".to_string()
}

impl Default for CollaboratorSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            health_url: default_health_url(),
            request_timeout: default_request_timeout(),
            token_env: None,
        }
    }
}

/// `[retry]` section: bounded retries of transport failures.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff")]
    pub initial_backoff: String,

    #[serde(default = "default_max_backoff")]
    pub max_backoff: String,
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff() -> String {
    "500ms".to_string()
}

fn default_max_backoff() -> String {
    "10s".to_string()
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff: default_initial_backoff(),
            max_backoff: default_max_backoff(),
        }
    }
}

/// `[monitor]` section: anomaly detection polling.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSection {
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,
}

fn default_poll_interval() -> String {
    "5s".to_string()
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
        }
    }
}

/// `[performance]` section: thresholds (percent) for recommendations.
#[derive(Debug, Clone, Deserialize)]
pub struct PerformanceSection {
    #[serde(default = "default_cpu_low_water")]
    pub cpu_low_water: f64,

    #[serde(default = "default_cpu_high_water")]
    pub cpu_high_water: f64,

    #[serde(default = "default_memory_high_water")]
    pub memory_high_water: f64,
}

fn default_cpu_low_water() -> f64 {
    20.0
}

fn default_cpu_high_water() -> f64 {
    80.0
}

fn default_memory_high_water() -> f64 {
    85.0
}

impl Default for PerformanceSection {
    fn default() -> Self {
        Self {
            cpu_low_water: default_cpu_low_water(),
            cpu_high_water: default_cpu_high_water(),
            memory_high_water: default_memory_high_water(),
        }
    }
}

/// Validated configuration with durations resolved.
///
/// Constructed only through `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub project_id: String,
    pub collaborator: CollaboratorSettings,
    pub retry: RetryPolicy,
    pub poll_interval: Duration,
    pub performance: PerformanceThresholds,
}

#[derive(Debug, Clone)]
pub struct CollaboratorSettings {
    pub endpoint: String,
    pub health_url: String,
    pub request_timeout: Duration,
    pub token_env: Option<String>,
}

/// Exponential backoff for retryable tool failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (0-based): doubles each time,
    /// capped at `max_backoff`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceThresholds {
    pub cpu_low_water: f64,
    pub cpu_high_water: f64,
    pub memory_high_water: f64,
}

impl Default for PerformanceThresholds {
    fn default() -> Self {
        Self {
            cpu_low_water: default_cpu_low_water(),
            cpu_high_water: default_cpu_high_water(),
            memory_high_water: default_memory_high_water(),
        }
    }
}
