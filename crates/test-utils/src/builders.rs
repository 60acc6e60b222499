#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use migradag::config::{ConfigFile, PerformanceThresholds, RawConfigFile};
use migradag::engine::Orchestrator;
use migradag::stages::StageSettings;
use migradag::tool::ToolInvoker;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.migration.project_id = "test-project".to_string();
        Self { config }
    }

    pub fn project_id(mut self, id: &str) -> Self {
        self.config.migration.project_id = id.to_string();
        self
    }

    pub fn endpoint(mut self, url: &str) -> Self {
        self.config.collaborator.endpoint = url.to_string();
        self
    }

    pub fn poll_interval(mut self, interval: &str) -> Self {
        self.config.monitor.poll_interval = interval.to_string();
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.retry.max_retries = n;
        self
    }

    pub fn cpu_thresholds(mut self, low: f64, high: f64) -> Self {
        self.config.performance.cpu_low_water = low;
        self.config.performance.cpu_high_water = high;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Stage settings with a short poll interval so monitoring tests run fast.
pub fn fast_settings() -> StageSettings {
    StageSettings {
        project_id: "test-project".to_string(),
        request_timeout: Duration::from_secs(1),
        poll_interval: Duration::from_millis(10),
        performance: PerformanceThresholds::default(),
    }
}

/// The six-stage migration wired to `invoker` with [`fast_settings`].
pub fn migration_orchestrator(invoker: Arc<dyn ToolInvoker>) -> Orchestrator {
    Orchestrator::migration(invoker, fast_settings()).expect("migration workflow is valid")
}
