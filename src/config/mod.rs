// src/config/mod.rs

//! Configuration loading and validation for migradag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Parse duration strings such as `"500ms"` or `"5s"` (`duration.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate and resolve a raw config into typed settings (`validate.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    CollaboratorSection, CollaboratorSettings, ConfigFile, MigrationSection, MonitorSection,
    PerformanceSection, PerformanceThresholds, RawConfigFile, RetryPolicy, RetrySection,
};
