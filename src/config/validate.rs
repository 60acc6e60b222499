// src/config/validate.rs

use std::time::Duration;

use reqwest::Url;

use crate::config::duration::parse_duration;
use crate::config::model::{
    CollaboratorSettings, ConfigFile, PerformanceSection, PerformanceThresholds, RawConfigFile,
    RetryPolicy,
};
use crate::errors::{MigradagError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = MigradagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ensure_project_id(&raw)?;
        let collaborator = resolve_collaborator(&raw)?;
        let retry = resolve_retry(&raw)?;
        let poll_interval = positive_duration("[monitor].poll_interval", &raw.monitor.poll_interval)?;
        let performance = resolve_performance(&raw.performance)?;

        Ok(ConfigFile {
            project_id: raw.migration.project_id.trim().to_string(),
            collaborator,
            retry,
            poll_interval,
            performance,
        })
    }
}

fn ensure_project_id(cfg: &RawConfigFile) -> Result<()> {
    if cfg.migration.project_id.trim().is_empty() {
        return Err(MigradagError::ConfigError(
            "[migration].project_id must be set".to_string(),
        ));
    }
    Ok(())
}

fn resolve_collaborator(cfg: &RawConfigFile) -> Result<CollaboratorSettings> {
    let section = &cfg.collaborator;
    ensure_http_url("[collaborator].endpoint", &section.endpoint)?;
    ensure_http_url("[collaborator].health_url", &section.health_url)?;

    let request_timeout =
        positive_duration("[collaborator].request_timeout", &section.request_timeout)?;

    let token_env = match section.token_env.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(name) => Some(name.to_string()),
    };

    Ok(CollaboratorSettings {
        endpoint: section.endpoint.clone(),
        health_url: section.health_url.clone(),
        request_timeout,
        token_env,
    })
}

fn resolve_retry(cfg: &RawConfigFile) -> Result<RetryPolicy> {
    let initial_backoff = parse_field("[retry].initial_backoff", &cfg.retry.initial_backoff)?;
    let max_backoff = parse_field("[retry].max_backoff", &cfg.retry.max_backoff)?;

    if max_backoff < initial_backoff {
        return Err(MigradagError::ConfigError(format!(
            "[retry].max_backoff ({:?}) must be >= initial_backoff ({:?})",
            max_backoff, initial_backoff
        )));
    }

    Ok(RetryPolicy {
        max_retries: cfg.retry.max_retries,
        initial_backoff,
        max_backoff,
    })
}

fn resolve_performance(section: &PerformanceSection) -> Result<PerformanceThresholds> {
    let percent = |name: &str, value: f64| -> Result<()> {
        if !(0.0..=100.0).contains(&value) {
            return Err(MigradagError::ConfigError(format!(
                "[performance].{name} must be within 0..=100 (got {value})"
            )));
        }
        Ok(())
    };

    percent("cpu_low_water", section.cpu_low_water)?;
    percent("cpu_high_water", section.cpu_high_water)?;
    percent("memory_high_water", section.memory_high_water)?;

    if section.cpu_low_water >= section.cpu_high_water {
        return Err(MigradagError::ConfigError(format!(
            "[performance].cpu_low_water ({}) must be below cpu_high_water ({})",
            section.cpu_low_water, section.cpu_high_water
        )));
    }
    if section.memory_high_water <= 0.0 {
        return Err(MigradagError::ConfigError(
            "[performance].memory_high_water must be > 0".to_string(),
        ));
    }

    Ok(PerformanceThresholds {
        cpu_low_water: section.cpu_low_water,
        cpu_high_water: section.cpu_high_water,
        memory_high_water: section.memory_high_water,
    })
}

fn ensure_http_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| MigradagError::ConfigError(format!("{field} is not a valid URL: {e}")))?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(()),
        _ => Err(MigradagError::ConfigError(format!(
            "{field} must be an http(s) URL with a host (got '{value}')"
        ))),
    }
}

fn parse_field(field: &str, value: &str) -> Result<Duration> {
    parse_duration(value).map_err(|e| MigradagError::ConfigError(format!("{field}: {e}")))
}

fn positive_duration(field: &str, value: &str) -> Result<Duration> {
    let d = parse_field(field, value)?;
    if d.is_zero() {
        return Err(MigradagError::ConfigError(format!("{field} must be > 0")));
    }
    Ok(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawConfigFile {
        let mut raw = RawConfigFile::default();
        raw.migration.project_id = "demo-project".to_string();
        raw
    }

    #[test]
    fn defaults_resolve() {
        let cfg = ConfigFile::try_from(raw()).unwrap();
        assert_eq!(cfg.project_id, "demo-project");
        assert_eq!(cfg.collaborator.request_timeout, Duration::from_secs(30));
        assert_eq!(cfg.retry.max_retries, 3);
        assert_eq!(cfg.poll_interval, Duration::from_secs(5));
        assert_eq!(cfg.performance, PerformanceThresholds::default());
    }

    #[test]
    fn missing_project_id_is_rejected() {
        let err = ConfigFile::try_from(RawConfigFile::default()).unwrap_err();
        assert!(err.to_string().contains("project_id"));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let mut cfg = raw();
        cfg.monitor.poll_interval = "0s".to_string();
        assert!(ConfigFile::try_from(cfg).is_err());
    }

    #[test]
    fn inverted_cpu_thresholds_are_rejected() {
        let mut cfg = raw();
        cfg.performance.cpu_low_water = 90.0;
        cfg.performance.cpu_high_water = 10.0;
        assert!(ConfigFile::try_from(cfg).is_err());
    }

    #[test]
    fn non_http_endpoint_is_rejected() {
        let mut cfg = raw();
        cfg.collaborator.endpoint = "ws://localhost:8080".to_string();
        assert!(ConfigFile::try_from(cfg).is_err());
    }

    #[test]
    fn blank_token_env_means_no_credentials() {
        let mut cfg = raw();
        cfg.collaborator.token_env = Some("  ".to_string());
        let cfg = ConfigFile::try_from(cfg).unwrap();
        assert!(cfg.collaborator.token_env.is_none());
    }
}
