// tests/config_loading.rs

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;

use migradag::config::{load_and_validate, load_from_path};
use migradag::errors::MigradagError;
use migradag::stages::StageSettings;
use migradag_test_utils::builders::ConfigFileBuilder;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn full_config_is_resolved() {
    let file = write_config(
        r#"
[migration]
project_id = "acme-prod"

[collaborator]
endpoint = "https://tools.internal:8443/tool"
health_url = "https://tools.internal:8443/healthz"
request_timeout = "45s"
token_env = "MIGRADAG_TOKEN"

[retry]
max_retries = 5
initial_backoff = "250ms"
max_backoff = "4s"

[monitor]
poll_interval = "2s"

[performance]
cpu_low_water = 10
cpu_high_water = 90
memory_high_water = 75
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.project_id, "acme-prod");
    assert_eq!(cfg.collaborator.request_timeout, Duration::from_secs(45));
    assert_eq!(cfg.collaborator.token_env.as_deref(), Some("MIGRADAG_TOKEN"));
    assert_eq!(cfg.retry.max_retries, 5);
    assert_eq!(cfg.retry.initial_backoff, Duration::from_millis(250));
    assert_eq!(cfg.poll_interval, Duration::from_secs(2));
    assert_eq!(cfg.performance.memory_high_water, 75.0);

    let settings = StageSettings::from_config(&cfg);
    assert_eq!(settings.project_id, "acme-prod");
    assert_eq!(settings.poll_interval, Duration::from_secs(2));
}

#[test]
fn minimal_config_uses_defaults() {
    let file = write_config("[migration]\nproject_id = \"demo\"\n");
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.collaborator.endpoint, "http://localhost:8080/tool");
    assert_eq!(cfg.collaborator.request_timeout, Duration::from_secs(30));
    assert_eq!(cfg.retry.max_retries, 3);
    assert_eq!(cfg.poll_interval, Duration::from_secs(5));
    assert_eq!(cfg.performance.cpu_low_water, 20.0);
    assert!(cfg.collaborator.token_env.is_none());
}

#[test]
fn missing_project_id_is_a_config_error() {
    let file = write_config("[monitor]\npoll_interval = \"1s\"\n");
    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, MigradagError::ConfigError(_)), "{err}");
}

#[test]
fn bad_toml_and_missing_files_are_reported() {
    let file = write_config("[migration\nproject_id = ");
    assert!(matches!(
        load_from_path(file.path()),
        Err(MigradagError::TomlError(_))
    ));

    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_and_validate(dir.path().join("absent.toml")),
        Err(MigradagError::IoError(_))
    ));
}

#[test]
fn invalid_values_are_rejected() {
    for contents in [
        "[migration]\nproject_id = \"p\"\n[monitor]\npoll_interval = \"soon\"\n",
        "[migration]\nproject_id = \"p\"\n[collaborator]\nendpoint = \"ftp://host/tool\"\n",
        "[migration]\nproject_id = \"p\"\n[retry]\ninitial_backoff = \"5s\"\nmax_backoff = \"1s\"\n",
        "[migration]\nproject_id = \"p\"\n[performance]\ncpu_low_water = 90\ncpu_high_water = 10\n",
    ] {
        let file = write_config(contents);
        let err = load_and_validate(file.path()).unwrap_err();
        assert!(matches!(err, MigradagError::ConfigError(_)), "{contents}: {err}");
    }
}

#[test]
fn builder_produces_valid_config() {
    let cfg = ConfigFileBuilder::new()
        .project_id("built")
        .poll_interval("50ms")
        .max_retries(0)
        .cpu_thresholds(5.0, 95.0)
        .build();

    assert_eq!(cfg.project_id, "built");
    assert_eq!(cfg.poll_interval, Duration::from_millis(50));
    assert_eq!(cfg.retry.max_retries, 0);
    assert_eq!(cfg.performance.cpu_high_water, 95.0);
}
