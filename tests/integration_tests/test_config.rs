// integration tests for engine configuration and template loading

use std::time::Duration;

use formrules::config;
use formrules::{FormTemplate, StateOrchestrator};
use serde_json::json;

use crate::common::{answers, ctx, write_temp, PET_LICENCE};

#[test]
fn test_partial_config_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(dir.path(), "formrules.json", r#"{ "pattern_timeout_ms": 250 }"#);

    let config = config::load(&path).unwrap();
    assert_eq!(config.pattern_timeout(), Duration::from_millis(250));
    assert_eq!(config.max_condition_depth, config::DEFAULT_MAX_CONDITION_DEPTH);
    assert_eq!(config.suggestion_threshold, config::DEFAULT_SUGGESTION_THRESHOLD);
}

#[test]
fn test_out_of_range_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(
        dir.path(),
        "formrules.json",
        r#"{ "pattern_timeout_ms": 0, "max_condition_depth": 1000 }"#,
    );

    let err = config::load(&path).unwrap_err().to_string();
    assert!(err.contains("pattern_timeout_ms"));
    assert!(err.contains("max_condition_depth"));
}

#[test]
fn test_malformed_config_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(dir.path(), "formrules.json", "{ not json");

    let err = format!("{:#}", config::load(&path).unwrap_err());
    assert!(err.contains("Failed to parse config file"));
    assert!(err.contains("formrules.json"));
}

#[test]
fn test_template_loaded_from_disk_drives_navigation() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(dir.path(), "pet-licence.json", PET_LICENCE);

    let template = FormTemplate::load(&path).unwrap();
    let orchestrator = StateOrchestrator::new(&config::EngineConfig {
        suggestion_threshold: 1,
        ..Default::default()
    });

    let data = answers(json!({ "hasPet": "no" }));
    assert_eq!(
        orchestrator.get_next_page(&template, &data, "about-you", &ctx("about-you")),
        Some("declaration".to_string())
    );
}

#[test]
fn test_missing_template_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = format!("{:#}", FormTemplate::load(&dir.path().join("nope.json")).unwrap_err());
    assert!(err.contains("Failed to read form template"));
}
