//! Config Validation Tests
//!
//! Typo detection (unknown keys with suggestions) and semantic validation of
//! `FlareConfig`, exercised through the public API only.

use flare::config::validation::{known_config_keys, suggest_correction, validate_unknown_keys};
use flare::config::{ConfigError, FlareConfig};
use flare::{FatigueStage, FlareEngine, RawTable};

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_scoring_key_warns_with_suggestion() {
    let warnings = validate_unknown_keys(
        r#"
[scoring]
ctr_wieght = 0.5
"#,
    );
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("ctr_wieght"));
    assert_eq!(warnings[0].suggestion.as_deref(), Some("scoring.ctr_weight"));
}

#[test]
fn typo_in_section_name_warns() {
    let warnings = validate_unknown_keys(
        r#"
[stage]
min_age_days = 10
"#,
    );
    assert!(!warnings.is_empty());
    assert_eq!(warnings[0].field, "stage");
    assert_eq!(warnings[0].suggestion.as_deref(), Some("stages"));
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = FlareConfig::default().to_toml().unwrap();
    assert!(validate_unknown_keys(&toml_str).is_empty());
}

#[test]
fn every_serialized_key_is_known() {
    let value: toml::Value = FlareConfig::default().to_toml().unwrap().parse().unwrap();
    let known = known_config_keys();
    for (section, table) in value.as_table().unwrap() {
        assert!(known.contains(section.as_str()), "{section} not in known keys");
        for key in table.as_table().unwrap().keys() {
            let path = format!("{section}.{key}");
            assert!(known.contains(path.as_str()), "{path} not in known keys");
        }
    }
}

#[test]
fn distant_key_gets_no_suggestion() {
    let known = known_config_keys();
    assert_eq!(suggest_correction("completely_unrelated_key", &known), None);
}

#[test]
fn unknown_keys_do_not_fail_loading() {
    let config = FlareConfig::from_toml_str(
        r#"
[engine]
parallel = true
paralel = false
"#,
    )
    .unwrap();
    assert!(config.engine.parallel);
}

// ============================================================================
// Semantic Validation
// ============================================================================

#[test]
fn non_ascending_thresholds_are_rejected() {
    let err = FlareConfig::from_toml_str(
        r#"
[stages]
friction_threshold = 60.0
fatigue_threshold = 50.0
"#,
    )
    .unwrap_err();
    match err {
        ConfigError::Validation(errors) => {
            assert!(errors.iter().any(|e| e.contains("fatigue_threshold")), "{errors:?}");
        }
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn waste_fraction_out_of_range_is_rejected() {
    let result = FlareConfig::from_toml_str(
        r#"
[waste]
failure_fraction = 1.5
"#,
    );
    assert!(matches!(result, Err(ConfigError::Validation(_))));
}

#[test]
fn wrong_type_is_parse_error() {
    let result = FlareConfig::from_toml_str(
        r#"
[stages]
min_age_days = "seven"
"#,
    );
    assert!(matches!(result, Err(ConfigError::Toml(_))));
}

#[test]
fn all_errors_reported_together() {
    let mut config = FlareConfig::default();
    config.scoring.roi_drop_saturation = -1.0;
    config.trend.baseline_periods = 0;
    config.recommendations.max_frequency_cap_reduction_pct = 150;
    match config.validate() {
        Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 3, "{errors:?}"),
        other => panic!("expected 3 validation errors, got {other:?}"),
    }
}

// ============================================================================
// Config Flows Into The Engine
// ============================================================================

#[test]
fn config_file_changes_classification() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flare_config.toml");
    std::fs::write(
        &path,
        r#"
[stages]
min_age_days = 60
"#,
    )
    .unwrap();
    let config = FlareConfig::load(Some(&path)).unwrap();

    let table = RawTable::from_csv_str(
        "date,campaign_id,impressions,clicks,spend\n\
         2024-01-01,C1,1000,100,100\n\
         2024-01-15,C1,1000,60,100\n\
         2024-01-30,C1,1000,20,100\n",
    )
    .unwrap();

    let default_stage = FlareEngine::default().process(&table).unwrap().detail("C1").unwrap().stage;
    assert!(default_stage.is_at_risk());

    let guarded = FlareEngine::new(config).process(&table).unwrap();
    let c1 = guarded.detail("C1").unwrap();
    assert_eq!(c1.stage, FatigueStage::Healthy);
    assert!(c1.age_guarded);
}
