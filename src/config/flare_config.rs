//! FLARE Configuration - every calibration constant as an operator-tunable TOML value
//!
//! Each section implements `Default` with the values from `config::defaults`,
//! so an absent or partial config file behaves exactly like the built-ins.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "FLARE_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "flare_config.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one engine instance.
///
/// Passed explicitly into `FlareEngine::new`; there is no process-global copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlareConfig {
    /// Trend extraction windows
    #[serde(default)]
    pub trend: TrendConfig,

    /// FRI weights and saturation points
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Stage thresholds and the age guard
    #[serde(default)]
    pub stages: StageConfig,

    /// Wasted-spend fractions
    #[serde(default)]
    pub waste: WasteConfig,

    /// Recommendation rule triggers
    #[serde(default)]
    pub recommendations: RecommendationConfig,

    /// Execution options
    #[serde(default)]
    pub engine: EngineConfig,
}

impl FlareConfig {
    /// Resolve configuration in order:
    /// 1. `explicit` path (errors propagate)
    /// 2. `$FLARE_CONFIG`
    /// 3. `./flare_config.toml`
    /// 4. Built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            let config = Self::load_from_file(path)?;
            info!(path = %path.display(), "Loaded FLARE config");
            return Ok(config);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded FLARE config from {CONFIG_ENV_VAR}");
                        return Ok(config);
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {CONFIG_ENV_VAR}, falling back");
                    }
                }
            } else {
                warn!(path = %path, "{CONFIG_ENV_VAR} points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded FLARE config from ./{LOCAL_CONFIG_FILE}");
                    return Ok(config);
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{LOCAL_CONFIG_FILE}, using defaults");
                }
            }
        }

        info!("No flare_config.toml found, using built-in defaults");
        Ok(Self::default())
    }

    /// Load and validate a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Toml(inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate TOML text.
    ///
    /// Unknown keys only warn; semantic problems are errors.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }
        let config: Self = toml::from_str(contents).map_err(ConfigError::Toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check the config for internal consistency.
    ///
    /// Rules:
    /// - Stage thresholds strictly ascending inside (0, 100]
    /// - Scoring weights non-negative and summing to ~1.0
    /// - Saturation points positive (used as divisors)
    /// - Waste fractions inside [0, 1] and escalating with severity
    /// - Window sizes > 0
    /// - No NaN / Inf anywhere
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let st = &self.stages;
        for (name, value) in [
            ("stages.friction_threshold", st.friction_threshold),
            ("stages.fatigue_threshold", st.fatigue_threshold),
            ("stages.failure_threshold", st.failure_threshold),
            ("stages.high_risk_fri", st.high_risk_fri),
        ] {
            if !value.is_finite() || value <= 0.0 || value > 100.0 {
                errors.push(format!("{name} = {value} must be in (0, 100]"));
            }
        }
        Self::check_ascending(
            st.friction_threshold,
            st.fatigue_threshold,
            "stages.friction_threshold",
            "stages.fatigue_threshold",
            &mut errors,
        );
        Self::check_ascending(
            st.fatigue_threshold,
            st.failure_threshold,
            "stages.fatigue_threshold",
            "stages.failure_threshold",
            &mut errors,
        );
        if st.min_age_days < 0 {
            errors.push(format!("stages.min_age_days = {} cannot be negative", st.min_age_days));
        }

        let sc = &self.scoring;
        for (name, value) in [
            ("scoring.ctr_weight", sc.ctr_weight),
            ("scoring.cpa_weight", sc.cpa_weight),
            ("scoring.roi_weight", sc.roi_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("{name} = {value} must be a non-negative number"));
            }
        }
        let weight_sum = sc.ctr_weight + sc.cpa_weight + sc.roi_weight;
        if !(0.95..=1.05).contains(&weight_sum) {
            errors.push(format!("scoring weights must sum to ~1.0, got {weight_sum:.2}"));
        }
        for (name, value) in [
            ("scoring.ctr_decay_saturation", sc.ctr_decay_saturation),
            ("scoring.cpa_increase_saturation", sc.cpa_increase_saturation),
            ("scoring.roi_drop_saturation", sc.roi_drop_saturation),
        ] {
            if !value.is_finite() || value <= 0.0 {
                errors.push(format!("{name} = {value} must be > 0 (used as divisor)"));
            }
        }

        let w = &self.waste;
        for (name, value) in [
            ("waste.friction_base", w.friction_base),
            ("waste.fatigue_base", w.fatigue_base),
            ("waste.failure_fraction", w.failure_fraction),
            ("waste.fri_slope", w.fri_slope),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                errors.push(format!("{name} = {value} must be in [0, 1]"));
            }
        }
        Self::check_ascending(
            w.friction_base,
            w.fatigue_base,
            "waste.friction_base",
            "waste.fatigue_base",
            &mut errors,
        );

        if self.trend.rolling_window == 0 {
            errors.push("trend.rolling_window must be > 0".to_string());
        }
        if self.trend.baseline_periods == 0 {
            errors.push("trend.baseline_periods must be > 0".to_string());
        }

        let r = &self.recommendations;
        if !r.ctr_decline_alert_pct.is_finite() || !r.cpa_increase_alert_pct.is_finite() {
            errors.push("recommendations alert percentages must be finite".to_string());
        }
        if r.max_frequency_cap_reduction_pct > 100 {
            errors.push(format!(
                "recommendations.max_frequency_cap_reduction_pct = {} cannot exceed 100",
                r.max_frequency_cap_reduction_pct
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_ascending(lower: f64, upper: f64, lower_name: &str, upper_name: &str, errors: &mut Vec<String>) {
        if !lower.is_finite() || !upper.is_finite() {
            errors.push(format!(
                "{lower_name}/{upper_name}: values must be finite (got {lower}, {upper})"
            ));
            return;
        }
        if upper <= lower {
            errors.push(format!(
                "{upper_name} ({upper:.3}) must be greater than {lower_name} ({lower:.3})"
            ));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({path}): {err}", path = .0.display(), err = .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({path}): {err}", path = .0.display(), err = .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config parse error: {0}")]
    Toml(#[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[source] toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Trend
// ============================================================================

/// Windows used by the daily fatigue timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendConfig {
    /// Trailing rolling-mean window (periods).
    #[serde(default = "default_rolling_window")]
    pub rolling_window: usize,

    /// Leading periods averaged into the baseline.
    #[serde(default = "default_baseline_periods")]
    pub baseline_periods: usize,
}

fn default_rolling_window() -> usize {
    defaults::ROLLING_WINDOW
}
fn default_baseline_periods() -> usize {
    defaults::BASELINE_PERIODS
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            rolling_window: default_rolling_window(),
            baseline_periods: default_baseline_periods(),
        }
    }
}

// ============================================================================
// Scoring
// ============================================================================

/// FRI formula constants.
///
/// Each signal is normalized as `clamp(signal / saturation, 0, 1)` and the
/// normalized values are combined with these weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_ctr_weight")]
    pub ctr_weight: f64,

    #[serde(default = "default_cpa_weight")]
    pub cpa_weight: f64,

    #[serde(default = "default_roi_weight")]
    pub roi_weight: f64,

    /// Relative CTR decay that maps to a full CTR contribution.
    #[serde(default = "default_ctr_decay_saturation")]
    pub ctr_decay_saturation: f64,

    /// Relative CPA increase that maps to a full CPA contribution.
    #[serde(default = "default_cpa_increase_saturation")]
    pub cpa_increase_saturation: f64,

    /// Relative ROI drop that maps to a full ROI contribution.
    #[serde(default = "default_roi_drop_saturation")]
    pub roi_drop_saturation: f64,
}

fn default_ctr_weight() -> f64 {
    defaults::CTR_WEIGHT
}
fn default_cpa_weight() -> f64 {
    defaults::CPA_WEIGHT
}
fn default_roi_weight() -> f64 {
    defaults::ROI_WEIGHT
}
fn default_ctr_decay_saturation() -> f64 {
    defaults::CTR_DECAY_SATURATION
}
fn default_cpa_increase_saturation() -> f64 {
    defaults::CPA_INCREASE_SATURATION
}
fn default_roi_drop_saturation() -> f64 {
    defaults::ROI_DROP_SATURATION
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            ctr_weight: default_ctr_weight(),
            cpa_weight: default_cpa_weight(),
            roi_weight: default_roi_weight(),
            ctr_decay_saturation: default_ctr_decay_saturation(),
            cpa_increase_saturation: default_cpa_increase_saturation(),
            roi_drop_saturation: default_roi_drop_saturation(),
        }
    }
}

// ============================================================================
// Stages
// ============================================================================

/// Closed-open FRI bands and the insufficient-history guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// T1: Healthy below, Friction at or above.
    #[serde(default = "default_friction_threshold")]
    pub friction_threshold: f64,

    /// T2: Fatigue at or above.
    #[serde(default = "default_fatigue_threshold")]
    pub fatigue_threshold: f64,

    /// T3: Failure at or above.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: f64,

    /// Campaigns younger than this many days are classified Healthy.
    #[serde(default = "default_min_age_days")]
    pub min_age_days: i64,

    /// FRI at or above which the overview lists a campaign as high risk.
    #[serde(default = "default_high_risk_fri")]
    pub high_risk_fri: f64,
}

fn default_friction_threshold() -> f64 {
    defaults::FRICTION_THRESHOLD
}
fn default_fatigue_threshold() -> f64 {
    defaults::FATIGUE_THRESHOLD
}
fn default_failure_threshold() -> f64 {
    defaults::FAILURE_THRESHOLD
}
fn default_min_age_days() -> i64 {
    defaults::MIN_AGE_DAYS
}
fn default_high_risk_fri() -> f64 {
    defaults::HIGH_RISK_FRI
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            friction_threshold: default_friction_threshold(),
            fatigue_threshold: default_fatigue_threshold(),
            failure_threshold: default_failure_threshold(),
            min_age_days: default_min_age_days(),
            high_risk_fri: default_high_risk_fri(),
        }
    }
}

// ============================================================================
// Waste
// ============================================================================

/// Stage-dependent share of affected spend counted as wasted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteConfig {
    #[serde(default = "default_friction_base")]
    pub friction_base: f64,

    #[serde(default = "default_fatigue_base")]
    pub fatigue_base: f64,

    #[serde(default = "default_failure_fraction")]
    pub failure_fraction: f64,

    /// Extra fraction per 100 FRI points for Friction and Fatigue.
    #[serde(default = "default_fri_slope")]
    pub fri_slope: f64,
}

fn default_friction_base() -> f64 {
    defaults::FRICTION_WASTE_BASE
}
fn default_fatigue_base() -> f64 {
    defaults::FATIGUE_WASTE_BASE
}
fn default_failure_fraction() -> f64 {
    defaults::FAILURE_WASTE_FRACTION
}
fn default_fri_slope() -> f64 {
    defaults::WASTE_FRI_SLOPE
}

impl Default for WasteConfig {
    fn default() -> Self {
        Self {
            friction_base: default_friction_base(),
            fatigue_base: default_fatigue_base(),
            failure_fraction: default_failure_fraction(),
            fri_slope: default_fri_slope(),
        }
    }
}

// ============================================================================
// Recommendations
// ============================================================================

/// Triggers for the conditional recommendation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationConfig {
    #[serde(default = "default_rotation_age_days")]
    pub rotation_age_days: i64,

    #[serde(default = "default_healthy_refresh_age_days")]
    pub healthy_refresh_age_days: i64,

    #[serde(default = "default_restructure_age_days")]
    pub restructure_age_days: i64,

    #[serde(default = "default_ctr_decline_alert_pct")]
    pub ctr_decline_alert_pct: f64,

    #[serde(default = "default_cpa_increase_alert_pct")]
    pub cpa_increase_alert_pct: f64,

    #[serde(default = "default_max_frequency_cap_reduction_pct")]
    pub max_frequency_cap_reduction_pct: u32,

    #[serde(default = "default_close_monitoring_fri")]
    pub close_monitoring_fri: f64,

    #[serde(default = "default_budget_reallocation_fri")]
    pub budget_reallocation_fri: f64,
}

fn default_rotation_age_days() -> i64 {
    defaults::ROTATION_AGE_DAYS
}
fn default_healthy_refresh_age_days() -> i64 {
    defaults::HEALTHY_REFRESH_AGE_DAYS
}
fn default_restructure_age_days() -> i64 {
    defaults::RESTRUCTURE_AGE_DAYS
}
fn default_ctr_decline_alert_pct() -> f64 {
    defaults::CTR_DECLINE_ALERT_PCT
}
fn default_cpa_increase_alert_pct() -> f64 {
    defaults::CPA_INCREASE_ALERT_PCT
}
fn default_max_frequency_cap_reduction_pct() -> u32 {
    defaults::MAX_FREQUENCY_CAP_REDUCTION_PCT
}
fn default_close_monitoring_fri() -> f64 {
    defaults::CLOSE_MONITORING_FRI
}
fn default_budget_reallocation_fri() -> f64 {
    defaults::BUDGET_REALLOCATION_FRI
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            rotation_age_days: default_rotation_age_days(),
            healthy_refresh_age_days: default_healthy_refresh_age_days(),
            restructure_age_days: default_restructure_age_days(),
            ctr_decline_alert_pct: default_ctr_decline_alert_pct(),
            cpa_increase_alert_pct: default_cpa_increase_alert_pct(),
            max_frequency_cap_reduction_pct: default_max_frequency_cap_reduction_pct(),
            close_monitoring_fri: default_close_monitoring_fri(),
            budget_reallocation_fri: default_budget_reallocation_fri(),
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Execution options that do not change results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Score campaigns on the rayon thread pool.
    #[serde(default)]
    pub parallel: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = FlareConfig::default();
        assert!(config.validate().is_ok(), "{:?}", config.validate());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = FlareConfig::from_toml_str(
            r#"
[stages]
min_age_days = 14
"#,
        )
        .unwrap();
        assert_eq!(config.stages.min_age_days, 14);
        assert_eq!(config.stages.friction_threshold, defaults::FRICTION_THRESHOLD);
        assert_eq!(config.scoring, ScoringConfig::default());
    }

    #[test]
    fn test_validation_catches_unordered_thresholds() {
        let mut config = FlareConfig::default();
        config.stages.fatigue_threshold = 80.0;
        config.stages.failure_threshold = 70.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("failure_threshold"), "{err}");
    }

    #[test]
    fn test_validation_catches_equal_thresholds() {
        let mut config = FlareConfig::default();
        config.stages.fatigue_threshold = config.stages.friction_threshold;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_catches_bad_weights() {
        let mut config = FlareConfig::default();
        config.scoring.ctr_weight = 0.9;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sum to ~1.0"), "{err}");
    }

    #[test]
    fn test_validation_catches_zero_saturation() {
        let mut config = FlareConfig::default();
        config.scoring.cpa_increase_saturation = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_catches_nan() {
        let mut config = FlareConfig::default();
        config.waste.fri_slope = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_catches_zero_window() {
        let mut config = FlareConfig::default();
        config.trend.rolling_window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_roundtrip_toml() {
        let original = FlareConfig::default();
        let toml_str = original.to_toml().expect("serialization should work");
        let roundtripped: FlareConfig = toml::from_str(&toml_str).expect("deserialization should work");
        assert_eq!(original, roundtripped);
    }

    #[test]
    fn test_all_sections_serialize() {
        let toml_str = FlareConfig::default().to_toml().unwrap();
        for section in ["[trend]", "[scoring]", "[stages]", "[waste]", "[recommendations]", "[engine]"] {
            assert!(toml_str.contains(section), "Missing {section} section");
        }
    }

    #[test]
    fn test_load_explicit_missing_file_is_error() {
        let result = FlareConfig::load(Some(Path::new("/nonexistent/flare_config.toml")));
        assert!(matches!(result, Err(ConfigError::Io(..))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flare_config.toml");
        std::fs::write(&path, "[engine]\nparallel = true\n").unwrap();
        let config = FlareConfig::load(Some(&path)).unwrap();
        assert!(config.engine.parallel);
    }

    #[test]
    fn test_load_from_file_parse_error_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[stages\nfriction_threshold = ").unwrap();
        let err = FlareConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(..)));
        assert!(err.to_string().contains("broken.toml"));
    }
}
