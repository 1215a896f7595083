//! System-wide default constants.
//!
//! Every calibration value the engine uses starts here and is overridable
//! through `flare_config.toml`. Grouped by pipeline stage.

// ============================================================================
// Trend Extraction
// ============================================================================

/// Trailing window (periods) for the rolling means of the daily timeline.
pub const ROLLING_WINDOW: usize = 7;

/// Leading periods averaged into the timeline baseline.
pub const BASELINE_PERIODS: usize = 7;

// ============================================================================
// FRI Scoring
// ============================================================================

/// Weight of the CTR-decay signal.
pub const CTR_WEIGHT: f64 = 0.40;

/// Weight of the CPA-increase signal.
pub const CPA_WEIGHT: f64 = 0.30;

/// Weight of the ROI-drop signal.
pub const ROI_WEIGHT: f64 = 0.30;

/// Relative CTR decay at which the CTR signal saturates (0.5 = 50% drop).
pub const CTR_DECAY_SATURATION: f64 = 0.5;

/// Relative CPA increase at which the CPA signal saturates (1.0 = doubled).
pub const CPA_INCREASE_SATURATION: f64 = 1.0;

/// Relative ROI drop at which the ROI signal saturates.
pub const ROI_DROP_SATURATION: f64 = 0.5;

// ============================================================================
// Stage Classification
// ============================================================================

/// FRI at which a campaign enters Friction (T1).
pub const FRICTION_THRESHOLD: f64 = 20.0;

/// FRI at which a campaign enters Fatigue (T2).
pub const FATIGUE_THRESHOLD: f64 = 50.0;

/// FRI at which a campaign enters Failure (T3).
pub const FAILURE_THRESHOLD: f64 = 75.0;

/// Campaigns younger than this (days) are always Healthy.
pub const MIN_AGE_DAYS: i64 = 7;

/// FRI at or above which a campaign is listed as high risk in the overview.
pub const HIGH_RISK_FRI: f64 = 50.0;

// ============================================================================
// Waste Estimation
// ============================================================================

/// Base waste fraction for Friction campaigns.
pub const FRICTION_WASTE_BASE: f64 = 0.20;

/// Base waste fraction for Fatigue campaigns.
pub const FATIGUE_WASTE_BASE: f64 = 0.40;

/// Flat waste fraction for Failure campaigns.
pub const FAILURE_WASTE_FRACTION: f64 = 0.70;

/// Additional waste fraction per 100 FRI points (Friction and Fatigue).
///
/// `fraction = base + FRI / 100 * WASTE_FRI_SLOPE`
pub const WASTE_FRI_SLOPE: f64 = 0.30;

// ============================================================================
// Recommendations
// ============================================================================

/// Campaign age (days) beyond which a rotation schedule is recommended.
pub const ROTATION_AGE_DAYS: i64 = 21;

/// Age (days) beyond which Healthy campaigns are told to plan a refresh.
pub const HEALTHY_REFRESH_AGE_DAYS: i64 = 14;

/// Age (days) beyond which Failure campaigns are told to restructure.
pub const RESTRUCTURE_AGE_DAYS: i64 = 30;

/// CTR decline (%) that triggers the A/B messaging test in Friction.
pub const CTR_DECLINE_ALERT_PCT: f64 = 10.0;

/// CPA increase (%) that triggers the targeting refinement in Fatigue.
pub const CPA_INCREASE_ALERT_PCT: f64 = 15.0;

/// Upper bound on the suggested frequency-cap reduction (%).
pub const MAX_FREQUENCY_CAP_REDUCTION_PCT: u32 = 50;

/// Friction FRI above which monitoring moves from weekly to every two days.
pub const CLOSE_MONITORING_FRI: f64 = 40.0;

/// Failure FRI above which budget reallocation replaces a budget cut.
pub const BUDGET_REALLOCATION_FRI: f64 = 75.0;
