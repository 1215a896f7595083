//! Waste Estimator
//!
//! Attributes spend to fatigue. Affected spend is the spend on days whose
//! timeline FRI reached the Friction threshold; a stage-dependent fraction of
//! it counts as wasted:
//!
//! - Friction: `friction_base + fri_slope × FRI / 100`
//! - Fatigue:  `fatigue_base + fri_slope × FRI / 100`
//! - Failure:  `failure_fraction`
//!
//! Healthy campaigns waste nothing.

use crate::config::{StageConfig, WasteConfig};
use crate::types::{CampaignSeries, FatigueStage, TimelinePoint, WasteEstimate};

/// Share of affected spend counted as wasted for a stage.
pub fn waste_fraction(stage: FatigueStage, fri: f64, config: &WasteConfig) -> f64 {
    let fraction = match stage {
        FatigueStage::Healthy => 0.0,
        FatigueStage::Friction => config.friction_base + config.fri_slope * fri / 100.0,
        FatigueStage::Fatigue => config.fatigue_base + config.fri_slope * fri / 100.0,
        FatigueStage::Failure => config.failure_fraction,
    };
    if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Spend delivered while the campaign was fatigued.
///
/// Falls back to the most recent third of the series (at least one row)
/// when no timeline day reached the Friction threshold.
pub fn affected_spend(series: &CampaignSeries, timeline: &[TimelinePoint], stages: &StageConfig) -> f64 {
    let mut flagged = timeline
        .iter()
        .filter(|p| p.fri >= stages.friction_threshold)
        .peekable();
    if flagged.peek().is_some() {
        return flagged.map(|p| p.spend).sum();
    }

    let rows = series.rows();
    let k = (rows.len() / 3).max(1).min(rows.len());
    rows[rows.len() - k..].iter().map(|r| r.spend).sum()
}

/// Estimate wasted and recoverable spend for one campaign.
pub fn estimate(
    stage: FatigueStage,
    fri: f64,
    series: &CampaignSeries,
    timeline: &[TimelinePoint],
    stages: &StageConfig,
    config: &WasteConfig,
) -> WasteEstimate {
    let total_spend = series.total_spend();
    if !stage.is_at_risk() {
        return WasteEstimate {
            total_spend,
            ..WasteEstimate::default()
        };
    }

    let affected = affected_spend(series, timeline, stages).min(total_spend);
    let fraction = waste_fraction(stage, fri, config);
    let wasted = (affected * fraction).clamp(0.0, total_spend);

    WasteEstimate {
        total_spend,
        affected_spend: affected,
        waste_fraction: fraction,
        wasted_spend: wasted,
        recoverable_spend: wasted,
    }
}
