//! Fatigue analysis pipeline
//!
//! ```text
//! RawTable → normalizer → trend → scoring → classifier → waste / recommendations → FatigueReport
//! ```
//!
//! Every stage is a pure function of its inputs plus the request's
//! [`FlareConfig`]. Campaigns are independent; with `engine.parallel` they are
//! evaluated on the rayon pool and the report is identical to a sequential run.

pub mod classifier;
pub mod normalizer;
pub mod recommendations;
pub mod scoring;
pub mod trend;
pub mod waste;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::FlareConfig;
use crate::error::ValidationError;
use crate::ingest::RawTable;
use crate::report::FatigueReport;
use crate::types::{CampaignSeries, FatigueResult, RiskLevel};

pub use classifier::Classification;
pub use normalizer::{normalize, CampaignTable, Capabilities, ColumnSchema, ValidationOutcome};
pub use recommendations::RecommendationContext;

/// Fatigue engine bound to one configuration.
#[derive(Debug, Clone, Default)]
pub struct FlareEngine {
    config: FlareConfig,
}

impl FlareEngine {
    pub fn new(config: FlareConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FlareConfig {
        &self.config
    }

    /// Check a table without scoring it.
    pub fn validate(&self, table: &RawTable) -> ValidationOutcome {
        normalizer::validate(table)
    }

    /// Run the full pipeline over every campaign in the table.
    pub fn process(&self, table: &RawTable) -> Result<FatigueReport, ValidationError> {
        let campaigns = normalizer::normalize(table)?;
        let warning = campaigns.warning();
        if let Some(w) = &warning {
            warn!(missing = ?w.missing, "{w}");
        }

        let results: Vec<FatigueResult> = if self.config.engine.parallel {
            campaigns.series().par_iter().map(|s| self.evaluate(s)).collect()
        } else {
            campaigns.series().iter().map(|s| self.evaluate(s)).collect()
        };

        let report = FatigueReport::new(
            results,
            campaigns.campaign_errors().to_vec(),
            warning.map(|w| w.to_string()),
            self.config.stages.high_risk_fri,
        );
        info!(
            rows = campaigns.row_count(),
            campaigns = report.len(),
            excluded = report.campaign_errors().len(),
            at_risk = report.results().filter(|r| r.stage.is_at_risk()).count(),
            "Fatigue analysis complete"
        );
        Ok(report)
    }

    /// Score, classify and cost one campaign.
    pub fn evaluate(&self, series: &CampaignSeries) -> FatigueResult {
        let cfg = &self.config;

        let summary = trend::extract(series);
        let breakdown = scoring::score(&trend::signals(&summary), &cfg.scoring);
        let fri = breakdown.fri;
        let Classification { stage, age_guarded } = classifier::classify(fri, summary.age_days, &cfg.stages);

        let timeline = trend::timeline(series, &cfg.trend, &cfg.scoring);
        let waste = waste::estimate(stage, fri, series, &timeline, &cfg.stages, &cfg.waste);

        let ctx = RecommendationContext {
            stage,
            fri,
            breakdown: &breakdown,
            trend: &summary,
            insufficient_history: summary.age_days < cfg.stages.min_age_days,
        };
        let recommendations = recommendations::generate(&ctx, &cfg.recommendations);

        debug!(
            campaign_id = %series.campaign_id(),
            fri = format!("{fri:.1}"),
            stage = %stage,
            age_days = summary.age_days,
            age_guarded,
            wasted = format!("{:.2}", waste.wasted_spend),
            dominant = ?breakdown.dominant_signal(),
            "Campaign scored"
        );

        FatigueResult {
            campaign_id: series.campaign_id().to_string(),
            fri,
            stage,
            risk_level: RiskLevel::from_fri(fri),
            age_guarded,
            breakdown,
            trend: summary,
            timeline,
            waste,
            recommendations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FatigueStage;

    fn csv(body: &str) -> RawTable {
        RawTable::from_csv_str(&format!(
            "date,campaign_id,impressions,clicks,spend,conversions,revenue\n{body}"
        ))
        .unwrap()
    }

    #[test]
    fn test_flat_campaign_is_healthy() {
        let table = csv(
            "2024-01-01,A,1000,50,100,5,300\n2024-01-11,A,1000,50,100,5,300\n2024-01-21,A,1000,50,100,5,300\n",
        );
        let report = FlareEngine::default().process(&table).unwrap();
        let a = report.detail("A").unwrap();
        assert_eq!(a.fri, 0.0);
        assert_eq!(a.stage, FatigueStage::Healthy);
        assert_eq!(a.wasted_spend(), 0.0);
        assert_eq!(a.risk_level, RiskLevel::Minimal);
    }

    #[test]
    fn test_young_campaign_is_age_guarded() {
        let table = csv("2024-01-01,A,1000,100,100,10,300\n2024-01-03,A,1000,10,100,1,30\n");
        let a = FlareEngine::default().process(&table).unwrap().detail("A").cloned().unwrap();
        assert!(a.fri >= 75.0, "fri = {}", a.fri);
        assert_eq!(a.stage, FatigueStage::Healthy);
        assert!(a.age_guarded);
        assert_eq!(a.wasted_spend(), 0.0);
    }

    #[test]
    fn test_validate_delegates_to_normalizer() {
        let outcome = FlareEngine::default().validate(&csv("2024-01-01,A,10,20,5,,\n"));
        assert!(!outcome.is_valid);
    }
}
