//! Result set returned by one pipeline run
//!
//! [`FatigueReport`] owns one [`FatigueResult`] per campaign in campaign-id
//! order, the campaigns excluded for malformed series, and the partial-analysis
//! warning. Consumers read it through three views:
//!
//! - [`FatigueReport::overview`]: portfolio summary (stage counts, spend, waste)
//! - [`FatigueReport::detail`]: one campaign by id
//! - [`FatigueReport::recommendations`]: every action across campaigns

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::CampaignError;
use crate::types::{FatigueResult, FatigueStage, Priority, Recommendation};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FatigueReport {
    results: BTreeMap<String, FatigueResult>,
    campaign_errors: Vec<CampaignError>,
    warning: Option<String>,
    high_risk_fri: f64,
}

/// Portfolio-level summary for an overview consumer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewSummary {
    pub total_campaigns: usize,
    /// Every stage is present, zero counts included
    pub stage_counts: BTreeMap<FatigueStage, usize>,
    pub campaigns_by_stage: BTreeMap<FatigueStage, Vec<String>>,
    pub total_spend: f64,
    pub total_wasted_spend: f64,
    pub total_recoverable_spend: f64,
    /// Wasted as a percentage of total spend
    pub waste_percentage: f64,
    pub average_fri: f64,
    /// Campaigns at or above the high-risk FRI, highest FRI first
    pub high_risk_campaigns: Vec<String>,
    pub excluded_campaigns: usize,
    pub partial_analysis: bool,
}

/// One recommendation tagged with its campaign.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignRecommendation<'a> {
    pub campaign_id: &'a str,
    pub stage: FatigueStage,
    pub fri: f64,
    pub recommendation: &'a Recommendation,
}

impl CampaignRecommendation<'_> {
    pub fn priority(&self) -> Priority {
        self.recommendation.priority
    }
}

impl FatigueReport {
    pub fn new(
        results: impl IntoIterator<Item = FatigueResult>,
        campaign_errors: Vec<CampaignError>,
        warning: Option<String>,
        high_risk_fri: f64,
    ) -> Self {
        Self {
            results: results
                .into_iter()
                .map(|r| (r.campaign_id.clone(), r))
                .collect(),
            campaign_errors,
            warning,
            high_risk_fri,
        }
    }

    /// Results in campaign-id order.
    pub fn results(&self) -> impl Iterator<Item = &FatigueResult> {
        self.results.values()
    }

    pub fn campaign_ids(&self) -> impl Iterator<Item = &str> {
        self.results.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn campaign_errors(&self) -> &[CampaignError] {
        &self.campaign_errors
    }

    /// Partial-analysis warning, if optional signals were missing.
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn detail(&self, campaign_id: &str) -> Option<&FatigueResult> {
        self.results.get(campaign_id)
    }

    pub fn overview(&self) -> OverviewSummary {
        let mut stage_counts: BTreeMap<FatigueStage, usize> =
            FatigueStage::ALL.iter().map(|&s| (s, 0)).collect();
        let mut campaigns_by_stage: BTreeMap<FatigueStage, Vec<String>> =
            FatigueStage::ALL.iter().map(|&s| (s, Vec::new())).collect();

        let (mut total_spend, mut total_wasted, mut total_recoverable, mut fri_sum) = (0.0, 0.0, 0.0, 0.0);
        for r in self.results.values() {
            *stage_counts.entry(r.stage).or_default() += 1;
            campaigns_by_stage
                .entry(r.stage)
                .or_default()
                .push(r.campaign_id.clone());
            total_spend += r.waste.total_spend;
            total_wasted += r.waste.wasted_spend;
            total_recoverable += r.waste.recoverable_spend;
            fri_sum += r.fri;
        }

        let mut high_risk: Vec<&FatigueResult> = self
            .results
            .values()
            .filter(|r| r.fri >= self.high_risk_fri)
            .collect();
        high_risk.sort_by(|a, b| b.fri.total_cmp(&a.fri));

        #[allow(clippy::cast_precision_loss)]
        let average_fri = if self.results.is_empty() {
            0.0
        } else {
            fri_sum / self.results.len() as f64
        };

        OverviewSummary {
            total_campaigns: self.results.len(),
            stage_counts,
            campaigns_by_stage,
            total_spend,
            total_wasted_spend: total_wasted,
            total_recoverable_spend: total_recoverable,
            waste_percentage: if total_spend > 0.0 {
                total_wasted / total_spend * 100.0
            } else {
                0.0
            },
            average_fri,
            high_risk_campaigns: high_risk.into_iter().map(|r| r.campaign_id.clone()).collect(),
            excluded_campaigns: self.campaign_errors.len(),
            partial_analysis: self.warning.is_some(),
        }
    }

    /// Every recommendation, priority-descending, then campaign id.
    pub fn recommendations(&self) -> Vec<CampaignRecommendation<'_>> {
        let mut all: Vec<CampaignRecommendation<'_>> = self
            .results
            .values()
            .flat_map(|r| {
                r.recommendations.iter().map(move |rec| CampaignRecommendation {
                    campaign_id: &r.campaign_id,
                    stage: r.stage,
                    fri: r.fri,
                    recommendation: rec,
                })
            })
            .collect();
        all.sort_by(|a, b| b.priority().cmp(&a.priority()));
        all
    }
}
