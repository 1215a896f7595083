//! Per-day campaign observations and the per-campaign series built from them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CampaignError;

/// Division that yields `None` instead of faulting or producing Inf/NaN.
pub fn safe_div(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator > 0.0 && numerator.is_finite() {
        Some(numerator / denominator)
    } else {
        None
    }
}

// ============================================================================
// CampaignMetricRow
// ============================================================================

/// One (campaign, date) observation after normalization.
///
/// `ctr`, `cpc`, `cpa` and `roi` are `None` when their denominator is zero
/// or the inputs they derive from were not supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignMetricRow {
    pub date: NaiveDate,
    pub impressions: u64,
    pub clicks: u64,
    pub spend: f64,
    pub conversions: Option<u64>,
    pub revenue: Option<f64>,
    /// clicks / impressions
    pub ctr: Option<f64>,
    /// spend / clicks
    pub cpc: Option<f64>,
    /// spend / conversions
    pub cpa: Option<f64>,
    /// revenue / spend
    pub roi: Option<f64>,
}

impl CampaignMetricRow {
    /// Row from raw counts with no supplied derived metrics.
    pub fn new(
        date: NaiveDate,
        impressions: u64,
        clicks: u64,
        spend: f64,
        conversions: Option<u64>,
        revenue: Option<f64>,
    ) -> Self {
        Self {
            date,
            impressions,
            clicks,
            spend,
            conversions,
            revenue,
            ctr: None,
            cpc: None,
            cpa: None,
            roi: None,
        }
        .with_derived_metrics()
    }

    /// Fill every derived metric that was not supplied.
    ///
    /// Supplied values win over derivation.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn with_derived_metrics(mut self) -> Self {
        if self.ctr.is_none() {
            self.ctr = safe_div(self.clicks as f64, self.impressions as f64);
        }
        if self.cpc.is_none() {
            self.cpc = safe_div(self.spend, self.clicks as f64);
        }
        if self.cpa.is_none() {
            self.cpa = self
                .conversions
                .and_then(|c| safe_div(self.spend, c as f64));
        }
        if self.roi.is_none() {
            self.roi = self.revenue.and_then(|r| safe_div(r, self.spend));
        }
        self
    }
}

// ============================================================================
// CampaignSeries
// ============================================================================

/// Date-ordered rows for one campaign. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignSeries {
    campaign_id: String,
    rows: Vec<CampaignMetricRow>,
}

impl CampaignSeries {
    /// Sort rows by date and reject empty series or repeated dates.
    pub fn new(
        campaign_id: impl Into<String>,
        mut rows: Vec<CampaignMetricRow>,
    ) -> Result<Self, CampaignError> {
        let campaign_id = campaign_id.into();
        if rows.is_empty() {
            return Err(CampaignError::EmptySeries { campaign_id });
        }
        rows.sort_by_key(|r| r.date);
        if let Some(pair) = rows.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(CampaignError::DuplicateDate {
                campaign_id,
                date: pair[0].date,
            });
        }
        Ok(Self { campaign_id, rows })
    }

    pub fn campaign_id(&self) -> &str {
        &self.campaign_id
    }

    pub fn rows(&self) -> &[CampaignMetricRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.rows[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.rows[self.rows.len() - 1].date
    }

    /// Days between the first and last observation.
    pub fn age_days(&self) -> i64 {
        (self.last_date() - self.first_date()).num_days()
    }

    pub fn total_spend(&self) -> f64 {
        self.rows.iter().map(|r| r.spend).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_derived_metrics() {
        let row = CampaignMetricRow::new(day(1), 1000, 50, 100.0, Some(4), Some(300.0));
        assert_eq!(row.ctr, Some(0.05));
        assert_eq!(row.cpc, Some(2.0));
        assert_eq!(row.cpa, Some(25.0));
        assert_eq!(row.roi, Some(3.0));
    }

    #[test]
    fn test_zero_denominators_leave_metrics_undefined() {
        let row = CampaignMetricRow::new(day(1), 0, 0, 0.0, Some(0), Some(10.0));
        assert_eq!(row.ctr, None);
        assert_eq!(row.cpc, None);
        assert_eq!(row.cpa, None);
        assert_eq!(row.roi, None);
    }

    #[test]
    fn test_supplied_metric_is_kept() {
        let mut row = CampaignMetricRow::new(day(1), 1000, 50, 100.0, None, None);
        row.ctr = Some(0.9);
        let row = row.with_derived_metrics();
        assert_eq!(row.ctr, Some(0.9));
        assert_eq!(row.cpa, None);
    }

    #[test]
    fn test_series_sorts_by_date() {
        let rows = vec![
            CampaignMetricRow::new(day(3), 10, 1, 1.0, None, None),
            CampaignMetricRow::new(day(1), 10, 1, 1.0, None, None),
            CampaignMetricRow::new(day(2), 10, 1, 1.0, None, None),
        ];
        let series = CampaignSeries::new("C1", rows).unwrap();
        assert_eq!(series.first_date(), day(1));
        assert_eq!(series.last_date(), day(3));
        assert_eq!(series.age_days(), 2);
        assert!((series.total_spend() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_series_rejects_duplicate_dates() {
        let rows = vec![
            CampaignMetricRow::new(day(1), 10, 1, 1.0, None, None),
            CampaignMetricRow::new(day(1), 20, 2, 2.0, None, None),
        ];
        let err = CampaignSeries::new("C1", rows).unwrap_err();
        assert_eq!(
            err,
            CampaignError::DuplicateDate {
                campaign_id: "C1".to_string(),
                date: day(1)
            }
        );
    }
}
