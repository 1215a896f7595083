//! Trend extractor outputs: window-vs-window metric trends and the daily timeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Early-window vs. late-window comparison of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricTrend {
    /// Mean over the earliest window
    pub early: f64,
    /// Mean over the most recent window
    pub late: f64,
    /// `late - early`
    pub delta: f64,
    /// `delta / early`; `None` when the early mean is zero
    pub relative_change: Option<f64>,
}

impl MetricTrend {
    pub fn new(early: f64, late: f64) -> Self {
        let delta = late - early;
        let relative_change = if early > 0.0 { Some(delta / early) } else { None };
        Self {
            early,
            late,
            delta,
            relative_change,
        }
    }

    /// Relative change in percent, for display and recommendation rules.
    pub fn change_pct(&self) -> Option<f64> {
        self.relative_change.map(|r| r * 100.0)
    }
}

/// Per-campaign trend features. Recomputed on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub ctr: Option<MetricTrend>,
    pub cpa: Option<MetricTrend>,
    pub roi: Option<MetricTrend>,
    /// Informational only; not scored
    pub cpc: Option<MetricTrend>,
    /// `max(date) - min(date)` in days
    pub age_days: i64,
    /// Number of observed periods (rows)
    pub periods: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub total_spend: f64,
    pub total_conversions: Option<u64>,
    pub total_revenue: Option<f64>,
}

impl TrendSummary {
    /// CTR change in percent (negative = declining).
    pub fn ctr_change_pct(&self) -> Option<f64> {
        self.ctr.as_ref().and_then(MetricTrend::change_pct)
    }

    /// CPA change in percent (positive = rising cost).
    pub fn cpa_change_pct(&self) -> Option<f64> {
        self.cpa.as_ref().and_then(MetricTrend::change_pct)
    }

    /// ROI change in percent (negative = declining return).
    pub fn roi_change_pct(&self) -> Option<f64> {
        self.roi.as_ref().and_then(MetricTrend::change_pct)
    }
}

/// One day of the rolling fatigue timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub spend: f64,
    /// FRI of the trailing rolling means against the campaign baseline
    pub fri: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_trend_relative_change() {
        let t = MetricTrend::new(10.0, 40.0);
        assert!((t.delta - 30.0).abs() < 1e-12);
        assert_eq!(t.relative_change, Some(3.0));
        assert_eq!(t.change_pct(), Some(300.0));
    }

    #[test]
    fn test_metric_trend_zero_baseline() {
        let t = MetricTrend::new(0.0, 5.0);
        assert_eq!(t.relative_change, None);
        assert!((t.delta - 5.0).abs() < 1e-12);
    }
}
