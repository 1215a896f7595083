//! Trend Extractor
//!
//! Per-campaign trend features from a date-ordered series:
//!
//! - **Window comparison**: mean of the earliest third of the series against
//!   the mean of the most recent third (first-to-last below three periods)
//! - **Timeline**: trailing rolling means scored against the leading
//!   baseline, one FRI per observed day
//!
//! Only rows where a metric is defined contribute to its means; a window with
//! no defined value leaves that metric's trend unavailable.
//!
//! CPA is the exception: a window's CPA is its total spend over its total
//! conversions. A late window that kept spending with zero conversions has an
//! unbounded CPA and saturates the signal instead of dropping it.

use statrs::statistics::Statistics;

use crate::config::{ScoringConfig, TrendConfig};
use crate::types::{
    safe_div, CampaignMetricRow, CampaignSeries, FatigueSignals, MetricTrend, TimelinePoint, TrendSummary,
};

use super::scoring;

type MetricFn = fn(&CampaignMetricRow) -> Option<f64>;

fn ctr(r: &CampaignMetricRow) -> Option<f64> {
    r.ctr
}
fn cpc(r: &CampaignMetricRow) -> Option<f64> {
    r.cpc
}
fn cpa(r: &CampaignMetricRow) -> Option<f64> {
    r.cpa
}
fn roi(r: &CampaignMetricRow) -> Option<f64> {
    r.roi
}

/// Mean of the defined values, `None` when there are none.
fn defined_mean(rows: &[CampaignMetricRow], metric: MetricFn) -> Option<f64> {
    let values: Vec<f64> = rows.iter().filter_map(metric).filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().mean())
    }
}

fn window_trend(early: &[CampaignMetricRow], late: &[CampaignMetricRow], metric: MetricFn) -> Option<MetricTrend> {
    Some(MetricTrend::new(defined_mean(early, metric)?, defined_mean(late, metric)?))
}

/// Σspend / Σconversions over the rows that report conversions.
///
/// Falls back to the mean of supplied CPA values when no row reports
/// conversions. `+∞` when spend continued with zero conversions.
#[allow(clippy::cast_precision_loss)]
fn window_cpa(rows: &[CampaignMetricRow]) -> Option<f64> {
    let counted: Vec<(f64, u64)> = rows
        .iter()
        .filter_map(|r| r.conversions.map(|c| (r.spend, c)))
        .collect();
    if counted.is_empty() {
        return defined_mean(rows, cpa);
    }
    let spend: f64 = counted.iter().map(|&(s, _)| s).sum();
    let conversions = counted.iter().fold(0u64, |acc, &(_, c)| acc.saturating_add(c));
    if conversions == 0 && spend > 0.0 {
        Some(f64::INFINITY)
    } else {
        safe_div(spend, conversions as f64)
    }
}

/// CPA trend; unavailable only when the early window has no finite CPA.
fn cpa_trend(early: Option<f64>, late: Option<f64>) -> Option<MetricTrend> {
    Some(MetricTrend::new(early.filter(|v| v.is_finite())?, late?))
}

/// Early and late comparison windows.
///
/// `k = n / 3` rows each; below three rows the first and last row.
fn comparison_windows(rows: &[CampaignMetricRow]) -> (&[CampaignMetricRow], &[CampaignMetricRow]) {
    let n = rows.len();
    let k = if n >= 3 { n / 3 } else { 1.min(n) };
    (&rows[..k], &rows[n - k..])
}

// ============================================================================
// Extraction
// ============================================================================

/// Summarize a campaign's trends.
pub fn extract(series: &CampaignSeries) -> TrendSummary {
    let rows = series.rows();
    let (early, late) = comparison_windows(rows);

    let total_conversions = rows
        .iter()
        .filter_map(|r| r.conversions)
        .fold(None, |acc: Option<u64>, c| Some(acc.unwrap_or(0).saturating_add(c)));
    let total_revenue = rows
        .iter()
        .filter_map(|r| r.revenue)
        .fold(None, |acc: Option<f64>, r| Some(acc.unwrap_or(0.0) + r));

    TrendSummary {
        ctr: window_trend(early, late, ctr),
        cpa: cpa_trend(window_cpa(early), window_cpa(late)),
        roi: window_trend(early, late, roi),
        cpc: window_trend(early, late, cpc),
        age_days: series.age_days(),
        periods: rows.len(),
        first_date: series.first_date(),
        last_date: series.last_date(),
        total_spend: series.total_spend(),
        total_conversions,
        total_revenue,
    }
}

/// Convert metric trends into fatigue-direction signals (positive = worse).
pub fn signals_from(
    ctr: Option<&MetricTrend>,
    cpa: Option<&MetricTrend>,
    roi: Option<&MetricTrend>,
) -> FatigueSignals {
    FatigueSignals {
        ctr_decay: ctr.and_then(|t| t.relative_change).map(|r| -r),
        cpa_increase: cpa.and_then(|t| t.relative_change),
        roi_drop: roi.and_then(|t| t.relative_change).map(|r| -r),
    }
}

/// Scoring signals of a trend summary.
pub fn signals(summary: &TrendSummary) -> FatigueSignals {
    signals_from(summary.ctr.as_ref(), summary.cpa.as_ref(), summary.roi.as_ref())
}

// ============================================================================
// Timeline
// ============================================================================

/// Daily FRI from trailing rolling means against the leading baseline.
///
/// The rolling window needs only one observed row, so every day is scored.
pub fn timeline(series: &CampaignSeries, trend: &TrendConfig, scoring_config: &ScoringConfig) -> Vec<TimelinePoint> {
    let rows = series.rows();
    let baseline_rows = &rows[..trend.baseline_periods.min(rows.len())];
    let baseline = |metric: MetricFn| defined_mean(baseline_rows, metric);
    let (ctr_base, cpa_base, roi_base) = (baseline(ctr), window_cpa(baseline_rows), baseline(roi));

    let window = trend.rolling_window.max(1);
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let trailing = &rows[(i + 1).saturating_sub(window)..=i];
            let versus = |base: Option<f64>, metric: MetricFn| {
                Some(MetricTrend::new(base?, defined_mean(trailing, metric)?))
            };
            let day_signals = signals_from(
                versus(ctr_base, ctr).as_ref(),
                cpa_trend(cpa_base, window_cpa(trailing)).as_ref(),
                versus(roi_base, roi).as_ref(),
            );
            TimelinePoint {
                date: row.date,
                spend: row.spend,
                fri: scoring::score(&day_signals, scoring_config).fri,
            }
        })
        .collect()
}
