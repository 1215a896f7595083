//! Fatigue Scorer
//!
//! Combines the trend signals into the Fatigue Risk Index (0-100).
//!
//! # Scoring Algorithm
//!
//! Each available signal is normalized against its saturation point and
//! weighted:
//!
//! ```text
//! FRI = 100 × Σ wᵢ·clamp(sᵢ / satᵢ, 0, 1) / Σ wᵢ     (over available signals)
//! ```
//!
//! - Improving metrics (negative signals) contribute zero, never negative
//! - Unavailable signals drop out and their weight is redistributed
//!   proportionally over the rest
//! - An unbounded worsening (`+∞`, e.g. conversions stopped while spend
//!   continued) saturates at 1; NaN is unavailable
//! - No available signal yields 0

use crate::config::ScoringConfig;
use crate::types::{FatigueSignals, FriBreakdown, ScoringSignal, SignalContribution};

/// Score one set of signals.
pub fn score(signals: &FatigueSignals, config: &ScoringConfig) -> FriBreakdown {
    let inputs = [
        (
            ScoringSignal::CtrDecay,
            signals.ctr_decay,
            config.ctr_weight,
            config.ctr_decay_saturation,
        ),
        (
            ScoringSignal::CpaIncrease,
            signals.cpa_increase,
            config.cpa_weight,
            config.cpa_increase_saturation,
        ),
        (
            ScoringSignal::RoiDrop,
            signals.roi_drop,
            config.roi_weight,
            config.roi_drop_saturation,
        ),
    ];

    let mut unavailable = Vec::new();
    let mut available = Vec::with_capacity(inputs.len());
    for (signal, value, weight, saturation) in inputs {
        match value.filter(|v| !v.is_nan()) {
            Some(raw) => available.push((signal, raw, weight, saturation)),
            None => unavailable.push(signal),
        }
    }

    let total_weight: f64 = available.iter().map(|&(_, _, w, _)| w).sum();
    if !(total_weight.is_finite() && total_weight > 0.0) {
        return FriBreakdown {
            fri: 0.0,
            contributions: Vec::new(),
            unavailable,
        };
    }

    let contributions: Vec<SignalContribution> = available
        .into_iter()
        .map(|(signal, raw, weight, saturation)| {
            let normalized = normalize(raw, saturation);
            let effective_weight = weight / total_weight;
            SignalContribution {
                signal,
                raw,
                normalized,
                effective_weight,
                points: 100.0 * effective_weight * normalized,
            }
        })
        .collect();

    let fri: f64 = contributions.iter().map(|c| c.points).sum();
    FriBreakdown {
        fri: if fri.is_finite() { fri.clamp(0.0, 100.0) } else { 0.0 },
        contributions,
        unavailable,
    }
}

/// `clamp(raw / saturation, 0, 1)`, 0 for NaN.
fn normalize(raw: f64, saturation: f64) -> f64 {
    let ratio = raw / saturation;
    if ratio > 0.0 {
        ratio.min(1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(ctr: Option<f64>, cpa: Option<f64>, roi: Option<f64>) -> FatigueSignals {
        FatigueSignals {
            ctr_decay: ctr,
            cpa_increase: cpa,
            roi_drop: roi,
        }
    }

    #[test]
    fn test_flat_signals_score_zero() {
        let b = score(&signals(Some(0.0), Some(0.0), Some(0.0)), &ScoringConfig::default());
        assert_eq!(b.fri, 0.0);
        assert!(!b.is_partial());
    }

    #[test]
    fn test_saturated_signals_score_hundred() {
        let b = score(&signals(Some(0.9), Some(5.0), Some(0.8)), &ScoringConfig::default());
        assert!((b.fri - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_improving_metrics_contribute_zero() {
        let b = score(&signals(Some(-0.5), Some(-0.3), Some(-1.0)), &ScoringConfig::default());
        assert_eq!(b.fri, 0.0);
        assert!(b.contributions.iter().all(|c| c.points == 0.0));
        assert_eq!(b.dominant_signal(), None);
    }

    #[test]
    fn test_weighted_combination() {
        // CTR half-saturated (0.25 / 0.5), CPA fully saturated, ROI flat
        let b = score(&signals(Some(0.25), Some(1.0), Some(0.0)), &ScoringConfig::default());
        let expected = 100.0 * (0.40 * 0.5 + 0.30 * 1.0);
        assert!((b.fri - expected).abs() < 1e-9, "{}", b.fri);
        assert_eq!(b.dominant_signal(), Some(ScoringSignal::CpaIncrease));
    }

    #[test]
    fn test_missing_roi_redistributes_weight() {
        let config = ScoringConfig::default();
        let b = score(&signals(Some(0.5), Some(0.0), None), &config);
        assert_eq!(b.unavailable, vec![ScoringSignal::RoiDrop]);
        let ctr = &b.contributions[0];
        assert!((ctr.effective_weight - 0.4 / 0.7).abs() < 1e-12);
        assert!((b.fri - 100.0 * 0.4 / 0.7).abs() < 1e-9);
        let weight_sum: f64 = b.contributions.iter().map(|c| c.effective_weight).sum();
        assert!((weight_sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_signals_scores_zero() {
        let b = score(&FatigueSignals::default(), &ScoringConfig::default());
        assert_eq!(b.fri, 0.0);
        assert_eq!(b.unavailable.len(), 3);
    }

    #[test]
    fn test_nan_signal_is_unavailable() {
        let b = score(&signals(Some(f64::NAN), None, Some(0.25)), &ScoringConfig::default());
        assert_eq!(b.unavailable.len(), 2);
        assert!((b.fri - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_unbounded_cpa_increase_saturates() {
        let config = ScoringConfig::default();
        let b = score(&signals(Some(0.0), Some(f64::INFINITY), None), &config);
        assert_eq!(b.unavailable, vec![ScoringSignal::RoiDrop]);
        let cpa = b.contributions.iter().find(|c| c.signal == ScoringSignal::CpaIncrease).unwrap();
        assert_eq!(cpa.normalized, 1.0);
        assert!((b.fri - 100.0 * 0.3 / 0.7).abs() < 1e-9);

        let mild = score(&signals(Some(0.0), Some(0.2), None), &config);
        assert!(b.fri > mild.fri);
    }

    #[test]
    fn test_unbounded_improvement_contributes_zero() {
        let b = score(&signals(Some(f64::NEG_INFINITY), None, None), &ScoringConfig::default());
        assert_eq!(b.fri, 0.0);
    }

    #[test]
    fn test_monotonic_in_each_signal() {
        let config = ScoringConfig::default();
        let mut previous = 0.0;
        for step in 0..=20 {
            let s = f64::from(step) * 0.05;
            let fri = score(&signals(Some(s), Some(0.1), Some(0.1)), &config).fri;
            assert!(fri >= previous, "FRI decreased at ctr_decay={s}");
            assert!((0.0..=100.0).contains(&fri));
            previous = fri;
        }
    }
}
