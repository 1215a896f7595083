//! Fatigue result types: stages, risk levels, FRI breakdown, waste, recommendations.

use serde::{Deserialize, Serialize};

use super::{TimelinePoint, TrendSummary};

// ============================================================================
// Stage & Risk
// ============================================================================

/// Fatigue stage, ascending severity. Evaluated fresh on every run.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub enum FatigueStage {
    #[default]
    Healthy,
    /// Early wear, minor CTR drop
    Friction,
    /// Engagement stagnation, rising CPA
    Fatigue,
    /// Sharp return decline, delivery continues with little effect
    Failure,
}

impl FatigueStage {
    pub const ALL: [Self; 4] = [Self::Healthy, Self::Friction, Self::Fatigue, Self::Failure];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Healthy => "Healthy",
            Self::Friction => "Friction",
            Self::Fatigue => "Fatigue",
            Self::Failure => "Failure",
        }
    }

    pub fn is_at_risk(&self) -> bool {
        !matches!(self, Self::Healthy)
    }
}

impl std::fmt::Display for FatigueStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Five-level risk label shown next to the FRI.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// ≥85 Critical, ≥60 High, ≥30 Medium, ≥10 Low, else Minimal.
    pub fn from_fri(fri: f64) -> Self {
        if fri >= 85.0 {
            Self::Critical
        } else if fri >= 60.0 {
            Self::High
        } else if fri >= 30.0 {
            Self::Medium
        } else if fri >= 10.0 {
            Self::Low
        } else {
            Self::Minimal
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Minimal => "Minimal",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        };
        write!(f, "{s}")
    }
}

// ============================================================================
// FRI Breakdown
// ============================================================================

/// Trend signals feeding the FRI.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ScoringSignal {
    CtrDecay,
    CpaIncrease,
    RoiDrop,
}

impl std::fmt::Display for ScoringSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CtrDecay => write!(f, "CTR decay"),
            Self::CpaIncrease => write!(f, "CPA increase"),
            Self::RoiDrop => write!(f, "ROI drop"),
        }
    }
}

/// Raw fatigue-direction signals (fractions, positive = worse).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FatigueSignals {
    pub ctr_decay: Option<f64>,
    pub cpa_increase: Option<f64>,
    pub roi_drop: Option<f64>,
}

/// One signal's share of the FRI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalContribution {
    pub signal: ScoringSignal,
    /// Raw signal value (fraction)
    pub raw: f64,
    /// `clamp(raw / saturation, 0, 1)`
    pub normalized: f64,
    /// Weight after redistribution over available signals
    pub effective_weight: f64,
    /// FRI points from this signal
    pub points: f64,
}

/// How the FRI was assembled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FriBreakdown {
    pub fri: f64,
    pub contributions: Vec<SignalContribution>,
    /// Signals that could not be computed; their weight was redistributed
    pub unavailable: Vec<ScoringSignal>,
}

impl FriBreakdown {
    /// Signal with the largest positive contribution.
    pub fn dominant_signal(&self) -> Option<ScoringSignal> {
        self.contributions
            .iter()
            .filter(|c| c.points > 0.0)
            .max_by(|a, b| a.points.total_cmp(&b.points))
            .map(|c| c.signal)
    }

    pub fn is_partial(&self) -> bool {
        !self.unavailable.is_empty()
    }
}

// ============================================================================
// Waste
// ============================================================================

/// Estimated spend lost to fatigue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WasteEstimate {
    pub total_spend: f64,
    /// Spend delivered while fatigue was present
    pub affected_spend: f64,
    /// Share of affected spend counted as wasted (0-1)
    pub waste_fraction: f64,
    /// Always ≤ `total_spend`
    pub wasted_spend: f64,
    /// Spend recoverable by acting on the recommendations
    pub recoverable_spend: f64,
}

impl WasteEstimate {
    /// Wasted spend as a percentage of total spend.
    pub fn waste_percentage(&self) -> f64 {
        if self.total_spend > 0.0 {
            self.wasted_spend / self.total_spend * 100.0
        } else {
            0.0
        }
    }
}

// ============================================================================
// Recommendations
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

/// What caused a recommendation to be emitted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// The stage itself
    Stage,
    CtrDecline,
    CpaIncrease,
    RoiDecline,
    CampaignAge,
    /// Age guard held the campaign at Healthy
    InsufficientData,
}

impl From<ScoringSignal> for Trigger {
    fn from(signal: ScoringSignal) -> Self {
        match signal {
            ScoringSignal::CtrDecay => Self::CtrDecline,
            ScoringSignal::CpaIncrease => Self::CpaIncrease,
            ScoringSignal::RoiDrop => Self::RoiDecline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: String,
    pub priority: Priority,
    pub rationale: String,
    pub trigger: Trigger,
}

impl Recommendation {
    pub fn new(
        action: impl Into<String>,
        priority: Priority,
        rationale: impl Into<String>,
        trigger: Trigger,
    ) -> Self {
        Self {
            action: action.into(),
            priority,
            rationale: rationale.into(),
            trigger,
        }
    }
}

// ============================================================================
// FatigueResult
// ============================================================================

/// Engine output for one campaign. Consumers read it, never mutate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigueResult {
    pub campaign_id: String,
    /// Fatigue Risk Index, 0-100
    pub fri: f64,
    pub stage: FatigueStage,
    pub risk_level: RiskLevel,
    /// Held at Healthy because the campaign is younger than the minimum age
    pub age_guarded: bool,
    pub breakdown: FriBreakdown,
    pub trend: TrendSummary,
    pub timeline: Vec<TimelinePoint>,
    pub waste: WasteEstimate,
    /// Priority-descending
    pub recommendations: Vec<Recommendation>,
}

impl FatigueResult {
    pub fn wasted_spend(&self) -> f64 {
        self.waste.wasted_spend
    }

    pub fn total_spend(&self) -> f64 {
        self.waste.total_spend
    }

    pub fn dominant_signal(&self) -> Option<ScoringSignal> {
        self.breakdown.dominant_signal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ordering() {
        assert!(FatigueStage::Healthy < FatigueStage::Friction);
        assert!(FatigueStage::Fatigue < FatigueStage::Failure);
        assert!(!FatigueStage::Healthy.is_at_risk());
        assert!(FatigueStage::Friction.is_at_risk());
    }

    #[test]
    fn test_risk_level_bands() {
        assert_eq!(RiskLevel::from_fri(0.0), RiskLevel::Minimal);
        assert_eq!(RiskLevel::from_fri(10.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_fri(30.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_fri(60.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_fri(85.0), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_fri(84.9), RiskLevel::High);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }

    #[test]
    fn test_dominant_signal_ignores_zero_points() {
        let breakdown = FriBreakdown {
            fri: 0.0,
            contributions: vec![SignalContribution {
                signal: ScoringSignal::CtrDecay,
                raw: -0.1,
                normalized: 0.0,
                effective_weight: 1.0,
                points: 0.0,
            }],
            unavailable: vec![],
        };
        assert_eq!(breakdown.dominant_signal(), None);
    }

    #[test]
    fn test_waste_percentage() {
        let waste = WasteEstimate {
            total_spend: 200.0,
            wasted_spend: 50.0,
            ..Default::default()
        };
        assert!((waste.waste_percentage() - 25.0).abs() < 1e-12);
        assert_eq!(WasteEstimate::default().waste_percentage(), 0.0);
    }
}
