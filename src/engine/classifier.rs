//! Stage Classifier
//!
//! Maps an FRI onto the four fatigue stages using closed-open bands:
//!
//! | FRI          | Stage    |
//! |--------------|----------|
//! | `< T1`       | Healthy  |
//! | `[T1, T2)`   | Friction |
//! | `[T2, T3)`   | Fatigue  |
//! | `>= T3`      | Failure  |
//!
//! A campaign younger than the minimum age is always Healthy.

use crate::config::StageConfig;
use crate::types::FatigueStage;

/// Stage decision for one campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub stage: FatigueStage,
    /// The age guard overrode an FRI-based stage
    pub age_guarded: bool,
}

/// Stage from FRI alone.
pub fn stage_for_fri(fri: f64, config: &StageConfig) -> FatigueStage {
    if fri >= config.failure_threshold {
        FatigueStage::Failure
    } else if fri >= config.fatigue_threshold {
        FatigueStage::Fatigue
    } else if fri >= config.friction_threshold {
        FatigueStage::Friction
    } else {
        FatigueStage::Healthy
    }
}

/// Stage with the insufficient-history guard applied.
pub fn classify(fri: f64, age_days: i64, config: &StageConfig) -> Classification {
    if age_days < config.min_age_days {
        return Classification {
            stage: FatigueStage::Healthy,
            age_guarded: stage_for_fri(fri, config).is_at_risk(),
        };
    }
    Classification {
        stage: stage_for_fri(fri, config),
        age_guarded: false,
    }
}
