//! Recommendation Generator
//!
//! Rule table over (stage, dominant trend signal, campaign age). Every rule
//! produces action text with the campaign's actual values in the rationale
//! (e.g. "CTR has declined by 42.0% since campaign start").
//!
//! Output is stable-sorted by priority, highest first. At-risk stages always
//! receive at least one action.
//!
//! Healthy campaigns get Low-priority monitoring only. Rotation planning past
//! `healthy_refresh_age_days` or `rotation_age_days` counts as monitoring
//! here: it is Low priority and never a corrective action.

use crate::config::RecommendationConfig;
use crate::types::{FatigueStage, FriBreakdown, Priority, Recommendation, ScoringSignal, Trigger, TrendSummary};

/// Inputs the rules key off.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationContext<'a> {
    pub stage: FatigueStage,
    pub fri: f64,
    pub breakdown: &'a FriBreakdown,
    pub trend: &'a TrendSummary,
    /// Younger than the minimum classification age
    pub insufficient_history: bool,
}

/// Build the ordered recommendation list for one campaign.
pub fn generate(ctx: &RecommendationContext<'_>, config: &RecommendationConfig) -> Vec<Recommendation> {
    let mut recs = Vec::new();
    let age = ctx.trend.age_days;

    if ctx.insufficient_history {
        recs.push(Recommendation::new(
            "Collect additional campaign data",
            Priority::Low,
            format!(
                "Only {age} days of history; fatigue stage is held at Healthy until enough data accumulates"
            ),
            Trigger::InsufficientData,
        ));
    }

    if age > config.rotation_age_days {
        recs.push(Recommendation::new(
            "Implement a regular creative rotation schedule",
            if ctx.stage.is_at_risk() { Priority::Medium } else { Priority::Low },
            format!("Campaign has been running for {age} days which exceeds optimal creative lifespan"),
            Trigger::CampaignAge,
        ));
    }

    match ctx.stage {
        FatigueStage::Healthy => healthy_rules(ctx, config, &mut recs),
        FatigueStage::Friction => friction_rules(ctx, config, &mut recs),
        FatigueStage::Fatigue => fatigue_rules(ctx, config, &mut recs),
        FatigueStage::Failure => failure_rules(ctx, config, &mut recs),
    }

    if ctx.stage.is_at_risk() {
        if let Some(signal) = ctx.breakdown.dominant_signal() {
            recs.push(dominant_signal_action(signal, ctx));
        }
        if recs.is_empty() {
            recs.push(Recommendation::new(
                "Review campaign creative and targeting",
                stage_priority(ctx.stage),
                format!("{} stage detected with FRI score of {:.1}", ctx.stage, ctx.fri),
                Trigger::Stage,
            ));
        }
    }

    recs.sort_by(|a, b| b.priority.cmp(&a.priority));
    recs
}

/// Priority of stage-level actions.
pub fn stage_priority(stage: FatigueStage) -> Priority {
    match stage {
        FatigueStage::Healthy => Priority::Low,
        FatigueStage::Friction | FatigueStage::Fatigue => Priority::Medium,
        FatigueStage::Failure => Priority::High,
    }
}

// ============================================================================
// Stage Rules
// ============================================================================

fn healthy_rules(ctx: &RecommendationContext<'_>, config: &RecommendationConfig, recs: &mut Vec<Recommendation>) {
    recs.push(Recommendation::new(
        "Monitor performance weekly",
        Priority::Low,
        format!(
            "Campaign is performing well with FRI score of {:.1}; maintain oversight to catch early signs of fatigue",
            ctx.fri
        ),
        Trigger::Stage,
    ));

    let age = ctx.trend.age_days;
    if age > config.healthy_refresh_age_days {
        recs.push(Recommendation::new(
            "Plan next creative rotation within 7-14 days",
            Priority::Low,
            format!("Proactive refresh recommended for campaigns running {age} days"),
            Trigger::CampaignAge,
        ));
    }
}

fn friction_rules(ctx: &RecommendationContext<'_>, config: &RecommendationConfig, recs: &mut Vec<Recommendation>) {
    recs.push(Recommendation::new(
        "Plan creative refresh within 7 days",
        Priority::Medium,
        format!("Early signs of fatigue detected with FRI score of {:.1}", ctx.fri),
        Trigger::Stage,
    ));
    recs.push(Recommendation::new(
        "Review frequency caps and adjust if necessary",
        Priority::Low,
        "Reduce exposure to prevent further fatigue progression",
        Trigger::Stage,
    ));

    if let Some(change) = ctx.trend.ctr_change_pct() {
        if change < -config.ctr_decline_alert_pct {
            recs.push(Recommendation::new(
                "A/B test new messaging variants",
                Priority::Medium,
                format!("CTR has declined by {:.1}% since campaign start", change.abs()),
                Trigger::CtrDecline,
            ));
        }
    }

    if ctx.fri > config.close_monitoring_fri {
        recs.push(Recommendation::new(
            "Monitor performance every 2 days",
            Priority::Medium,
            format!("FRI score of {:.1} requires closer monitoring", ctx.fri),
            Trigger::Stage,
        ));
    } else {
        recs.push(Recommendation::new(
            "Monitor performance weekly",
            Priority::Low,
            "Standard monitoring for early-stage fatigue",
            Trigger::Stage,
        ));
    }
}

fn fatigue_rules(ctx: &RecommendationContext<'_>, config: &RecommendationConfig, recs: &mut Vec<Recommendation>) {
    recs.push(Recommendation::new(
        "Implement creative refresh immediately",
        Priority::Medium,
        format!("Significant fatigue detected with FRI score of {:.1}", ctx.fri),
        Trigger::Stage,
    ));

    let cap_reduction = frequency_cap_reduction(ctx.fri, config.max_frequency_cap_reduction_pct);
    recs.push(Recommendation::new(
        format!("Reduce frequency caps by {cap_reduction}%"),
        Priority::Medium,
        "Prevent audience overexposure to current creative",
        Trigger::Stage,
    ));

    if let Some(change) = ctx.trend.cpa_change_pct() {
        if change > config.cpa_increase_alert_pct {
            recs.push(Recommendation::new(
                "Refine audience targeting to higher-converting segments",
                Priority::Medium,
                if change.is_finite() {
                    format!("CPA has increased by {change:.1}% since campaign start")
                } else {
                    "Conversions stopped in the recent window while spend continued".to_string()
                },
                Trigger::CpaIncrease,
            ));
        }
    }

    recs.push(Recommendation::new(
        "Consider platform or format diversification",
        Priority::Low,
        "Reduce dependence on fatigued channels",
        Trigger::Stage,
    ));
    recs.push(Recommendation::new(
        "Monitor performance daily",
        Priority::Low,
        "Close monitoring required at fatigue stage",
        Trigger::Stage,
    ));
}

fn failure_rules(ctx: &RecommendationContext<'_>, config: &RecommendationConfig, recs: &mut Vec<Recommendation>) {
    recs.push(Recommendation::new(
        "Pause current creative execution",
        Priority::High,
        format!("Critical fatigue detected with FRI score of {:.1}", ctx.fri),
        Trigger::Stage,
    ));
    recs.push(Recommendation::new(
        "Complete creative overhaul required",
        Priority::High,
        "Minor refreshes are insufficient at failure stage",
        Trigger::Stage,
    ));

    let age = ctx.trend.age_days;
    if age > config.restructure_age_days {
        recs.push(Recommendation::new(
            "Consider campaign restructure with new objectives",
            Priority::High,
            format!("Campaign has been running for {age} days with declining results"),
            Trigger::CampaignAge,
        ));
    }

    if ctx.fri > config.budget_reallocation_fri {
        recs.push(Recommendation::new(
            "Reallocate at least 50% of budget to healthier campaigns",
            Priority::High,
            format!("Critical performance deterioration (FRI {:.1})", ctx.fri),
            Trigger::Stage,
        ));
    } else {
        recs.push(Recommendation::new(
            "Temporarily reduce budget by 30-40%",
            Priority::High,
            "Conserve budget while implementing fixes",
            Trigger::Stage,
        ));
    }

    recs.push(Recommendation::new(
        "Reassess targeting strategy and platform mix",
        Priority::Medium,
        "Current approach is experiencing significant fatigue",
        Trigger::Stage,
    ));
}

/// `min(max_pct, ⌊0.7 × FRI⌋)`
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn frequency_cap_reduction(fri: f64, max_pct: u32) -> u32 {
    let pct = (fri.clamp(0.0, 100.0) * 0.7).floor() as u32;
    pct.min(max_pct)
}

fn dominant_signal_action(signal: ScoringSignal, ctx: &RecommendationContext<'_>) -> Recommendation {
    let priority = stage_priority(ctx.stage);
    let change = |pct: Option<f64>| match pct {
        Some(p) if p.is_finite() => format!("{p:+.1}%"),
        Some(_) => "unbounded, no recent conversions".to_string(),
        None => "n/a".to_string(),
    };
    match signal {
        ScoringSignal::CtrDecay => Recommendation::new(
            "Rotate in new creative variants to recover click-through rate",
            priority,
            format!(
                "CTR decay is the largest FRI contributor (CTR change {})",
                change(ctx.trend.ctr_change_pct())
            ),
            signal.into(),
        ),
        ScoringSignal::CpaIncrease => Recommendation::new(
            "Tighten bidding and exclude low-converting placements",
            priority,
            format!(
                "CPA increase is the largest FRI contributor (CPA change {})",
                change(ctx.trend.cpa_change_pct())
            ),
            signal.into(),
        ),
        ScoringSignal::RoiDrop => Recommendation::new(
            "Shift spend toward higher-return audiences and placements",
            priority,
            format!(
                "ROI drop is the largest FRI contributor (ROI change {})",
                change(ctx.trend.roi_change_pct())
            ),
            signal.into(),
        ),
    }
}
