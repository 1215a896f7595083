//! Shared data structures for the fatigue pipeline
//!
//! - `CampaignMetricRow`, `CampaignSeries`: normalized input
//! - `TrendSummary`, `MetricTrend`, `TimelinePoint`: trend extractor output
//! - `FatigueResult` and its parts: scorer, classifier, waste and recommendation output

mod metrics;
mod trend;
mod fatigue;

pub use metrics::*;
pub use trend::*;
pub use fatigue::*;
