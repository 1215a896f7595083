//! FLARE: Fatigue Learning and Adaptive Response Engine
//!
//! Scores digital-advertising campaigns for ad fatigue from a daily metric
//! table, classifies each campaign into a fatigue stage, estimates wasted
//! spend, and emits prioritized actions.
//!
//! ## Architecture
//!
//! - **Normalizer**: column resolution, row validation, derived CTR/CPC/CPA/ROI
//! - **Trend Extractor**: early-vs-late window trends and a daily FRI timeline
//! - **Fatigue Scorer**: weighted, saturating Fatigue Risk Index (0-100)
//! - **Stage Classifier**: Healthy / Friction / Fatigue / Failure bands
//! - **Waste Estimator**: spend attributed to fatigue
//! - **Recommendation Generator**: rule table keyed by stage, signal and age
//!
//! ## Usage
//!
//! ```ignore
//! let table = flare::RawTable::from_csv_file(Path::new("campaigns.csv"))?;
//! let outcome = flare::validate(&table);
//! let report = flare::process(&table)?;
//! for rec in report.recommendations() {
//!     println!("[{}] {}: {}", rec.priority(), rec.campaign_id, rec.recommendation.action);
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod report;
pub mod types;

pub use config::FlareConfig;
pub use engine::{FlareEngine, ValidationOutcome};
pub use error::{CampaignError, PartialDataWarning, ValidationError};
pub use ingest::{IngestError, RawTable};
pub use report::{CampaignRecommendation, FatigueReport, OverviewSummary};
pub use types::{
    FatigueResult, FatigueStage, Priority, Recommendation, RiskLevel, ScoringSignal, TrendSummary,
    WasteEstimate,
};

/// Validate a table with the built-in calibration.
pub fn validate(table: &RawTable) -> ValidationOutcome {
    FlareEngine::default().validate(table)
}

/// Run the full pipeline with the built-in calibration.
pub fn process(table: &RawTable) -> Result<FatigueReport, ValidationError> {
    FlareEngine::default().process(table)
}
