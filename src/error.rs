//! Error taxonomy for the engine.
//!
//! - [`ValidationError`]: fatal, the whole table is rejected
//! - [`PartialDataWarning`]: optional columns missing, processing continues
//! - [`CampaignError`]: one campaign excluded, the run continues

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Fatal input problems. Processing halts and nothing is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Input table has no data rows")]
    EmptyInput,

    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("Row {row}: expected {expected} cells, found {found}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Row {row}: required value '{column}' is empty")]
    EmptyValue { row: usize, column: &'static str },

    #[error("Row {row}: invalid {column} value '{value}'")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("Row {row}: {column} cannot be negative (got {value})")]
    NegativeValue {
        row: usize,
        column: &'static str,
        value: f64,
    },

    #[error("Row {row}: clicks ({clicks}) exceed impressions ({impressions})")]
    ClicksExceedImpressions {
        row: usize,
        clicks: u64,
        impressions: u64,
    },
}

/// Raised for a single malformed campaign series.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CampaignError {
    #[error("Campaign '{campaign_id}' has more than one row dated {date}")]
    DuplicateDate {
        campaign_id: String,
        date: NaiveDate,
    },

    #[error("Campaign '{campaign_id}' has no rows")]
    EmptySeries { campaign_id: String },
}

impl CampaignError {
    pub fn campaign_id(&self) -> &str {
        match self {
            Self::DuplicateDate { campaign_id, .. } | Self::EmptySeries { campaign_id } => {
                campaign_id
            }
        }
    }
}

/// Scoring signals that cannot be computed from the supplied columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MissingSignal {
    /// Neither `conversions` nor `cpa` supplied
    Cpa,
    /// Neither `revenue` nor `roi` supplied
    Roi,
}

impl MissingSignal {
    fn columns(self) -> &'static str {
        match self {
            Self::Cpa => "conversions/cpa",
            Self::Roi => "revenue/roi",
        }
    }
}

/// Non-fatal warning: analysis continues on the signals that remain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialDataWarning {
    pub missing: Vec<MissingSignal>,
}

impl std::fmt::Display for PartialDataWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let columns: Vec<&str> = self.missing.iter().map(|m| m.columns()).collect();
        write!(
            f,
            "Partial analysis mode: missing optional columns ({}); \
             fatigue scoring uses the remaining signals only",
            columns.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_warning_message_names_columns() {
        let warning = PartialDataWarning {
            missing: vec![MissingSignal::Roi],
        };
        let message = warning.to_string();
        assert!(message.starts_with("Partial analysis mode"));
        assert!(message.contains("revenue/roi"));
        assert!(!message.contains("conversions"));
    }

    #[test]
    fn test_campaign_error_exposes_id() {
        let err = CampaignError::DuplicateDate {
            campaign_id: "C9".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        };
        assert_eq!(err.campaign_id(), "C9");
        assert!(err.to_string().contains("2024-03-01"));
    }
}
