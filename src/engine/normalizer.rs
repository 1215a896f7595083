//! Metric Normalizer
//!
//! Resolves the column schema, validates every row, derives CTR/CPC/CPA/ROI
//! with safe division and groups the rows into per-campaign series held in a
//! single [`CampaignTable`] arena.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{CampaignError, MissingSignal, PartialDataWarning, ValidationError};
use crate::ingest::RawTable;
use crate::types::{CampaignMetricRow, CampaignSeries};

/// Columns every input must carry.
pub const REQUIRED_COLUMNS: [&str; 5] = ["date", "campaign_id", "impressions", "clicks", "spend"];

/// Columns used when present.
pub const OPTIONAL_COLUMNS: [&str; 6] = ["conversions", "ctr", "cpc", "cpa", "revenue", "roi"];

// ============================================================================
// Column Schema
// ============================================================================

/// Fixed mapping from logical column to cell index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSchema {
    width: usize,
    date: usize,
    campaign_id: usize,
    impressions: usize,
    clicks: usize,
    spend: usize,
    conversions: Option<usize>,
    ctr: Option<usize>,
    cpc: Option<usize>,
    cpa: Option<usize>,
    revenue: Option<usize>,
    roi: Option<usize>,
}

impl ColumnSchema {
    /// Map the table header, failing on the first missing required column.
    pub fn resolve(table: &RawTable) -> Result<Self, ValidationError> {
        let [date, campaign_id, impressions, clicks, spend] = REQUIRED_COLUMNS.map(|name| {
            table
                .column_index(name)
                .ok_or(ValidationError::MissingColumn(name))
        });
        let [conversions, ctr, cpc, cpa, revenue, roi] = OPTIONAL_COLUMNS.map(|name| table.column_index(name));
        Ok(Self {
            width: table.headers().len(),
            date: date?,
            campaign_id: campaign_id?,
            impressions: impressions?,
            clicks: clicks?,
            spend: spend?,
            conversions,
            ctr,
            cpc,
            cpa,
            revenue,
            roi,
        })
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            cpa: self.conversions.is_some() || self.cpa.is_some(),
            roi: self.revenue.is_some() || self.roi.is_some(),
        }
    }
}

/// Which scoring signals the supplied columns can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub cpa: bool,
    pub roi: bool,
}

impl Capabilities {
    pub fn missing(&self) -> Vec<MissingSignal> {
        let mut missing = Vec::new();
        if !self.cpa {
            missing.push(MissingSignal::Cpa);
        }
        if !self.roi {
            missing.push(MissingSignal::Roi);
        }
        missing
    }

    /// Partial analysis mode.
    pub fn is_degraded(&self) -> bool {
        !(self.cpa && self.roi)
    }

    pub fn warning(&self) -> Option<PartialDataWarning> {
        self.is_degraded().then(|| PartialDataWarning {
            missing: self.missing(),
        })
    }
}

// ============================================================================
// Validation Outcome
// ============================================================================

/// Result of `validate`.
///
/// `is_valid = true` with a message means partial analysis mode;
/// `is_valid = false` is fatal and the message names the problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub message: Option<String>,
}

impl ValidationOutcome {
    pub fn is_partial(&self) -> bool {
        self.is_valid && self.message.is_some()
    }
}

/// Check a table without building series.
pub fn validate(table: &RawTable) -> ValidationOutcome {
    match parse_rows(table) {
        Ok((schema, _)) => ValidationOutcome {
            is_valid: true,
            message: schema.capabilities().warning().map(|w| w.to_string()),
        },
        Err(e) => ValidationOutcome {
            is_valid: false,
            message: Some(e.to_string()),
        },
    }
}

// ============================================================================
// Campaign Table
// ============================================================================

/// Owned arena of all campaign series, indexed by campaign id.
#[derive(Debug, Clone)]
pub struct CampaignTable {
    series: Vec<CampaignSeries>,
    index: BTreeMap<String, usize>,
    capabilities: Capabilities,
    campaign_errors: Vec<CampaignError>,
    row_count: usize,
}

impl CampaignTable {
    pub fn get(&self, campaign_id: &str) -> Option<&CampaignSeries> {
        self.index.get(campaign_id).map(|&i| &self.series[i])
    }

    /// All series in campaign-id order.
    pub fn series(&self) -> &[CampaignSeries] {
        &self.series
    }

    pub fn campaign_ids(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Campaigns dropped because their series was malformed.
    pub fn campaign_errors(&self) -> &[CampaignError] {
        &self.campaign_errors
    }

    pub fn warning(&self) -> Option<PartialDataWarning> {
        self.capabilities.warning()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Validate, derive metrics, and group rows by campaign.
pub fn normalize(table: &RawTable) -> Result<CampaignTable, ValidationError> {
    let (schema, rows) = parse_rows(table)?;
    let row_count = rows.len();

    let mut grouped: BTreeMap<String, Vec<CampaignMetricRow>> = BTreeMap::new();
    for (campaign_id, row) in rows {
        grouped.entry(campaign_id).or_default().push(row);
    }

    let mut series = Vec::with_capacity(grouped.len());
    let mut index = BTreeMap::new();
    let mut campaign_errors = Vec::new();
    for (campaign_id, rows) in grouped {
        match CampaignSeries::new(campaign_id, rows) {
            Ok(s) => {
                index.insert(s.campaign_id().to_string(), series.len());
                series.push(s);
            }
            Err(e) => {
                warn!(campaign_id = %e.campaign_id(), error = %e, "Excluding malformed campaign");
                campaign_errors.push(e);
            }
        }
    }

    debug!(
        rows = row_count,
        campaigns = series.len(),
        excluded = campaign_errors.len(),
        "Normalized campaign table"
    );

    Ok(CampaignTable {
        series,
        index,
        capabilities: schema.capabilities(),
        campaign_errors,
        row_count,
    })
}

// ============================================================================
// Row Parsing
// ============================================================================

fn parse_rows(
    table: &RawTable,
) -> Result<(ColumnSchema, Vec<(String, CampaignMetricRow)>), ValidationError> {
    let schema = ColumnSchema::resolve(table)?;
    if table.is_empty() {
        return Err(ValidationError::EmptyInput);
    }

    let rows = table
        .rows()
        .iter()
        .enumerate()
        .map(|(i, cells)| parse_row(&schema, i + 1, cells))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((schema, rows))
}

fn parse_row(
    schema: &ColumnSchema,
    row: usize,
    cells: &[String],
) -> Result<(String, CampaignMetricRow), ValidationError> {
    if cells.len() != schema.width {
        return Err(ValidationError::RaggedRow {
            row,
            expected: schema.width,
            found: cells.len(),
        });
    }
    let cell = move |idx: usize| cells[idx].trim();
    let optional = move |idx: Option<usize>| idx.map(cell).filter(|s| !s.is_empty());

    let campaign_id = required_cell(row, "campaign_id", cell(schema.campaign_id))?;
    let date = parse_date(row, required_cell(row, "date", cell(schema.date))?)?;
    let impressions = parse_count(row, "impressions", required_cell(row, "impressions", cell(schema.impressions))?)?;
    let clicks = parse_count(row, "clicks", required_cell(row, "clicks", cell(schema.clicks))?)?;
    let spend = parse_amount(row, "spend", required_cell(row, "spend", cell(schema.spend))?)?;

    if clicks > impressions {
        return Err(ValidationError::ClicksExceedImpressions {
            row,
            clicks,
            impressions,
        });
    }

    let conversions = optional(schema.conversions)
        .map(|s| parse_count(row, "conversions", s))
        .transpose()?;
    let revenue = optional(schema.revenue)
        .map(|s| parse_amount(row, "revenue", s))
        .transpose()?;

    let metric = |idx: Option<usize>, column: &'static str| {
        optional(idx).map(|s| parse_amount(row, column, s)).transpose()
    };

    let parsed = CampaignMetricRow {
        date,
        impressions,
        clicks,
        spend,
        conversions,
        revenue,
        ctr: metric(schema.ctr, "ctr")?,
        cpc: metric(schema.cpc, "cpc")?,
        cpa: metric(schema.cpa, "cpa")?,
        roi: metric(schema.roi, "roi")?,
    }
    .with_derived_metrics();

    Ok((campaign_id.to_string(), parsed))
}

fn required_cell<'a>(row: usize, column: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    if value.is_empty() {
        Err(ValidationError::EmptyValue { row, column })
    } else {
        Ok(value)
    }
}

/// ISO 8601 date, or a datetime whose date part is used.
fn parse_date(row: usize, value: &str) -> Result<NaiveDate, ValidationError> {
    let invalid = || ValidationError::InvalidValue {
        row,
        column: "date",
        value: value.to_string(),
    };

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.date_naive());
    }
    let (head, rest) = (value.get(..10).ok_or_else(invalid)?, &value[10..]);
    if rest.starts_with('T') || rest.starts_with(' ') {
        return NaiveDate::parse_from_str(head, "%Y-%m-%d").map_err(|_| invalid());
    }
    Err(invalid())
}

fn parse_number(row: usize, column: &'static str, value: &str) -> Result<f64, ValidationError> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => {
            if v < 0.0 {
                Err(ValidationError::NegativeValue { row, column, value: v })
            } else {
                Ok(v)
            }
        }
        _ => Err(ValidationError::InvalidValue {
            row,
            column,
            value: value.to_string(),
        }),
    }
}

/// Non-negative monetary amount or ratio.
fn parse_amount(row: usize, column: &'static str, value: &str) -> Result<f64, ValidationError> {
    parse_number(row, column, value)
}

/// Non-negative whole number; `"1200.0"` is accepted.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_count(row: usize, column: &'static str, value: &str) -> Result<u64, ValidationError> {
    if let Ok(v) = value.parse::<u64>() {
        return Ok(v);
    }
    let v = parse_number(row, column, value)?;
    if v.fract() != 0.0 || v > u64::MAX as f64 {
        return Err(ValidationError::InvalidValue {
            row,
            column,
            value: value.to_string(),
        });
    }
    Ok(v as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "date,campaign_id,impressions,clicks,spend,conversions,revenue";

    fn table(body: &str) -> RawTable {
        RawTable::from_csv_str(&format!("{HEADER}\n{body}")).unwrap()
    }

    #[test]
    fn test_valid_table_full_mode() {
        let outcome = validate(&table("2024-01-01,C1,1000,50,100,5,300\n"));
        assert_eq!(
            outcome,
            ValidationOutcome {
                is_valid: true,
                message: None
            }
        );
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let raw = RawTable::from_csv_str("date,campaign_id,impressions,spend\n2024-01-01,C1,10,1\n").unwrap();
        assert_eq!(
            normalize(&raw).unwrap_err(),
            ValidationError::MissingColumn("clicks")
        );
        let outcome = validate(&raw);
        assert!(!outcome.is_valid);
        assert!(outcome.message.unwrap().contains("clicks"));
    }

    #[test]
    fn test_each_required_column_is_checked() {
        let full = table("2024-01-01,C1,1000,50,100,5,300\n");
        for name in REQUIRED_COLUMNS {
            let raw = full.without_columns(&[name]);
            assert_eq!(ColumnSchema::resolve(&raw).unwrap_err(), ValidationError::MissingColumn(name));
        }
    }

    #[test]
    fn test_optional_columns_drive_capabilities() {
        let full = table("2024-01-01,C1,1000,50,100,5,300\n");
        let caps = ColumnSchema::resolve(&full).unwrap().capabilities();
        assert!(!caps.is_degraded());

        let bare = full.without_columns(&OPTIONAL_COLUMNS);
        let caps = ColumnSchema::resolve(&bare).unwrap().capabilities();
        assert_eq!(caps.missing(), vec![MissingSignal::Cpa, MissingSignal::Roi]);
    }

    #[test]
    fn test_empty_input_is_fatal() {
        assert_eq!(normalize(&table("")).unwrap_err(), ValidationError::EmptyInput);
    }

    #[test]
    fn test_negative_impressions_is_fatal() {
        let err = normalize(&table("2024-01-01,C1,-5,0,10,,\n")).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::NegativeValue { row: 1, column: "impressions", .. }
        ));
    }

    #[test]
    fn test_clicks_exceed_impressions_is_fatal() {
        let err = normalize(&table("2024-01-01,C1,10,11,10,,\n")).unwrap_err();
        assert_eq!(
            err,
            ValidationError::ClicksExceedImpressions {
                row: 1,
                clicks: 11,
                impressions: 10
            }
        );
    }

    #[test]
    fn test_fractional_count_is_fatal() {
        let err = normalize(&table("2024-01-01,C1,10.5,1,10,,\n")).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { column: "impressions", .. }));
    }

    #[test]
    fn test_float_formatted_count_is_accepted() {
        let t = normalize(&table("2024-01-01,C1,1000.0,50.0,10,,\n")).unwrap();
        assert_eq!(t.get("C1").unwrap().rows()[0].impressions, 1000);
    }

    #[test]
    fn test_ragged_row_is_fatal() {
        let err = normalize(&table("2024-01-01,C1,10,1\n")).unwrap_err();
        assert!(matches!(err, ValidationError::RaggedRow { row: 1, expected: 7, found: 4 }));
    }

    #[test]
    fn test_bad_date_is_fatal() {
        let err = normalize(&table("01/02/2024,C1,10,1,10,,\n")).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { column: "date", .. }));
    }

    #[test]
    fn test_datetime_dates_are_accepted() {
        let t = normalize(&table(
            "2024-01-01T00:00:00,C1,10,1,10,,\n2024-01-02 12:30:00,C1,10,1,10,,\n2024-01-03T08:00:00Z,C1,10,1,10,,\n",
        ))
        .unwrap();
        assert_eq!(t.get("C1").unwrap().len(), 3);
    }

    #[test]
    fn test_missing_revenue_is_partial_mode() {
        let raw = table("2024-01-01,C1,1000,50,100,5,300\n").without_columns(&["revenue"]);
        let outcome = validate(&raw);
        assert!(outcome.is_valid);
        assert!(outcome.is_partial());
        assert!(outcome.message.unwrap().contains("revenue/roi"));
    }

    #[test]
    fn test_supplied_roi_column_keeps_full_mode() {
        let raw = RawTable::from_csv_str(
            "date,campaign_id,impressions,clicks,spend,cpa,roi\n2024-01-01,C1,1000,50,100,20,2.5\n",
        )
        .unwrap();
        let t = normalize(&raw).unwrap();
        assert!(!t.capabilities().is_degraded());
        let row = &t.get("C1").unwrap().rows()[0];
        assert_eq!(row.roi, Some(2.5));
        assert_eq!(row.cpa, Some(20.0));
    }

    #[test]
    fn test_derives_metrics() {
        let t = normalize(&table("2024-01-01,C1,1000,50,100,0,300\n")).unwrap();
        let row = &t.get("C1").unwrap().rows()[0];
        assert_eq!(row.ctr, Some(0.05));
        assert_eq!(row.cpc, Some(2.0));
        assert_eq!(row.cpa, None, "zero conversions leaves CPA undefined");
        assert_eq!(row.roi, Some(3.0));
    }

    #[test]
    fn test_groups_and_orders_campaigns() {
        let t = normalize(&table(
            "2024-01-02,B,10,1,10,,\n2024-01-01,A,10,1,10,,\n2024-01-01,B,10,1,10,,\n",
        ))
        .unwrap();
        assert_eq!(t.campaign_ids().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(t.get("B").unwrap().first_date(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(t.row_count(), 3);
    }

    #[test]
    fn test_duplicate_dates_isolate_one_campaign() {
        let t = normalize(&table(
            "2024-01-01,A,10,1,10,,\n2024-01-01,A,10,1,10,,\n2024-01-01,B,10,1,10,,\n",
        ))
        .unwrap();
        assert!(t.get("A").is_none());
        assert!(t.get("B").is_some());
        assert_eq!(t.campaign_errors().len(), 1);
        assert_eq!(t.campaign_errors()[0].campaign_id(), "A");
    }
}
