//! CSV loader and date normalizer.
//!
//! Reads the visit file, checks the required header, parses every
//! `Visit_Date` into a calendar date and derives the visit month. Any
//! failure is fatal: there is no partial-table fallback.

use crate::{
    error::{DashError, DashResult},
    table::{OptionalColumns, VisitRecord, VisitTable, REQUIRED_COLUMNS},
    types::YearMonth,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::io::Read;
use std::path::Path;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M",
];

/// Cell values read as missing in optional columns.
const MISSING_TOKENS: [&str; 12] = [
    "", "NA", "N/A", "n/a", "#N/A", "NaN", "nan", "-NaN", "null", "NULL", "None", "<NA>",
];

/// A row exactly as it appears in the file, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawVisitRow {
    #[serde(rename = "Customer_ID")]
    pub customer_id: String,
    #[serde(rename = "Visit_Date")]
    pub visit_date: String,
    #[serde(rename = "Days_Since_Last_Visit")]
    pub days_since_last_visit: f64,
    #[serde(rename = "Total_Spend")]
    pub total_spend: f64,
    #[serde(rename = "Product_Category")]
    pub product_category: String,
    #[serde(rename = "Product_Satisfaction")]
    pub product_satisfaction: f64,
    #[serde(rename = "Conversion_Rate", default, deserialize_with = "optional_number")]
    pub conversion_rate: Option<f64>,
    #[serde(rename = "Bounce_Rate", default, deserialize_with = "optional_number")]
    pub bounce_rate: Option<f64>,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "City_Type", default, deserialize_with = "optional_text")]
    pub city_type: Option<String>,
    #[serde(rename = "Num_Items", default, deserialize_with = "optional_number")]
    pub num_items: Option<f64>,
}

/// Whether `cell` holds one of the missing-value markers.
pub fn is_missing(cell: &str) -> bool {
    MISSING_TOKENS.contains(&cell.trim())
}

fn optional_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        Some(cell) if !is_missing(&cell) => cell
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid number '{cell}'"))),
        _ => Ok(None),
    }
}

fn optional_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.filter(|cell| !is_missing(cell)))
}

impl RawVisitRow {
    fn normalize(self, line: u64) -> DashResult<VisitRecord> {
        let visit_date = parse_visit_date(&self.visit_date).ok_or_else(|| DashError::MalformedRow {
            line,
            reason: format!("unparseable Visit_Date '{}'", self.visit_date),
        })?;

        Ok(VisitRecord {
            customer_id:           self.customer_id,
            visit_date,
            visit_month:           YearMonth::of(visit_date),
            days_since_last_visit: self.days_since_last_visit,
            total_spend:           self.total_spend,
            product_category:      self.product_category,
            product_satisfaction:  self.product_satisfaction,
            conversion_rate:       self.conversion_rate,
            bounce_rate:           self.bounce_rate,
            city:                  self.city,
            city_type:             self.city_type,
            num_items:             self.num_items,
        })
    }
}

/// Parse a visit timestamp down to its calendar date.
pub fn parse_visit_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Load the visit table from a file path.
pub fn load_path(path: impl AsRef<Path>) -> DashResult<VisitTable> {
    let path = path.as_ref();
    let source = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|e| DashError::DataUnavailable {
        path: source.clone(),
        reason: e.to_string(),
    })?;
    load_reader(file, &source)
}

/// Load the visit table from any reader. `source` names it in errors.
pub fn load_reader<R: Read>(reader: R, source: &str) -> DashResult<VisitTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    if let Some(missing) = REQUIRED_COLUMNS
        .iter()
        .find(|col| !headers.iter().any(|h| h == **col))
    {
        return Err(DashError::DataUnavailable {
            path: source.to_string(),
            reason: format!("missing required column '{missing}'"),
        });
    }
    let columns = OptionalColumns::from_headers(headers.iter());

    let mut records = Vec::new();
    for (idx, result) in csv_reader.deserialize::<RawVisitRow>().enumerate() {
        let line = idx as u64 + 2;
        let raw = result.map_err(|e| DashError::MalformedRow { line, reason: e.to_string() })?;
        records.push(raw.normalize(line)?);
    }

    log::info!(
        "loaded {} visit rows from {source} (conversion={} bounce={} city_type={} items={})",
        records.len(),
        columns.conversion_rate,
        columns.bounce_rate,
        columns.city_type,
        columns.num_items,
    );

    Ok(VisitTable::new(records, columns))
}
