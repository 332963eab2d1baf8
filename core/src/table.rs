//! The in-memory visit table.
//!
//! One `VisitRecord` per row of the source file, with the visit date already
//! parsed and the visit month derived. The table also remembers which
//! optional columns its source carried, so charts that depend on them can be
//! skipped by a column-existence check rather than per-row guessing.

use crate::types::{CustomerId, YearMonth};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ── Column names ─────────────────────────────────────────────────────────────

pub const CUSTOMER_ID: &str = "Customer_ID";
pub const VISIT_DATE: &str = "Visit_Date";
pub const DAYS_SINCE_LAST_VISIT: &str = "Days_Since_Last_Visit";
pub const TOTAL_SPEND: &str = "Total_Spend";
pub const PRODUCT_CATEGORY: &str = "Product_Category";
pub const PRODUCT_SATISFACTION: &str = "Product_Satisfaction";
pub const CONVERSION_RATE: &str = "Conversion_Rate";
pub const BOUNCE_RATE: &str = "Bounce_Rate";
pub const CITY: &str = "City";
pub const CITY_TYPE: &str = "City_Type";
pub const NUM_ITEMS: &str = "Num_Items";
/// Derived column: the visit date truncated to `YYYY-MM`.
pub const VISIT_MONTH: &str = "Visit_Month";

/// Columns every input file must carry.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    CUSTOMER_ID,
    VISIT_DATE,
    DAYS_SINCE_LAST_VISIT,
    TOTAL_SPEND,
    PRODUCT_CATEGORY,
    PRODUCT_SATISFACTION,
    CITY,
];

// ── Record ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitRecord {
    pub customer_id:           CustomerId,
    pub visit_date:            NaiveDate,
    pub visit_month:           YearMonth,
    pub days_since_last_visit: f64,
    pub total_spend:           f64,
    pub product_category:      String,
    pub product_satisfaction:  f64,
    pub conversion_rate:       Option<f64>,
    pub bounce_rate:           Option<f64>,
    pub city:                  String,
    pub city_type:             Option<String>,
    pub num_items:             Option<f64>,
}

impl VisitRecord {
    pub fn value(&self, column: NumericColumn) -> Option<f64> {
        match column {
            NumericColumn::TotalSpend          => Some(self.total_spend),
            NumericColumn::ProductSatisfaction => Some(self.product_satisfaction),
            NumericColumn::DaysSinceLastVisit  => Some(self.days_since_last_visit),
            NumericColumn::ConversionRate      => self.conversion_rate,
            NumericColumn::BounceRate          => self.bounce_rate,
            NumericColumn::NumItems            => self.num_items,
        }
    }

    pub fn value_mut(&mut self, column: NumericColumn) -> Option<&mut f64> {
        match column {
            NumericColumn::TotalSpend          => Some(&mut self.total_spend),
            NumericColumn::ProductSatisfaction => Some(&mut self.product_satisfaction),
            NumericColumn::DaysSinceLastVisit  => Some(&mut self.days_since_last_visit),
            NumericColumn::ConversionRate      => self.conversion_rate.as_mut(),
            NumericColumn::BounceRate          => self.bounce_rate.as_mut(),
            NumericColumn::NumItems            => self.num_items.as_mut(),
        }
    }

    pub fn key(&self, key: GroupKey) -> Option<String> {
        match key {
            GroupKey::ProductCategory => Some(self.product_category.clone()),
            GroupKey::City            => Some(self.city.clone()),
            GroupKey::CityType        => self.city_type.clone(),
            GroupKey::VisitMonth      => Some(self.visit_month.to_string()),
        }
    }
}

// ── Column descriptors ───────────────────────────────────────────────────────

/// Numeric columns that can be clipped, grouped or summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NumericColumn {
    #[serde(rename = "Total_Spend")]
    TotalSpend,
    #[serde(rename = "Conversion_Rate")]
    ConversionRate,
    #[serde(rename = "Bounce_Rate")]
    BounceRate,
    #[serde(rename = "Product_Satisfaction")]
    ProductSatisfaction,
    #[serde(rename = "Days_Since_Last_Visit")]
    DaysSinceLastVisit,
    #[serde(rename = "Num_Items")]
    NumItems,
}

impl NumericColumn {
    pub fn header(self) -> &'static str {
        match self {
            Self::TotalSpend          => TOTAL_SPEND,
            Self::ConversionRate      => CONVERSION_RATE,
            Self::BounceRate          => BOUNCE_RATE,
            Self::ProductSatisfaction => PRODUCT_SATISFACTION,
            Self::DaysSinceLastVisit  => DAYS_SINCE_LAST_VISIT,
            Self::NumItems            => NUM_ITEMS,
        }
    }
}

/// One-key grouping dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupKey {
    #[serde(rename = "Product_Category")]
    ProductCategory,
    #[serde(rename = "City")]
    City,
    #[serde(rename = "City_Type")]
    CityType,
    #[serde(rename = "Visit_Month")]
    VisitMonth,
}

impl GroupKey {
    pub fn header(self) -> &'static str {
        match self {
            Self::ProductCategory => PRODUCT_CATEGORY,
            Self::City            => CITY,
            Self::CityType        => CITY_TYPE,
            Self::VisitMonth      => VISIT_MONTH,
        }
    }
}

/// Which optional columns the source header carried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionalColumns {
    pub conversion_rate: bool,
    pub bounce_rate:     bool,
    pub city_type:       bool,
    pub num_items:       bool,
}

impl OptionalColumns {
    pub fn all() -> Self {
        Self { conversion_rate: true, bounce_rate: true, city_type: true, num_items: true }
    }

    pub fn from_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let mut columns = Self::default();
        for header in headers {
            match header {
                CONVERSION_RATE => columns.conversion_rate = true,
                BOUNCE_RATE     => columns.bounce_rate = true,
                CITY_TYPE       => columns.city_type = true,
                NUM_ITEMS       => columns.num_items = true,
                _ => {}
            }
        }
        columns
    }
}

// ── Table ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub struct VisitTable {
    records: Vec<VisitRecord>,
    columns: OptionalColumns,
}

impl VisitTable {
    pub fn new(records: Vec<VisitRecord>, columns: OptionalColumns) -> Self {
        Self { records, columns }
    }

    pub fn records(&self) -> &[VisitRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [VisitRecord] {
        &mut self.records
    }

    pub fn columns(&self) -> OptionalColumns {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_numeric(&self, column: NumericColumn) -> bool {
        match column {
            NumericColumn::ConversionRate => self.columns.conversion_rate,
            NumericColumn::BounceRate     => self.columns.bounce_rate,
            NumericColumn::NumItems       => self.columns.num_items,
            NumericColumn::TotalSpend
            | NumericColumn::ProductSatisfaction
            | NumericColumn::DaysSinceLastVisit => true,
        }
    }

    pub fn has_key(&self, key: GroupKey) -> bool {
        match key {
            GroupKey::CityType => self.columns.city_type,
            GroupKey::ProductCategory | GroupKey::City | GroupKey::VisitMonth => true,
        }
    }

    /// Rows matching `keep`, with the same column set.
    pub fn subset(&self, mut keep: impl FnMut(&VisitRecord) -> bool) -> VisitTable {
        VisitTable {
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
            columns: self.columns,
        }
    }

    /// Distinct visit months present, in calendar order.
    pub fn months(&self) -> BTreeSet<YearMonth> {
        self.records.iter().map(|r| r.visit_month).collect()
    }
}
