//! Metric aggregation over a visit table.
//!
//! Every function here is a pure function of the table it is given. Rates
//! are percentages and fall back to 0 when their denominator is 0, so an
//! empty month selection never fails.

use crate::{
    clip::{quantile, sorted_values},
    config::{SegmentThresholds, WindowConfig},
    segment::{Segment, VisitBehavior},
    table::{GroupKey, NumericColumn, VisitRecord, VisitTable},
    types::YearMonth,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

// ── Public types ─────────────────────────────────────────────────────────────

/// Distinct-customer counts and their share of all distinct customers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerMetrics {
    pub total_customers:       usize,
    pub repeat_customers:      usize,
    pub churned_customers:     usize,
    pub loyal_customers:       usize,
    pub unsatisfied_customers: usize,
    pub repeat_rate:           f64,
    pub churn_rate:            f64,
    pub loyal_rate:            f64,
    pub unsatisfied_rate:      f64,
}

impl CustomerMetrics {
    pub fn count(&self, segment: Segment) -> usize {
        match segment {
            Segment::Repeat      => self.repeat_customers,
            Segment::Churn       => self.churned_customers,
            Segment::Loyal       => self.loyal_customers,
            Segment::Unsatisfied => self.unsatisfied_customers,
        }
    }

    pub fn rate(&self, segment: Segment) -> f64 {
        match segment {
            Segment::Repeat      => self.repeat_rate,
            Segment::Churn       => self.churn_rate,
            Segment::Loyal       => self.loyal_rate,
            Segment::Unsatisfied => self.unsatisfied_rate,
        }
    }
}

/// Recent-window sales against the previous-period baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesDecline {
    pub previous_months:    usize,
    pub avg_prev_sales:     f64,
    pub expected_sales:     f64,
    pub total_sales_window: f64,
    pub decline_amount:     f64,
    pub decline_percent:    f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    pub month:       YearMonth,
    pub total_spend: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorCount {
    pub month:     YearMonth,
    pub behavior:  VisitBehavior,
    pub customers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RateMetric {
    #[serde(rename = "Repeat_Rate")]
    RepeatRate,
    #[serde(rename = "Churn_Rate")]
    ChurnRate,
    #[serde(rename = "Loyal_Rate")]
    LoyalRate,
    #[serde(rename = "Unsatisfied_Rate")]
    UnsatisfiedRate,
}

impl RateMetric {
    pub const ALL: [RateMetric; 4] = [
        Self::RepeatRate,
        Self::ChurnRate,
        Self::LoyalRate,
        Self::UnsatisfiedRate,
    ];

    pub fn segment(self) -> Segment {
        match self {
            Self::RepeatRate      => Segment::Repeat,
            Self::ChurnRate       => Segment::Churn,
            Self::LoyalRate       => Segment::Loyal,
            Self::UnsatisfiedRate => Segment::Unsatisfied,
        }
    }
}

/// One long-form row of the rate-over-time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRate {
    pub month:  YearMonth,
    pub metric: RateMetric,
    pub rate:   f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupValue {
    pub key:   String,
    pub value: f64,
}

/// Five-number summary plus mean, for box/violin/strip style charts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub count:  usize,
    pub min:    f64,
    pub q1:     f64,
    pub median: f64,
    pub q3:     f64,
    pub max:    f64,
    pub mean:   f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDistribution {
    pub key:   String,
    pub stats: Distribution,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentShare {
    pub segment:   String,
    pub customers: usize,
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// `numerator / denominator * 100`, or 0 when the denominator is 0.
pub fn pct(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator * 100.0
    }
}

pub fn distinct_customers<'a>(rows: impl IntoIterator<Item = &'a VisitRecord>) -> usize {
    rows.into_iter()
        .map(|r| r.customer_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

pub fn total_spend(table: &VisitTable) -> f64 {
    table.records().iter().map(|r| r.total_spend).sum()
}

// ── Customer metrics ─────────────────────────────────────────────────────────

pub fn customer_metrics(table: &VisitTable, thresholds: &SegmentThresholds) -> CustomerMetrics {
    let rows = table.records();
    let total = distinct_customers(rows);
    let count = |segment: Segment| {
        distinct_customers(rows.iter().filter(|r| thresholds.matches(segment, r)))
    };

    let repeat = count(Segment::Repeat);
    let churn = count(Segment::Churn);
    let loyal = count(Segment::Loyal);
    let unsatisfied = count(Segment::Unsatisfied);
    let denominator = total as f64;

    CustomerMetrics {
        total_customers:       total,
        repeat_customers:      repeat,
        churned_customers:     churn,
        loyal_customers:       loyal,
        unsatisfied_customers: unsatisfied,
        repeat_rate:           pct(repeat as f64, denominator),
        churn_rate:            pct(churn as f64, denominator),
        loyal_rate:            pct(loyal as f64, denominator),
        unsatisfied_rate:      pct(unsatisfied as f64, denominator),
    }
}

/// Pie slices: churn, loyal, unsatisfied and the remainder.
///
/// The three segments can overlap, so the remainder is floored at 0.
pub fn segmentation(
    metrics: &CustomerMetrics,
    thresholds: &SegmentThresholds,
) -> Vec<SegmentShare> {
    let labelled =
        metrics.churned_customers + metrics.loyal_customers + metrics.unsatisfied_customers;
    vec![
        SegmentShare {
            segment:   format!("Churn (>{}d)", thresholds.churn_min_days),
            customers: metrics.churned_customers,
        },
        SegmentShare {
            segment:   format!(
                "Loyal ({}–{}d)",
                thresholds.loyal_min_days, thresholds.loyal_max_days
            ),
            customers: metrics.loyal_customers,
        },
        SegmentShare {
            segment:   format!("Unsatisfied (≤{})", thresholds.unsatisfied_max_score),
            customers: metrics.unsatisfied_customers,
        },
        SegmentShare {
            segment:   "Other".into(),
            customers: metrics.total_customers.saturating_sub(labelled),
        },
    ]
}

// ── Sales decline ────────────────────────────────────────────────────────────

/// Compare recent-window sales with the scaled previous-period average.
///
/// `full` supplies the previous period (every month outside the window);
/// `selected` supplies the window total.
pub fn sales_decline(
    full: &VisitTable,
    selected: &VisitTable,
    window: &WindowConfig,
) -> SalesDecline {
    let mut prev_months: HashSet<YearMonth> = HashSet::new();
    let mut prev_total = 0.0;
    for r in full.records().iter().filter(|r| !window.contains(r.visit_month)) {
        prev_months.insert(r.visit_month);
        prev_total += r.total_spend;
    }

    let avg_prev_sales = if prev_months.is_empty() {
        0.0
    } else {
        prev_total / prev_months.len() as f64
    };
    let expected_sales = avg_prev_sales * window.baseline_months() as f64;
    let total_sales_window = total_spend(selected);
    let decline_amount = expected_sales - total_sales_window;

    SalesDecline {
        previous_months: prev_months.len(),
        avg_prev_sales,
        expected_sales,
        total_sales_window,
        decline_amount,
        decline_percent: pct(decline_amount, expected_sales),
    }
}

// ── Time series ──────────────────────────────────────────────────────────────

pub fn monthly_spend(table: &VisitTable) -> Vec<MonthlyTotal> {
    let mut by_month: BTreeMap<YearMonth, f64> = BTreeMap::new();
    for r in table.records() {
        *by_month.entry(r.visit_month).or_insert(0.0) += r.total_spend;
    }
    by_month
        .into_iter()
        .map(|(month, total_spend)| MonthlyTotal { month, total_spend })
        .collect()
}

/// Distinct customers per (month, exclusive behavior label).
pub fn behavior_by_month(table: &VisitTable, thresholds: &SegmentThresholds) -> Vec<BehaviorCount> {
    let mut groups: BTreeMap<(YearMonth, VisitBehavior), HashSet<&str>> = BTreeMap::new();
    for r in table.records() {
        groups
            .entry((r.visit_month, thresholds.classify(r)))
            .or_default()
            .insert(r.customer_id.as_str());
    }
    groups
        .into_iter()
        .map(|((month, behavior), customers)| BehaviorCount {
            month,
            behavior,
            customers: customers.len(),
        })
        .collect()
}

/// Per-month segment rates, long-form and metric-major.
///
/// Numerators count flagged visits, the denominator counts distinct
/// customers in the month.
pub fn rates_over_time(table: &VisitTable, thresholds: &SegmentThresholds) -> Vec<MonthlyRate> {
    #[derive(Default)]
    struct MonthTally<'a> {
        customers: HashSet<&'a str>,
        flagged:   HashMap<Segment, usize>,
    }

    let mut months: BTreeMap<YearMonth, MonthTally<'_>> = BTreeMap::new();
    for r in table.records() {
        let tally = months.entry(r.visit_month).or_default();
        tally.customers.insert(r.customer_id.as_str());
        for segment in Segment::ALL {
            if thresholds.matches(segment, r) {
                *tally.flagged.entry(segment).or_insert(0) += 1;
            }
        }
    }

    RateMetric::ALL
        .into_iter()
        .flat_map(|metric| {
            months.iter().map(move |(&month, tally)| {
                let flagged = tally.flagged.get(&metric.segment()).copied().unwrap_or(0);
                MonthlyRate {
                    month,
                    metric,
                    rate: pct(flagged as f64, tally.customers.len() as f64),
                }
            })
        })
        .collect()
}

// ── Groupings ────────────────────────────────────────────────────────────────

fn grouped_values(
    table: &VisitTable,
    key: GroupKey,
    column: NumericColumn,
) -> BTreeMap<String, Vec<f64>> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for r in table.records() {
        if let (Some(k), Some(v)) = (r.key(key), r.value(column)) {
            if !v.is_nan() {
                groups.entry(k).or_default().push(v);
            }
        }
    }
    groups
}

/// Sum of `column` per key, ordered by key.
pub fn sum_by(table: &VisitTable, key: GroupKey, column: NumericColumn) -> Vec<GroupValue> {
    grouped_values(table, key, column)
        .into_iter()
        .map(|(key, values)| GroupValue { key, value: values.iter().sum() })
        .collect()
}

/// Mean of `column` per key, ordered by key.
pub fn mean_by(table: &VisitTable, key: GroupKey, column: NumericColumn) -> Vec<GroupValue> {
    grouped_values(table, key, column)
        .into_iter()
        .map(|(key, values)| GroupValue {
            key,
            value: values.iter().sum::<f64>() / values.len() as f64,
        })
        .collect()
}

pub fn distribution(values: &[f64]) -> Option<Distribution> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(f64::total_cmp);
    let (&min, &max) = (sorted.first()?, sorted.last()?);
    Some(Distribution {
        count:  sorted.len(),
        min,
        q1:     quantile(&sorted, 0.25)?,
        median: quantile(&sorted, 0.50)?,
        q3:     quantile(&sorted, 0.75)?,
        max,
        mean:   sorted.iter().sum::<f64>() / sorted.len() as f64,
    })
}

/// Distribution of `column` over the whole table.
pub fn column_distribution(table: &VisitTable, column: NumericColumn) -> Option<Distribution> {
    distribution(&sorted_values(table, column))
}

/// Distribution of `column` per key, ordered by key.
pub fn distribution_by(
    table: &VisitTable,
    key: GroupKey,
    column: NumericColumn,
) -> Vec<GroupDistribution> {
    grouped_values(table, key, column)
        .into_iter()
        .filter_map(|(key, values)| {
            distribution(&values).map(|stats| GroupDistribution { key, stats })
        })
        .collect()
}

/// (x, y) pairs for rows carrying both columns.
pub fn scatter(table: &VisitTable, x: NumericColumn, y: NumericColumn) -> Vec<Point> {
    table
        .records()
        .iter()
        .filter_map(|r| Some(Point { x: r.value(x)?, y: r.value(y)? }))
        .collect()
}
