//! Global outlier clipping.
//!
//! Bounds come from the whole table, before any month filter, and every
//! row is clamped against the same bounds.

use crate::{
    config::ClippingConfig,
    table::{NumericColumn, VisitTable},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipBounds {
    pub column: NumericColumn,
    pub lower:  f64,
    pub upper:  f64,
}

impl ClipBounds {
    /// Clamp `value` into the bounds. NaN passes through unchanged.
    pub fn apply(&self, value: f64) -> f64 {
        if value.is_nan() {
            return value;
        }
        value.max(self.lower).min(self.upper)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Quantile of an ascending slice with linear interpolation between the
/// two closest ranks. `None` for an empty slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Present, non-NaN values of `column`, sorted ascending.
pub fn sorted_values(table: &VisitTable, column: NumericColumn) -> Vec<f64> {
    let mut values: Vec<f64> = table
        .records()
        .iter()
        .filter_map(|r| r.value(column))
        .filter(|v| !v.is_nan())
        .collect();
    values.sort_by(f64::total_cmp);
    values
}

/// Bounds for every configured column the table carries and has values for.
pub fn compute_bounds(table: &VisitTable, config: &ClippingConfig) -> Vec<ClipBounds> {
    let (q_lo, q_hi) = if config.lower_quantile <= config.upper_quantile {
        (config.lower_quantile, config.upper_quantile)
    } else {
        (config.upper_quantile, config.lower_quantile)
    };

    let mut bounds = Vec::new();
    for &column in &config.columns {
        if !table.has_numeric(column) {
            log::warn!("clip: column {} not present, skipped", column.header());
            continue;
        }
        let values = sorted_values(table, column);
        if let (Some(lower), Some(upper)) = (quantile(&values, q_lo), quantile(&values, q_hi)) {
            log::debug!("clip: {} to [{lower:.4}, {upper:.4}]", column.header());
            bounds.push(ClipBounds { column, lower, upper });
        }
    }
    bounds
}

/// Clamp every row of `table` to bounds computed over the whole table.
/// Returns the bounds that were applied.
pub fn clip_outliers(table: &mut VisitTable, config: &ClippingConfig) -> Vec<ClipBounds> {
    let bounds = compute_bounds(table, config);
    for record in table.records_mut() {
        for b in &bounds {
            if let Some(value) = record.value_mut(b.column) {
                *value = b.apply(*value);
            }
        }
    }
    bounds
}
