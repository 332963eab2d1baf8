use crate::{
    table::NumericColumn,
    types::YearMonth,
};
use serde::{Deserialize, Serialize};

// ── Customer segments ──────────────────────────────────────────────

/// Day and score thresholds behind the customer segment labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentThresholds {
    /// Repeat: days since last visit ≤ this.
    pub repeat_max_days: f64,
    /// Churn: days since last visit > this.
    pub churn_min_days: f64,
    /// Loyal: days since last visit within [loyal_min_days, loyal_max_days].
    pub loyal_min_days: f64,
    pub loyal_max_days: f64,
    /// Unsatisfied: product satisfaction ≤ this.
    pub unsatisfied_max_score: f64,
}

impl Default for SegmentThresholds {
    fn default() -> Self {
        Self {
            repeat_max_days:       20.0,
            churn_min_days:        30.0,
            loyal_min_days:        10.0,
            loyal_max_days:        20.0,
            unsatisfied_max_score: 2.0,
        }
    }
}

// ── Outlier clipping ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClippingConfig {
    pub columns: Vec<NumericColumn>,
    pub lower_quantile: f64,
    pub upper_quantile: f64,
}

impl Default for ClippingConfig {
    fn default() -> Self {
        Self {
            columns: vec![
                NumericColumn::TotalSpend,
                NumericColumn::ConversionRate,
                NumericColumn::BounceRate,
                NumericColumn::ProductSatisfaction,
            ],
            lower_quantile: 0.01,
            upper_quantile: 0.99,
        }
    }
}

// ── Recent window ──────────────────────────────────────────────────

/// One selectable month in the filter control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthOption {
    pub key:   YearMonth,
    pub label: String,
}

/// The fixed recent window. Every month outside it belongs to the
/// previous-period baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub months: Vec<MonthOption>,
}

impl WindowConfig {
    pub fn contains(&self, month: YearMonth) -> bool {
        self.months.iter().any(|m| m.key == month)
    }

    pub fn keys(&self) -> impl Iterator<Item = YearMonth> + '_ {
        self.months.iter().map(|m| m.key)
    }

    /// Number of months the previous-period average is scaled by.
    pub fn baseline_months(&self) -> usize {
        self.months.len()
    }

    /// Resolve a filter option by key (`2023-09`) or label (`September 2023`).
    pub fn resolve(&self, option: &str) -> Option<YearMonth> {
        let option = option.trim();
        self.months
            .iter()
            .find(|m| m.label.eq_ignore_ascii_case(option) || m.key.to_string() == option)
            .map(|m| m.key)
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        let months = [
            (2023, 9,  "September 2023"),
            (2023, 10, "October 2023"),
            (2023, 11, "November 2023"),
            (2023, 12, "December 2023"),
            (2024, 1,  "January 2024"),
            (2024, 2,  "February 2024"),
        ]
        .into_iter()
        .map(|(year, month, label)| MonthOption {
            key: YearMonth { year, month },
            label: label.into(),
        })
        .collect();
        Self { months }
    }
}

// ── Top level ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashConfig {
    #[serde(default)]
    pub segments: SegmentThresholds,
    #[serde(default)]
    pub clipping: ClippingConfig,
    #[serde(default)]
    pub window: WindowConfig,
}

impl DashConfig {
    /// Load from a JSON file. Sections missing from the file keep their
    /// built-in defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: DashConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        if config.window.months.is_empty() {
            anyhow::bail!("{path}: window must list at least one month");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_is_sept_2023_to_feb_2024() {
        let window = WindowConfig::default();
        let keys: Vec<String> = window.keys().map(|k| k.to_string()).collect();
        assert_eq!(
            keys,
            ["2023-09", "2023-10", "2023-11", "2023-12", "2024-01", "2024-02"]
        );
        assert_eq!(window.baseline_months(), 6);
    }

    #[test]
    fn window_resolves_keys_and_labels() {
        let window = WindowConfig::default();
        let sept = YearMonth::new(2023, 9).unwrap();
        assert_eq!(window.resolve("2023-09"), Some(sept));
        assert_eq!(window.resolve("September 2023"), Some(sept));
        assert_eq!(window.resolve(" september 2023 "), Some(sept));
        assert_eq!(window.resolve("2023-08"), None);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: DashConfig =
            serde_json::from_str(r#"{ "segments": { "repeat_max_days": 14.0,
                "churn_min_days": 30.0, "loyal_min_days": 10.0,
                "loyal_max_days": 20.0, "unsatisfied_max_score": 2.0 } }"#)
                .unwrap();
        assert_eq!(config.segments.repeat_max_days, 14.0);
        assert_eq!(config.clipping, ClippingConfig::default());
        assert_eq!(config.window, WindowConfig::default());
    }
}
