//! Sales performance view.
//!
//! Two monthly spend trends (whole table and selected months), the stacked
//! repeat/churn behavior chart for the selection, and the segment rates
//! over time for the whole table.

use crate::{
    metrics::{
        behavior_by_month, customer_metrics, monthly_spend, rates_over_time, BehaviorCount,
        CustomerMetrics, MonthlyRate, MonthlyTotal,
    },
    view::{Chart, ChartKind, ChartSpec, DashboardView, ViewContext},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesReport {
    /// Segment metrics over the whole table, independent of the filter.
    pub all_time:        CustomerMetrics,
    pub trend_all:       Chart<MonthlyTotal>,
    pub trend_selected:  Chart<MonthlyTotal>,
    pub behavior:        Chart<BehaviorCount>,
    pub rate_trends:     Chart<MonthlyRate>,
}

pub struct SalesView;

impl DashboardView for SalesView {
    type Report = SalesReport;

    fn name(&self) -> &'static str {
        "sales"
    }

    fn build(&self, ctx: &ViewContext<'_>) -> SalesReport {
        let segments = &ctx.config.segments;

        let trend_all = Chart::new(
            ChartSpec::new(ChartKind::Line, "Total Monthly Sales (2 Years)", "month", "total_spend")
                .labeled("Month", "Total Spend"),
            monthly_spend(ctx.full),
        );

        let trend_selected = Chart::new(
            ChartSpec::new(ChartKind::Line, "Monthly Sales Trend", "month", "total_spend")
                .labeled("Month", "Total Spend"),
            monthly_spend(ctx.selected),
        );

        let behavior = Chart::new(
            ChartSpec::new(
                ChartKind::StackedBar,
                "Customer Return Behavior by Month",
                "month",
                "customers",
            )
            .colored_by("behavior")
            .labeled("Month", "Customer Count"),
            behavior_by_month(ctx.selected, segments),
        );

        let rate_trends = Chart::new(
            ChartSpec::new(
                ChartKind::Line,
                "Monthly Trend: Repeat, Churn, Loyalty, Unsatisfaction",
                "month",
                "rate",
            )
            .colored_by("metric")
            .labeled("Month", "Percentage"),
            rates_over_time(ctx.full, segments),
        );

        log::debug!(
            "sales: {} months overall, {} selected, {} behavior cells",
            trend_all.data.len(),
            trend_selected.data.len(),
            behavior.data.len(),
        );

        SalesReport {
            all_time: customer_metrics(ctx.full, segments),
            trend_all,
            trend_selected,
            behavior,
            rate_trends,
        }
    }
}
