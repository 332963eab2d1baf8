//! Overview view: the executive KPI strip.
//!
//! Total two-year sales, the four customer-segment rates for the selected
//! months, and the recent-window sales decline.

use crate::{
    metrics::{customer_metrics, sales_decline, total_spend, CustomerMetrics, SalesDecline},
    types::YearMonth,
    view::{DashboardView, ViewContext},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewReport {
    /// The months chosen in the filter, whether or not they have visits.
    pub selected_months:      Vec<YearMonth>,
    pub rows_selected:        usize,
    pub total_sales_all_time: f64,
    pub customers:            CustomerMetrics,
    pub decline:              SalesDecline,
}

pub struct OverviewView;

impl DashboardView for OverviewView {
    type Report = OverviewReport;

    fn name(&self) -> &'static str {
        "overview"
    }

    fn build(&self, ctx: &ViewContext<'_>) -> OverviewReport {
        let customers = customer_metrics(ctx.selected, &ctx.config.segments);
        let decline = sales_decline(ctx.full, ctx.selected, &ctx.config.window);

        log::debug!(
            "overview: customers={} repeat={:.2}% churn={:.2}% decline={:.2}%",
            customers.total_customers,
            customers.repeat_rate,
            customers.churn_rate,
            decline.decline_percent,
        );

        OverviewReport {
            selected_months: ctx.selection.months().collect(),
            rows_selected: ctx.selected.len(),
            total_sales_all_time: total_spend(ctx.full),
            customers,
            decline,
        }
    }
}
