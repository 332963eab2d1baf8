//! Customer & geographic insights view.
//!
//! Category, city and city-type groupings for the selected months, plus the
//! customer segmentation pie. Charts that need an optional column are
//! omitted when the source file did not carry it.

use crate::{
    metrics::{
        customer_metrics, distribution_by, mean_by, scatter, segmentation, sum_by,
        GroupDistribution, GroupValue, Point, SegmentShare,
    },
    table::{GroupKey, NumericColumn, VisitTable},
    view::{Chart, ChartKind, ChartSpec, DashboardView, ViewContext},
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerGeoReport {
    pub category_sales:           Chart<GroupValue>,
    pub satisfaction_by_category: Chart<GroupDistribution>,
    pub city_avg_spend:           Chart<GroupValue>,
    pub segmentation:             Chart<SegmentShare>,
    pub conversion_by_city_type:  Option<Chart<GroupDistribution>>,
    pub bounce_by_month:          Option<Chart<GroupDistribution>>,
    pub items_vs_spend:           Option<Chart<Point>>,
    pub city_type_avg_spend:      Option<Chart<GroupValue>>,
}

pub struct CustomerGeoView;

impl CustomerGeoView {
    fn conversion_by_city_type(&self, table: &VisitTable) -> Option<Chart<GroupDistribution>> {
        if !table.has_numeric(NumericColumn::ConversionRate) || !table.has_key(GroupKey::CityType) {
            log::warn!(
                "customer_geo: Conversion_Rate or City_Type missing, conversion chart skipped"
            );
            return None;
        }
        Some(Chart::new(
            ChartSpec::new(ChartKind::Strip, "Conversion Rate Spread by City Type", "key", "stats")
                .colored_by("key")
                .labeled("City Type", "Conversion Rate (%)"),
            distribution_by(table, GroupKey::CityType, NumericColumn::ConversionRate),
        ))
    }

    fn bounce_by_month(&self, table: &VisitTable) -> Option<Chart<GroupDistribution>> {
        if !table.has_numeric(NumericColumn::BounceRate) {
            log::warn!("customer_geo: Bounce_Rate missing, bounce chart skipped");
            return None;
        }
        Some(Chart::new(
            ChartSpec::new(ChartKind::Box, "Monthly Bounce Rate Trends", "key", "stats")
                .colored_by("key")
                .labeled("Month", "Bounce Rate (%)"),
            distribution_by(table, GroupKey::VisitMonth, NumericColumn::BounceRate),
        ))
    }

    fn items_vs_spend(&self, table: &VisitTable) -> Option<Chart<Point>> {
        if !table.has_numeric(NumericColumn::NumItems) {
            log::warn!("customer_geo: Num_Items missing, items chart skipped");
            return None;
        }
        Some(Chart::new(
            ChartSpec::new(ChartKind::DensityContour, "Item Count vs Spend Density", "x", "y")
                .labeled("Number of Items Purchased", "Total Spend"),
            scatter(table, NumericColumn::NumItems, NumericColumn::TotalSpend),
        ))
    }

    fn city_type_avg_spend(&self, table: &VisitTable) -> Option<Chart<GroupValue>> {
        if !table.has_key(GroupKey::CityType) {
            log::warn!("customer_geo: City_Type missing, city type chart skipped");
            return None;
        }
        Some(Chart::new(
            ChartSpec::new(ChartKind::Bar, "Average Spend Across City Types", "key", "value")
                .colored_by("key")
                .labeled("City Type", "Average Spend"),
            mean_by(table, GroupKey::CityType, NumericColumn::TotalSpend),
        ))
    }
}

impl DashboardView for CustomerGeoView {
    type Report = CustomerGeoReport;

    fn name(&self) -> &'static str {
        "customer_geo"
    }

    fn build(&self, ctx: &ViewContext<'_>) -> CustomerGeoReport {
        let table = ctx.selected;
        let segments = &ctx.config.segments;

        let category_sales = Chart::new(
            ChartSpec::new(ChartKind::Bar, "Product Category Sales", "key", "value")
                .colored_by("value")
                .labeled("Product Category", "Total Revenue"),
            sum_by(table, GroupKey::ProductCategory, NumericColumn::TotalSpend),
        );

        let satisfaction_by_category = Chart::new(
            ChartSpec::new(ChartKind::Violin, "Satisfaction by Category", "key", "stats")
                .colored_by("key")
                .labeled("Product Category", "Customer Satisfaction"),
            distribution_by(table, GroupKey::ProductCategory, NumericColumn::ProductSatisfaction),
        );

        let mut city_means = mean_by(table, GroupKey::City, NumericColumn::TotalSpend);
        city_means.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
        let city_avg_spend = Chart::new(
            ChartSpec::new(ChartKind::Funnel, "Avg Spend by City", "value", "key")
                .labeled("Average Revenue", "City"),
            city_means,
        );

        let metrics = customer_metrics(table, segments);
        let segment_chart = Chart::new(
            ChartSpec::new(ChartKind::Pie, "Customer Segmentation", "segment", "customers"),
            segmentation(&metrics, segments),
        );

        CustomerGeoReport {
            category_sales,
            satisfaction_by_category,
            city_avg_spend,
            segmentation: segment_chart,
            conversion_by_city_type: self.conversion_by_city_type(table),
            bounce_by_month: self.bounce_by_month(table),
            items_vs_spend: self.items_vs_spend(table),
            city_type_avg_spend: self.city_type_avg_spend(table),
        }
    }
}
