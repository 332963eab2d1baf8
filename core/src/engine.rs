//! The dashboard engine.
//!
//! PIPELINE (fixed, never reordered):
//!   1. Load + normalize      (cache, once per path)
//!   2. Clip outliers         (once, over the whole table)
//!   3. Month filter          (per view, per render)
//!   4. View aggregation      (overview, sales, customer_geo)
//!
//! RULES:
//!   - Clipping happens before any filter; bounds never change after build.
//!   - render() is a pure function of (clipped table, filters).
//!   - Views never see each other's selections.

use crate::{
    cache::DatasetCache,
    clip::{clip_outliers, ClipBounds},
    config::{DashConfig, MonthOption},
    customer_geo_view::{CustomerGeoReport, CustomerGeoView},
    error::DashResult,
    filter::{filter_months, MonthSelection, ViewFilters},
    overview_view::{OverviewReport, OverviewView},
    sales_view::{SalesReport, SalesView},
    table::VisitTable,
    view::{DashboardView, ViewContext},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Everything the renderer receives for one interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub month_options: Vec<MonthOption>,
    pub filters:       ViewFilters,
    pub clip_bounds:   Vec<ClipBounds>,
    pub overview:      OverviewReport,
    pub sales:         SalesReport,
    pub customer_geo:  CustomerGeoReport,
}

pub struct Dashboard {
    config: DashConfig,
    table:  Arc<VisitTable>,
    bounds: Vec<ClipBounds>,
}

impl Dashboard {
    /// Clip `raw` once and keep the result for every later render.
    /// The shared raw table is left untouched.
    pub fn new(config: DashConfig, raw: &VisitTable) -> Self {
        let mut table = raw.clone();
        let bounds = clip_outliers(&mut table, &config.clipping);
        log::info!(
            "dashboard ready: {} rows, {} months, {} clipped columns",
            table.len(),
            table.months().len(),
            bounds.len(),
        );
        Self { config, table: Arc::new(table), bounds }
    }

    /// Load `path` through the process-wide cache and build on it.
    pub fn open(path: impl AsRef<Path>, config: DashConfig) -> DashResult<Self> {
        let raw = DatasetCache::global().load(path)?;
        Ok(Self::new(config, &raw))
    }

    pub fn config(&self) -> &DashConfig {
        &self.config
    }

    /// The clipped table.
    pub fn table(&self) -> &VisitTable {
        &self.table
    }

    pub fn clip_bounds(&self) -> &[ClipBounds] {
        &self.bounds
    }

    /// Every view's default filter: all window months.
    pub fn default_filters(&self) -> ViewFilters {
        ViewFilters::all(&self.config.window)
    }

    pub fn render(&self, filters: &ViewFilters) -> DashboardReport {
        DashboardReport {
            month_options: self.config.window.months.clone(),
            filters:       filters.clone(),
            clip_bounds:   self.bounds.clone(),
            overview:      self.render_view(&OverviewView, &filters.overview),
            sales:         self.render_view(&SalesView, &filters.sales),
            customer_geo:  self.render_view(&CustomerGeoView, &filters.customer_geo),
        }
    }

    /// Filter the clipped table to `selection` and run one view over it.
    pub fn render_view<V: DashboardView>(&self, view: &V, selection: &MonthSelection) -> V::Report {
        let selected = filter_months(&self.table, selection);
        log::debug!(
            "render {}: {} months selected, {} rows",
            view.name(),
            selection.len(),
            selected.len(),
        );
        view.build(&ViewContext {
            config:    &self.config,
            full:      &self.table,
            selection,
            selected:  &selected,
        })
    }
}
