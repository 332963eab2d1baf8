//! Month filter.
//!
//! Each view owns an independent selection drawn from the fixed window
//! options. An empty selection is legal and yields an empty subset.

use crate::{
    config::WindowConfig,
    error::{DashError, DashResult},
    table::VisitTable,
    types::YearMonth,
    view::ViewKind,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthSelection {
    months: BTreeSet<YearMonth>,
}

impl MonthSelection {
    /// Every window month selected (the control's default).
    pub fn all(window: &WindowConfig) -> Self {
        Self { months: window.keys().collect() }
    }

    pub fn none() -> Self {
        Self::default()
    }

    /// Build from filter options given as keys or display labels.
    pub fn from_options<S: AsRef<str>>(window: &WindowConfig, options: &[S]) -> DashResult<Self> {
        let months = options
            .iter()
            .map(|opt| {
                let opt = opt.as_ref();
                window
                    .resolve(opt)
                    .ok_or_else(|| DashError::UnknownMonth { label: opt.to_string() })
            })
            .collect::<DashResult<BTreeSet<_>>>()?;
        Ok(Self { months })
    }

    pub fn contains(&self, month: YearMonth) -> bool {
        self.months.contains(&month)
    }

    pub fn months(&self) -> impl Iterator<Item = YearMonth> + '_ {
        self.months.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }
}

/// Rows whose visit month is selected.
pub fn filter_months(table: &VisitTable, selection: &MonthSelection) -> VisitTable {
    table.subset(|r| selection.contains(r.visit_month))
}

/// One selection per view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewFilters {
    pub overview:     MonthSelection,
    pub sales:        MonthSelection,
    pub customer_geo: MonthSelection,
}

impl ViewFilters {
    pub fn all(window: &WindowConfig) -> Self {
        let all = MonthSelection::all(window);
        Self {
            overview:     all.clone(),
            sales:        all.clone(),
            customer_geo: all,
        }
    }

    pub fn get(&self, view: ViewKind) -> &MonthSelection {
        match view {
            ViewKind::Overview    => &self.overview,
            ViewKind::Sales       => &self.sales,
            ViewKind::CustomerGeo => &self.customer_geo,
        }
    }

    pub fn set(&mut self, view: ViewKind, selection: MonthSelection) {
        match view {
            ViewKind::Overview    => self.overview = selection,
            ViewKind::Sales       => self.sales = selection,
            ViewKind::CustomerGeo => self.customer_geo = selection,
        }
    }
}
