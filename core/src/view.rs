//! View trait and chart hand-off types.
//!
//! RULE: A view is a pure aggregation recipe. It reads the full table and
//! its own filtered subset and returns a serializable report. Views never
//! hold state between renders.

use crate::{
    config::DashConfig,
    error::DashError,
    filter::MonthSelection,
    table::VisitTable,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Everything a view may read while building its report.
pub struct ViewContext<'a> {
    pub config:    &'a DashConfig,
    /// The whole clipped table.
    pub full:      &'a VisitTable,
    /// The months this view was asked for, including ones without visits.
    pub selection: &'a MonthSelection,
    /// The clipped table restricted to `selection`.
    pub selected:  &'a VisitTable,
}

pub trait DashboardView {
    type Report: Serialize;

    /// Stable name, used in logs.
    fn name(&self) -> &'static str;

    fn build(&self, ctx: &ViewContext<'_>) -> Self::Report;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Overview,
    Sales,
    CustomerGeo,
}

impl ViewKind {
    pub const ALL: [ViewKind; 3] = [Self::Overview, Self::Sales, Self::CustomerGeo];

    pub fn name(self) -> &'static str {
        match self {
            Self::Overview    => "overview",
            Self::Sales       => "sales",
            Self::CustomerGeo => "customer_geo",
        }
    }
}

impl FromStr for ViewKind {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.name() == s.trim())
            .ok_or_else(|| DashError::UnknownView { name: s.to_string() })
    }
}

// ── Chart hand-off ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
    StackedBar,
    Funnel,
    Pie,
    Violin,
    Strip,
    Box,
    DensityContour,
}

/// What the renderer needs besides the data: chart kind, title, and which
/// columns go on each axis and drive the color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind:    ChartKind,
    pub title:   String,
    /// Data field on the x axis.
    pub x:       String,
    /// Data field on the y axis.
    pub y:       String,
    /// Data field that drives the color, if any.
    pub color:   Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
}

impl ChartSpec {
    pub fn new(kind: ChartKind, title: &str, x: &str, y: &str) -> Self {
        Self {
            kind,
            title: title.into(),
            x: x.into(),
            y: y.into(),
            color: None,
            x_label: None,
            y_label: None,
        }
    }

    pub fn labeled(mut self, x_label: &str, y_label: &str) -> Self {
        self.x_label = Some(x_label.into());
        self.y_label = Some(y_label.into());
        self
    }

    pub fn colored_by(mut self, column: &str) -> Self {
        self.color = Some(column.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart<T> {
    pub spec: ChartSpec,
    pub data: Vec<T>,
}

impl<T> Chart<T> {
    pub fn new(spec: ChartSpec, data: Vec<T>) -> Self {
        Self { spec, data }
    }
}
