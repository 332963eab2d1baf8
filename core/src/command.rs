use crate::{
    engine::{Dashboard, DashboardReport},
    error::DashResult,
    filter::{MonthSelection, ViewFilters},
    view::ViewKind,
};
use serde::{Deserialize, Serialize};

/// All commands a UI layer can send.
/// Variants may be added, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewCommand {
    GetState,
    /// Replace one view's month selection. `months` holds keys
    /// (`2023-09`) or display labels (`September 2023`); empty is allowed.
    SetMonths {
        view:   String,
        months: Vec<String>,
    },
    ResetFilters,
    Quit,
}

#[derive(Debug, Clone)]
pub enum CommandOutcome {
    Report(Box<DashboardReport>),
    Quit,
}

/// A dashboard plus the current per-view filters of one UI session.
pub struct DashboardSession {
    dashboard: Dashboard,
    filters:   ViewFilters,
}

impl DashboardSession {
    pub fn new(dashboard: Dashboard) -> Self {
        let filters = dashboard.default_filters();
        Self { dashboard, filters }
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn filters(&self) -> &ViewFilters {
        &self.filters
    }

    pub fn report(&self) -> DashboardReport {
        self.dashboard.render(&self.filters)
    }

    /// Apply a command. On error the filters are left unchanged.
    pub fn apply(&mut self, command: &ViewCommand) -> DashResult<CommandOutcome> {
        match command {
            ViewCommand::Quit => return Ok(CommandOutcome::Quit),
            ViewCommand::GetState => {}
            ViewCommand::ResetFilters => {
                self.filters = self.dashboard.default_filters();
            }
            ViewCommand::SetMonths { view, months } => {
                let view: ViewKind = view.parse()?;
                let window = &self.dashboard.config().window;
                let selection = MonthSelection::from_options(window, months)?;
                log::info!("filter {}: {} months selected", view.name(), selection.len());
                self.filters.set(view, selection);
            }
        }
        Ok(CommandOutcome::Report(Box::new(self.report())))
    }
}
