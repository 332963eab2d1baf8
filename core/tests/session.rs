//! Command handling and per-view month filters.

use salesdash_core::{
    command::{CommandOutcome, DashboardSession, ViewCommand},
    config::DashConfig,
    engine::{Dashboard, DashboardReport},
    error::DashError,
    filter::MonthSelection,
    loader::load_reader,
    synth::{self, SyntheticConfig},
    types::YearMonth,
    view::{ChartKind, ViewKind},
};

// ── Helpers ──────────────────────────────────────────────────────────────────

const CSV: &str = "\
Customer_ID,Visit_Date,Days_Since_Last_Visit,Total_Spend,Product_Category,Product_Satisfaction,City
A,2023-07-05,12,60,Books,3,Pune
B,2023-08-05,12,40,Books,3,Pune
A,2023-09-05,15,100,Books,1,Pune
B,2023-12-05,45,120,Clothing,4,Delhi
C,2024-02-05,5,150,Books,5,Delhi
";

fn session() -> DashboardSession {
    let table = load_reader(CSV.as_bytes(), "session").unwrap();
    DashboardSession::new(Dashboard::new(DashConfig::default(), &table))
}

fn report(outcome: CommandOutcome) -> DashboardReport {
    match outcome {
        CommandOutcome::Report(report) => *report,
        CommandOutcome::Quit => panic!("expected a report"),
    }
}

fn set_months(view: &str, months: &[&str]) -> ViewCommand {
    ViewCommand::SetMonths {
        view:   view.into(),
        months: months.iter().map(|m| m.to_string()).collect(),
    }
}

fn ym(year: i32, month: u32) -> YearMonth {
    YearMonth::new(year, month).unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn commands_parse_from_json_lines() {
    let cmd: ViewCommand = serde_json::from_str(
        r#"{"type":"set_months","view":"sales","months":["September 2023","2024-01"]}"#,
    )
    .unwrap();
    assert_eq!(cmd, set_months("sales", &["September 2023", "2024-01"]));

    let cmd: ViewCommand = serde_json::from_str(r#"{"type":"get_state"}"#).unwrap();
    assert_eq!(cmd, ViewCommand::GetState);
    let cmd: ViewCommand = serde_json::from_str(r#"{"type":"reset_filters"}"#).unwrap();
    assert_eq!(cmd, ViewCommand::ResetFilters);
}

#[test]
fn initial_state_selects_every_window_month() {
    let mut s = session();
    let r = report(s.apply(&ViewCommand::GetState).unwrap());

    assert_eq!(r.month_options.len(), 6);
    assert_eq!(r.month_options[0].label, "September 2023");
    for view in ViewKind::ALL {
        assert_eq!(r.filters.get(view).len(), 6);
    }
    assert_eq!(r.overview.rows_selected, 3);
    assert_eq!(r.overview.customers.total_customers, 3);
}

#[test]
fn views_filter_independently() {
    let mut s = session();
    let r = report(s.apply(&set_months("overview", &["September 2023"])).unwrap());

    assert_eq!(r.overview.selected_months, [ym(2023, 9)]);
    assert_eq!(r.overview.rows_selected, 1);
    assert_eq!(r.overview.customers.total_customers, 1);
    // other views keep the full window
    assert_eq!(r.filters.sales.len(), 6);
    assert_eq!(r.sales.trend_selected.data.len(), 3);
    assert_eq!(r.customer_geo.category_sales.data.len(), 2);
}

#[test]
fn selected_months_include_months_without_visits() {
    let mut s = session();
    let r = report(s.apply(&set_months("overview", &["2023-09", "October 2023"])).unwrap());

    assert_eq!(r.overview.selected_months, [ym(2023, 9), ym(2023, 10)]);
    assert_eq!(r.overview.rows_selected, 1);
}

/// Spend clips to [40.8, 148.8], so the whole-table total is 469.6.
#[test]
fn all_time_figures_ignore_the_selection() {
    let mut s = session();
    s.apply(&set_months("sales", &["2023-09"])).unwrap();
    let r = report(s.apply(&set_months("overview", &["2023-09"])).unwrap());

    let total = r.overview.total_sales_all_time;
    assert!(approx(total, 469.6), "got {total}");
    assert_eq!(r.sales.trend_selected.data.len(), 1);

    let all = &r.sales.all_time;
    assert_eq!(all.total_customers, 3);
    assert_eq!(all.repeat_customers, 3);
    assert_eq!(all.churned_customers, 1);
    assert!(approx(all.repeat_rate, 100.0));
    assert!(approx(all.churn_rate, 100.0 / 3.0));
}

#[test]
fn city_average_spend_is_sorted_descending() {
    let r = session().report();
    let cities: Vec<(&str, f64)> = r
        .customer_geo
        .city_avg_spend
        .data
        .iter()
        .map(|g| (g.key.as_str(), g.value))
        .collect();

    // window rows: Pune 100, Delhi 120 and 148.8 after clipping
    assert_eq!(cities.len(), 2);
    assert_eq!(cities[0].0, "Delhi");
    assert!(approx(cities[0].1, 134.4));
    assert_eq!(cities[1].0, "Pune");
    assert!(approx(cities[1].1, 100.0));
}

#[test]
fn empty_selection_renders_zeros() {
    let mut s = session();
    let r = report(s.apply(&set_months("customer_geo", &[])).unwrap());

    assert!(r.filters.customer_geo.is_empty());
    assert!(r.customer_geo.category_sales.data.is_empty());
    assert!(r.customer_geo.city_avg_spend.data.is_empty());
    let pie: Vec<usize> = r.customer_geo.segmentation.data.iter().map(|s| s.customers).collect();
    assert_eq!(pie, [0, 0, 0, 0]);
}

#[test]
fn unknown_month_is_rejected_and_filters_kept() {
    let mut s = session();
    let before = s.filters().clone();
    let err = s.apply(&set_months("sales", &["2023-09", "August 2023"])).unwrap_err();

    assert!(
        matches!(err, DashError::UnknownMonth { ref label } if label == "August 2023"),
        "got {err:?}"
    );
    assert_eq!(s.filters(), &before);
}

#[test]
fn unknown_view_is_rejected_and_filters_kept() {
    let mut s = session();
    let before = s.filters().clone();
    let err = s.apply(&set_months("geo", &["2023-09"])).unwrap_err();

    assert!(matches!(err, DashError::UnknownView { .. }), "got {err:?}");
    assert_eq!(s.filters(), &before);
}

#[test]
fn reset_restores_every_view() {
    let mut s = session();
    s.apply(&set_months("sales", &["2023-12"])).unwrap();
    s.apply(&set_months("overview", &[])).unwrap();
    let r = report(s.apply(&ViewCommand::ResetFilters).unwrap());

    assert_eq!(r.filters, s.dashboard().default_filters());
    assert_eq!(r.filters.overview, MonthSelection::all(&s.dashboard().config().window));
}

#[test]
fn quit_ends_the_session() {
    let mut s = session();
    assert!(matches!(s.apply(&ViewCommand::Quit).unwrap(), CommandOutcome::Quit));
}

#[test]
fn render_is_repeatable() {
    let s = session();
    let filters = s.filters().clone();
    assert_eq!(s.dashboard().render(&filters), s.dashboard().render(&filters));
}

#[test]
fn sales_view_charts_carry_specs() {
    let r = session().report();

    assert_eq!(r.sales.trend_all.spec.kind, ChartKind::Line);
    assert_eq!(r.sales.trend_all.data.len(), 5);
    assert_eq!(r.sales.behavior.spec.kind, ChartKind::StackedBar);
    assert_eq!(r.sales.behavior.spec.color.as_deref(), Some("behavior"));
    assert_eq!(r.sales.rate_trends.data.len(), 4 * 5);
    assert_eq!(r.customer_geo.segmentation.spec.kind, ChartKind::Pie);
}

#[test]
fn optional_charts_follow_source_columns() {
    let r = session().report();
    assert!(r.customer_geo.conversion_by_city_type.is_none());
    assert!(r.customer_geo.bounce_by_month.is_none());
    assert!(r.customer_geo.items_vs_spend.is_none());
    assert!(r.customer_geo.city_type_avg_spend.is_none());

    let rows = synth::generate(3, &SyntheticConfig { customers: 30, ..SyntheticConfig::default() });
    let mut buf = Vec::new();
    synth::write_csv(&rows, &mut buf).unwrap();
    let table = load_reader(buf.as_slice(), "synthetic").unwrap();
    let dashboard = Dashboard::new(DashConfig::default(), &table);
    let r = dashboard.render(&dashboard.default_filters());

    assert!(r.customer_geo.conversion_by_city_type.is_some());
    assert!(r.customer_geo.bounce_by_month.is_some());
    assert!(r.customer_geo.items_vs_spend.is_some());
    assert!(r.customer_geo.city_type_avg_spend.is_some());
}
