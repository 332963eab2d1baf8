//! Metric aggregation: segment counts, sales decline, time series, groupings.

use salesdash_core::{
    config::{SegmentThresholds, WindowConfig},
    filter::{filter_months, MonthSelection},
    loader::load_reader,
    metrics::{
        behavior_by_month, column_distribution, customer_metrics, mean_by, monthly_spend, pct,
        rates_over_time, sales_decline, segmentation, sum_by, RateMetric,
    },
    segment::{Segment, VisitBehavior},
    table::{GroupKey, NumericColumn, VisitTable},
    types::YearMonth,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

const HEADER: &str =
    "Customer_ID,Visit_Date,Days_Since_Last_Visit,Total_Spend,Product_Category,Product_Satisfaction,City\n";

fn table(rows: &str) -> VisitTable {
    let csv = format!("{HEADER}{rows}");
    load_reader(csv.as_bytes(), "test").unwrap()
}

fn ym(year: i32, month: u32) -> YearMonth {
    YearMonth::new(year, month).unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Two previous months (60 + 40) and two window months (100 + 150).
fn decline_table() -> VisitTable {
    table(
        "\
A,2023-07-05,12,60,Books,3,Pune
B,2023-08-05,12,40,Books,3,Pune
A,2023-09-05,12,100,Books,3,Pune
B,2024-02-05,12,150,Books,3,Pune
",
    )
}

// ── Tests: customer segments ────────────────────────────────────────────────

#[test]
fn one_visit_can_carry_several_segments() {
    let t = table("C1,2023-09-05,15,10,Books,1,Pune\n");
    let m = customer_metrics(&t, &SegmentThresholds::default());

    assert_eq!(m.total_customers, 1);
    assert_eq!(m.count(Segment::Repeat), 1);
    assert_eq!(m.count(Segment::Loyal), 1);
    assert_eq!(m.count(Segment::Unsatisfied), 1);
    assert_eq!(m.count(Segment::Churn), 0);
    assert_eq!(m.rate(Segment::Repeat), 100.0);
    assert_eq!(m.rate(Segment::Churn), 0.0);
}

#[test]
fn customers_are_counted_once() {
    let t = table(
        "\
C1,2023-09-05,5,10,Books,4,Pune
C1,2023-10-05,8,10,Books,4,Pune
C1,2023-11-05,45,10,Books,4,Pune
C2,2023-09-05,45,10,Books,4,Pune
",
    );
    let m = customer_metrics(&t, &SegmentThresholds::default());

    assert_eq!(m.total_customers, 2);
    assert_eq!(m.repeat_customers, 1);
    assert_eq!(m.churned_customers, 2);
    assert_eq!(m.repeat_rate, 50.0);
    assert_eq!(m.churn_rate, 100.0);
}

#[test]
fn threshold_boundaries() {
    let t = table(
        "\
R20,2023-09-05,20,10,Books,3,Pune
C30,2023-09-05,30,10,Books,3,Pune
C31,2023-09-05,30.5,10,Books,3,Pune
L10,2023-09-05,10,10,Books,3,Pune
L9,2023-09-05,9,10,Books,2,Pune
",
    );
    let s = SegmentThresholds::default();
    let rows = t.records();

    assert!(s.is_repeat(&rows[0]) && s.is_loyal(&rows[0]));
    assert!(!s.is_churn(&rows[1]), "exactly 30 days is not churn");
    assert!(s.is_churn(&rows[2]));
    assert!(s.is_loyal(&rows[3]));
    assert!(!s.is_loyal(&rows[4]));
    assert!(s.is_unsatisfied(&rows[4]), "score 2 is unsatisfied");
    assert!(!s.is_unsatisfied(&rows[0]));
}

#[test]
fn empty_selection_yields_zeros() {
    let full = decline_table();
    let window = WindowConfig::default();
    let empty = filter_months(&full, &MonthSelection::none());

    let m = customer_metrics(&empty, &SegmentThresholds::default());
    assert_eq!(m.total_customers, 0);
    for segment in Segment::ALL {
        assert_eq!(m.count(segment), 0);
        assert_eq!(m.rate(segment), 0.0);
    }

    let d = sales_decline(&full, &empty, &window);
    assert_eq!(d.total_sales_window, 0.0);
    assert!(approx(d.decline_amount, d.expected_sales));
    assert!(approx(d.decline_percent, 100.0));
}

#[test]
fn segmentation_remainder_never_negative() {
    let t = table(
        "\
C1,2023-09-05,15,10,Books,1,Pune
C2,2023-09-05,35,10,Books,4,Pune
",
    );
    let s = SegmentThresholds::default();
    let slices = segmentation(&customer_metrics(&t, &s), &s);

    let counts: Vec<usize> = slices.iter().map(|slice| slice.customers).collect();
    // churn=1 loyal=1 unsatisfied=1 over 2 customers
    assert_eq!(counts, [1, 1, 1, 0]);
    assert_eq!(slices[3].segment, "Other");
}

// ── Tests: sales decline ────────────────────────────────────────────────────

#[test]
fn decline_compares_window_with_scaled_baseline() {
    let full = decline_table();
    let window = WindowConfig::default();
    let selected = filter_months(&full, &MonthSelection::all(&window));
    let d = sales_decline(&full, &selected, &window);

    assert_eq!(d.previous_months, 2);
    assert!(approx(d.avg_prev_sales, 50.0));
    assert!(approx(d.expected_sales, 300.0));
    assert!(approx(d.total_sales_window, 250.0));
    assert!(approx(d.decline_amount, 50.0));
    assert!(approx(d.decline_percent, 50.0 / 300.0 * 100.0));
}

#[test]
fn baseline_ignores_the_month_filter() {
    let full = decline_table();
    let window = WindowConfig::default();
    let only_feb = MonthSelection::from_options(&window, &["February 2024"]).unwrap();
    let d = sales_decline(&full, &filter_months(&full, &only_feb), &window);

    assert!(approx(d.expected_sales, 300.0));
    assert!(approx(d.total_sales_window, 150.0));
    assert!(approx(d.decline_amount, 150.0));
}

#[test]
fn no_previous_period_gives_zero_percent() {
    let full = table("A,2023-09-05,12,100,Books,3,Pune\n");
    let window = WindowConfig::default();
    let d = sales_decline(&full, &full, &window);

    assert_eq!(d.previous_months, 0);
    assert_eq!(d.expected_sales, 0.0);
    assert!(approx(d.decline_amount, -100.0));
    assert_eq!(d.decline_percent, 0.0);
}

#[test]
fn pct_handles_zero_denominator() {
    assert_eq!(pct(5.0, 0.0), 0.0);
    assert_eq!(pct(1.0, 4.0), 25.0);
}

// ── Tests: time series ──────────────────────────────────────────────────────

#[test]
fn monthly_spend_is_chronological() {
    let totals = monthly_spend(&decline_table());
    let months: Vec<YearMonth> = totals.iter().map(|t| t.month).collect();
    assert_eq!(months, [ym(2023, 7), ym(2023, 8), ym(2023, 9), ym(2024, 2)]);
    assert_eq!(totals[3].total_spend, 150.0);
}

#[test]
fn behavior_labels_are_exclusive_per_visit() {
    let t = table(
        "\
C1,2023-09-05,5,10,Books,4,Pune
C2,2023-09-06,45,10,Books,4,Pune
C3,2023-09-07,25,10,Books,4,Pune
C4,2023-09-08,6,10,Books,4,Pune
C1,2023-10-05,40,10,Books,4,Pune
",
    );
    let counts = behavior_by_month(&t, &SegmentThresholds::default());
    let cells: Vec<(YearMonth, VisitBehavior, usize)> =
        counts.iter().map(|c| (c.month, c.behavior, c.customers)).collect();

    assert_eq!(
        cells,
        [
            (ym(2023, 9), VisitBehavior::Repeat, 2),
            (ym(2023, 9), VisitBehavior::Churn, 1),
            (ym(2023, 9), VisitBehavior::Other, 1),
            (ym(2023, 10), VisitBehavior::Churn, 1),
        ]
    );
}

#[test]
fn rates_over_time_are_metric_major() {
    let t = table(
        "\
C1,2023-09-05,15,10,Books,1,Pune
C1,2023-09-20,15,10,Books,1,Pune
C2,2023-09-05,45,10,Books,4,Pune
C2,2023-10-05,45,10,Books,4,Pune
",
    );
    let rates = rates_over_time(&t, &SegmentThresholds::default());

    assert_eq!(rates.len(), RateMetric::ALL.len() * 2);
    let order: Vec<(RateMetric, YearMonth)> = rates.iter().map(|r| (r.metric, r.month)).collect();
    assert_eq!(order[0], (RateMetric::RepeatRate, ym(2023, 9)));
    assert_eq!(order[1], (RateMetric::RepeatRate, ym(2023, 10)));
    assert_eq!(order[2], (RateMetric::ChurnRate, ym(2023, 9)));
    assert_eq!(order[7], (RateMetric::UnsatisfiedRate, ym(2023, 10)));

    // Flagged visits over distinct customers: C1 visits twice in September.
    assert_eq!(rates[0].rate, 100.0);
    assert_eq!(rates[1].rate, 0.0);
    assert_eq!(rates[2].rate, 50.0);
    assert_eq!(rates[3].rate, 100.0);
}

#[test]
fn rate_metric_serializes_with_column_names() {
    let json = serde_json::to_string(&RateMetric::ALL).unwrap();
    assert_eq!(json, r#"["Repeat_Rate","Churn_Rate","Loyal_Rate","Unsatisfied_Rate"]"#);
}

// ── Tests: groupings ────────────────────────────────────────────────────────

#[test]
fn category_sums_and_city_means() {
    let t = table(
        "\
C1,2023-09-05,5,10,Books,4,Pune
C2,2023-09-05,5,30,Books,4,Delhi
C3,2023-09-05,5,5,Beauty,4,Delhi
",
    );

    let sums = sum_by(&t, GroupKey::ProductCategory, NumericColumn::TotalSpend);
    let sums: Vec<(&str, f64)> = sums.iter().map(|g| (g.key.as_str(), g.value)).collect();
    assert_eq!(sums, [("Beauty", 5.0), ("Books", 40.0)]);

    let means = mean_by(&t, GroupKey::City, NumericColumn::TotalSpend);
    let means: Vec<(&str, f64)> = means.iter().map(|g| (g.key.as_str(), g.value)).collect();
    assert_eq!(means, [("Delhi", 17.5), ("Pune", 10.0)]);
}

#[test]
fn distribution_summary() {
    let t = table(
        "\
C1,2023-09-05,5,10,Books,1,Pune
C2,2023-09-05,5,20,Books,2,Pune
C3,2023-09-05,5,30,Books,3,Pune
C4,2023-09-05,5,40,Books,4,Pune
C5,2023-09-05,5,50,Books,5,Pune
",
    );
    let d = column_distribution(&t, NumericColumn::TotalSpend).unwrap();

    assert_eq!(d.count, 5);
    assert_eq!((d.min, d.q1, d.median, d.q3, d.max), (10.0, 20.0, 30.0, 40.0, 50.0));
    assert_eq!(d.mean, 30.0);
    assert!(column_distribution(&t, NumericColumn::BounceRate).is_none());
}
