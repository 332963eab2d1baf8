//! dash-runner: headless runner for the sales-decline dashboard.
//!
//! Usage:
//!   dash-runner --data e-commerce.csv
//!   dash-runner --data e-commerce.csv --months 2023-12,2024-01
//!   dash-runner --synthesize 500 --seed 7 --data sample.csv
//!   dash-runner --data e-commerce.csv --ipc-mode

use anyhow::{bail, Result};
use salesdash_core::{
    command::{CommandOutcome, DashboardSession, ViewCommand},
    config::DashConfig,
    engine::{Dashboard, DashboardReport},
    filter::{MonthSelection, ViewFilters},
    synth::{self, SyntheticConfig},
};
use std::env;
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};

const DEFAULT_DATA: &str = "e-commerce.csv";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let data = value_arg(&args, "--data").unwrap_or(DEFAULT_DATA);
    let seed = parse_arg(&args, "--seed", 42u64);

    let config = match value_arg(&args, "--config") {
        Some(path) => DashConfig::load(path)?,
        None => DashConfig::default(),
    };

    if let Some(customers) = synthesize_request(&args)? {
        let sample = SyntheticConfig { customers, ..SyntheticConfig::default() };
        let rows = synth::generate(seed, &sample);
        synth::write_csv(&rows, BufWriter::new(File::create(data)?))?;
        if !ipc_mode {
            println!("wrote {} synthetic rows to {data}", rows.len());
        }
    }

    let dashboard = Dashboard::open(data, config)?;

    if ipc_mode {
        run_ipc_loop(DashboardSession::new(dashboard))?;
    } else {
        let mut filters = dashboard.default_filters();
        if let Some(months) = value_arg(&args, "--months") {
            let options: Vec<&str> = months.split(',').filter(|m| !m.trim().is_empty()).collect();
            let selection = MonthSelection::from_options(&dashboard.config().window, &options)?;
            filters = ViewFilters {
                overview:     selection.clone(),
                sales:        selection.clone(),
                customer_geo: selection,
            };
        }
        print_summary(data, &dashboard.render(&filters));
    }

    Ok(())
}

fn run_ipc_loop(mut session: DashboardSession) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: ViewCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        match session.apply(&cmd) {
            Ok(CommandOutcome::Quit) => break,
            Ok(CommandOutcome::Report(report)) => {
                writeln!(stdout, "{}", serde_json::to_string(&report)?)?;
            }
            Err(e) => {
                log::warn!("command rejected: {e}");
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn print_summary(data: &str, report: &DashboardReport) {
    let overview = &report.overview;
    let c = &overview.customers;
    let d = &overview.decline;

    println!("=== SALES DASHBOARD ===");
    println!("  data:              {data}");
    println!(
        "  months:            {}",
        overview
            .selected_months
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  rows selected:     {}", overview.rows_selected);
    println!("  total sales (all): ${:.2}", overview.total_sales_all_time);
    println!("  customers:         {}", c.total_customers);
    println!("  repeat:            {:.2}%", c.repeat_rate);
    println!("  churn risk:        {:.2}%", c.churn_rate);
    println!("  loyal:             {:.2}%", c.loyal_rate);
    println!("  unsatisfied:       {:.2}%", c.unsatisfied_rate);
    println!(
        "  decline (window):  -${:.2} (-{:.2}%) vs expected ${:.2}",
        d.decline_amount, d.decline_percent, d.expected_sales
    );

    println!();
    println!("=== MONTHLY SALES ===");
    if report.sales.trend_all.data.is_empty() {
        println!("  (no visits)");
    }
    for point in &report.sales.trend_all.data {
        let in_window = report.month_options.iter().any(|m| m.key == point.month);
        let marker = if in_window { "*" } else { " " };
        println!("  {}{} ${:>12.2}", point.month, marker, point.total_spend);
    }

    println!();
    println!("=== CLIP BOUNDS ===");
    for b in &report.clip_bounds {
        println!("  {:<22} [{:.2}, {:.2}]", b.column.header(), b.lower, b.upper);
    }
}

/// Customer count for `--synthesize`, if given.
///
/// The generated file replaces whatever sits at `--data`, so the output path
/// must be named explicitly.
fn synthesize_request(args: &[String]) -> Result<Option<usize>> {
    if !args.iter().any(|a| a == "--synthesize") {
        return Ok(None);
    }
    let raw = value_arg(args, "--synthesize")
        .ok_or_else(|| anyhow::anyhow!("--synthesize needs a customer count"))?;
    let customers: usize = raw
        .parse()
        .map_err(|_| anyhow::anyhow!("--synthesize expects a customer count, got '{raw}'"))?;
    if value_arg(args, "--data").is_none() {
        bail!("--synthesize needs an explicit --data output path");
    }
    Ok(Some(customers))
}

fn value_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    value_arg(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
