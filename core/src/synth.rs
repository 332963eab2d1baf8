//! Deterministic synthetic visit data.
//!
//! Produces two years of visits ending with the recent window, in the same
//! column layout as the real file, so the runner and the tests can work
//! without it. Spend in the recent window is damped to give the decline
//! metrics something to show. Same seed, same rows.

use crate::{
    error::DashResult,
    loader::RawVisitRow,
    rng::{SampleRng, SampleStream},
    types::YearMonth,
};
use chrono::Duration;
use std::io::Write;

const CATEGORIES: [&str; 6] = [
    "Electronics",
    "Clothing",
    "Home & Kitchen",
    "Beauty",
    "Sports",
    "Books",
];

const CITIES: [(&str, &str); 8] = [
    ("Mumbai", "Tier 1"),
    ("Delhi", "Tier 1"),
    ("Bengaluru", "Tier 1"),
    ("Pune", "Tier 2"),
    ("Jaipur", "Tier 2"),
    ("Lucknow", "Tier 2"),
    ("Nashik", "Tier 3"),
    ("Udaipur", "Tier 3"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    pub customers:         usize,
    pub first_month:       YearMonth,
    pub months:            u32,
    /// Months at the end of the range whose visit rate and spend are damped.
    pub recent_months:     u32,
    pub visit_probability: f64,
    pub recent_damping:    f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            customers:         500,
            first_month:       YearMonth { year: 2022, month: 3 },
            months:            24,
            recent_months:     6,
            visit_probability: 0.45,
            recent_damping:    0.75,
        }
    }
}

struct CustomerProfile {
    customer_id:       String,
    city:              &'static str,
    city_type:         &'static str,
    favorite:          &'static str,
    spend_scale:       f64,
    base_satisfaction: u64,
}

/// Generate rows for `config`, seeded by `seed`.
pub fn generate(seed: u64, config: &SyntheticConfig) -> Vec<RawVisitRow> {
    let mut customer_rng = SampleStream::Customers.rng(seed);
    let mut visit_rng = SampleStream::Visits.rng(seed);

    let profiles: Vec<CustomerProfile> = (0..config.customers)
        .map(|i| {
            let &(city, city_type) = customer_rng.pick(&CITIES);
            CustomerProfile {
                customer_id:       format!("C{:05}", i + 1),
                city,
                city_type,
                favorite:          *customer_rng.pick(&CATEGORIES),
                spend_scale:       customer_rng.float_between(0.6, 1.6),
                base_satisfaction: customer_rng.int_between(1, 5),
            }
        })
        .collect();

    let recent_start = config.months.saturating_sub(config.recent_months);
    let mut rows = Vec::new();
    for offset in 0..config.months {
        let month = config.first_month.plus_months(offset);
        let Some(first_day) = month.first_day() else { continue };
        let recent = offset >= recent_start;
        let (p_visit, damping) = if recent {
            (config.visit_probability * config.recent_damping, config.recent_damping)
        } else {
            (config.visit_probability, 1.0)
        };

        for profile in &profiles {
            if !visit_rng.chance(p_visit) {
                continue;
            }
            let day = visit_rng.next_u64_below(28) as i64;
            let visit_date = (first_day + Duration::days(day)).format("%Y-%m-%d").to_string();
            rows.push(visit_row(&mut visit_rng, profile, visit_date, recent, damping));
        }
    }

    log::info!("synthesized {} visit rows for {} customers", rows.len(), config.customers);
    rows
}

fn visit_row(
    rng: &mut SampleRng,
    profile: &CustomerProfile,
    visit_date: String,
    recent: bool,
    damping: f64,
) -> RawVisitRow {
    let category = if rng.chance(0.6) { profile.favorite } else { *rng.pick(&CATEGORIES) };
    let days_since_last_visit = if recent {
        rng.int_between(1, 60)
    } else {
        rng.int_between(1, 40)
    };
    let satisfaction_jitter = rng.int_between(0, 2) as i64 - 1;
    let satisfaction = (profile.base_satisfaction as i64 + satisfaction_jitter).clamp(1, 5);
    let num_items = rng.int_between(1, 8);
    let raw_spend = rng.pareto(15.0, 2.2) * num_items as f64 * profile.spend_scale * damping;
    let spend = cents(raw_spend);
    let conversion_base = match profile.city_type {
        "Tier 1" => 4.5,
        "Tier 2" => 3.5,
        _ => 2.5,
    };

    RawVisitRow {
        customer_id:           profile.customer_id.clone(),
        visit_date,
        days_since_last_visit: days_since_last_visit as f64,
        total_spend:           spend,
        product_category:      category.to_string(),
        product_satisfaction:  satisfaction as f64,
        conversion_rate:       Some(cents(conversion_base + rng.float_between(-2.0, 2.0))),
        bounce_rate:           Some(cents(rng.float_between(20.0, 70.0))),
        city:                  profile.city.to_string(),
        city_type:             Some(profile.city_type.to_string()),
        num_items:             Some(num_items as f64),
    }
}

fn cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Write rows as CSV with the input-file header.
pub fn write_csv<W: Write>(rows: &[RawVisitRow], writer: W) -> DashResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
