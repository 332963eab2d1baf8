//! Sales-decline dashboard core.
//!
//! Loads the e-commerce visit file, clips outliers once over the whole
//! table, and computes the metrics and chart series for the overview,
//! sales and customer/geo views. Rendering is left to the caller.

pub mod cache;
pub mod clip;
pub mod command;
pub mod config;
pub mod customer_geo_view;
pub mod engine;
pub mod error;
pub mod filter;
pub mod loader;
pub mod metrics;
pub mod overview_view;
pub mod rng;
pub mod sales_view;
pub mod segment;
pub mod synth;
pub mod table;
pub mod types;
pub mod view;
