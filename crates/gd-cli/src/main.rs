//! `geodata` — command-line front end for the geodata workspace.
//!
//! ```bash
//! geodata taxi --input train.csv --n-rows 10000 --summary trips.csv
//! geodata taxi --input train.csv --start-date 2013-07-01 --end-date 2013-07-07
//! geodata routes --kind geolife Data/000/Trajectory/*.plt
//! geodata de4l --input sensors.json --route-len 20
//! geodata mobility --db model.db --input train.csv --n-rows 100 --export-dir out/
//! ```
//!
//! Logging is controlled by `RUST_LOG`; `GEODATA_LOG_FORMAT=json` switches
//! to JSON lines.

mod cli;
mod commands;
mod config;


use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let log_format = std::env::var("GEODATA_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "geodata=info,gd_=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if let Err(e) = commands::run(cli) {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}
