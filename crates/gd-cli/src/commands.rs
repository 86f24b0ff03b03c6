//! Subcommand implementations.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use gd_datasets::{
    CabspottingDataset, DailyRoute, Dataset, De4lSensorDataset, GeoLifeDataset, TDriveDataset, TaxiDataset,
    TaxiOptions, TaxiTrip,
};
use gd_mobility::export::persist_csv;
use gd_mobility::{MobilityModel, MobilityStore, NominatimClient, OpenRouteServiceClient};

use crate::cli::{Cli, Command, De4lArgs, MobilityArgs, RouteKind, RoutesArgs, TaxiArgs, TaxiInput};
use crate::config::GeodataConfig;

pub fn run(cli: Cli) -> Result<()> {
    let config = GeodataConfig::load(cli.config.as_deref())?;
    match cli.command {
        Command::Taxi(args) => taxi(&config, args),
        Command::Routes(args) => routes(args),
        Command::De4l(args) => de4l(args),
        Command::Mobility(args) => mobility(&config, args),
    }
}

// ── taxi ──────────────────────────────────────────────────────────────────────

pub(crate) fn taxi_options(config: &GeodataConfig, input: &TaxiInput) -> TaxiOptions {
    let mut options = config.taxi_options();
    if input.no_speed_filter {
        options.max_allowed_speed_kmh = None;
    } else if let Some(kmh) = input.max_speed_kmh {
        options.max_allowed_speed_kmh = Some(kmh);
    }
    if let Some(len) = input.min_route_length {
        options.min_route_length = len;
    }
    if let Some(scale) = input.scale_override() {
        options.scale = scale;
    }
    options
}

fn load_taxi(config: &GeodataConfig, input: &TaxiInput) -> Result<TaxiDataset> {
    let options = taxi_options(config, input);
    let dataset = match (input.start_date, input.end_date) {
        (Some(start), Some(end)) => TaxiDataset::create_from_csv_within_time_range(&input.input, start, end, options),
        _ => TaxiDataset::create_from_csv(&input.input, input.skip_rows, input.n_rows, options),
    }
    .with_context(|| format!("loading taxi trips from {}", input.input.display()))?;
    Ok(dataset)
}

#[derive(Serialize)]
struct TripSummaryRow<'a> {
    trip_id:       &'a str,
    taxi_id:       u64,
    start:         String,
    points:        usize,
    max_speed_kmh: f64,
}

pub(crate) fn write_trip_summary<W: Write>(trips: &[TaxiTrip], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for trip in trips {
        csv_writer.serialize(TripSummaryRow {
            trip_id:       &trip.record.trip_id,
            taxi_id:       trip.record.taxi_id,
            start:         trip.start.to_rfc3339(),
            points:        trip.route.len(),
            max_speed_kmh: trip.max_speed_kmh()?,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn taxi(config: &GeodataConfig, args: TaxiArgs) -> Result<()> {
    let dataset = load_taxi(config, &args.input)?;
    let points: usize = dataset.trips().iter().map(|t| t.route.len()).sum();
    info!(
        trips = dataset.len(),
        points,
        max_route_len = dataset.max_route_len(),
        bounds = ?dataset.location_bounds().as_tuple(),
        "taxi dataset loaded"
    );

    if let Some(path) = args.summary {
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        write_trip_summary(dataset.trips(), file)?;
        info!(path = %path.display(), "trip summary written");
    }
    Ok(())
}

// ── routes ────────────────────────────────────────────────────────────────────

fn routes(args: RoutesArgs) -> Result<()> {
    let daily: Vec<DailyRoute> = match args.kind {
        RouteKind::Cabspotting => CabspottingDataset::create_from_txt(&args.files, args.limit)?.routes().to_vec(),
        RouteKind::Geolife => GeoLifeDataset::create_from_txt(&args.files, args.limit)?.routes().to_vec(),
        RouteKind::TDrive => TDriveDataset::create_from_txt(&args.files, args.limit)?.routes().to_vec(),
    };
    let points: usize = daily.iter().map(|r| r.route.len()).sum();
    info!(kind = ?args.kind, files = args.files.len(), routes = daily.len(), points, "daily routes loaded");
    Ok(())
}

// ── de4l ──────────────────────────────────────────────────────────────────────

fn de4l(args: De4lArgs) -> Result<()> {
    let dataset = De4lSensorDataset::create_from_json(&args.input, args.route_len, args.limit)
        .with_context(|| format!("loading sensor readings from {}", args.input.display()))?;
    info!(
        readings = dataset.point_count(),
        route_len = dataset.route_len(),
        samples = dataset.len(),
        "de4l dataset loaded"
    );
    Ok(())
}

// ── mobility ──────────────────────────────────────────────────────────────────

fn mobility(config: &GeodataConfig, args: MobilityArgs) -> Result<()> {
    let dataset = load_taxi(config, &args.input)?;

    let services = &config.services;
    let nominatim_url = args.nominatim_url.as_deref().unwrap_or(&services.nominatim_url);
    let ors_url = args.ors_url.as_deref().unwrap_or(&services.ors_url);
    let profile = args.ors_profile.unwrap_or(services.ors_profile);

    let store = MobilityStore::open(&args.db).with_context(|| format!("opening {}", args.db.display()))?;
    let geocoder = NominatimClient::new(nominatim_url)?;
    let directions = OpenRouteServiceClient::new(ors_url, profile)?;
    info!(nominatim = geocoder.base_url(), ors = ors_url, %profile, trips = dataset.len(), "building mobility model");

    let mut model = MobilityModel::new(store, geocoder, directions);
    model.calculate(dataset.trips().iter().map(|t| (t.start, &t.route)))?;

    if let Some(dir) = args.export_dir {
        export(model.store(), &dir)?;
    }
    Ok(())
}

fn export(store: &MobilityStore, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let transitions = dir.join("transitions.csv");
    let locations = dir.join("locations.csv");
    persist_csv(store, &transitions, &locations)?;
    info!(dir = %dir.display(), "mobility model exported");
    Ok(())
}
