use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use gd_mobility::OrsProfile;

#[derive(Debug, Parser)]
#[command(name = "geodata", version, about = "Preprocess GPS trajectory datasets and build mobility models")]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true, env = "GEODATA_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load and clean a Porto taxi CSV.
    Taxi(TaxiArgs),
    /// Load daily routes from Cabspotting, GeoLife or T-Drive files.
    Routes(RoutesArgs),
    /// Load DE4L sensor readings as fixed-length routes.
    De4l(De4lArgs),
    /// Build a mobility model from taxi trips.
    Mobility(MobilityArgs),
}

/// Row selection and cleaning flags shared by `taxi` and `mobility`.
#[derive(Debug, Args)]
pub struct TaxiInput {
    /// Taxi CSV file.
    #[arg(long)]
    pub input: PathBuf,

    /// Data rows to skip after the header.
    #[arg(long, conflicts_with = "start_date")]
    pub skip_rows: Option<usize>,

    /// Maximum number of data rows to read.
    #[arg(long, conflicts_with = "start_date")]
    pub n_rows: Option<usize>,

    /// First trip date to load (YYYY-MM-DD).
    #[arg(long, requires = "end_date")]
    pub start_date: Option<NaiveDate>,

    /// Last trip date to load (YYYY-MM-DD).
    #[arg(long, requires = "start_date")]
    pub end_date: Option<NaiveDate>,

    /// Drop trips faster than this anywhere along the route.
    #[arg(long, conflicts_with = "no_speed_filter")]
    pub max_speed_kmh: Option<f64>,

    /// Keep trips regardless of their speed.
    #[arg(long)]
    pub no_speed_filter: bool,

    /// Drop trips with fewer points.
    #[arg(long)]
    pub min_route_length: Option<usize>,

    /// Scale sample routes to the unit square.
    #[arg(long, overrides_with = "no_scale")]
    pub scale: bool,

    /// Keep sample routes unscaled.
    #[arg(long, overrides_with = "scale")]
    pub no_scale: bool,
}

impl TaxiInput {
    /// `Some` only when `--scale` or `--no-scale` was given; the last one wins.
    pub fn scale_override(&self) -> Option<bool> {
        match (self.scale, self.no_scale) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Debug, Args)]
pub struct TaxiArgs {
    #[command(flatten)]
    pub input: TaxiInput,

    /// Write one summary row per trip to this CSV file.
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum RouteKind {
    Cabspotting,
    Geolife,
    TDrive,
}

#[derive(Debug, Args)]
pub struct RoutesArgs {
    #[arg(long, value_enum)]
    pub kind: RouteKind,

    /// Maximum rows read per file.
    #[arg(long)]
    pub limit: Option<usize>,

    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Args)]
pub struct De4lArgs {
    /// JSON-lines file.
    #[arg(long)]
    pub input: PathBuf,

    /// Points per route.
    #[arg(long, default_value_t = 20)]
    pub route_len: usize,

    /// Maximum readings to load.
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct MobilityArgs {
    /// SQLite database holding the model; created if missing.
    #[arg(long)]
    pub db: PathBuf,

    #[command(flatten)]
    pub input: TaxiInput,

    /// Write `transitions.csv` and `locations.csv` here afterwards.
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    #[arg(long)]
    pub nominatim_url: Option<String>,

    #[arg(long)]
    pub ors_url: Option<String>,

    #[arg(long)]
    pub ors_profile: Option<OrsProfile>,
}
