//! `gd-datasets` — loaders and preprocessing for mobility datasets.
//!
//! | Module          | Source                                        | Item type       |
//! |-----------------|-----------------------------------------------|-----------------|
//! | [`taxi`]        | Porto Taxi Service Trajectory (CSV)           | [`RouteSample`] |
//! | [`de4l`]        | DE4L sensor readings (JSON lines)             | [`RouteSample`] |
//! | [`cabspotting`] | Cabspotting San Francisco (space-separated)   | `TimedRoute`    |
//! | [`geolife`]     | GeoLife (`.plt`)                              | `TimedRoute`    |
//! | [`t_drive`]     | T-Drive Beijing (CSV)                         | `TimedRoute`    |
//!
//! Every dataset implements [`Dataset`].  Trajectory datasets build one
//! route per entity per UTC day through [`DailyRouteBuilder`].  All routes
//! handed out are in radians.
//!
//! # Usage
//!
//! ```rust,ignore
//! use gd_datasets::{Dataset, TaxiDataset, TaxiOptions};
//!
//! let options = TaxiOptions { max_allowed_speed_kmh: Some(60.0), ..Default::default() };
//! let data = TaxiDataset::create_from_csv(Path::new("train.csv"), None, Some(1_000), options)?;
//! for sample in data.iter() {
//!     let sample = sample?;
//!     // feed sample.route_scaled_padded to a model
//! }
//! ```

pub mod cabspotting;
pub mod dataset;
pub mod de4l;
pub mod error;
pub mod geolife;
pub mod grouping;
pub mod t_drive;
pub mod taxi;

#[cfg(test)]
mod tests;

pub use cabspotting::{CabspottingDataset, CabspottingRecord};
pub use dataset::{Dataset, DatasetIter, RouteSample};
pub use de4l::{De4lLocation, De4lRecord, De4lSensorDataset};
pub use error::{DatasetError, DatasetResult};
pub use geolife::GeoLifeDataset;
pub use grouping::{DailyRoute, DailyRouteBuilder};
pub use t_drive::TDriveDataset;
pub use taxi::{TaxiDataset, TaxiOptions, TaxiRecord, TaxiTrip};
