//! Optional TOML configuration.
//!
//! ```toml
//! [taxi]
//! max_allowed_speed_kmh = 60.0   # 0 disables the speed filter
//! min_route_length      = 1
//! scale                 = false
//!
//! [services]
//! nominatim_url = "localhost:8080"
//! ors_url       = "localhost:8008/ors"
//! ors_profile   = "driving-car"
//! ```
//!
//! Every key is optional; command-line flags override the file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use gd_datasets::TaxiOptions;
use gd_mobility::OrsProfile;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeodataConfig {
    pub taxi:     TaxiConfig,
    pub services: ServicesConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaxiConfig {
    /// `None`, zero or negative disables the speed filter.
    pub max_allowed_speed_kmh: Option<f64>,
    pub min_route_length:      usize,
    pub scale:                 bool,
}

impl Default for TaxiConfig {
    fn default() -> Self {
        Self { max_allowed_speed_kmh: Some(60.0), min_route_length: 1, scale: false }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServicesConfig {
    pub nominatim_url: String,
    pub ors_url:       String,
    pub ors_profile:   OrsProfile,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            nominatim_url: "localhost:8080".to_string(),
            ors_url:       "localhost:8008/ors".to_string(),
            ors_profile:   OrsProfile::DrivingCar,
        }
    }
}

impl GeodataConfig {
    /// Read `path`, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn taxi_options(&self) -> TaxiOptions {
        TaxiOptions {
            scale: self.taxi.scale,
            location_bounds: None,
            max_allowed_speed_kmh: self.taxi.max_allowed_speed_kmh.filter(|kmh| *kmh > 0.0),
            min_route_length: self.taxi.min_route_length,
        }
    }
}
