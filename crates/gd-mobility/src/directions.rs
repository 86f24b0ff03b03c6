//! Shortest-route lookups between two points.
//!
//! [`OpenRouteServiceClient`] asks an openrouteservice instance;
//! [`shortest_route_details`] wraps any provider and fills in whatever it
//! cannot deliver from the straight-line connection.

use std::fmt;
use std::str::FromStr;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use gd_core::{CoordinatesUnit, GeoReferenceSystem, Point, Route, distance};

use crate::http::{build_client, normalize_base_url};
use crate::{MobilityError, MobilityResult};

/// Speed assumed for durations the router did not provide.
pub const DEFAULT_AVG_SPEED_KMH: f64 = 45.0;

/// Mode of transport used by openrouteservice.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrsProfile {
    #[default]
    DrivingCar,
    DrivingHgv,
    FootWalking,
    FootHiking,
    CyclingRegular,
    CyclingRoad,
    CyclingMountain,
    CyclingElectric,
}

impl OrsProfile {
    pub const ALL: [OrsProfile; 8] = [
        OrsProfile::DrivingCar,
        OrsProfile::DrivingHgv,
        OrsProfile::FootWalking,
        OrsProfile::FootHiking,
        OrsProfile::CyclingRegular,
        OrsProfile::CyclingRoad,
        OrsProfile::CyclingMountain,
        OrsProfile::CyclingElectric,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrsProfile::DrivingCar => "driving-car",
            OrsProfile::DrivingHgv => "driving-hgv",
            OrsProfile::FootWalking => "foot-walking",
            OrsProfile::FootHiking => "foot-hiking",
            OrsProfile::CyclingRegular => "cycling-regular",
            OrsProfile::CyclingRoad => "cycling-road",
            OrsProfile::CyclingMountain => "cycling-mountain",
            OrsProfile::CyclingElectric => "cycling-electric",
        }
    }
}

impl fmt::Display for OrsProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrsProfile {
    type Err = MobilityError;

    fn from_str(s: &str) -> MobilityResult<Self> {
        let s = s.trim();
        OrsProfile::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| MobilityError::UnknownProfile(s.to_string()))
    }
}

/// What a router reports for one origin/destination pair.
#[derive(Clone, Debug, PartialEq)]
pub struct Directions {
    pub distance_m: Option<f64>,
    pub duration_s: Option<f64>,
    /// `LatLon` degrees.
    pub geometry:   Route,
}

pub trait DirectionsProvider {
    fn directions(&self, from: &Point, to: &Point) -> MobilityResult<Directions>;
}

// ── openrouteservice ──────────────────────────────────────────────────────────

pub struct OpenRouteServiceClient {
    http:     Client,
    base_url: String,
    profile:  OrsProfile,
}

impl OpenRouteServiceClient {
    /// `base_url` is e.g. `localhost:8008/ors`.
    pub fn new(base_url: &str, profile: OrsProfile) -> MobilityResult<Self> {
        Ok(Self::with_client(build_client()?, base_url, profile))
    }

    pub fn with_client(http: Client, base_url: &str, profile: OrsProfile) -> Self {
        Self { http, base_url: normalize_base_url(base_url), profile }
    }

    pub fn profile(&self) -> OrsProfile {
        self.profile
    }

    fn endpoint(&self) -> String {
        format!("{}/v2/directions/{}/geojson", self.base_url, self.profile)
    }
}

impl DirectionsProvider for OpenRouteServiceClient {
    fn directions(&self, from: &Point, to: &Point) -> MobilityResult<Directions> {
        let (from, to) = (from.to_degrees()?, to.to_degrees()?);
        let body = json!({ "coordinates": [from.coordinates(), to.coordinates()] });
        let response: Value = self
            .http
            .post(self.endpoint())
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;
        directions_from_geojson(&response)
    }
}

/// Read the first feature of an openrouteservice GeoJSON response.
pub(crate) fn directions_from_geojson(response: &Value) -> MobilityResult<Directions> {
    let feature = response
        .pointer("/features/0")
        .ok_or_else(|| MobilityError::BadResponse("directions response has no features".to_string()))?;

    let summary = feature.pointer("/properties/summary");
    let summary_value = |key: &str| summary.and_then(|s| s.get(key)).and_then(Value::as_f64);

    let coordinates = feature
        .pointer("/geometry/coordinates")
        .and_then(Value::as_array)
        .ok_or_else(|| MobilityError::BadResponse("directions feature has no geometry".to_string()))?;
    let rows = coordinates
        .iter()
        .map(|c| match (c.get(0).and_then(Value::as_f64), c.get(1).and_then(Value::as_f64)) {
            (Some(lon), Some(lat)) => Ok([lon, lat]),
            _ => Err(MobilityError::BadResponse(format!("invalid geometry coordinate {c}"))),
        })
        .collect::<MobilityResult<Vec<_>>>()?;

    Ok(Directions {
        distance_m: summary_value("distance"),
        duration_s: summary_value("duration"),
        geometry:   Route::from_rows_with_units(&rows, GeoReferenceSystem::LatLon, CoordinatesUnit::Degrees)?,
    })
}

// ── Route details with fallback ───────────────────────────────────────────────

/// Distance, duration, and path of the shortest route between two points.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteDetails {
    pub distance_m: f64,
    pub duration_s: f64,
    /// In the coordinates unit of the origin.
    pub geometry:   Route,
}

fn fallback_duration_s(distance_m: f64) -> f64 {
    distance_m / (DEFAULT_AVG_SPEED_KMH * 1_000.0 / 3_600.0)
}

/// Ask `provider` for directions from `from` to `to`.
///
/// If the provider fails, the route is the direct connection: its distance
/// is the great-circle distance and its duration assumes
/// [`DEFAULT_AVG_SPEED_KMH`].  A missing distance or duration is filled in
/// the same way.
pub fn shortest_route_details<D>(provider: &D, from: &Point, to: &Point) -> MobilityResult<RouteDetails>
where
    D: DirectionsProvider + ?Sized,
{
    let (distance_m, duration_s, geometry) = match provider.directions(from, to) {
        Ok(directions) => {
            let distance_m = match directions.distance_m {
                Some(m) => m,
                None => {
                    debug!(%from, %to, "no distance in directions, using direct connection");
                    distance(from, to)?
                }
            };
            let duration_s = match directions.duration_s {
                Some(s) => s,
                None => {
                    debug!(%from, %to, speed_kmh = DEFAULT_AVG_SPEED_KMH, "no duration in directions, assuming average speed");
                    fallback_duration_s(distance_m)
                }
            };
            (distance_m, duration_s, directions.geometry)
        }
        Err(e) => {
            warn!(
                %from, %to, error = %e, speed_kmh = DEFAULT_AVG_SPEED_KMH,
                "route could not be calculated, using direct connection"
            );
            let distance_m = distance(from, to)?;
            let geometry = Route::from_points(vec![from.to_degrees()?, to.to_degrees()?])?;
            (distance_m, fallback_duration_s(distance_m), geometry)
        }
    };

    let geometry = match from.coordinates_unit() {
        CoordinatesUnit::Radians => geometry.to_radians()?,
        CoordinatesUnit::Degrees => geometry,
    };
    Ok(RouteDetails { distance_m, duration_s, geometry })
}
