//! Geographic point type and great-circle utilities.
//!
//! A `Point` stores `f64` coordinates plus two tags: the geo reference system
//! (`LatLon` on the sphere, or a `Cartesian` Mercator plane in kilometres)
//! and, for `LatLon`, the coordinates unit.  Unless stated otherwise the
//! x-coordinate is longitude and the y-coordinate is latitude.
//!
//! Formulas follow the "Destination point" and "Bearing" sections of
//! <http://www.movable-type.co.uk/scripts/latlong.html>.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::{GeoError, GeoResult};

/// Earth radius used for destination-point and Mercator calculations, metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Mean Earth radius used for haversine distances, metres.
pub const HAVERSINE_RADIUS_M: f64 = 6_371_008.8;

const MERCATOR_RADIUS_KM: f64 = EARTH_RADIUS_M / 1_000.0;

// ── GeoReferenceSystem ────────────────────────────────────────────────────────

/// The coordinate space a point lives in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum GeoReferenceSystem {
    /// Longitude / latitude on the Earth's surface.
    #[default]
    LatLon,
    /// Euclidean plane (Mercator projection, kilometres).
    Cartesian,
}

impl fmt::Display for GeoReferenceSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GeoReferenceSystem::LatLon    => "latlon",
            GeoReferenceSystem::Cartesian => "cartesian",
        })
    }
}

impl FromStr for GeoReferenceSystem {
    type Err = GeoError;

    fn from_str(s: &str) -> GeoResult<Self> {
        match s.trim() {
            "latlon"    => Ok(GeoReferenceSystem::LatLon),
            "cartesian" => Ok(GeoReferenceSystem::Cartesian),
            other => Err(GeoError::Parse(format!(
                "geo reference system can only be 'latlon' or 'cartesian', got {other:?}"
            ))),
        }
    }
}

// ── CoordinatesUnit ───────────────────────────────────────────────────────────

/// Angular unit of `LatLon` coordinates.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CoordinatesUnit {
    #[default]
    Radians,
    Degrees,
}

impl fmt::Display for CoordinatesUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CoordinatesUnit::Radians => "radians",
            CoordinatesUnit::Degrees => "degrees",
        })
    }
}

impl FromStr for CoordinatesUnit {
    type Err = GeoError;

    fn from_str(s: &str) -> GeoResult<Self> {
        match s.trim() {
            "radians" => Ok(CoordinatesUnit::Radians),
            "degrees" => Ok(CoordinatesUnit::Degrees),
            other => Err(GeoError::Parse(format!(
                "coordinates unit can only be 'radians' or 'degrees', got {other:?}"
            ))),
        }
    }
}

// ── Point ─────────────────────────────────────────────────────────────────────

/// A geographical location.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    x_lon: f64,
    y_lat: f64,
    geo_reference_system: GeoReferenceSystem,
    coordinates_unit: CoordinatesUnit,
}

impl Default for Point {
    /// The radians `LatLon` origin.
    fn default() -> Self {
        Self {
            x_lon: 0.0,
            y_lat: 0.0,
            geo_reference_system: GeoReferenceSystem::default(),
            coordinates_unit: CoordinatesUnit::default(),
        }
    }
}

impl Point {
    /// A `LatLon` point in radians.
    pub fn new(x_lon: f64, y_lat: f64) -> GeoResult<Self> {
        Self::with_units(x_lon, y_lat, GeoReferenceSystem::LatLon, CoordinatesUnit::Radians)
    }

    /// A `LatLon` point in degrees.
    pub fn degrees(lon: f64, lat: f64) -> GeoResult<Self> {
        Self::with_units(lon, lat, GeoReferenceSystem::LatLon, CoordinatesUnit::Degrees)
    }

    /// A point on the Cartesian plane.
    pub fn cartesian(x: f64, y: f64) -> GeoResult<Self> {
        Self::with_units(x, y, GeoReferenceSystem::Cartesian, CoordinatesUnit::Radians)
    }

    pub fn with_units(
        x_lon: f64,
        y_lat: f64,
        geo_reference_system: GeoReferenceSystem,
        coordinates_unit: CoordinatesUnit,
    ) -> GeoResult<Self> {
        Ok(Self {
            x_lon: check_finite(x_lon)?,
            y_lat: check_finite(y_lat)?,
            geo_reference_system,
            coordinates_unit,
        })
    }

    /// The origin in the same reference system and unit as `self`.
    #[inline]
    pub(crate) fn zero_like(&self) -> Self {
        Self { x_lon: 0.0, y_lat: 0.0, ..*self }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn x_lon(&self) -> f64 {
        self.x_lon
    }

    #[inline]
    pub fn y_lat(&self) -> f64 {
        self.y_lat
    }

    /// Fails with `InvalidCoordinate` for NaN or infinite values.
    pub fn set_x_lon(&mut self, value: f64) -> GeoResult<()> {
        self.x_lon = check_finite(value)?;
        Ok(())
    }

    /// Fails with `InvalidCoordinate` for NaN or infinite values.
    pub fn set_y_lat(&mut self, value: f64) -> GeoResult<()> {
        self.y_lat = check_finite(value)?;
        Ok(())
    }

    /// Overwrite both coordinates.  Callers pass values derived from finite
    /// coordinates.
    #[inline]
    pub(crate) fn set_coordinates_unchecked(&mut self, x_lon: f64, y_lat: f64) {
        self.x_lon = x_lon;
        self.y_lat = y_lat;
    }

    /// `[x, y]`: the row layout used by feature matrices.
    #[inline]
    pub fn coordinates(&self) -> [f64; 2] {
        [self.x_lon, self.y_lat]
    }

    #[inline]
    pub fn geo_reference_system(&self) -> GeoReferenceSystem {
        self.geo_reference_system
    }

    /// Re-tag the reference system without touching the coordinates.
    pub fn set_geo_reference_system(&mut self, value: GeoReferenceSystem) {
        self.geo_reference_system = value;
    }

    #[inline]
    pub fn coordinates_unit(&self) -> CoordinatesUnit {
        self.coordinates_unit
    }

    /// Re-tag the unit without touching the coordinates.
    pub fn set_coordinates_unit(&mut self, value: CoordinatesUnit) {
        self.coordinates_unit = value;
    }

    #[inline]
    pub fn is_latlon(&self) -> bool {
        self.geo_reference_system == GeoReferenceSystem::LatLon
    }

    // ── Unit conversion ───────────────────────────────────────────────────

    fn convert_unit(&mut self, target: CoordinatesUnit, warn_if_noop: bool) -> GeoResult<()> {
        if !self.is_latlon() {
            return Err(GeoError::NotLatLon);
        }
        if self.coordinates_unit == target {
            if warn_if_noop {
                warn!("coordinates unit is already '{target}'");
            }
            return Ok(());
        }
        match target {
            CoordinatesUnit::Degrees => {
                self.x_lon = self.x_lon.to_degrees();
                self.y_lat = self.y_lat.to_degrees();
            }
            CoordinatesUnit::Radians => {
                self.x_lon = self.x_lon.to_radians();
                self.y_lat = self.y_lat.to_radians();
            }
        }
        self.coordinates_unit = target;
        Ok(())
    }

    /// Convert in place to degrees.  Warns if already in degrees.
    pub fn convert_to_degrees(&mut self) -> GeoResult<()> {
        self.convert_unit(CoordinatesUnit::Degrees, true)
    }

    /// Convert in place to radians.  Warns if already in radians.
    pub fn convert_to_radians(&mut self) -> GeoResult<()> {
        self.convert_unit(CoordinatesUnit::Radians, true)
    }

    /// A copy of this point in degrees.
    pub fn to_degrees(&self) -> GeoResult<Point> {
        let mut copy = *self;
        copy.convert_unit(CoordinatesUnit::Degrees, false)?;
        Ok(copy)
    }

    /// A copy of this point in radians.
    pub fn to_radians(&self) -> GeoResult<Point> {
        let mut copy = *self;
        copy.convert_unit(CoordinatesUnit::Radians, false)?;
        Ok(copy)
    }

    /// `(lon, lat)` in radians.  Caller guarantees `LatLon`.
    fn radians_lon_lat(&self) -> (f64, f64) {
        match self.coordinates_unit {
            CoordinatesUnit::Radians => (self.x_lon, self.y_lat),
            CoordinatesUnit::Degrees => (self.x_lon.to_radians(), self.y_lat.to_radians()),
        }
    }

    // ── Vector addition ───────────────────────────────────────────────────

    /// Move this point `distance_m` metres along `bearing_rad` on a great
    /// circle.  The coordinates unit of the point is preserved and the
    /// resulting longitude lies in [-π, π) (radians) or [-180, 180) (degrees).
    pub fn add_vector_mut(&mut self, distance_m: f64, bearing_rad: f64) -> GeoResult<()> {
        if !self.is_latlon() {
            return Err(GeoError::Unsupported("adding a vector"));
        }
        let (lon1, lat1) = self.radians_lon_lat();
        let angular = distance_m / EARTH_RADIUS_M;

        let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing_rad.cos()).asin();
        let lon2 = lon1
            + (bearing_rad.sin() * angular.sin() * lat1.cos())
                .atan2(angular.cos() - lat1.sin() * lat2.sin());
        let lon2 = (lon2 + 3.0 * PI).rem_euclid(2.0 * PI) - PI;

        let unit = self.coordinates_unit;
        self.x_lon = lon2;
        self.y_lat = lat2;
        self.coordinates_unit = CoordinatesUnit::Radians;
        self.convert_unit(unit, false)
    }

    /// A copy of this point moved along a vector; see [`add_vector_mut`](Self::add_vector_mut).
    pub fn add_vector(&self, distance_m: f64, bearing_rad: f64) -> GeoResult<Point> {
        let mut copy = *self;
        copy.add_vector_mut(distance_m, bearing_rad)?;
        Ok(copy)
    }

    // ── Reference-system conversion ───────────────────────────────────────

    /// Project onto the Mercator plane (kilometres).  Warns if already
    /// Cartesian.
    pub fn convert_to_cartesian(&mut self) {
        if !self.is_latlon() {
            warn!("geo reference system is already 'cartesian'");
            return;
        }
        let (lon, lat) = self.radians_lon_lat();
        self.x_lon = MERCATOR_RADIUS_KM * lon;
        self.y_lat = MERCATOR_RADIUS_KM * (FRAC_PI_4 + lat / 2.0).tan().ln();
        self.geo_reference_system = GeoReferenceSystem::Cartesian;
        self.coordinates_unit = CoordinatesUnit::Radians;
    }

    /// Inverse Mercator projection; the result is `LatLon` in radians.
    /// Warns if already `LatLon`.
    pub fn convert_to_latlon(&mut self) {
        if self.is_latlon() {
            warn!("geo reference system is already 'latlon'");
            return;
        }
        self.x_lon /= MERCATOR_RADIUS_KM;
        self.y_lat = FRAC_PI_2 - 2.0 * (-self.y_lat / MERCATOR_RADIUS_KM).exp().atan();
        self.geo_reference_system = GeoReferenceSystem::LatLon;
        self.coordinates_unit = CoordinatesUnit::Radians;
    }

    pub fn to_cartesian(&self) -> Point {
        let mut copy = *self;
        if copy.is_latlon() {
            copy.convert_to_cartesian();
        }
        copy
    }

    pub fn to_latlon(&self) -> Point {
        let mut copy = *self;
        if !copy.is_latlon() {
            copy.convert_to_latlon();
        }
        copy
    }
}

impl TryFrom<&[f64]> for Point {
    type Error = GeoError;

    /// Build a radians `LatLon` point from `[lon, lat]`.
    fn try_from(coordinates: &[f64]) -> GeoResult<Self> {
        match coordinates {
            [x, y] => Point::new(*x, *y),
            other => Err(GeoError::InvalidLength(other.len())),
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x_lon, self.y_lat)
    }
}

fn check_finite(value: f64) -> GeoResult<f64> {
    if value.is_finite() { Ok(value) } else { Err(GeoError::InvalidCoordinate(value)) }
}

// ── Free functions ────────────────────────────────────────────────────────────

/// Initial great-circle bearing from `a` to `b`, in radians.
pub fn bearing(a: &Point, b: &Point) -> GeoResult<f64> {
    if !a.is_latlon() || !b.is_latlon() {
        return Err(GeoError::NotLatLon);
    }
    let (lon1, lat1) = a.radians_lon_lat();
    let (lon2, lat2) = b.radians_lon_lat();
    let d_lon = lon2 - lon1;
    Ok((d_lon.sin() * lat2.cos())
        .atan2(lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos()))
}

/// Distance between two points in metres (haversine) or, for Cartesian
/// points, the Euclidean distance in the points' own unit.
pub fn distance(a: &Point, b: &Point) -> GeoResult<f64> {
    let (ref_a, ref_b) = (a.geo_reference_system(), b.geo_reference_system());
    if ref_a != ref_b {
        return Err(GeoError::ReferenceSystemMismatch(ref_a, ref_b));
    }
    match ref_a {
        GeoReferenceSystem::LatLon => {
            let (lon1, lat1) = a.radians_lon_lat();
            let (lon2, lat2) = b.radians_lon_lat();
            let h = ((lat2 - lat1) * 0.5).sin().powi(2)
                + lat1.cos() * lat2.cos() * ((lon2 - lon1) * 0.5).sin().powi(2);
            Ok(2.0 * HAVERSINE_RADIUS_M * h.sqrt().asin())
        }
        GeoReferenceSystem::Cartesian => {
            Ok((b.x_lon() - a.x_lon()).hypot(b.y_lat() - a.y_lat()))
        }
    }
}

/// The point on the great circle from `start` to `end` whose distance from
/// `start` is `ratio` times the full distance.  Returned in `start`'s unit.
pub fn interpolated_point(start: &Point, end: &Point, ratio: f64) -> GeoResult<Point> {
    if !start.is_latlon() {
        return Err(GeoError::Unsupported("interpolation"));
    }
    let total = distance(start, end)?;
    let heading = bearing(start, end)?;
    start.add_vector(ratio * total, heading)
}
