//! Ordered point sequences.
//!
//! # Invariants
//!
//! 1. All points of a route share one geo reference system and one
//!    coordinates unit.  Insertions that break this return
//!    [`GeoError::UnitMismatch`].
//! 2. A route of timestamped points ([`TimedRoute`]) is always sorted by
//!    timestamp, ascending.  Ties keep insertion order.
//!
//! Operations that only make sense for one kind of point are implemented on
//! the concrete type: zero-padding exists on `Route<Point>`, time sorting on
//! `Route<TimedPoint>`.

use std::fmt;
use std::ops::Index;

use chrono::{DateTime, Utc};

use crate::bounds::LocationBounds;
use crate::point::{CoordinatesUnit, GeoReferenceSystem, Point, distance};
use crate::timed_point::TimedPoint;
use crate::{GeoError, GeoResult};

// ── Located ───────────────────────────────────────────────────────────────────

/// Anything that carries a [`Point`] and may carry a timestamp.
pub trait Located: Copy {
    fn point(&self) -> &Point;
    fn point_mut(&mut self) -> &mut Point;

    /// `Some` for timestamped points; routes keep these sorted.
    #[inline]
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        None
    }
}

impl Located for Point {
    #[inline]
    fn point(&self) -> &Point {
        self
    }
    #[inline]
    fn point_mut(&mut self) -> &mut Point {
        self
    }
}

impl Located for TimedPoint {
    #[inline]
    fn point(&self) -> &Point {
        &self.point
    }
    #[inline]
    fn point_mut(&mut self) -> &mut Point {
        &mut self.point
    }
    #[inline]
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.timestamp)
    }
}

// ── Route ─────────────────────────────────────────────────────────────────────

/// A route of timestamped points, kept sorted by time.
pub type TimedRoute = Route<TimedPoint>;

/// A sequence of points.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route<P: Located = Point> {
    points: Vec<P>,
}

impl<P: Located> Default for Route<P> {
    fn default() -> Self {
        Self { points: Vec::new() }
    }
}

impl<P: Located> Route<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { points: Vec::with_capacity(capacity) }
    }

    /// Build a route from `points`, checking unit consistency and sorting
    /// timestamped points by time.
    pub fn from_points(points: Vec<P>) -> GeoResult<Self> {
        if let Some(first) = points.first() {
            for p in &points[1..] {
                check_units(first.point(), p.point())?;
            }
        }
        let mut route = Self { points };
        route.sort_if_timed();
        Ok(route)
    }

    fn sort_if_timed(&mut self) {
        if self.has_timestamps() {
            // `sort_by_key` is stable, so equal timestamps keep their order.
            self.points.sort_by_key(|p| p.timestamp());
        }
    }

    // ── Access ────────────────────────────────────────────────────────────

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn points(&self) -> &[P] {
        &self.points
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, P> {
        self.points.iter()
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<&P> {
        self.points.get(idx)
    }

    #[inline]
    pub fn first(&self) -> Option<&P> {
        self.points.first()
    }

    #[inline]
    pub fn last(&self) -> Option<&P> {
        self.points.last()
    }

    /// `true` if the route is non-empty and its points carry timestamps.
    pub fn has_timestamps(&self) -> bool {
        self.points.first().and_then(Located::timestamp).is_some()
    }

    pub fn coordinates_unit(&self) -> Option<CoordinatesUnit> {
        self.points.first().map(|p| p.point().coordinates_unit())
    }

    pub fn geo_reference_system(&self) -> Option<GeoReferenceSystem> {
        self.points.first().map(|p| p.point().geo_reference_system())
    }

    /// `true` if a point with exactly these coordinates and units is present.
    pub fn contains_point(&self, point: &Point) -> bool {
        self.points.iter().any(|p| p.point() == point)
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Append `point`.  Timestamped points are inserted at their time-ordered
    /// position (after any existing points with the same timestamp).
    pub fn push(&mut self, point: P) -> GeoResult<&mut Self> {
        if let Some(first) = self.points.first() {
            check_units(first.point(), point.point())?;
        }
        match point.timestamp() {
            Some(ts) => {
                let at = self.points.partition_point(|p| p.timestamp() <= Some(ts));
                self.points.insert(at, point);
            }
            None => self.points.push(point),
        }
        Ok(self)
    }

    /// Replace the point at `idx`.  Timestamped routes are re-sorted.
    pub fn set(&mut self, idx: usize, point: P) -> GeoResult<()> {
        let len = self.points.len();
        if idx >= len {
            return Err(GeoError::IndexOutOfBounds { index: idx, len });
        }
        if let Some(other) = self.points.iter().enumerate().find(|(i, _)| *i != idx) {
            check_units(other.1.point(), point.point())?;
        }
        self.points[idx] = point;
        self.sort_if_timed();
        Ok(())
    }

    // ── Unit conversion ───────────────────────────────────────────────────

    pub fn convert_to_radians(&mut self) -> GeoResult<()> {
        for p in &mut self.points {
            *p.point_mut() = p.point().to_radians()?;
        }
        Ok(())
    }

    pub fn convert_to_degrees(&mut self) -> GeoResult<()> {
        for p in &mut self.points {
            *p.point_mut() = p.point().to_degrees()?;
        }
        Ok(())
    }

    pub fn to_radians(&self) -> GeoResult<Self> {
        let mut copy = self.clone();
        copy.convert_to_radians()?;
        Ok(copy)
    }

    pub fn to_degrees(&self) -> GeoResult<Self> {
        let mut copy = self.clone();
        copy.convert_to_degrees()?;
        Ok(copy)
    }

    // ── Scaling ───────────────────────────────────────────────────────────

    /// Scale coordinates from `bounds` to `[0, 1]`.
    pub fn scale(&mut self, bounds: &LocationBounds) -> &mut Self {
        for p in &mut self.points {
            let point = p.point_mut();
            let (x, y) = (bounds.scale_x(point.x_lon()), bounds.scale_y(point.y_lat()));
            point.set_coordinates_unchecked(x, y);
        }
        self
    }

    /// Scale coordinates from `[0, 1]` back to `bounds`.
    pub fn inverse_scale(&mut self, bounds: &LocationBounds) -> &mut Self {
        for p in &mut self.points {
            let point = p.point_mut();
            let (x, y) = (bounds.unscale_x(point.x_lon()), bounds.unscale_y(point.y_lat()));
            point.set_coordinates_unchecked(x, y);
        }
        self
    }

    // ── Aggregates ────────────────────────────────────────────────────────

    /// Arithmetic mean of the coordinates, in the route's units.
    pub fn average_point(&self) -> Option<Point> {
        let first = self.points.first()?;
        let n = self.points.len() as f64;
        let (sum_x, sum_y) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(x, y), p| (x + p.point().x_lon(), y + p.point().y_lat()));
        let mut center = first.point().zero_like();
        center.set_coordinates_unchecked(sum_x / n, sum_y / n);
        Some(center)
    }

    pub fn bounds(&self) -> Option<LocationBounds> {
        LocationBounds::from_points(self.points.iter().map(Located::point))
    }

    /// Highest speed between consecutive points, in km/h, assuming
    /// `interval_secs` between every pair.  `0.0` for fewer than two points.
    pub fn max_speed_kmh(&self, interval_secs: f64) -> GeoResult<f64> {
        let mut max_kmh: f64 = 0.0;
        for pair in self.points.windows(2) {
            let metres = distance(pair[0].point(), pair[1].point())?;
            max_kmh = max_kmh.max(metres / interval_secs * 3.6);
        }
        Ok(max_kmh)
    }

    /// `[x, y]` rows in point order.
    pub fn to_rows(&self) -> Vec<[f64; 2]> {
        self.points.iter().map(|p| p.point().coordinates()).collect()
    }
}

impl Route<Point> {
    /// Build a radians `LatLon` route from `[lon, lat]` rows.
    pub fn from_rows(rows: &[[f64; 2]]) -> GeoResult<Self> {
        Self::from_rows_with_units(rows, GeoReferenceSystem::LatLon, CoordinatesUnit::Radians)
    }

    pub fn from_rows_with_units(
        rows: &[[f64; 2]],
        geo_reference_system: GeoReferenceSystem,
        coordinates_unit: CoordinatesUnit,
    ) -> GeoResult<Self> {
        let points = rows
            .iter()
            .map(|[x, y]| Point::with_units(*x, *y, geo_reference_system, coordinates_unit))
            .collect::<GeoResult<Vec<_>>>()?;
        Ok(Self { points })
    }

    /// Append zero points until the route has `target_len` points.
    pub fn pad(&mut self, target_len: usize) -> &mut Self {
        if target_len > self.points.len() {
            let zero = self.points.first().map_or_else(Point::default, Point::zero_like);
            self.points.resize(target_len, zero);
        }
        self
    }

    /// Attach one timestamp per point.  The result is sorted by time.
    pub fn with_timestamps(self, timestamps: Vec<DateTime<Utc>>) -> GeoResult<TimedRoute> {
        if timestamps.len() != self.points.len() {
            return Err(GeoError::LengthMismatch {
                expected: self.points.len(),
                found:    timestamps.len(),
            });
        }
        let points = self
            .points
            .into_iter()
            .zip(timestamps)
            .map(|(p, ts)| TimedPoint::new(p, ts))
            .collect();
        Route::from_points(points)
    }
}

impl Route<TimedPoint> {
    /// Re-sort by timestamp.  Only needed for routes built from
    /// deserialized data.
    pub fn sort_by_time(&mut self) -> &mut Self {
        self.points.sort_by_key(|p| p.timestamp);
        self
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    /// The same points without their timestamps.
    pub fn without_timestamps(&self) -> Route<Point> {
        Route { points: self.points.iter().map(|p| p.point).collect() }
    }
}

impl<P: Located> Index<usize> for Route<P> {
    type Output = P;

    fn index(&self, idx: usize) -> &P {
        &self.points[idx]
    }
}

impl<'a, P: Located> IntoIterator for &'a Route<P> {
    type Item = &'a P;
    type IntoIter = std::slice::Iter<'a, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl<P: Located> fmt::Display for Route<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, p) in self.points.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", p.point())?;
        }
        f.write_str("]")
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn check_units(expected: &Point, found: &Point) -> GeoResult<()> {
    if expected.geo_reference_system() != found.geo_reference_system()
        || expected.coordinates_unit() != found.coordinates_unit()
    {
        return Err(GeoError::UnitMismatch {
            expected_system: expected.geo_reference_system(),
            expected_unit:   expected.coordinates_unit(),
            found_system:    found.geo_reference_system(),
            found_unit:      found.coordinates_unit(),
        });
    }
    Ok(())
}
