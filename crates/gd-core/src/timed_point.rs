//! A point paired with a UTC timestamp.

use chrono::{DateTime, Utc};

use crate::point::{Point, interpolated_point};
use crate::GeoResult;

/// A geographical location observed at `timestamp`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimedPoint {
    pub point: Point,
    pub timestamp: DateTime<Utc>,
}

impl TimedPoint {
    #[inline]
    pub fn new(point: Point, timestamp: DateTime<Utc>) -> Self {
        Self { point, timestamp }
    }

    pub fn to_degrees(&self) -> GeoResult<TimedPoint> {
        Ok(Self { point: self.point.to_degrees()?, ..*self })
    }

    pub fn to_radians(&self) -> GeoResult<TimedPoint> {
        Ok(Self { point: self.point.to_radians()?, ..*self })
    }

    pub fn to_cartesian(&self) -> TimedPoint {
        Self { point: self.point.to_cartesian(), ..*self }
    }

    pub fn to_latlon(&self) -> TimedPoint {
        Self { point: self.point.to_latlon(), ..*self }
    }

    pub fn add_vector(&self, distance_m: f64, bearing_rad: f64) -> GeoResult<TimedPoint> {
        Ok(Self { point: self.point.add_vector(distance_m, bearing_rad)?, ..*self })
    }
}

/// Interpolate between two timed points.  The result carries `start`'s
/// timestamp.
pub fn timed_interpolated_point(
    start: &TimedPoint,
    end: &TimedPoint,
    ratio: f64,
) -> GeoResult<TimedPoint> {
    let point = interpolated_point(&start.point, &end.point, ratio)?;
    Ok(TimedPoint::new(point, start.timestamp))
}
