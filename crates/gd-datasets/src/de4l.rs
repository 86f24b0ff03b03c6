//! DE4L air-quality sensor readings, sliced into fixed-length routes.
//!
//! Input is JSON lines; each entry needs at least
//!
//! ```json
//! {"timestamp": "2021-02-16T09:45:02.000Z", "location": {"lon": 11.61, "lat": 50.87}}
//! ```
//!
//! Consecutive readings form routes of `route_len` points; the last route
//! may be shorter and is zero-padded.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;

use gd_core::time::parse_timestamp;
use gd_core::{FeatureMatrix, LocationBounds, Point, Route, TimedPoint, TimedRoute, one_hot_time_features};

use crate::dataset::{Dataset, RouteSample, check_extension, check_index};
use crate::{DatasetError, DatasetResult};

#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
pub struct De4lLocation {
    /// Degrees.
    pub lon: f64,
    /// Degrees.
    pub lat: f64,
}

/// One sensor reading.  Unknown keys are ignored.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct De4lRecord {
    /// ISO 8601.
    pub timestamp: String,
    pub location: De4lLocation,
}

/// Sensor readings grouped into fixed-length routes.
#[derive(Clone, Debug)]
pub struct De4lSensorDataset {
    /// Radians, in input order.
    points: Vec<TimedPoint>,
    route_len: usize,
    location_bounds: LocationBounds,
}

impl De4lSensorDataset {
    /// Parse timestamps and convert locations to radians up front.  Bounds
    /// are computed from all readings unless supplied.
    pub fn new(
        records: Vec<De4lRecord>,
        route_len: usize,
        location_bounds: Option<LocationBounds>,
    ) -> DatasetResult<Self> {
        if route_len == 0 {
            return Err(DatasetError::InvalidArgument("route_len must be at least 1".to_string()));
        }

        let points = records
            .iter()
            .map(|r| {
                let point = Point::degrees(r.location.lon, r.location.lat)?.to_radians()?;
                Ok(TimedPoint::new(point, parse_timestamp(&r.timestamp)?))
            })
            .collect::<DatasetResult<Vec<_>>>()?;

        let location_bounds = match location_bounds {
            Some(bounds) => bounds,
            None => LocationBounds::from_points(points.iter().map(|p| &p.point))
                .ok_or(DatasetError::NoValidEntries)?,
        };

        Ok(Self { points, route_len, location_bounds })
    }

    /// Load from a `.json` lines file, reading at most `limit` entries.
    pub fn create_from_json(path: &Path, route_len: usize, limit: Option<usize>) -> DatasetResult<Self> {
        check_extension(path, "json")?;
        let file = File::open(path)?;
        Self::create_from_reader(BufReader::new(file), route_len, limit)
    }

    pub fn create_from_reader<R: Read>(reader: R, route_len: usize, limit: Option<usize>) -> DatasetResult<Self> {
        let records = serde_json::Deserializer::from_reader(reader)
            .into_iter::<De4lRecord>()
            .take(limit.unwrap_or(usize::MAX))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(records, route_len, None)
    }

    pub fn route_len(&self) -> usize {
        self.route_len
    }

    pub fn location_bounds(&self) -> LocationBounds {
        self.location_bounds
    }

    /// Number of individual readings.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }
}

impl Dataset for De4lSensorDataset {
    type Item = RouteSample;

    fn len(&self) -> usize {
        self.points.len().div_ceil(self.route_len)
    }

    fn get(&self, idx: usize) -> DatasetResult<RouteSample> {
        check_index(idx, self.len())?;
        let start = idx * self.route_len;
        let end = (start + self.route_len).min(self.points.len());
        let chunk = &self.points[start..end];

        let timestamps: Vec<_> = chunk.iter().map(|p| p.timestamp).collect();
        let (day_of_week, quarter_hour_of_day, month) = one_hot_time_features(&timestamps, self.route_len);

        // Matrices follow input order; the timed route is sorted by time.
        let route_with_timestamps = TimedRoute::from_points(chunk.to_vec())?;
        let route = Route::from_points(chunk.iter().map(|p| p.point).collect())?;

        let mut raw = route.clone();
        raw.pad(self.route_len);
        let mut scaled: Route = route;
        scaled.scale(&self.location_bounds).pad(self.route_len);

        Ok(RouteSample {
            day_of_week,
            quarter_hour_of_day,
            month,
            route_with_timestamps,
            route_raw_padded: FeatureMatrix::from_rows(&raw.to_rows()),
            route_scaled_padded: FeatureMatrix::from_rows(&scaled.to_rows()),
        })
    }
}
