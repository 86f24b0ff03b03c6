//! Cabspotting San Francisco taxi traces.
//!
//! # File format
//!
//! One space-separated file per taxi, no header:
//!
//! ```text
//! 37.75134 -122.39488 0 1213084687
//! 37.75136 -122.39527 1 1213084659
//! ```
//!
//! Columns are `lat lon occupancy unix_time`; `occupancy` is 1 while a
//! customer is on board.  Taxi ids are the files' positions in the input
//! list.
//!
//! Pick-ups and drop-offs are derived from occupancy changes: a 0 → 1
//! change marks the current point, a 1 → 0 change marks the previous one.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use gd_core::time::from_unix_secs;
use gd_core::{Point, TimedPoint, TimedRoute};

use crate::dataset::{Dataset, check_index};
use crate::grouping::{DailyRoute, DailyRouteBuilder};
use crate::DatasetResult;

#[derive(Deserialize)]
struct CabspottingRow {
    lat:       f64,
    lon:       f64,
    occupancy: u8,
    unix_time: i64,
}

/// One position report of one taxi.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CabspottingRecord {
    pub taxi_id:   u32,
    /// Degrees.
    pub lat:       f64,
    /// Degrees.
    pub lon:       f64,
    pub occupancy: u8,
    pub unix_time: i64,
}

/// Daily taxi routes with their customer stops.
#[derive(Clone, Debug)]
pub struct CabspottingDataset {
    routes: Vec<DailyRoute>,
    stops: Vec<Vec<usize>>,
}

impl CabspottingDataset {
    pub fn new(mut records: Vec<CabspottingRecord>) -> DatasetResult<Self> {
        records.sort_by_key(|r| (r.taxi_id, r.unix_time));

        let mut builder = DailyRouteBuilder::new();
        let mut stops: Vec<Vec<usize>> = Vec::new();
        let mut occupancy = 0u8;
        let mut point_idx = 0usize;

        for r in records {
            let point = match Point::degrees(r.lon, r.lat) {
                Ok(p) => p,
                Err(e) => {
                    warn!(taxi_id = r.taxi_id, lon = r.lon, lat = r.lat, error = %e, "point ignored");
                    continue;
                }
            };
            let timed = TimedPoint::new(point, from_unix_secs(r.unix_time)?);

            if builder.push(r.taxi_id, timed)? {
                stops.push(Vec::new());
                occupancy = r.occupancy;
                point_idx = 0;
            } else if r.occupancy != occupancy {
                let stop = if occupancy == 0 { point_idx } else { point_idx.saturating_sub(1) };
                if let Some(current) = stops.last_mut() {
                    current.push(stop);
                }
                occupancy = r.occupancy;
            }
            point_idx += 1;
        }

        Ok(Self { routes: builder.finish()?, stops })
    }

    /// Read one file per taxi.  `limit` caps the rows read from each file.
    pub fn create_from_txt<P: AsRef<Path>>(paths: &[P], limit: Option<usize>) -> DatasetResult<Self> {
        let readers = paths
            .iter()
            .map(|p| File::open(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::create_from_readers(readers, limit)
    }

    /// Like [`create_from_txt`](Self::create_from_txt) but accepts any `Read`
    /// sources.
    pub fn create_from_readers<R: Read>(readers: Vec<R>, limit: Option<usize>) -> DatasetResult<Self> {
        let mut records = Vec::new();
        for (taxi_id, reader) in readers.into_iter().enumerate() {
            let mut csv_reader = csv::ReaderBuilder::new()
                .delimiter(b' ')
                .has_headers(false)
                .trim(csv::Trim::All)
                .from_reader(reader);
            for row in csv_reader.deserialize::<CabspottingRow>().take(limit.unwrap_or(usize::MAX)) {
                let row = row?;
                records.push(CabspottingRecord {
                    taxi_id: taxi_id as u32,
                    lat: row.lat,
                    lon: row.lon,
                    occupancy: row.occupancy,
                    unix_time: row.unix_time,
                });
            }
        }
        Self::new(records)
    }

    pub fn routes(&self) -> &[DailyRoute] {
        &self.routes
    }

    /// Point indices of pick-ups and drop-offs in route `idx`.
    pub fn stops(&self, idx: usize) -> DatasetResult<&[usize]> {
        check_index(idx, self.stops.len())?;
        Ok(&self.stops[idx])
    }
}

impl Dataset for CabspottingDataset {
    type Item = TimedRoute;

    fn len(&self) -> usize {
        self.routes.len()
    }

    fn get(&self, idx: usize) -> DatasetResult<TimedRoute> {
        check_index(idx, self.routes.len())?;
        Ok(self.routes[idx].route.clone())
    }
}
