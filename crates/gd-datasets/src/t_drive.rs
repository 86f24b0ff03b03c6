//! Microsoft T-Drive Beijing taxi trajectories (2008).
//!
//! Headerless CSV, `taxi_id,date_time,lon,lat`:
//!
//! ```csv
//! 1,2008-02-02 15:36:08,116.51172,39.92123
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use gd_core::time::parse_timestamp;
use gd_core::{Point, TimedPoint, TimedRoute};

use crate::dataset::{Dataset, check_index};
use crate::grouping::{DailyRoute, DailyRouteBuilder};
use crate::DatasetResult;

#[derive(Deserialize)]
struct TDriveRow {
    taxi_id:   u32,
    date_time: String,
    lon:       f64,
    lat:       f64,
}

/// Daily taxi routes.
#[derive(Clone, Debug)]
pub struct TDriveDataset {
    routes: Vec<DailyRoute>,
}

impl TDriveDataset {
    /// `limit` caps the rows read from each file.
    pub fn create_from_txt<P: AsRef<Path>>(paths: &[P], limit: Option<usize>) -> DatasetResult<Self> {
        let readers = paths
            .iter()
            .map(|p| File::open(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::create_from_readers(readers, limit)
    }

    pub fn create_from_readers<R: Read>(readers: Vec<R>, limit: Option<usize>) -> DatasetResult<Self> {
        let mut builder = DailyRouteBuilder::new();

        for reader in readers {
            let mut csv_reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .trim(csv::Trim::All)
                .from_reader(reader);
            for row in csv_reader.deserialize::<TDriveRow>().take(limit.unwrap_or(usize::MAX)) {
                let row = row?;
                let timestamp = parse_timestamp(&row.date_time)?;
                match Point::degrees(row.lon, row.lat) {
                    Ok(point) => {
                        builder.push(row.taxi_id, TimedPoint::new(point, timestamp))?;
                    }
                    Err(e) => {
                        warn!(taxi_id = row.taxi_id, lon = row.lon, lat = row.lat, error = %e, "point ignored");
                    }
                }
            }
        }

        Ok(Self { routes: builder.finish()? })
    }

    pub fn routes(&self) -> &[DailyRoute] {
        &self.routes
    }
}

impl Dataset for TDriveDataset {
    type Item = TimedRoute;

    fn len(&self) -> usize {
        self.routes.len()
    }

    fn get(&self, idx: usize) -> DatasetResult<TimedRoute> {
        check_index(idx, self.routes.len())?;
        Ok(self.routes[idx].route.clone())
    }
}
