//! Microsoft Research Asia GeoLife GPS trajectories.
//!
//! `.plt` files start with six header lines, followed by
//! `lat,lon,0,altitude,days,date,time` rows:
//!
//! ```text
//! 39.984702,116.318417,0,492,39744.1201851852,2008-10-23,02:53:04
//! ```
//!
//! Each file is one user; the user id is the file's position in the input
//! list.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use gd_core::time::parse_timestamp;
use gd_core::{Point, TimedPoint, TimedRoute};

use crate::dataset::{Dataset, check_index};
use crate::grouping::{DailyRoute, DailyRouteBuilder};
use crate::DatasetResult;

const HEADER_LINES: usize = 6;

#[derive(Deserialize)]
struct PltRow {
    lat:       f64,
    lon:       f64,
    _flag:     String,
    _altitude: f64,
    _days:     f64,
    date:      String,
    time:      String,
}

/// Daily user routes.
#[derive(Clone, Debug)]
pub struct GeoLifeDataset {
    routes: Vec<DailyRoute>,
}

impl GeoLifeDataset {
    /// Read one `.plt` file per user.  `limit` caps the rows read from each
    /// file.
    pub fn create_from_txt<P: AsRef<Path>>(paths: &[P], limit: Option<usize>) -> DatasetResult<Self> {
        let readers = paths
            .iter()
            .map(|p| File::open(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::create_from_readers(readers, limit)
    }

    pub fn create_from_readers<R: Read>(readers: Vec<R>, limit: Option<usize>) -> DatasetResult<Self> {
        let mut builder = DailyRouteBuilder::new();

        for (user_id, reader) in readers.into_iter().enumerate() {
            let mut buffered = BufReader::new(reader);
            let mut skipped = String::new();
            for _ in 0..HEADER_LINES {
                skipped.clear();
                if buffered.read_line(&mut skipped)? == 0 {
                    break;
                }
            }

            let mut csv_reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .trim(csv::Trim::All)
                .from_reader(buffered);
            for row in csv_reader.deserialize::<PltRow>().take(limit.unwrap_or(usize::MAX)) {
                let row = row?;
                let timestamp = parse_timestamp(&format!("{} {}", row.date, row.time))?;
                match Point::degrees(row.lon, row.lat) {
                    Ok(point) => {
                        builder.push(user_id as u32, TimedPoint::new(point, timestamp))?;
                    }
                    Err(e) => {
                        warn!(user_id, lon = row.lon, lat = row.lat, error = %e, "point ignored");
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

impl Dataset for GeoLifeDataset {
    type Item = TimedRoute;

    fn len(&self) -> usize {
        self.routes.len()
    }

    fn get(&self, idx: usize) -> DatasetResult<TimedRoute> {
        check_index(idx, self.routes.len())?;
        Ok(self.routes[idx].route.clone())
    }
}
