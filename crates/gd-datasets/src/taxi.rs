//! Porto "Taxi Service Trajectory" dataset (ECML/PKDD 15).
//!
//! # CSV format
//!
//! ```csv
//! TRIP_ID,CALL_TYPE,ORIGIN_CALL,ORIGIN_STAND,TAXI_ID,TIMESTAMP,DAY_TYPE,MISSING_DATA,POLYLINE
//! "1372636858620000589","C","","","20000589","1372636858","A","False","[[-8.618643,41.141412],[-8.618499,41.141376]]"
//! ```
//!
//! | Column         | Meaning                                                     |
//! |----------------|-------------------------------------------------------------|
//! | `TRIP_ID`      | Unique trip identifier                                      |
//! | `CALL_TYPE`    | `A` dispatched, `B` taxi stand, `C` street                  |
//! | `ORIGIN_CALL`  | Caller id for `CALL_TYPE = A`, empty otherwise              |
//! | `ORIGIN_STAND` | Stand id for `CALL_TYPE = B`, empty otherwise               |
//! | `TAXI_ID`      | Driver identifier                                           |
//! | `TIMESTAMP`    | Trip start, Unix seconds                                    |
//! | `DAY_TYPE`     | `A` normal, `B` holiday, `C` day before a holiday (`DAYTYPE` is accepted) |
//! | `MISSING_DATA` | `True` when the GPS stream has gaps                         |
//! | `POLYLINE`     | `[[lon, lat], ...]` in degrees, one pair per 15 s           |
//!
//! Files are decoded as Latin-1.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use csv::{ByteRecord, StringRecord};
use serde::{Deserialize, Deserializer};
use tracing::{debug, info};

use gd_core::parser::route_str_to_list;
use gd_core::time::from_unix_secs;
use gd_core::{CoordinatesUnit, FeatureMatrix, GeoReferenceSystem, LocationBounds, Route, one_hot_time_features};

use crate::dataset::{Dataset, RouteSample, check_extension, check_index};
use crate::{DatasetError, DatasetResult};

/// Seconds between consecutive polyline points.
pub const SECONDS_BETWEEN_POINTS: i64 = 15;

const SCAN_CHUNK_ROWS: usize = 5_000;

// ── Records ───────────────────────────────────────────────────────────────────

/// One raw CSV row.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TaxiRecord {
    pub trip_id:      String,
    pub call_type:    String,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub origin_call:  Option<u64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub origin_stand: Option<u32>,
    pub taxi_id:      u64,
    pub timestamp:    i64,
    #[serde(alias = "DAYTYPE")]
    pub day_type:     String,
    #[serde(deserialize_with = "deserialize_flag")]
    pub missing_data: bool,
    pub polyline:     String,
}

/// A cleaned trip: radians route plus one timestamp per point.
#[derive(Clone, Debug, PartialEq)]
pub struct TaxiTrip {
    pub record:     TaxiRecord,
    pub start:      DateTime<Utc>,
    pub route:      Route,
    pub timestamps: Vec<DateTime<Utc>>,
}

impl TaxiTrip {
    pub fn max_speed_kmh(&self) -> DatasetResult<f64> {
        Ok(self.route.max_speed_kmh(SECONDS_BETWEEN_POINTS as f64)?)
    }
}

// ── Options ───────────────────────────────────────────────────────────────────

/// Cleaning and sampling options.
#[derive(Clone, Debug, PartialEq)]
pub struct TaxiOptions {
    /// Scale sample routes to `[0, 1]` by `location_bounds`.
    pub scale: bool,
    /// Outer bounds in radians.  Computed from the data when `None`.
    pub location_bounds: Option<LocationBounds>,
    /// Drop trips faster than this anywhere along the route.
    pub max_allowed_speed_kmh: Option<f64>,
    /// Drop trips with fewer points.  Values below 1 are treated as 1.
    pub min_route_length: usize,
}

impl Default for TaxiOptions {
    fn default() -> Self {
        Self {
            scale: false,
            location_bounds: None,
            max_allowed_speed_kmh: None,
            min_route_length: 1,
        }
    }
}

// ── Dataset ───────────────────────────────────────────────────────────────────

/// Cleaned taxi trips sorted by start time.
#[derive(Clone, Debug)]
pub struct TaxiDataset {
    trips: Vec<TaxiTrip>,
    scale: bool,
    max_route_len: usize,
    location_bounds: LocationBounds,
}

struct Candidate {
    record: TaxiRecord,
    route: Route,
    max_speed_kmh: f64,
}

impl TaxiDataset {
    /// Clean `records` and build the dataset.
    ///
    /// Rows are dropped in this order: empty polyline, missing data, too few
    /// points, too fast.  One `info` event is logged per non-empty group.
    pub fn new(records: Vec<TaxiRecord>, options: TaxiOptions) -> DatasetResult<Self> {
        let min_route_length = options.min_route_length.max(1);

        let mut rows = records
            .into_iter()
            .map(|record| {
                let coordinates = if record.polyline.trim() == "[]" {
                    Vec::new()
                } else {
                    route_str_to_list(&record.polyline)
                };
                let route = Route::from_rows_with_units(
                    &coordinates,
                    GeoReferenceSystem::LatLon,
                    CoordinatesUnit::Degrees,
                )?
                .to_radians()?;
                let max_speed_kmh = route.max_speed_kmh(SECONDS_BETWEEN_POINTS as f64)?;
                Ok(Candidate { record, route, max_speed_kmh })
            })
            .collect::<DatasetResult<Vec<_>>>()?;

        drop_rows(&mut rows, |c| c.record.polyline.trim() == "[]", "'POLYLINE' was empty");
        drop_rows(&mut rows, |c| c.record.missing_data, "'MISSING_DATA' was true");
        drop_rows(
            &mut rows,
            |c| c.route.len() < min_route_length,
            &format!("route has less than {min_route_length} point(s)"),
        );
        if let Some(limit) = options.max_allowed_speed_kmh {
            drop_rows(
                &mut rows,
                |c| c.max_speed_kmh > limit,
                &format!("the maximum allowed speed of {limit} km/h was violated"),
            );
        }

        if rows.is_empty() {
            return Err(DatasetError::NoValidEntries);
        }

        let step = TimeDelta::seconds(SECONDS_BETWEEN_POINTS);
        let mut trips = rows
            .into_iter()
            .map(|c| {
                let start = from_unix_secs(c.record.timestamp)?;
                let timestamps = timestamps(start, c.route.len(), step);
                Ok(TaxiTrip { record: c.record, start, route: c.route, timestamps })
            })
            .collect::<DatasetResult<Vec<_>>>()?;
        trips.sort_by_key(|t| t.start);

        let max_route_len = trips.iter().map(|t| t.route.len()).max().unwrap_or(0);
        let location_bounds = match options.location_bounds {
            Some(bounds) => bounds,
            None => trips
                .iter()
                .filter_map(|t| t.route.bounds())
                .reduce(LocationBounds::merge)
                .ok_or(DatasetError::NoValidEntries)?,
        };

        debug!(trips = trips.len(), max_route_len, "taxi dataset ready");
        Ok(Self { trips, scale: options.scale, max_route_len, location_bounds })
    }

    /// Load from a `.csv` file.  `skip_rows` data rows after the header are
    /// skipped, then at most `n_rows` are read.
    pub fn create_from_csv(
        path: &Path,
        skip_rows: Option<usize>,
        n_rows: Option<usize>,
        options: TaxiOptions,
    ) -> DatasetResult<Self> {
        check_extension(path, "csv")?;
        let file = File::open(path)?;
        Self::create_from_reader(file, skip_rows, n_rows, options)
    }

    /// Like [`create_from_csv`](Self::create_from_csv) but accepts any `Read`
    /// source.
    pub fn create_from_reader<R: Read>(
        reader: R,
        skip_rows: Option<usize>,
        n_rows: Option<usize>,
        options: TaxiOptions,
    ) -> DatasetResult<Self> {
        let records = read_records(reader, skip_rows.unwrap_or(0), n_rows)?;
        Self::new(records, options)
    }

    /// Load the rows from the first trip starting on `start_date` to the
    /// last trip starting on `end_date` (UTC).
    ///
    /// The file is scanned in chunks of 5 000 rows; once both dates were
    /// seen, the scan stops at the first chunk without `end_date` rows.  The
    /// file is not sorted by time, so the result depends on that chunking.
    pub fn create_from_csv_within_time_range(
        path: &Path,
        start_date: NaiveDate,
        end_date: NaiveDate,
        options: TaxiOptions,
    ) -> DatasetResult<Self> {
        check_extension(path, "csv")?;
        let (start_idx, end_idx) =
            find_date_range(File::open(path)?, start_date, end_date, SCAN_CHUNK_ROWS)?;
        if end_idx < start_idx {
            return Err(DatasetError::InvalidArgument(format!(
                "rows for {end_date} (last at {end_idx}) precede rows for {start_date} (first at {start_idx})"
            )));
        }
        Self::create_from_csv(path, Some(start_idx), Some(end_idx - start_idx + 1), options)
    }

    pub fn trips(&self) -> &[TaxiTrip] {
        &self.trips
    }

    /// Length of the longest route; samples are padded to it.
    pub fn max_route_len(&self) -> usize {
        self.max_route_len
    }

    pub fn location_bounds(&self) -> LocationBounds {
        self.location_bounds
    }
}

impl Dataset for TaxiDataset {
    type Item = RouteSample;

    fn len(&self) -> usize {
        self.trips.len()
    }

    fn get(&self, idx: usize) -> DatasetResult<RouteSample> {
        check_index(idx, self.trips.len())?;
        let trip = &self.trips[idx];
        let rows = self.max_route_len;

        let (day_of_week, quarter_hour_of_day, month) = one_hot_time_features(&trip.timestamps, rows);

        let mut route_raw_padded = FeatureMatrix::from_rows(&trip.route.to_rows());
        route_raw_padded.pad_rows(rows);

        let mut route = trip.route.clone();
        if self.scale {
            route.scale(&self.location_bounds);
        }
        route.pad(rows);
        let route_scaled_padded = FeatureMatrix::from_rows(&route.to_rows());

        let mut stamps = trip.timestamps.clone();
        if let Some(&last) = stamps.last() {
            stamps.resize(rows, last);
        }
        let route_with_timestamps = route.with_timestamps(stamps)?;

        Ok(RouteSample {
            day_of_week,
            quarter_hour_of_day,
            month,
            route_with_timestamps,
            route_raw_padded,
            route_scaled_padded,
        })
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// `len` timestamps starting at `start`, `step` apart.
pub fn timestamps(start: DateTime<Utc>, len: usize, step: TimeDelta) -> Vec<DateTime<Utc>> {
    std::iter::successors(Some(start), |t| Some(*t + step)).take(len).collect()
}

fn drop_rows<T>(rows: &mut Vec<T>, should_drop: impl Fn(&T) -> bool, reason: &str) {
    let before = rows.len();
    rows.retain(|r| !should_drop(r));
    let dropped = before - rows.len();
    if dropped > 0 {
        info!(dropped, "rows dropped because {reason}");
    }
}

fn latin1_record(record: &ByteRecord) -> StringRecord {
    record
        .iter()
        .map(|field| field.iter().map(|&b| char::from(b)).collect::<String>())
        .collect()
}

fn read_records<R: Read>(
    reader: R,
    skip_rows: usize,
    n_rows: Option<usize>,
) -> DatasetResult<Vec<TaxiRecord>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = latin1_record(csv_reader.byte_headers()?);

    let mut records = Vec::new();
    let mut raw = ByteRecord::new();
    let mut row = 0usize;
    while csv_reader.read_byte_record(&mut raw)? {
        if n_rows.is_some_and(|n| records.len() >= n) {
            break;
        }
        if row >= skip_rows {
            records.push(latin1_record(&raw).deserialize::<TaxiRecord>(Some(&headers))?);
        }
        row += 1;
    }
    Ok(records)
}

/// Zero-based data-row indices of the first `start` row and the last `end`
/// row, by the UTC date of `TIMESTAMP`.
pub(crate) fn find_date_range<R: Read>(
    reader: R,
    start: NaiveDate,
    end: NaiveDate,
    chunk_rows: usize,
) -> DatasetResult<(usize, usize)> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = latin1_record(csv_reader.byte_headers()?);
    let ts_col = headers
        .iter()
        .position(|h| h == "TIMESTAMP")
        .ok_or_else(|| DatasetError::Parse("missing 'TIMESTAMP' column".to_string()))?;

    let mut start_idx = None;
    let mut end_idx = None;
    let mut chunk_first_start = None;
    let mut chunk_last_end = None;
    let mut raw = ByteRecord::new();
    let mut row = 0usize;

    loop {
        let more = csv_reader.read_byte_record(&mut raw)?;
        if more {
            let date = row_date(raw.get(ts_col))?;
            if date == start && chunk_first_start.is_none() {
                chunk_first_start = Some(row);
            }
            if date == end {
                chunk_last_end = Some(row);
            }
            row += 1;
        }

        let chunk_complete = if more { row % chunk_rows == 0 } else { row % chunk_rows != 0 };
        if chunk_complete {
            start_idx = start_idx.or(chunk_first_start);
            end_idx = end_idx.or(chunk_last_end);
            if start_idx.is_some() && end_idx.is_some() {
                match chunk_last_end {
                    Some(i) => end_idx = Some(i),
                    None => break,
                }
            }
            chunk_first_start = None;
            chunk_last_end = None;
        }
        if !more {
            break;
        }
    }

    let start_idx = start_idx.ok_or(DatasetError::DateNotFound { which: "start", date: start })?;
    let end_idx = end_idx.ok_or(DatasetError::DateNotFound { which: "end", date: end })?;
    Ok((start_idx, end_idx))
}

fn row_date(field: Option<&[u8]>) -> DatasetResult<NaiveDate> {
    let text = field
        .and_then(|f| std::str::from_utf8(f).ok())
        .ok_or_else(|| DatasetError::Parse("missing TIMESTAMP value".to_string()))?;
    let secs = text
        .trim()
        .parse::<i64>()
        .map_err(|e| DatasetError::Parse(format!("TIMESTAMP {text:?}: {e}")))?;
    Ok(from_unix_secs(secs)?.date_naive())
}

/// `True`/`False` as in the published CSV, plus `true`/`false`/`1`/`0`.
fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let s = String::deserialize(deserializer)?;
    match s.trim() {
        "True" | "true" | "TRUE" | "1" => Ok(true),
        "False" | "false" | "FALSE" | "0" => Ok(false),
        other => Err(serde::de::Error::custom(format!("invalid boolean {other:?}"))),
    }
}
