//! SQLite persistence for segment locations and transitions.
//!
//! # Schema
//!
//! | Table                    | Key             | Contents                                         |
//! |--------------------------|-----------------|--------------------------------------------------|
//! | `location`               | `osm_id`        | points seen on the segment and their centre      |
//! | `transition`             | `transition_id` | per (from, to, weekday): count and sums, averages |
//! | `transition_probability` | `transition_id` | count / Σcount over the same (from, weekday)     |
//!
//! Points and routes are stored as their `Display` strings in degrees, e.g.
//! `[[13.4, 52.5], [13.41, 52.51]]`, and read back with `gd_core::parser`.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use serde::{Deserialize, Serialize};

use gd_core::parser::{points_str_to_list, route_str_to_list};
use gd_core::{CoordinatesUnit, GeoError, GeoReferenceSystem, GeoResult, Point, Route};

use crate::MobilityResult;
use crate::geocoder::OsmId;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS location (
        osm_id    INTEGER PRIMARY KEY,
        locations TEXT,
        center    TEXT
    );
    CREATE TABLE IF NOT EXISTS transition (
        transition_id INTEGER PRIMARY KEY,
        osm_id_1      INTEGER,
        osm_id_2      INTEGER,
        weekday       INTEGER,
        counter       INTEGER,
        distance_sum  REAL,
        duration_sum  REAL,
        distance_avg  REAL GENERATED ALWAYS AS (distance_sum / counter) STORED,
        duration_avg  REAL GENERATED ALWAYS AS (duration_sum / counter) STORED
    );
    CREATE TABLE IF NOT EXISTS transition_probability (
        transition_id          INTEGER PRIMARY KEY,
        transition_probability REAL
    );";

const TRANSITION_COLUMNS: &str = "t.transition_id, t.osm_id_1, t.osm_id_2, t.weekday, t.counter, \
     t.distance_sum, t.duration_sum, t.distance_avg, t.duration_avg, p.transition_probability";

const TRANSITION_FROM: &str =
    "FROM transition t LEFT JOIN transition_probability p ON t.transition_id = p.transition_id";

// ── Rows ──────────────────────────────────────────────────────────────────────

/// Aggregated movements from one segment to another on one weekday.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub transition_id:          i64,
    pub osm_id_1:               OsmId,
    pub osm_id_2:               OsmId,
    /// Monday = 0.
    pub weekday:                u32,
    pub counter:                u32,
    /// Metres.
    pub distance_sum:           f64,
    /// Seconds.
    pub duration_sum:           f64,
    pub distance_avg:           f64,
    pub duration_avg:           f64,
    /// `None` until probabilities have been calculated.
    pub transition_probability: Option<f64>,
}

impl Transition {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            transition_id:          row.get(0)?,
            osm_id_1:               OsmId(row.get(1)?),
            osm_id_2:               OsmId(row.get(2)?),
            weekday:                row.get(3)?,
            counter:                row.get(4)?,
            distance_sum:           row.get(5)?,
            duration_sum:           row.get(6)?,
            distance_avg:           row.get(7)?,
            duration_avg:           row.get(8)?,
            transition_probability: row.get(9)?,
        })
    }
}

/// Points observed on one road segment.
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    pub osm_id:    OsmId,
    /// `LatLon` degrees.
    pub locations: Route,
    /// Mean of `locations`.
    pub center:    Point,
}

impl Location {
    /// Parse the stored string forms of `locations` and `center`.
    pub fn from_stored(osm_id: OsmId, locations: &str, center: &str) -> GeoResult<Self> {
        let locations = Route::from_rows_with_units(
            &route_str_to_list(locations),
            GeoReferenceSystem::LatLon,
            CoordinatesUnit::Degrees,
        )?;
        let [lon, lat] = points_str_to_list(center)
            .first()
            .copied()
            .ok_or_else(|| GeoError::Parse(format!("stored center {center:?} is not a point")))?;
        Ok(Self { osm_id, locations, center: Point::degrees(lon, lat)? })
    }
}

// ── MobilityStore ─────────────────────────────────────────────────────────────

/// Owns the SQLite connection holding the mobility model.
pub struct MobilityStore {
    conn: Connection,
}

impl MobilityStore {
    /// Open (or create) the database at `path` and initialise the schema.
    pub fn open(path: &Path) -> MobilityResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;",
        )?;
        Self::init(conn)
    }

    pub fn in_memory() -> MobilityResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> MobilityResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // ── Transitions ───────────────────────────────────────────────────────

    pub fn find_transition(&self, osm_id_1: OsmId, osm_id_2: OsmId, weekday: u32) -> MobilityResult<Option<Transition>> {
        let sql = format!(
            "SELECT {TRANSITION_COLUMNS} {TRANSITION_FROM} \
             WHERE t.osm_id_1 = ?1 AND t.osm_id_2 = ?2 AND t.weekday = ?3"
        );
        Ok(self
            .conn
            .query_row(&sql, params![osm_id_1.0, osm_id_2.0, weekday], Transition::from_row)
            .optional()?)
    }

    /// Count one more movement from `osm_id_1` to `osm_id_2` on `weekday`.
    pub fn create_or_update_transition(
        &mut self,
        osm_id_1: OsmId,
        osm_id_2: OsmId,
        weekday: u32,
        distance_m: f64,
        duration_s: f64,
    ) -> MobilityResult<()> {
        let tx = self.conn.transaction()?;
        let updated = tx.execute(
            "UPDATE transition \
             SET counter = counter + 1, distance_sum = distance_sum + ?4, duration_sum = duration_sum + ?5 \
             WHERE osm_id_1 = ?1 AND osm_id_2 = ?2 AND weekday = ?3",
            params![osm_id_1.0, osm_id_2.0, weekday, distance_m, duration_s],
        )?;
        if updated == 0 {
            tx.execute(
                "INSERT INTO transition (osm_id_1, osm_id_2, weekday, counter, distance_sum, duration_sum) \
                 VALUES (?1, ?2, ?3, 1, ?4, ?5)",
                params![osm_id_1.0, osm_id_2.0, weekday, distance_m, duration_s],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Rebuild `transition_probability` from the current transition counts.
    pub fn calculate_transition_probabilities(&mut self) -> MobilityResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(
            "DROP TABLE IF EXISTS transition_probability;
             CREATE TABLE transition_probability (
                 transition_id          INTEGER PRIMARY KEY,
                 transition_probability REAL
             );
             INSERT INTO transition_probability
             SELECT t.transition_id, CAST(t.counter AS REAL) / CAST(s.sum_of_counter AS REAL)
             FROM transition t
             LEFT JOIN (
                 SELECT osm_id_1, weekday, SUM(counter) AS sum_of_counter
                 FROM transition GROUP BY osm_id_1, weekday
             ) s ON t.osm_id_1 = s.osm_id_1 AND t.weekday = s.weekday;",
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Transitions leaving `start` on `weekday` whose target is not in
    /// `forbidden_targets`.
    pub fn find_possible_transitions(
        &self,
        start: OsmId,
        forbidden_targets: &[OsmId],
        weekday: u32,
    ) -> MobilityResult<Vec<Transition>> {
        let mut sql = format!(
            "SELECT {TRANSITION_COLUMNS} {TRANSITION_FROM} WHERE t.osm_id_1 = ?1 AND t.weekday = ?2"
        );
        if !forbidden_targets.is_empty() {
            let placeholders: Vec<String> = (0..forbidden_targets.len()).map(|i| format!("?{}", i + 3)).collect();
            sql.push_str(&format!(" AND t.osm_id_2 NOT IN ({})", placeholders.join(", ")));
        }
        sql.push_str(" ORDER BY t.transition_id");

        let values = [start.0, i64::from(weekday)]
            .into_iter()
            .chain(forbidden_targets.iter().map(|id| id.0));
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), Transition::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn transitions(&self) -> MobilityResult<Vec<Transition>> {
        let sql = format!("SELECT {TRANSITION_COLUMNS} {TRANSITION_FROM} ORDER BY t.transition_id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Transition::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn transition_count(&self) -> MobilityResult<usize> {
        self.count("SELECT COUNT(*) FROM transition")
    }

    // ── Locations ─────────────────────────────────────────────────────────

    pub fn find_location(&self, osm_id: OsmId) -> MobilityResult<Option<Location>> {
        let stored = self
            .conn
            .query_row(
                "SELECT locations, center FROM location WHERE osm_id = ?1",
                params![osm_id.0],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        match stored {
            Some((locations, center)) => Ok(Some(Location::from_stored(osm_id, &locations, &center)?)),
            None => Ok(None),
        }
    }

    /// Record that `point` lies on `osm_id`.  A point already listed for the
    /// segment is not added twice; otherwise the centre is recomputed.
    pub fn create_or_update_location(&mut self, osm_id: OsmId, point: &Point) -> MobilityResult<()> {
        let point = point.to_degrees()?;
        match self.find_location(osm_id)? {
            None => {
                self.conn.execute(
                    "INSERT INTO location (osm_id, locations, center) VALUES (?1, ?2, ?3)",
                    params![osm_id.0, format!("[{point}]"), point.to_string()],
                )?;
            }
            Some(mut location) => {
                if location.locations.contains_point(&point) {
                    return Ok(());
                }
                location.locations.push(point)?;
                let center = location.locations.average_point().unwrap_or(point);
                self.conn.execute(
                    "UPDATE location SET locations = ?2, center = ?3 WHERE osm_id = ?1",
                    params![osm_id.0, location.locations.to_string(), center.to_string()],
                )?;
            }
        }
        Ok(())
    }

    pub fn locations(&self) -> MobilityResult<Vec<Location>> {
        let mut stmt = self.conn.prepare("SELECT osm_id, locations, center FROM location ORDER BY osm_id")?;
        let stored = stmt
            .query_map([], |row| Ok((OsmId(row.get(0)?), row.get::<_, String>(1)?, row.get::<_, String>(2)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        stored
            .into_iter()
            .map(|(osm_id, locations, center)| Ok(Location::from_stored(osm_id, &locations, &center)?))
            .collect()
    }

    pub fn location_count(&self) -> MobilityResult<usize> {
        self.count("SELECT COUNT(*) FROM location")
    }

    // ── Bulk import ───────────────────────────────────────────────────────

    /// Insert previously exported transitions, keeping their ids.
    pub fn import_transitions(&mut self, transitions: &[Transition]) -> MobilityResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut insert = tx.prepare_cached(
                "INSERT OR REPLACE INTO transition \
                 (transition_id, osm_id_1, osm_id_2, weekday, counter, distance_sum, duration_sum) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for t in transitions {
                insert.execute(params![
                    t.transition_id,
                    t.osm_id_1.0,
                    t.osm_id_2.0,
                    t.weekday,
                    t.counter,
                    t.distance_sum,
                    t.duration_sum,
                ])?;
            }
        }
        tx.commit()?;
        self.calculate_transition_probabilities()
    }

    /// Insert previously exported locations, replacing any with the same id.
    pub fn import_locations(&mut self, locations: &[Location]) -> MobilityResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut insert = tx.prepare_cached(
                "INSERT OR REPLACE INTO location (osm_id, locations, center) VALUES (?1, ?2, ?3)",
            )?;
            for l in locations {
                insert.execute(params![l.osm_id.0, l.locations.to_string(), l.center.to_string()])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn count(&self, sql: &str) -> MobilityResult<usize> {
        let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(n as usize)
    }
}
