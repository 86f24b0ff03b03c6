//! CSV export and import of a [`MobilityStore`].
//!
//! `transitions.csv` has one row per [`Transition`] with its probability;
//! `locations.csv` has `osm_id,locations,center` with the point lists in
//! their bracketed string form.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::MobilityResult;
use crate::geocoder::OsmId;
use crate::store::{Location, MobilityStore, Transition};

#[derive(Serialize, Deserialize)]
struct LocationRow {
    osm_id:    OsmId,
    locations: String,
    center:    String,
}

/// Write both tables of `store` as CSV files with headers.
pub fn persist_csv(store: &MobilityStore, transitions_path: &Path, locations_path: &Path) -> MobilityResult<()> {
    write_transitions(store, File::create(transitions_path)?)?;
    write_locations(store, File::create(locations_path)?)
}

pub fn write_transitions<W: Write>(store: &MobilityStore, writer: W) -> MobilityResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for transition in store.transitions()? {
        csv_writer.serialize(transition)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_locations<W: Write>(store: &MobilityStore, writer: W) -> MobilityResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for location in store.locations()? {
        csv_writer.serialize(LocationRow {
            osm_id:    location.osm_id,
            locations: location.locations.to_string(),
            center:    location.center.to_string(),
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn load_transitions_csv(path: &Path) -> MobilityResult<Vec<Transition>> {
    load_transitions_reader(File::open(path)?)
}

pub fn load_transitions_reader<R: Read>(reader: R) -> MobilityResult<Vec<Transition>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    Ok(csv_reader.deserialize().collect::<Result<Vec<Transition>, _>>()?)
}

pub fn load_locations_csv(path: &Path) -> MobilityResult<Vec<Location>> {
    load_locations_reader(File::open(path)?)
}

pub fn load_locations_reader<R: Read>(reader: R) -> MobilityResult<Vec<Location>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    csv_reader
        .deserialize::<LocationRow>()
        .map(|row| {
            let row = row?;
            Ok(Location::from_stored(row.osm_id, &row.locations, &row.center)?)
        })
        .collect()
}
