//! Reverse geocoding: map a point to the OpenStreetMap way it lies on.
//!
//! [`NominatimClient`] queries a Nominatim server at zoom 18 (way level).
//! [`NearestSegmentGeocoder`] answers offline from segment centres already
//! stored in a [`MobilityStore`](crate::MobilityStore).

use std::fmt;

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use gd_core::Point;

use crate::http::{build_client, normalize_base_url};
use crate::store::Location;
use crate::{MobilityError, MobilityResult};

/// Id of an OpenStreetMap way.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OsmId(pub i64);

impl fmt::Display for OsmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolves a `LatLon` point (degrees or radians) to a road segment.
pub trait ReverseGeocoder {
    fn reverse(&self, point: &Point) -> MobilityResult<OsmId>;
}

// ── Nominatim ─────────────────────────────────────────────────────────────────

/// Zoom level at which Nominatim returns ways rather than areas.
const WAY_ZOOM: u8 = 18;

pub struct NominatimClient {
    http:     Client,
    base_url: String,
}

impl NominatimClient {
    /// `base_url` is e.g. `localhost:8080` or `https://nominatim.example.org`.
    pub fn new(base_url: &str) -> MobilityResult<Self> {
        Ok(Self::with_client(build_client()?, base_url))
    }

    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self { http, base_url: normalize_base_url(base_url) }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl ReverseGeocoder for NominatimClient {
    fn reverse(&self, point: &Point) -> MobilityResult<OsmId> {
        let point = point.to_degrees()?;
        let url = format!("{}/reverse", self.base_url);
        let body: Value = self
            .http
            .get(&url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", point.y_lat().to_string()),
                ("lon", point.x_lon().to_string()),
                ("zoom", WAY_ZOOM.to_string()),
            ])
            .send()?
            .error_for_status()?
            .json()?;
        let osm_id = osm_id_from_response(&body)?;
        debug!(lon = point.x_lon(), lat = point.y_lat(), %osm_id, "reverse geocoded");
        Ok(osm_id)
    }
}

/// Extract `osm_id` from a Nominatim `jsonv2` reverse response.
pub(crate) fn osm_id_from_response(body: &Value) -> MobilityResult<OsmId> {
    if let Some(error) = body.get("error") {
        return Err(MobilityError::BadResponse(format!("nominatim: {error}")));
    }
    match body.get("osm_id") {
        Some(Value::Number(n)) => n
            .as_i64()
            .map(OsmId)
            .ok_or_else(|| MobilityError::BadResponse(format!("osm_id {n} is not an integer"))),
        Some(Value::String(s)) => s
            .parse()
            .map(OsmId)
            .map_err(|_| MobilityError::BadResponse(format!("osm_id {s:?} is not an integer"))),
        _ => Err(MobilityError::BadResponse("nominatim response has no osm_id".to_string())),
    }
}

// ── Offline nearest segment ───────────────────────────────────────────────────

/// R-tree entry: a segment centre as `[lon, lat]` in degrees.
#[derive(Clone)]
struct SegmentEntry {
    center: [f64; 2],
    osm_id: OsmId,
}

impl RTreeObject for SegmentEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.center)
    }
}

impl PointDistance for SegmentEntry {
    /// Squared planar distance in degrees.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlon = self.center[0] - point[0];
        let dlat = self.center[1] - point[1];
        dlon * dlon + dlat * dlat
    }
}

/// Snaps points to the nearest known segment centre.
pub struct NearestSegmentGeocoder {
    index: RTree<SegmentEntry>,
}

impl NearestSegmentGeocoder {
    pub fn from_locations(locations: &[Location]) -> MobilityResult<Self> {
        let entries = locations
            .iter()
            .map(|l| {
                let center = l.center.to_degrees()?;
                Ok(SegmentEntry { center: center.coordinates(), osm_id: l.osm_id })
            })
            .collect::<MobilityResult<Vec<_>>>()?;
        Ok(Self { index: RTree::bulk_load(entries) })
    }

    pub fn len(&self) -> usize {
        self.index.size()
    }

    pub fn is_empty(&self) -> bool {
        self.index.size() == 0
    }
}

impl ReverseGeocoder for NearestSegmentGeocoder {
    fn reverse(&self, point: &Point) -> MobilityResult<OsmId> {
        let point = point.to_degrees()?;
        self.index
            .nearest_neighbor(&point.coordinates())
            .map(|e| e.osm_id)
            .ok_or(MobilityError::NoSegment)
    }
}
