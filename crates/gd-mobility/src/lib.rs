//! `gd-mobility` — a road-segment transition model stored in SQLite.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                       |
//! |----------------|----------------------------------------------------------------|
//! | [`geocoder`]   | `OsmId`, `ReverseGeocoder`, Nominatim and offline R-tree impls |
//! | [`directions`] | `DirectionsProvider`, openrouteservice client, fallback details |
//! | [`store`]      | `MobilityStore` — location, transition and probability tables |
//! | [`model`]      | `MobilityModel<G, D>` — builds the model, samples next segments |
//! | [`export`]     | CSV export and import of a store                               |
//! | [`error`]      | `MobilityError`, `MobilityResult<T>`                           |
//!
//! # Model
//!
//! Every consecutive point pair of a trace is reverse geocoded to a pair of
//! OSM ways.  The pair becomes a transition on the trip's weekday, carrying
//! the routed distance and duration between the two points.  After all
//! traces are added, each transition's probability is its count divided by
//! the count of all transitions leaving the same way on the same weekday.

pub mod directions;
pub mod error;
pub mod export;
pub mod geocoder;
mod http;
pub mod model;
pub mod store;

#[cfg(test)]
mod tests;

pub use directions::{
    DEFAULT_AVG_SPEED_KMH, Directions, DirectionsProvider, OpenRouteServiceClient, OrsProfile, RouteDetails,
    shortest_route_details,
};
pub use error::{MobilityError, MobilityResult};
pub use geocoder::{NearestSegmentGeocoder, NominatimClient, OsmId, ReverseGeocoder};
pub use model::MobilityModel;
pub use store::{Location, MobilityStore, Transition};
