//! `gd-core` — foundational types for the geodata preprocessing workspace.
//!
//! This crate is a dependency of every other `gd-*` crate.  It has no `gd-*`
//! dependencies and only small external ones (`chrono`, `thiserror`,
//! `tracing`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`point`]       | `Point`, reference systems, bearing / distance / interpolation |
//! | [`timed_point`] | `TimedPoint` — a point with a UTC timestamp              |
//! | [`route`]       | `Route<P>`, `TimedRoute`, the `Located` trait             |
//! | [`bounds`]      | `LocationBounds` for min/max scaling                      |
//! | [`parser`]      | String ↔ list parsers for stored points and timestamps    |
//! | [`time`]        | Timestamp parsing and `TimeFeatures`                      |
//! | [`features`]    | `FeatureMatrix` and one-hot time encodings               |
//! | [`error`]       | `GeoError`, `GeoResult`                                   |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to points, routes, bounds.  |

pub mod bounds;
pub mod error;
pub mod features;
pub mod parser;
pub mod point;
pub mod route;
pub mod time;
pub mod timed_point;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use bounds::LocationBounds;
pub use error::{GeoError, GeoResult};
pub use features::{FeatureMatrix, one_hot_time_features};
pub use point::{CoordinatesUnit, GeoReferenceSystem, Point, bearing, distance, interpolated_point};
pub use route::{Located, Route, TimedRoute};
pub use time::TimeFeatures;
pub use timed_point::{TimedPoint, timed_interpolated_point};
