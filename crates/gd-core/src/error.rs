//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `GeoError` as one
//! variant via `#[from]`.

use thiserror::Error;

use crate::point::{CoordinatesUnit, GeoReferenceSystem};

/// Errors produced by point, route, and parser operations.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("coordinate value {0} is not a finite number")]
    InvalidCoordinate(f64),

    #[error("a point needs exactly two coordinates, got {0}")]
    InvalidLength(usize),

    #[error("operation requires the 'latlon' geo reference system")]
    NotLatLon,

    #[error("geo reference systems differ: {0} vs {1}")]
    ReferenceSystemMismatch(GeoReferenceSystem, GeoReferenceSystem),

    #[error("point units ({found_system}, {found_unit}) do not match route units ({expected_system}, {expected_unit})")]
    UnitMismatch {
        expected_system: GeoReferenceSystem,
        expected_unit:   CoordinatesUnit,
        found_system:    GeoReferenceSystem,
        found_unit:      CoordinatesUnit,
    },

    #[error("{0} is not available for cartesian points")]
    Unsupported(&'static str),

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("length mismatch: expected {expected}, got {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("parse error: {0}")]
    Parse(String),
}

/// Shorthand result type for `gd-core`.
pub type GeoResult<T> = Result<T, GeoError>;
