use gd_core::GeoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MobilityError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unexpected service response: {0}")]
    BadResponse(String),

    #[error("unknown openrouteservice profile {0:?}")]
    UnknownProfile(String),

    #[error("no road segment known near the requested point")]
    NoSegment,
}

pub type MobilityResult<T> = Result<T, MobilityError>;
