//! Error types for species difference detection

use std::fmt;

#[derive(Debug)]
pub enum DiffError {
    /// No place matched the requested region name
    PlaceNotFound(String),
    /// No taxon matched the requested name
    TaxonNotFound(String),
    /// A time-period phrase could not be parsed
    InvalidTimeFormat(String),
    /// Upstream API failure (transport, HTTP status, or decode)
    Api(inat_api::InatError),
    /// Failed to write a results file
    Io(std::io::Error),
    /// Failed to serialize results
    Json(serde_json::Error),
}

impl fmt::Display for DiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlaceNotFound(msg) => write!(f, "Place not found: {}", msg),
            Self::TaxonNotFound(msg) => write!(f, "Taxon not found: {}", msg),
            Self::InvalidTimeFormat(msg) => write!(f, "Invalid time format: {}", msg),
            Self::Api(e) => write!(f, "{}", e),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for DiffError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<inat_api::InatError> for DiffError {
    fn from(e: inat_api::InatError) -> Self {
        Self::Api(e)
    }
}

impl From<std::io::Error> for DiffError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for DiffError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

pub type Result<T> = std::result::Result<T, DiffError>;
