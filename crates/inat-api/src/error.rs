//! Error types for the iNaturalist API client

use std::fmt;

/// Errors that can occur when interacting with the iNaturalist API
#[derive(Debug)]
pub enum InatError {
    /// HTTP request failed (transport, timeout, or body decode)
    Http(reqwest::Error),
    /// The API answered with a non-success status
    Api(String),
}

impl fmt::Display for InatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "iNaturalist HTTP error: {}", e),
            Self::Api(msg) => write!(f, "iNaturalist API error: {}", msg),
        }
    }
}

impl std::error::Error for InatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::Api(_) => None,
        }
    }
}

impl From<reqwest::Error> for InatError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

/// Result type for iNaturalist API operations
pub type Result<T> = std::result::Result<T, InatError>;
