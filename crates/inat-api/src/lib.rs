//! Rust client for the iNaturalist API
//!
//! This crate provides type-safe bindings to the iNaturalist v1 API,
//! which offers access to crowd-sourced biodiversity observation data.
//!
//! # Example
//!
//! ```no_run
//! use inat_api::{InatClient, SpeciesCountQuery};
//!
//! # async fn example() -> Result<(), inat_api::InatError> {
//! let client = InatClient::new();
//!
//! // Search for places
//! let places = client.search_places("Oregon", None).await?;
//! for place in &places {
//!     println!("{:?} ({:?})", place.name, place.place_type);
//! }
//!
//! // Aggregated species counts for a place
//! let query = SpeciesCountQuery {
//!     place_id: places.first().map(|p| p.id),
//!     ..Default::default()
//! };
//! let counts = client.species_counts(&query).await?;
//! println!("{} taxa observed", counts.total_results);
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! This crate covers the following iNaturalist v1 endpoints:
//!
//! - `GET /places/autocomplete` - Place name search
//! - `GET /places/{id}` - Place details
//! - `GET /taxa` - Taxon name search
//! - `GET /observations` - Observation records
//! - `GET /observations/species_counts` - Aggregated per-taxon counts

mod client;
mod error;
mod types;

pub use client::InatClient;
pub use error::{InatError, Result};
pub use types::{
    Observation, ObservationQuery, PagedResponse, Place, SpeciesCount, SpeciesCountQuery, Taxon,
};
