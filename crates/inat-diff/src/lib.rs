//! Detect species newly appearing in a region from iNaturalist data
//!
//! Resolves free-text place and taxon names to stable ids, parses
//! informal time-period phrases, pages through the observation API
//! with rate limiting and retry, and classifies every taxon observed
//! in a current window as new or established against a historical
//! lookback window, using taxonomic ancestry to absorb identification
//! rank mismatches between the two.
//!
//! # Example
//!
//! ```no_run
//! use inat_diff::{RetryPolicy, SpeciesQuery};
//!
//! # async fn example() -> inat_diff::Result<()> {
//! let engine = SpeciesQuery::new();
//! let report = engine
//!     .find_all_new_species("this month", "Oregon", None, 20, &RetryPolicy::default())
//!     .await?;
//! println!("{} new species", report.new_species_count);
//! # Ok(())
//! # }
//! ```

pub mod diff;
pub mod error;
pub mod fetch;
pub mod html;
pub mod quality;
pub mod query;
pub mod report;
pub mod resolve;
pub mod timeparse;

pub use inat_api::InatClient;

pub use diff::{diff_species, ClassifiedSpecies, SpeciesDiff};
pub use error::{DiffError, Result};
pub use fetch::RetryPolicy;
pub use quality::QualityAnnotator;
pub use query::{NewSpeciesReport, SpeciesQuery, DEFAULT_LOOKBACK_YEARS};
pub use timeparse::{parse_time_period, TimeWindow};
