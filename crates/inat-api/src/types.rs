//! Data types for iNaturalist API responses
//!
//! These structs mirror the iNaturalist v1 payloads. Response fields
//! are optional at the wire boundary so downstream code never has to
//! re-check raw JSON for missing keys.

use serde::{Deserialize, Serialize};

/// A named place recognized by iNaturalist, identified by a stable id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub id: i64,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub place_type: Option<String>,
    pub admin_level: Option<i64>,
}

/// A node in the taxonomic hierarchy
///
/// `ancestor_ids` is the lineage from root to immediate parent; a
/// taxon's own id does not appear in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Taxon {
    pub id: i64,
    pub name: Option<String>,
    pub preferred_common_name: Option<String>,
    pub rank: Option<String>,
    pub iconic_taxon_name: Option<String>,
    #[serde(default)]
    pub ancestor_ids: Vec<i64>,
}

/// Aggregated observation count for one taxon, from
/// `observations/species_counts`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesCount {
    pub taxon: Taxon,
    #[serde(default)]
    pub count: u64,
}

/// A single observation record (subset of fields actually consumed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub id: i64,
    pub observed_on: Option<String>,
    pub quality_grade: Option<String>,
    pub uri: Option<String>,
    pub taxon: Option<Taxon>,
}

/// Pagination envelope shared by all list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct PagedResponse<T> {
    #[serde(default)]
    pub total_results: u64,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub results: Vec<T>,
}

fn default_page() -> u32 {
    1
}

/// Parameters for the `observations` endpoint
#[derive(Debug, Clone)]
pub struct ObservationQuery {
    pub place_id: Option<i64>,
    pub taxon_id: Option<i64>,
    pub taxon_name: Option<String>,
    /// Inclusive start date, `YYYY-MM-DD`
    pub d1: Option<String>,
    /// Inclusive end date, `YYYY-MM-DD`
    pub d2: Option<String>,
    pub quality_grade: Option<String>,
    pub per_page: u32,
    pub page: u32,
}

impl Default for ObservationQuery {
    fn default() -> Self {
        Self {
            place_id: None,
            taxon_id: None,
            taxon_name: None,
            d1: None,
            d2: None,
            quality_grade: None,
            per_page: 200,
            page: 1,
        }
    }
}

impl ObservationQuery {
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(id) = self.place_id {
            pairs.push(("place_id", id.to_string()));
        }
        if let Some(id) = self.taxon_id {
            pairs.push(("taxon_id", id.to_string()));
        }
        if let Some(ref name) = self.taxon_name {
            pairs.push(("taxon_name", name.clone()));
        }
        if let Some(ref d1) = self.d1 {
            pairs.push(("d1", d1.clone()));
        }
        if let Some(ref d2) = self.d2 {
            pairs.push(("d2", d2.clone()));
        }
        if let Some(ref grade) = self.quality_grade {
            pairs.push(("quality_grade", grade.clone()));
        }
        pairs.push(("per_page", self.per_page.to_string()));
        pairs.push(("page", self.page.to_string()));
        pairs
    }
}

/// Parameters for the `observations/species_counts` endpoint
#[derive(Debug, Clone)]
pub struct SpeciesCountQuery {
    pub place_id: Option<i64>,
    pub taxon_id: Option<i64>,
    pub iconic_taxon: Option<String>,
    /// Inclusive start date, `YYYY-MM-DD`
    pub d1: Option<String>,
    /// Inclusive end date, `YYYY-MM-DD`
    pub d2: Option<String>,
    pub per_page: u32,
    pub page: u32,
}

impl Default for SpeciesCountQuery {
    fn default() -> Self {
        Self {
            place_id: None,
            taxon_id: None,
            iconic_taxon: None,
            d1: None,
            d2: None,
            per_page: 500,
            page: 1,
        }
    }
}

impl SpeciesCountQuery {
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        // leaf_taxa=true keeps genus/family-level identifications in the
        // counts instead of only species-rank rows.
        let mut pairs = vec![("leaf_taxa", "true".to_string())];
        if let Some(id) = self.place_id {
            pairs.push(("place_id", id.to_string()));
        }
        if let Some(id) = self.taxon_id {
            pairs.push(("taxon_id", id.to_string()));
        }
        if let Some(ref iconic) = self.iconic_taxon {
            pairs.push(("iconic_taxa", iconic.clone()));
        }
        if let Some(ref d1) = self.d1 {
            pairs.push(("d1", d1.clone()));
        }
        if let Some(ref d2) = self.d2 {
            pairs.push(("d2", d2.clone()));
        }
        pairs.push(("per_page", self.per_page.to_string()));
        pairs.push(("page", self.page.to_string()));
        pairs
    }
}
