//! Place and taxon name resolution
//!
//! Maps free-text region and taxon names onto stable iNaturalist ids,
//! with deterministic tie-breaking and metadata describing which rule
//! matched so callers can warn about ambiguous fallbacks.

use inat_api::{InatClient, Place, Taxon};
use serde::Serialize;
use tracing::warn;

use crate::error::{DiffError, Result};

/// Political boundary types preferred during place resolution,
/// checked in this fixed order.
const PRIORITY_PLACE_TYPES: [&str; 4] = ["country", "state", "county", "province"];

/// Which rule produced a place match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceMatch {
    /// A political boundary whose name contains the query
    PriorityType,
    /// A place whose name equals the query exactly
    ExactName,
    /// First search result; name did not match the query
    Fallback,
}

impl PlaceMatch {
    /// Label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::PriorityType => "priority type",
            Self::ExactName => "exact name",
            Self::Fallback => "fallback (first result)",
        }
    }
}

/// A place name resolved to its iNaturalist id
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedPlace {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub matched_as: PlaceMatch,
}

/// A taxon name resolved to its iNaturalist id
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedTaxon {
    pub id: i64,
    /// Normalized name the search ran with
    pub query_name: String,
    pub rank: Option<String>,
}

/// Pick the best place for `query` from search results.
///
/// Priority: a political boundary (country, state, county, province,
/// in that order) whose name contains the query; then an exact name
/// match; then the first result, tagged as a fallback.
pub fn select_place<'a>(query: &str, places: &'a [Place]) -> Option<(&'a Place, PlaceMatch)> {
    let needle = query.trim().to_lowercase();

    for wanted in PRIORITY_PLACE_TYPES {
        for place in places {
            let type_matches = place
                .place_type
                .as_deref()
                .map(|t| t.eq_ignore_ascii_case(wanted))
                .unwrap_or(false);
            let name_contains = place
                .name
                .as_deref()
                .map(|n| n.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if type_matches && name_contains {
                return Some((place, PlaceMatch::PriorityType));
            }
        }
    }

    for place in places {
        let exact = place
            .name
            .as_deref()
            .map(|n| n.to_lowercase() == needle)
            .unwrap_or(false);
        if exact {
            return Some((place, PlaceMatch::ExactName));
        }
    }

    places.first().map(|place| (place, PlaceMatch::Fallback))
}

/// Pick the best taxon for `query`: case-insensitive exact name match,
/// else the first search result.
pub fn select_taxon<'a>(query: &str, taxa: &'a [Taxon]) -> Option<&'a Taxon> {
    let needle = query.trim().to_lowercase();
    taxa.iter()
        .find(|t| {
            t.name
                .as_deref()
                .map(|n| n.to_lowercase() == needle)
                .unwrap_or(false)
        })
        .or_else(|| taxa.first())
}

/// Resolve a region name to a place id
pub async fn resolve_place(client: &InatClient, region: &str) -> Result<ResolvedPlace> {
    let places = client.search_places(region, None).await?;
    let (place, matched_as) = select_place(region, &places)
        .ok_or_else(|| DiffError::PlaceNotFound(format!("no places found for '{}'", region)))?;

    let name = place.name.clone().unwrap_or_default();
    let display_name = place.display_name.clone().unwrap_or_else(|| name.clone());

    if matched_as == PlaceMatch::Fallback {
        warn!(
            region,
            resolved = %display_name,
            place_id = place.id,
            "no exact place match, using first search result"
        );
    }

    Ok(ResolvedPlace {
        id: place.id,
        name,
        display_name,
        matched_as,
    })
}

/// Resolve a taxon name to a taxon id. The name is normalized to
/// binomial convention before searching.
pub async fn resolve_taxon(client: &InatClient, taxon_name: &str) -> Result<ResolvedTaxon> {
    let normalized = normalize_taxon_name(taxon_name);
    let taxa = client.search_taxa(&normalized, None).await?;
    let taxon = select_taxon(&normalized, &taxa)
        .ok_or_else(|| DiffError::TaxonNotFound(format!("no taxa found for '{}'", normalized)))?;

    Ok(ResolvedTaxon {
        id: taxon.id,
        query_name: normalized,
        rank: taxon.rank.clone(),
    })
}

/// Normalize a taxon name for API queries.
///
/// A name of exactly two alphabetic tokens (hyphens allowed) is taken
/// as a binomial and gets `Genus species` capitalization; anything
/// else passes through untouched apart from trimming.
pub fn normalize_taxon_name(name: &str) -> String {
    let name = name.trim();
    let parts: Vec<&str> = name.split_whitespace().collect();

    let binomial = parts.len() == 2
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_alphabetic() || c == '-'));

    if binomial {
        format!("{} {}", capitalize(parts[0]), parts[1].to_lowercase())
    } else {
        name.to_string()
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(id: i64, name: &str, place_type: &str) -> Place {
        Place {
            id,
            name: Some(name.to_string()),
            display_name: Some(format!("{}, US", name)),
            place_type: Some(place_type.to_string()),
            admin_level: None,
        }
    }

    fn taxon(id: i64, name: &str) -> Taxon {
        Taxon {
            id,
            name: Some(name.to_string()),
            preferred_common_name: None,
            rank: Some("species".to_string()),
            iconic_taxon_name: None,
            ancestor_ids: vec![],
        }
    }

    #[test]
    fn state_outranks_county() {
        let places = vec![place(1, "X", "county"), place(2, "X", "state")];
        let (selected, matched) = select_place("X", &places).unwrap();
        assert_eq!(selected.id, 2);
        assert_eq!(matched, PlaceMatch::PriorityType);
    }

    #[test]
    fn priority_requires_name_containment() {
        // The state's name does not contain the query, so the exact
        // (non-priority) match wins instead.
        let places = vec![place(1, "Somewhere", "state"), place(2, "oregon", "open_space")];
        let (selected, matched) = select_place("Oregon", &places).unwrap();
        assert_eq!(selected.id, 2);
        assert_eq!(matched, PlaceMatch::ExactName);
    }

    #[test]
    fn containment_is_enough_for_priority_types() {
        let places = vec![place(7, "Greater Portland Metro", "county")];
        let (selected, matched) = select_place("Portland", &places).unwrap();
        assert_eq!(selected.id, 7);
        assert_eq!(matched, PlaceMatch::PriorityType);
    }

    #[test]
    fn falls_back_to_first_result() {
        let places = vec![place(9, "Crystal Springs Garden", "open_space")];
        let (selected, matched) = select_place("Portland", &places).unwrap();
        assert_eq!(selected.id, 9);
        assert_eq!(matched, PlaceMatch::Fallback);
        assert_eq!(matched.label(), "fallback (first result)");
    }

    #[test]
    fn no_places_means_no_selection() {
        assert!(select_place("Oregon", &[]).is_none());
    }

    #[test]
    fn selection_is_deterministic() {
        let places = vec![
            place(1, "X", "county"),
            place(2, "X", "state"),
            place(3, "X", "country"),
        ];
        for _ in 0..10 {
            let (selected, _) = select_place("X", &places).unwrap();
            assert_eq!(selected.id, 3);
        }
    }

    #[test]
    fn exact_taxon_match_beats_search_rank() {
        let taxa = vec![taxon(10, "Canis lupus familiaris"), taxon(11, "Canis lupus")];
        assert_eq!(select_taxon("canis lupus", &taxa).unwrap().id, 11);
    }

    #[test]
    fn first_taxon_when_no_exact_match() {
        let taxa = vec![taxon(10, "Canis lupus familiaris"), taxon(11, "Canis lupus")];
        assert_eq!(select_taxon("Canis", &taxa).unwrap().id, 10);
    }

    #[test]
    fn binomial_names_are_capitalized() {
        assert_eq!(normalize_taxon_name("panthera LEO"), "Panthera leo");
        assert_eq!(normalize_taxon_name("  python bivittatus "), "Python bivittatus");
        assert_eq!(normalize_taxon_name("aix sponsa-hybrid"), "Aix sponsa-hybrid");
    }

    #[test]
    fn non_binomial_names_pass_through() {
        assert_eq!(
            normalize_taxon_name("Canis lupus familiaris"),
            "Canis lupus familiaris"
        );
        assert_eq!(normalize_taxon_name("Aves"), "Aves");
        assert_eq!(normalize_taxon_name("C4 grasses"), "C4 grasses");
    }
}
