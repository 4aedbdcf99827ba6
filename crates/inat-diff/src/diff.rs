//! Species-set differencing between two time windows
//!
//! Classifies every taxon observed in the current window as "new" or
//! "established" against a historical window, using taxonomic
//! ancestry so that rank mismatches between the two windows (a
//! genus-level identification now vs. species-level identifications
//! before) do not read as new arrivals.

use std::collections::{HashMap, HashSet};

use inat_api::SpeciesCount;
use serde::Serialize;

/// A current-window taxon classified against the historical window
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedSpecies {
    pub id: i64,
    pub name: Option<String>,
    pub preferred_common_name: Option<String>,
    pub rank: Option<String>,
    pub iconic_taxon: Option<String>,
    pub observation_count: u64,
    pub historical_count: u64,
    /// Filled in by the quality annotator on the reporting path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_quality_grade_label: Option<String>,
}

impl ClassifiedSpecies {
    fn from_record(record: &SpeciesCount, historical_count: u64) -> Self {
        Self {
            id: record.taxon.id,
            name: record.taxon.name.clone(),
            preferred_common_name: record.taxon.preferred_common_name.clone(),
            rank: record.taxon.rank.clone(),
            iconic_taxon: record.taxon.iconic_taxon_name.clone(),
            observation_count: record.count,
            historical_count,
            highest_quality_grade_label: None,
        }
    }
}

/// Partition of the current window into new and established taxa
#[derive(Debug, Clone, Default, Serialize)]
pub struct SpeciesDiff {
    pub new_species: Vec<ClassifiedSpecies>,
    pub established_species: Vec<ClassifiedSpecies>,
}

/// Classify every current taxon as new or established.
///
/// A current taxon is established when it has a direct historical
/// record, or when it appears in the historical ancestor closure —
/// i.e. some historically observed taxon descends from it. In the
/// closure case its historical count is the sum over all historical
/// records in its lineage. Everything else is new, historical count 0.
///
/// Output lists are sorted by observation count (descending) with the
/// taxon id as tiebreak, so repeated runs over the same inputs yield
/// identical partitions.
pub fn diff_species(
    current: &HashMap<i64, SpeciesCount>,
    historical: &HashMap<i64, SpeciesCount>,
) -> SpeciesDiff {
    let mut closure: HashSet<i64> = historical.keys().copied().collect();
    for record in historical.values() {
        closure.extend(record.taxon.ancestor_ids.iter().copied());
    }

    let mut diff = SpeciesDiff::default();

    for (taxon_id, record) in current {
        let historical_count = if let Some(hist) = historical.get(taxon_id) {
            Some(hist.count)
        } else if closure.contains(taxon_id) {
            Some(descendant_count(historical, *taxon_id))
        } else {
            None
        };

        match historical_count {
            Some(count) => diff
                .established_species
                .push(ClassifiedSpecies::from_record(record, count)),
            None => diff
                .new_species
                .push(ClassifiedSpecies::from_record(record, 0)),
        }
    }

    sort_by_count(&mut diff.new_species);
    sort_by_count(&mut diff.established_species);
    diff
}

/// Sum of historical counts over every record descending from `taxon_id`
fn descendant_count(historical: &HashMap<i64, SpeciesCount>, taxon_id: i64) -> u64 {
    historical
        .values()
        .filter(|record| record.taxon.ancestor_ids.contains(&taxon_id))
        .map(|record| record.count)
        .sum()
}

fn sort_by_count(species: &mut [ClassifiedSpecies]) {
    species.sort_by(|a, b| {
        b.observation_count
            .cmp(&a.observation_count)
            .then(a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use inat_api::Taxon;

    fn record(taxon_id: i64, count: u64, ancestor_ids: Vec<i64>) -> SpeciesCount {
        SpeciesCount {
            taxon: Taxon {
                id: taxon_id,
                name: Some(format!("Taxon {}", taxon_id)),
                preferred_common_name: None,
                rank: Some("species".to_string()),
                iconic_taxon_name: None,
                ancestor_ids,
            },
            count,
        }
    }

    fn map(records: Vec<SpeciesCount>) -> HashMap<i64, SpeciesCount> {
        records.into_iter().map(|r| (r.taxon.id, r)).collect()
    }

    #[test]
    fn direct_match_is_established_with_its_count() {
        let current = map(vec![record(5, 2, vec![1, 2])]);
        let historical = map(vec![record(5, 7, vec![1, 2])]);

        let diff = diff_species(&current, &historical);
        assert!(diff.new_species.is_empty());
        assert_eq!(diff.established_species.len(), 1);
        assert_eq!(diff.established_species[0].historical_count, 7);
    }

    #[test]
    fn ancestor_of_historical_taxon_is_established() {
        // Current genus-level id 5 vs. a historical species that lists
        // 5 among its ancestors: not a new arrival.
        let current = map(vec![record(5, 1, vec![1, 2])]);
        let historical = map(vec![record(7, 3, vec![1, 2, 5])]);

        let diff = diff_species(&current, &historical);
        assert!(diff.new_species.is_empty());
        assert_eq!(diff.established_species.len(), 1);
        assert_eq!(diff.established_species[0].id, 5);
        assert_eq!(diff.established_species[0].historical_count, 3);
    }

    #[test]
    fn closure_count_sums_over_all_descendants() {
        let current = map(vec![record(5, 1, vec![1])]);
        let historical = map(vec![
            record(7, 3, vec![1, 5]),
            record(8, 4, vec![1, 5]),
            record(9, 100, vec![1, 2]),
        ]);

        let diff = diff_species(&current, &historical);
        assert_eq!(diff.established_species[0].historical_count, 7);
    }

    #[test]
    fn unknown_taxon_is_new_with_zero_history() {
        let current = map(vec![record(9, 4, vec![1, 2])]);
        let historical = HashMap::new();

        let diff = diff_species(&current, &historical);
        assert!(diff.established_species.is_empty());
        assert_eq!(diff.new_species.len(), 1);
        assert_eq!(diff.new_species[0].id, 9);
        assert_eq!(diff.new_species[0].historical_count, 0);
    }

    #[test]
    fn mixed_partition() {
        let current = map(vec![
            record(5, 1, vec![1, 2]),
            record(6, 2, vec![1, 3]),
            record(7, 9, vec![1, 4]),
        ]);
        let historical = map(vec![record(6, 11, vec![1, 3]), record(8, 2, vec![1, 2, 5])]);

        let diff = diff_species(&current, &historical);
        let new_ids: Vec<i64> = diff.new_species.iter().map(|s| s.id).collect();
        let established_ids: Vec<i64> = diff.established_species.iter().map(|s| s.id).collect();

        assert_eq!(new_ids, vec![7]);
        assert_eq!(established_ids, vec![6, 5]);
    }

    #[test]
    fn output_is_sorted_by_count_then_id() {
        let current = map(vec![
            record(3, 5, vec![]),
            record(1, 5, vec![]),
            record(2, 9, vec![]),
        ]);
        let diff = diff_species(&current, &HashMap::new());
        let ids: Vec<i64> = diff.new_species.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn differencing_is_idempotent() {
        let current = map(vec![
            record(5, 1, vec![1, 2]),
            record(6, 2, vec![1, 3]),
            record(7, 9, vec![1, 4]),
        ]);
        let historical = map(vec![record(6, 11, vec![1, 3])]);

        let first = diff_species(&current, &historical);
        let second = diff_species(&current, &historical);

        let ids = |species: &[ClassifiedSpecies]| species.iter().map(|s| s.id).collect::<Vec<_>>();
        assert_eq!(ids(&first.new_species), ids(&second.new_species));
        assert_eq!(
            ids(&first.established_species),
            ids(&second.established_species)
        );
    }
}
