//! Query orchestration for species observation analysis
//!
//! Ties the parser, resolver, fetcher and differencer together into
//! the operations the CLI and server expose. Every operation returns
//! an immutable, serializable report snapshot.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use inat_api::{InatClient, Observation, ObservationQuery, Place, SpeciesCount, SpeciesCountQuery};
use serde::Serialize;
use tracing::info;

use crate::diff::{diff_species, ClassifiedSpecies};
use crate::error::Result;
use crate::fetch::{fetch_all_pages, fetch_species_count_map, RetryPolicy};
use crate::resolve::{resolve_place, resolve_taxon, ResolvedPlace, ResolvedTaxon};
use crate::timeparse::{parse_time_period, TimeWindow};

/// Default number of years to look back for historical observations
pub const DEFAULT_LOOKBACK_YEARS: u32 = 20;

/// Query parameters and resolved ids, echoed back in every report
#[derive(Debug, Clone, Serialize)]
pub struct QueryInfo {
    pub region: String,
    pub place_id: i64,
    pub place_display_name: String,
    pub place_matched_as: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxon_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxon_id: Option<i64>,
    pub time_period: String,
    pub start_date: String,
    pub end_date: String,
}

impl QueryInfo {
    fn new(
        region: &str,
        place: &ResolvedPlace,
        taxon: Option<&ResolvedTaxon>,
        time_period: &str,
        window: &TimeWindow,
    ) -> Self {
        Self {
            region: region.to_string(),
            place_id: place.id,
            place_display_name: place.display_name.clone(),
            place_matched_as: place.matched_as.label().to_string(),
            taxon_name: taxon.map(|t| t.query_name.clone()),
            taxon_id: taxon.map(|t| t.id),
            time_period: time_period.to_string(),
            start_date: window.start_str(),
            end_date: window.end_str(),
        }
    }
}

/// One page of raw observations for a specific taxon/region/period
#[derive(Debug, Clone, Serialize)]
pub struct ObservationReport {
    pub query: QueryInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_info: Option<Place>,
    pub total_results: u64,
    pub per_page: u32,
    pub page: u32,
    pub observations: Vec<Observation>,
}

/// Whether one specific taxon is new to a region
#[derive(Debug, Clone, Serialize)]
pub struct SingleSpeciesReport {
    pub query: QueryInfo,
    pub total_results: u64,
    pub historical_total: u64,
    pub lookback_period: String,
    pub lookback_years: u32,
    pub is_new_to_region: bool,
    pub analysis: String,
}

/// A unique taxon aggregated from raw observations
#[derive(Debug, Clone, Serialize)]
pub struct SpeciesSummary {
    pub id: i64,
    pub name: Option<String>,
    pub preferred_common_name: Option<String>,
    pub rank: Option<String>,
    pub observation_count: u64,
}

/// All species observed in a region during a period
#[derive(Debug, Clone, Serialize)]
pub struct SpeciesListReport {
    pub query: QueryInfo,
    pub species_count: usize,
    pub total_observations: usize,
    pub species: Vec<SpeciesSummary>,
}

/// Outcome of the all-new-species pipeline
#[derive(Debug, Clone, Serialize)]
pub struct NewSpeciesReport {
    pub query: QueryInfo,
    pub lookback_period: String,
    pub lookback_years: u32,
    pub total_species_in_period: usize,
    pub new_species_count: usize,
    pub established_species_count: usize,
    pub new_species: Vec<ClassifiedSpecies>,
    pub established_species: Vec<ClassifiedSpecies>,
    pub rate_limit_seconds: f64,
}

/// High-level query engine over an [`InatClient`]
pub struct SpeciesQuery {
    client: InatClient,
}

impl SpeciesQuery {
    pub fn new() -> Self {
        Self::with_client(InatClient::new())
    }

    pub fn with_client(client: InatClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &InatClient {
        &self.client
    }

    /// Fetch one page of observations for a taxon in a region/period
    pub async fn query_species_in_period(
        &self,
        taxon_name: &str,
        time_period: &str,
        region: &str,
    ) -> Result<ObservationReport> {
        let window = parse_time_period(time_period)?;
        let place = resolve_place(&self.client, region).await?;
        let taxon = resolve_taxon(&self.client, taxon_name).await?;

        let observations = self
            .client
            .observations(&ObservationQuery {
                place_id: Some(place.id),
                taxon_id: Some(taxon.id),
                d1: Some(window.start_str()),
                d2: Some(window.end_str()),
                ..Default::default()
            })
            .await?;

        let place_info = self.client.get_place(place.id).await?;

        Ok(ObservationReport {
            query: QueryInfo::new(region, &place, Some(&taxon), time_period, &window),
            place_info,
            total_results: observations.total_results,
            per_page: observations.per_page,
            page: observations.page,
            observations: observations.results,
        })
    }

    /// Check whether one specific taxon is new to a region: observed in
    /// the period, with no observations in the lookback window before it.
    pub async fn check_new_species(
        &self,
        taxon_name: &str,
        time_period: &str,
        region: &str,
        lookback_years: u32,
    ) -> Result<SingleSpeciesReport> {
        let current = self
            .query_species_in_period(taxon_name, time_period, region)
            .await?;

        if current.total_results == 0 {
            return Ok(SingleSpeciesReport {
                query: current.query,
                total_results: 0,
                historical_total: 0,
                lookback_period: "N/A".to_string(),
                lookback_years,
                is_new_to_region: false,
                analysis: "No observations found in the specified period".to_string(),
            });
        }

        let window = parse_time_period(time_period)?;
        let lookback = lookback_window(window.start, lookback_years);

        let historical = self
            .client
            .observations(&ObservationQuery {
                place_id: Some(current.query.place_id),
                taxon_id: current.query.taxon_id,
                d1: Some(lookback.start_str()),
                d2: Some(lookback.end_str()),
                ..Default::default()
            })
            .await?;

        let is_new = historical.total_results == 0;
        let analysis = if is_new {
            format!(
                "Species appears to be NEW to {} in the specified period. \
                 No observations found in the previous {} years.",
                region, lookback_years
            )
        } else {
            format!(
                "Species was previously observed in {}. Found {} historical observations.",
                region, historical.total_results
            )
        };

        Ok(SingleSpeciesReport {
            query: current.query,
            total_results: current.total_results,
            historical_total: historical.total_results,
            lookback_period: lookback.to_string(),
            lookback_years,
            is_new_to_region: is_new,
            analysis,
        })
    }

    /// List every species observed in a region during a period,
    /// aggregated from the full paginated observation set.
    pub async fn list_species_in_period(
        &self,
        time_period: &str,
        region: &str,
        policy: &RetryPolicy,
    ) -> Result<SpeciesListReport> {
        let window = parse_time_period(time_period)?;
        let place = resolve_place(&self.client, region).await?;

        let observations = fetch_all_pages(policy, |page| {
            let query = ObservationQuery {
                place_id: Some(place.id),
                d1: Some(window.start_str()),
                d2: Some(window.end_str()),
                page,
                ..Default::default()
            };
            let client = &self.client;
            async move { client.observations(&query).await }
        })
        .await?;

        let species = summarize_observations(&observations);

        Ok(SpeciesListReport {
            query: QueryInfo::new(region, &place, None, time_period, &window),
            species_count: species.len(),
            total_observations: observations.len(),
            species,
        })
    }

    /// Find all species that appear to be new to a region during a
    /// period: fetch the current and historical species-count maps and
    /// classify every current taxon against the historical set.
    pub async fn find_all_new_species(
        &self,
        time_period: &str,
        region: &str,
        taxon_name: Option<&str>,
        lookback_years: u32,
        policy: &RetryPolicy,
    ) -> Result<NewSpeciesReport> {
        let window = parse_time_period(time_period)?;
        let lookback = lookback_window(window.start, lookback_years);

        let place = resolve_place(&self.client, region).await?;
        let taxon = match taxon_name {
            Some(name) => Some(resolve_taxon(&self.client, name).await?),
            None => None,
        };
        let taxon_id = taxon.as_ref().map(|t| t.id);

        info!(
            region = %place.display_name,
            period = %window,
            "fetching current-window species counts"
        );
        let current = self
            .species_count_window(place.id, taxon_id, &window, policy)
            .await?;

        info!(
            species = current.len(),
            lookback = %lookback,
            "fetching historical species counts"
        );
        let historical = self
            .species_count_window(place.id, taxon_id, &lookback, policy)
            .await?;

        let diff = diff_species(&current, &historical);
        info!(
            new = diff.new_species.len(),
            established = diff.established_species.len(),
            "classification complete"
        );

        Ok(NewSpeciesReport {
            query: QueryInfo::new(region, &place, taxon.as_ref(), time_period, &window),
            lookback_period: lookback.to_string(),
            lookback_years,
            total_species_in_period: current.len(),
            new_species_count: diff.new_species.len(),
            established_species_count: diff.established_species.len(),
            new_species: diff.new_species,
            established_species: diff.established_species,
            rate_limit_seconds: policy.rate_limit.as_secs_f64(),
        })
    }

    async fn species_count_window(
        &self,
        place_id: i64,
        taxon_id: Option<i64>,
        window: &TimeWindow,
        policy: &RetryPolicy,
    ) -> Result<HashMap<i64, SpeciesCount>> {
        fetch_species_count_map(policy, |page| {
            let query = SpeciesCountQuery {
                place_id: Some(place_id),
                taxon_id,
                d1: Some(window.start_str()),
                d2: Some(window.end_str()),
                page,
                ..Default::default()
            };
            let client = &self.client;
            async move { client.species_counts(&query).await }
        })
        .await
    }
}

impl Default for SpeciesQuery {
    fn default() -> Self {
        Self::new()
    }
}

/// Historical window for a lookback: ends the day before the current
/// window starts, and reaches back 365 x years days from there.
pub fn lookback_window(current_start: NaiveDate, years: u32) -> TimeWindow {
    let end = current_start - Duration::days(1);
    let start = end - Duration::days(365 * i64::from(years));
    TimeWindow { start, end }
}

/// Aggregate raw observations into unique taxa with observation
/// tallies, sorted by count (descending, taxon id tiebreak).
pub fn summarize_observations(observations: &[Observation]) -> Vec<SpeciesSummary> {
    let mut unique: HashMap<i64, SpeciesSummary> = HashMap::new();

    for observation in observations {
        let Some(taxon) = &observation.taxon else {
            continue;
        };
        unique
            .entry(taxon.id)
            .or_insert_with(|| SpeciesSummary {
                id: taxon.id,
                name: taxon.name.clone(),
                preferred_common_name: taxon.preferred_common_name.clone(),
                rank: taxon.rank.clone(),
                observation_count: 0,
            })
            .observation_count += 1;
    }

    let mut species: Vec<SpeciesSummary> = unique.into_values().collect();
    species.sort_by(|a, b| {
        b.observation_count
            .cmp(&a.observation_count)
            .then(a.id.cmp(&b.id))
    });
    species
}

#[cfg(test)]
mod tests {
    use super::*;
    use inat_api::Taxon;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn observation_of(taxon_id: i64, name: &str) -> Observation {
        Observation {
            id: taxon_id * 1000,
            observed_on: Some("2024-03-01".to_string()),
            quality_grade: Some("research".to_string()),
            uri: None,
            taxon: Some(Taxon {
                id: taxon_id,
                name: Some(name.to_string()),
                preferred_common_name: None,
                rank: Some("species".to_string()),
                iconic_taxon_name: None,
                ancestor_ids: vec![],
            }),
        }
    }

    #[test]
    fn lookback_ends_the_day_before_the_window() {
        let lookback = lookback_window(date(2024, 3, 1), 20);
        assert_eq!(lookback.end_str(), "2024-02-29");
        assert_eq!(lookback.start, lookback.end - Duration::days(7300));
        assert!(lookback.start <= lookback.end);
    }

    #[test]
    fn summarize_tallies_unique_taxa() {
        let observations = vec![
            observation_of(1, "Apis mellifera"),
            observation_of(2, "Bombus vosnesenskii"),
            observation_of(1, "Apis mellifera"),
            Observation {
                id: 99,
                observed_on: None,
                quality_grade: None,
                uri: None,
                taxon: None,
            },
        ];

        let species = summarize_observations(&observations);
        assert_eq!(species.len(), 2);
        assert_eq!(species[0].id, 1);
        assert_eq!(species[0].observation_count, 2);
        assert_eq!(species[1].id, 2);
        assert_eq!(species[1].observation_count, 1);
    }

    #[test]
    fn query_info_serializes_without_absent_taxon() {
        let place = crate::resolve::ResolvedPlace {
            id: 10,
            name: "Oregon".to_string(),
            display_name: "Oregon, US".to_string(),
            matched_as: crate::resolve::PlaceMatch::PriorityType,
        };
        let window = TimeWindow {
            start: date(2024, 2, 1),
            end: date(2024, 2, 29),
        };
        let info = QueryInfo::new("Oregon", &place, None, "this month", &window);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["place_id"], 10);
        assert_eq!(json["start_date"], "2024-02-01");
        assert!(json.get("taxon_id").is_none());
        assert_eq!(json["place_matched_as"], "priority type");
    }
}
