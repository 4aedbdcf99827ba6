//! iNaturalist API HTTP client

use std::time::Duration;

use crate::error::{InatError, Result};
use crate::types::*;

/// Client for the iNaturalist v1 API
///
/// A thin parameterized GET wrapper: every endpoint returns a decoded,
/// typed payload and every failure surfaces as a single [`InatError`]
/// kind, regardless of which endpoint produced it.
pub struct InatClient {
    http: reqwest::Client,
    base_url: String,
}

impl InatClient {
    /// Base URL for the iNaturalist API v1
    pub const BASE_URL: &'static str = "https://api.inaturalist.org/v1";
    /// User agent sent with every request
    pub const DEFAULT_USER_AGENT: &'static str = "inat-diff/0.1.0";

    /// Create a new client with default settings (30 second timeout)
    pub fn new() -> Self {
        Self::with_base_url(Self::BASE_URL)
    }

    /// Create a new client against a custom API URL
    pub fn with_base_url(base_url: &str) -> Self {
        Self::with_base_url_and_user_agent(base_url, Self::DEFAULT_USER_AGENT)
    }

    /// Create a new client with a custom API URL and user agent
    pub fn with_base_url_and_user_agent(base_url: &str, user_agent: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T>(&self, endpoint: &str, params: &[(&str, String)]) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut url = format!("{}/{}", self.base_url, endpoint);
        for (i, (key, value)) in params.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(InatError::Api(format!(
                "{} returned status {}",
                endpoint,
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    /// Search for places by name via the autocomplete endpoint
    ///
    /// # Arguments
    /// * `query` - Free-text place name
    /// * `place_type` - Optional place type filter (e.g. "state")
    pub async fn search_places(&self, query: &str, place_type: Option<&str>) -> Result<Vec<Place>> {
        let mut params = vec![("q", query.to_string())];
        if let Some(t) = place_type {
            params.push(("place_type", t.to_string()));
        }

        let data: PagedResponse<Place> = self.get_json("places/autocomplete", &params).await?;
        Ok(data.results)
    }

    /// Get detailed information about a specific place
    pub async fn get_place(&self, place_id: i64) -> Result<Option<Place>> {
        let endpoint = format!("places/{}", place_id);
        let data: PagedResponse<Place> = self.get_json(&endpoint, &[]).await?;
        Ok(data.results.into_iter().next())
    }

    /// Search for taxa by name
    ///
    /// # Arguments
    /// * `query` - Scientific or common name
    /// * `rank` - Optional rank filter (e.g. "species", "genus")
    pub async fn search_taxa(&self, query: &str, rank: Option<&str>) -> Result<Vec<Taxon>> {
        let mut params = vec![("q", query.to_string())];
        if let Some(r) = rank {
            params.push(("rank", r.to_string()));
        }

        let data: PagedResponse<Taxon> = self.get_json("taxa", &params).await?;
        Ok(data.results)
    }

    /// Fetch one page of observation records
    pub async fn observations(&self, query: &ObservationQuery) -> Result<PagedResponse<Observation>> {
        self.get_json("observations", &query.query_pairs()).await
    }

    /// Fetch one page of aggregated per-taxon observation counts
    ///
    /// Much cheaper than paging through raw observations when only the
    /// set of observed taxa is needed. Always requests all taxonomic
    /// ranks, not just species-level identifications.
    pub async fn species_counts(
        &self,
        query: &SpeciesCountQuery,
    ) -> Result<PagedResponse<SpeciesCount>> {
        self.get_json("observations/species_counts", &query.query_pairs())
            .await
    }
}

impl Default for InatClient {
    fn default() -> Self {
        Self::new()
    }
}
