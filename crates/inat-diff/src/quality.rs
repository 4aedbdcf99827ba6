//! Best-observation quality grade annotation
//!
//! A reporting-path extra: for each taxon in a report, look up the
//! best quality grade among its observations in the queried place.
//! Lookups are memoized per (taxon, place) for the process lifetime —
//! entries are computed once and never invalidated, so upstream grade
//! changes are not observed until restart.

use std::time::Duration;

use inat_api::{InatClient, ObservationQuery};
use moka::future::Cache;
use tokio::time::sleep;
use tracing::debug;

use crate::diff::ClassifiedSpecies;

/// Quality grades from best to worst
const QUALITY_PRIORITY: [&str; 3] = ["research", "needs_id", "casual"];

/// Human-readable label for a quality grade key
fn quality_label(grade: &str) -> String {
    match grade {
        "research" => "Research Grade".to_string(),
        "needs_id" => "Needs ID".to_string(),
        "casual" => "Casual".to_string(),
        other => other.to_string(),
    }
}

/// Memoized best-quality-grade lookup
pub struct QualityAnnotator {
    client: InatClient,
    cache: Cache<(i64, Option<i64>), Option<String>>,
}

impl QualityAnnotator {
    pub fn new(client: InatClient) -> Self {
        Self {
            client,
            // Unbounded by design: per-process, entries never expire
            cache: Cache::builder().build(),
        }
    }

    /// Best available quality grade for a taxon in a place, or `None`
    /// when there are no observations (or the probe fails).
    ///
    /// Cache misses cost up to three API calls and sleep `rate_limit`
    /// afterwards; cache hits return immediately.
    pub async fn highest_quality_grade(
        &self,
        taxon_id: i64,
        place_id: Option<i64>,
        rate_limit: Duration,
    ) -> Option<String> {
        let key = (taxon_id, place_id);
        if let Some(cached) = self.cache.get(&key).await {
            return cached;
        }

        let grade = self.probe(taxon_id, place_id).await;
        self.cache.insert(key, grade.clone()).await;
        sleep(rate_limit).await;
        grade
    }

    async fn probe(&self, taxon_id: i64, place_id: Option<i64>) -> Option<String> {
        for grade in QUALITY_PRIORITY {
            let query = ObservationQuery {
                taxon_id: Some(taxon_id),
                place_id,
                quality_grade: Some(grade.to_string()),
                per_page: 1,
                ..Default::default()
            };

            match self.client.observations(&query).await {
                Ok(page) if page.total_results > 0 => return Some(grade.to_string()),
                Ok(_) => {}
                Err(err) => {
                    // Annotation is decorative; a failed probe must not
                    // fail the report.
                    debug!(taxon_id, error = %err, "quality grade probe failed");
                    return None;
                }
            }
        }
        None
    }

    /// Fill in `highest_quality_grade_label` for every species,
    /// "Unknown" where no grade could be determined.
    pub async fn annotate(
        &self,
        species: &mut [ClassifiedSpecies],
        place_id: Option<i64>,
        rate_limit: Duration,
    ) {
        for entry in species.iter_mut() {
            let label = self
                .highest_quality_grade(entry.id, place_id, rate_limit)
                .await
                .map(|grade| quality_label(&grade))
                .unwrap_or_else(|| "Unknown".to_string());
            entry.highest_quality_grade_label = Some(label);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_labels() {
        assert_eq!(quality_label("research"), "Research Grade");
        assert_eq!(quality_label("needs_id"), "Needs ID");
        assert_eq!(quality_label("casual"), "Casual");
        assert_eq!(quality_label("verifiable"), "verifiable");
    }

    #[test]
    fn priority_starts_at_research_grade() {
        assert_eq!(QUALITY_PRIORITY[0], "research");
    }
}
