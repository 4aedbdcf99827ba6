//! Paginated fetching with rate limiting and retry
//!
//! Drives repeated calls against the paged endpoints: the page cursor
//! starts at 1 and advances until an empty page comes back. Each
//! successful page is followed by a flat rate-limit sleep; each failed
//! page is retried in place with exponential backoff up to a ceiling,
//! after which the whole fetch fails with no partial results.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use inat_api::{InatError, PagedResponse, SpeciesCount};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{DiffError, Result};

/// Retry and rate-limit policy for paginated fetches.
///
/// The backoff before the Nth consecutive retry of a page is
/// `rate_limit * multiplier^N`, seeded by the flat inter-page rate
/// limit. The defaults (1.2 s, ceiling 5) keep a full fetch at ~50
/// requests/minute against the API's advertised 60-100/min ceiling
/// while riding out transient 5xx and network errors.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Consecutive failures tolerated per page before giving up
    pub max_retries: u32,
    /// Flat sleep after every successful page, and the backoff seed
    pub rate_limit: Duration,
    /// Backoff growth factor per consecutive failure
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            rate_limit: Duration::from_millis(1200),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Default policy with a custom inter-call rate limit
    pub fn with_rate_limit(rate_limit: Duration) -> Self {
        Self {
            rate_limit,
            ..Self::default()
        }
    }

    /// Backoff delay before retry number `retry_count` (1-based)
    pub fn backoff(&self, retry_count: u32) -> Duration {
        self.rate_limit * self.multiplier.pow(retry_count)
    }
}

/// Fetch every page of a paginated endpoint, concatenating `results`
/// rows until an empty page terminates the walk.
///
/// `fetch_page` is called with the 1-based page number; injecting it
/// as a closure keeps the retry machinery independent of any concrete
/// endpoint (and testable without a network).
pub async fn fetch_all_pages<T, F, Fut>(policy: &RetryPolicy, mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = inat_api::Result<PagedResponse<T>>>,
{
    let mut rows = Vec::new();
    let mut page: u32 = 1;

    loop {
        let response = fetch_page_with_retry(policy, &mut fetch_page, page).await?;
        if response.results.is_empty() {
            debug!(page, rows = rows.len(), "pagination complete");
            return Ok(rows);
        }

        rows.extend(response.results);
        page += 1;
        sleep(policy.rate_limit).await;
    }
}

async fn fetch_page_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    fetch_page: &mut F,
    page: u32,
) -> Result<PagedResponse<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = inat_api::Result<PagedResponse<T>>>,
{
    let mut retry_count = 0;

    loop {
        match fetch_page(page).await {
            Ok(response) => return Ok(response),
            Err(err) => {
                retry_count += 1;
                if retry_count < policy.max_retries {
                    let delay = policy.backoff(retry_count);
                    warn!(
                        page,
                        retry = retry_count,
                        max = policy.max_retries,
                        error = %err,
                        "page fetch failed, backing off {:.1}s",
                        delay.as_secs_f64()
                    );
                    sleep(delay).await;
                } else {
                    return Err(DiffError::Api(InatError::Api(format!(
                        "failed to fetch page {} after {} retries: {}",
                        page, policy.max_retries, err
                    ))));
                }
            }
        }
    }
}

/// Fetch all species-count pages into a taxon-id-keyed map.
///
/// Duplicate taxon ids across pages overwrite each other; pages are
/// assumed non-overlapping.
pub async fn fetch_species_count_map<F, Fut>(
    policy: &RetryPolicy,
    fetch_page: F,
) -> Result<HashMap<i64, SpeciesCount>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = inat_api::Result<PagedResponse<SpeciesCount>>>,
{
    let rows = fetch_all_pages(policy, fetch_page).await?;
    let mut map = HashMap::with_capacity(rows.len());
    for row in rows {
        map.insert(row.taxon.id, row);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inat_api::Taxon;
    use std::cell::Cell;

    fn count_row(taxon_id: i64, count: u64) -> SpeciesCount {
        SpeciesCount {
            taxon: Taxon {
                id: taxon_id,
                name: Some(format!("Taxon {}", taxon_id)),
                preferred_common_name: None,
                rank: Some("species".to_string()),
                iconic_taxon_name: None,
                ancestor_ids: vec![],
            },
            count,
        }
    }

    fn page_of(rows: Vec<SpeciesCount>) -> PagedResponse<SpeciesCount> {
        PagedResponse {
            total_results: rows.len() as u64,
            page: 1,
            per_page: 500,
            results: rows,
        }
    }

    #[test]
    fn backoff_grows_exponentially_from_rate_limit() {
        let policy = RetryPolicy::with_rate_limit(Duration::from_millis(1200));
        assert_eq!(policy.backoff(1), Duration::from_millis(2400));
        assert_eq!(policy.backoff(2), Duration::from_millis(4800));
        assert_eq!(policy.backoff(4), Duration::from_millis(19200));
    }

    #[tokio::test(start_paused = true)]
    async fn walks_pages_until_empty() {
        let policy = RetryPolicy::default();
        let map = fetch_species_count_map(&policy, |page| async move {
            Ok(match page {
                1 => page_of(vec![count_row(1, 10), count_row(2, 5)]),
                2 => page_of(vec![count_row(3, 1)]),
                _ => page_of(vec![]),
            })
        })
        .await
        .unwrap();

        assert_eq!(map.len(), 3);
        assert_eq!(map[&1].count, 10);
        assert_eq!(map[&3].count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_first_page_yields_empty_map() {
        let policy = RetryPolicy::default();
        let map = fetch_species_count_map(&policy, |_| async { Ok(page_of(vec![])) })
            .await
            .unwrap();
        assert!(map.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_taxon_ids_overwrite() {
        let policy = RetryPolicy::default();
        let map = fetch_species_count_map(&policy, |page| async move {
            Ok(match page {
                1 => page_of(vec![count_row(1, 10)]),
                2 => page_of(vec![count_row(1, 99)]),
                _ => page_of(vec![]),
            })
        })
        .await
        .unwrap();

        assert_eq!(map.len(), 1);
        assert_eq!(map[&1].count, 99);
    }

    #[tokio::test(start_paused = true)]
    async fn four_failures_then_success_returns_everything() {
        let policy = RetryPolicy::default();
        let failures = Cell::new(0u32);

        let map = fetch_species_count_map(&policy, |page| {
            let failures = &failures;
            async move {
                if page == 1 && failures.get() < 4 {
                    failures.set(failures.get() + 1);
                    return Err(InatError::Api("status 503".to_string()));
                }
                Ok(match page {
                    1 => page_of(vec![count_row(1, 10)]),
                    _ => page_of(vec![]),
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(failures.get(), 4);
        assert_eq!(map.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn five_failures_are_fatal_with_no_partial_results() {
        let policy = RetryPolicy::default();
        let attempts = Cell::new(0u32);

        let result = fetch_species_count_map(&policy, |page| {
            let attempts = &attempts;
            async move {
                // Page 1 succeeds so there is accumulated state to lose
                if page == 1 {
                    return Ok(page_of(vec![count_row(1, 10)]));
                }
                attempts.set(attempts.get() + 1);
                Err(InatError::Api("status 503".to_string()))
            }
        })
        .await;

        assert_eq!(attempts.get(), 5);
        let err = result.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("page 2"), "unexpected message: {}", msg);
        assert!(msg.contains("after 5 retries"), "unexpected message: {}", msg);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_sleep_follows_each_successful_page() {
        let policy = RetryPolicy::with_rate_limit(Duration::from_secs(2));
        let started = tokio::time::Instant::now();

        fetch_all_pages(&policy, |page| async move {
            Ok(match page {
                1 | 2 => page_of(vec![count_row(page as i64, 1)]),
                _ => page_of(vec![]),
            })
        })
        .await
        .unwrap();

        // Two successful pages -> two flat sleeps; the terminal empty
        // page sleeps nothing.
        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_delays_accumulate_before_fatal_error() {
        let policy = RetryPolicy::with_rate_limit(Duration::from_secs(1));
        let started = tokio::time::Instant::now();

        let result: Result<Vec<SpeciesCount>> = fetch_all_pages(&policy, |_| async {
            Err(InatError::Api("status 500".to_string()))
        })
        .await;

        assert!(result.is_err());
        // Retries 1..4 sleep 2+4+8+16 seconds; the 5th failure is fatal.
        assert_eq!(started.elapsed(), Duration::from_secs(30));
    }
}
