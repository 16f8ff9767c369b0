// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TTL snapshot cache for one sheet range.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sitesnap_core::SitesnapError;
use tokio::sync::RwLock;

struct Snapshot {
    fetched_at: Instant,
    rows: Arc<Vec<Vec<String>>>,
}

/// One cached range. Readers share the snapshot; a stale snapshot is
/// refreshed by whichever caller notices first, under the write lock so
/// concurrent refreshes collapse into one fetch.
pub struct CachedRange {
    ttl: Duration,
    slot: RwLock<Option<Snapshot>>,
}

impl CachedRange {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// Return the cached rows, fetching via `fetch` when absent or stale.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        fetch: F,
    ) -> Result<Arc<Vec<Vec<String>>>, SitesnapError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Vec<String>>, SitesnapError>>,
    {
        {
            let slot = self.slot.read().await;
            if let Some(snapshot) = slot.as_ref() {
                if snapshot.fetched_at.elapsed() < self.ttl {
                    return Ok(snapshot.rows.clone());
                }
            }
        }

        let mut slot = self.slot.write().await;
        if let Some(snapshot) = slot.as_ref() {
            if snapshot.fetched_at.elapsed() < self.ttl {
                return Ok(snapshot.rows.clone());
            }
        }

        let rows = Arc::new(fetch().await?);
        *slot = Some(Snapshot {
            fetched_at: Instant::now(),
            rows: rows.clone(),
        });
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn second_read_within_ttl_skips_fetch() {
        let cache = CachedRange::new(Duration::from_secs(60));
        let calls = AtomicU32::new(0);

        for _ in 0..3 {
            let rows = cache
                .get_or_fetch(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![vec!["a".to_string()]])
                })
                .await
                .unwrap();
            assert_eq!(rows[0][0], "a");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_ttl_refetches_every_time() {
        let cache = CachedRange::new(Duration::ZERO);
        let calls = AtomicU32::new(0);

        for _ in 0..2 {
            cache
                .get_or_fetch(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Vec::new())
                })
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fetch_error_leaves_cache_empty() {
        let cache = CachedRange::new(Duration::from_secs(60));
        let err = cache
            .get_or_fetch(|| async {
                Err(SitesnapError::Sheets {
                    message: "down".into(),
                    source: None,
                })
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SitesnapError::Sheets { .. }));

        let rows = cache
            .get_or_fetch(|| async { Ok(vec![vec!["fresh".to_string()]]) })
            .await
            .unwrap();
        assert_eq!(rows[0][0], "fresh");
    }
}
