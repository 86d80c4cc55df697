//! Offset/limit pagination over count-bearing listings.

use std::future::Future;

use tracing::debug;

use tglog_shared::constants::MAX_PAGE_LIMIT;
use tglog_shared::{Paged, RemoteError};

use crate::error::SyncError;
use crate::rate_limit::RateLimiter;

/// Walks a paginated endpoint until it is exhausted or told to stop.
#[derive(Debug, Clone, Copy)]
pub struct PageTraverser {
    limit: u32,
    limiter: RateLimiter,
}

impl PageTraverser {
    pub fn new(limit: u32, limiter: RateLimiter) -> Self {
        Self {
            limit: limit.max(1),
            limiter,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Fetch every page of the listing served by `fetch(offset, limit)`.
    pub async fn traverse<P, F, Fut>(&self, fetch: F, start_offset: u32) -> Result<Vec<P>, SyncError>
    where
        P: Paged,
        F: FnMut(u32, u32) -> Fut,
        Fut: Future<Output = Result<P, RemoteError>>,
    {
        self.traverse_until(fetch, start_offset, |_: &P| false).await
    }

    /// Fetch pages until the listing is exhausted or `should_stop` returns
    /// `true` for a page. The page that tripped the predicate is kept.
    ///
    /// Paging continues while `offset <= total`, so once the cursor lands
    /// exactly on the total one more (empty) page is requested. The service
    /// answers that request with an empty page.
    ///
    /// The first page may omit the total, meaning the whole listing fit in
    /// it. Every later page must repeat the total seen first; anything else
    /// aborts with [`SyncError::Protocol`]. Failed fetches are not retried.
    /// An offset that would overflow `u32` ends the walk.
    pub async fn traverse_until<P, F, Fut, S>(
        &self,
        mut fetch: F,
        start_offset: u32,
        mut should_stop: S,
    ) -> Result<Vec<P>, SyncError>
    where
        P: Paged,
        F: FnMut(u32, u32) -> Fut,
        Fut: Future<Output = Result<P, RemoteError>>,
        S: FnMut(&P) -> bool,
    {
        let mut offset = start_offset;
        let mut expected_total: Option<u32> = None;
        let mut pages = Vec::new();

        loop {
            debug!(offset, limit = self.limit, "Fetching page");
            let page = fetch(offset, self.limit).await?;

            let total = match (expected_total, page.total_count()) {
                (None, None) => {
                    debug!("All records received in one page");
                    pages.push(page);
                    break;
                }
                (None, Some(total)) => {
                    debug!(total, "Paging until completion");
                    expected_total = Some(total);
                    total
                }
                (Some(_), None) => {
                    return Err(SyncError::Protocol(format!(
                        "page at offset {offset} is missing the total count"
                    )));
                }
                (Some(expected), Some(total)) if total != expected => {
                    return Err(SyncError::Protocol(format!(
                        "page at offset {offset} reports {total} records, expected {expected}"
                    )));
                }
                (Some(expected), Some(_)) => expected,
            };

            if should_stop(&page) {
                debug!(offset, "Stop condition met, halting traversal");
                pages.push(page);
                break;
            }

            pages.push(page);
            offset = match offset.checked_add(self.limit) {
                Some(next) if next <= total => next,
                _ => break,
            };

            self.limiter.wait().await;
        }

        debug!(pages = pages.len(), "Traversal finished");
        Ok(pages)
    }
}

impl Default for PageTraverser {
    fn default() -> Self {
        Self::new(MAX_PAGE_LIMIT, RateLimiter::default())
    }
}
