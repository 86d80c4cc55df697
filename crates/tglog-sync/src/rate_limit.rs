use std::time::Duration;

use tglog_shared::constants::RATE_LIMIT_BACKOFF_MS;

/// Fixed pause between two consecutive page requests.
///
/// Callers invoke it strictly in sequence, so it holds no state beyond the
/// interval itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiter {
    backoff: Duration,
}

impl RateLimiter {
    pub fn new(backoff: Duration) -> Self {
        Self { backoff }
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    pub async fn wait(&self) {
        tokio::time::sleep(self.backoff).await;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_millis(RATE_LIMIT_BACKOFF_MS))
    }
}
