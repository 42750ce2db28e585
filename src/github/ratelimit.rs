use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info};

use super::{GithubClient, GithubError};

/// Cooperative pacing against the shared search budget. The search API
/// enforces a small global quota, so the scan checks the live status
/// before each member's burst of queries and sleeps through the reset
/// when it would not fit.
pub struct RateLimiter<'a> {
    client: &'a GithubClient,
    safety_margin: Duration,
}

impl<'a> RateLimiter<'a> {
    pub fn new(client: &'a GithubClient, safety_margin: Duration) -> Self {
        Self {
            client,
            safety_margin,
        }
    }

    /// Blocks until more than `min_remaining` search calls are available.
    /// The margin is added on top of the reported reset time because the
    /// upstream clock is not precise.
    pub async fn ensure_quota(&self, min_remaining: u64) -> Result<(), GithubError> {
        let quota = self.client.search_quota().await?;
        if quota.remaining > min_remaining {
            debug!(remaining = quota.remaining, "search quota sufficient");
            return Ok(());
        }

        let until_reset = (quota.reset - Utc::now().timestamp()).max(0) as u64;
        let wait = Duration::from_secs(until_reset) + self.safety_margin;
        info!(
            "API rate limit exceeded - waiting for {} seconds...",
            wait.as_secs()
        );
        tokio::time::sleep(wait).await;
        info!("Done waiting - resuming");
        Ok(())
    }
}
