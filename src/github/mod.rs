//! Thin GitHub API layer: search counts, team membership, and the live
//! search-quota status the rate limiter paces against.

use serde::Deserialize;
use thiserror::Error;

pub mod client;
pub mod ratelimit;

pub use client::GithubClient;
pub use ratelimit::RateLimiter;

#[derive(Error, Debug)]
pub enum GithubError {
    /// HTTP client construction failed (TLS or proxy misconfiguration)
    #[error("failed to initialize GitHub client: {0}")]
    Init(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("resource not found: {0}")]
    NotFound(String),
}

/// One entry of a team-membership page; only the login is consumed.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamMember {
    pub login: String,
}

/// Remaining search-API budget as reported by the rate-limit endpoint.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SearchQuota {
    pub remaining: u64,
    /// Unix timestamp at which the budget replenishes
    pub reset: i64,
}
