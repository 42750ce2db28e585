use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{GithubError, SearchQuota, TeamMember};

const API_URL: &str = "https://api.github.com";
const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct GithubClient {
    client: reqwest::Client,
    token: String,
    api_url: String,
}

impl GithubClient {
    pub fn new(token: &str) -> Result<Self, GithubError> {
        let client = reqwest::Client::builder()
            .user_agent("teamgauge/0.1")
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| GithubError::Init(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            token: token.to_string(),
            api_url: API_URL.to_string(),
        })
    }

    fn build_request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
    }

    fn handle_error_status(&self, response: reqwest::Response, entity: &str) -> GithubError {
        match response.status() {
            reqwest::StatusCode::NOT_FOUND => GithubError::NotFound(entity.to_string()),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                GithubError::AuthFailed("invalid or missing token".into())
            }
            _ => GithubError::Http(response.error_for_status().unwrap_err()),
        }
    }

    /// Total number of issues/PRs matching a search query.
    pub async fn search_count(&self, query: &str) -> Result<u64, GithubError> {
        let url = format!(
            "{}/search/issues?q={}&per_page=1",
            self.api_url,
            urlencoding::encode(query)
        );

        let response = self.build_request(&url).send().await?;
        if !response.status().is_success() {
            return Err(self.handle_error_status(response, query));
        }

        let result: SearchResult = response.json().await?;
        debug!(query, count = result.total_count, "search complete");
        Ok(result.total_count)
    }

    /// First page of a team's membership. Teams larger than one page are
    /// truncated; none of the configured teams is that large.
    pub async fn team_members(
        &self,
        org_id: u64,
        team_id: u64,
    ) -> Result<Vec<TeamMember>, GithubError> {
        let url = format!(
            "{}/organizations/{}/team/{}/members?per_page=100",
            self.api_url, org_id, team_id
        );

        let response = self.build_request(&url).send().await?;
        if !response.status().is_success() {
            return Err(self.handle_error_status(response, &format!("team {}", team_id)));
        }

        Ok(response.json().await?)
    }

    /// Live remaining/reset status for the search resource.
    pub async fn search_quota(&self) -> Result<SearchQuota, GithubError> {
        let url = format!("{}/rate_limit", self.api_url);

        let response = self.build_request(&url).send().await?;
        if !response.status().is_success() {
            return Err(self.handle_error_status(response, "rate limit status"));
        }

        let result: RateLimitResponse = response.json().await?;
        Ok(result.resources.search)
    }
}

// --- API Response Types ---

#[derive(Debug, Deserialize)]
struct SearchResult {
    total_count: u64,
}

#[derive(Debug, Deserialize)]
struct RateLimitResponse {
    resources: RateLimitResources,
}

#[derive(Debug, Deserialize)]
struct RateLimitResources {
    search: SearchQuota,
}
