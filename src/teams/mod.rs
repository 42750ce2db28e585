use clap::ValueEnum;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::github::{GithubClient, GithubError};

/// Which team's activity to measure. Selects the roster source, the query
/// set, and the derived-metric rule via the configured team table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TeamDesignator {
    Triage,
    Alldevs,
    Testers,
    Paiddevs,
}

impl TeamDesignator {
    pub fn key(self) -> &'static str {
        match self {
            TeamDesignator::Triage => "triage",
            TeamDesignator::Alldevs => "alldevs",
            TeamDesignator::Testers => "testers",
            TeamDesignator::Paiddevs => "paiddevs",
        }
    }
}

#[derive(Error, Debug)]
pub enum TeamError {
    #[error("unknown team designator: {0}")]
    UnknownDesignator(String),

    #[error("failed to fetch members of team {team_id}: {source}")]
    Membership {
        team_id: u64,
        source: GithubError,
    },
}

pub struct TeamResolver<'a> {
    client: &'a GithubClient,
    config: &'a Config,
}

impl<'a> TeamResolver<'a> {
    pub fn new(client: &'a GithubClient, config: &'a Config) -> Self {
        Self { client, config }
    }

    /// Resolves a designator to its deduplicated roster, sorted descending
    /// by case-normalized login. Multiple org teams are merged and treated
    /// as one unit; teams with no org representation use their configured
    /// literal roster instead.
    ///
    /// Only the first membership page per team is fetched; no configured
    /// team spans more than one page.
    pub async fn resolve(&self, designator: TeamDesignator) -> Result<Vec<String>, TeamError> {
        let spec = self.config.team(designator)?;

        let mut logins: HashSet<String> = HashSet::new();
        if spec.group_ids.is_empty() {
            if spec.fallback_members.is_empty() {
                return Err(TeamError::UnknownDesignator(designator.key().to_string()));
            }
            logins.extend(spec.fallback_members.iter().cloned());
        } else {
            for &team_id in &spec.group_ids {
                let members = self
                    .client
                    .team_members(self.config.org.id, team_id)
                    .await
                    .map_err(|source| TeamError::Membership { team_id, source })?;
                debug!(team_id, count = members.len(), "fetched team membership");
                logins.extend(members.into_iter().map(|m| m.login));
            }
        }

        Ok(sorted_roster(logins))
    }
}

fn sorted_roster(logins: HashSet<String>) -> Vec<String> {
    let mut roster: Vec<String> = logins.into_iter().collect();
    roster.sort_by(|a, b| case_normalized(b).cmp(&case_normalized(a)));
    roster
}

/// First character uppercased, remainder lowercased; the roster sort key.
pub fn case_normalized(login: &str) -> String {
    let mut chars = login.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_normalization_capitalizes_first_and_lowers_rest() {
        assert_eq!(case_normalized("mcFly"), "Mcfly");
        assert_eq!(case_normalized("ULTRANIX"), "Ultranix");
        assert_eq!(case_normalized(""), "");
    }

    #[test]
    fn roster_sorts_descending_by_normalized_login() {
        let logins: HashSet<String> = ["zeb", "Alpha", "mike"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(sorted_roster(logins), vec!["zeb", "mike", "Alpha"]);
    }

    #[test]
    fn roster_has_no_duplicates() {
        let logins: HashSet<String> = ["Nyeriah", "UltraNix", "Nyeriah"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let roster = sorted_roster(logins);
        assert_eq!(roster.len(), 2);
        assert_eq!(roster, vec!["UltraNix", "Nyeriah"]);
    }

    #[test]
    fn mixed_case_logins_sort_by_normalized_form() {
        let logins: HashSet<String> = ["winfidonarleyan", "IntelligentQuantum", "ultraNix"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let roster = sorted_roster(logins);
        assert_eq!(
            roster,
            vec!["winfidonarleyan", "ultraNix", "IntelligentQuantum"]
        );
    }
}
