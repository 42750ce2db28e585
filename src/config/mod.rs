use anyhow::{ensure, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::teams::{TeamDesignator, TeamError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub org: OrgConfig,
    pub scan: ScanConfig,
    pub teams: IndexMap<String, TeamSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgConfig {
    /// Numeric organization id used by the team-membership endpoint
    pub id: u64,
    pub name: String,
    /// Short label prefixed to chart titles
    pub label: String,
    /// Repository matched by repo-scoped query templates
    pub secondary_repo: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Flat pause after each member, keeps us under secondary rate limits
    pub inter_member_delay_secs: u64,
    /// Added to the reported quota reset time; the upstream clock is imprecise
    pub rate_safety_margin_secs: u64,
}

/// Everything that varies per team: where the roster comes from, which
/// queries run, what the resulting columns are called, and how raw counts
/// are corrected before charting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSpec {
    pub display_name: String,
    /// Org team ids whose memberships are unioned into the roster
    pub group_ids: Vec<u64>,
    /// Literal roster for teams with no formal org team
    pub fallback_members: Vec<String>,
    /// Column names, matching the post-transform slot count
    pub metric_names: Vec<String>,
    pub query_templates: Vec<QueryTemplate>,
    pub transform: Option<DerivedTransform>,
    /// Keep members with no activity; used for fixed rosters where
    /// absence of contribution should stay visible
    pub retain_zero_rows: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QueryTemplate {
    pub item: ItemKind,
    pub role: MatchRole,
    pub scope: SearchScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    Issue,
    Pr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchRole {
    Author,
    Involves,
    ReviewedBy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchScope {
    Org,
    SecondaryRepo,
}

/// Subtracts one raw slot from another to correct double counting, e.g.
/// self-authored items also matched by an `involves:` query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DerivedTransform {
    pub minuend_slot: usize,
    pub subtrahend_slot: usize,
    pub clamp_at_zero: bool,
    /// Remove the subtrahend slot after subtracting, shrinking the vector
    pub drop_subtrahend: bool,
}

impl DerivedTransform {
    pub fn result_arity(&self, raw_arity: usize) -> usize {
        if self.drop_subtrahend {
            raw_arity - 1
        } else {
            raw_arity
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut teams = IndexMap::new();

        teams.insert(
            "triage".to_string(),
            TeamSpec {
                display_name: "Triaging Team".to_string(),
                group_ids: vec![4_914_022, 4_916_549],
                fallback_members: Vec::new(),
                metric_names: vec![
                    "AC Issues Created".to_string(),
                    "CC Issues Involved".to_string(),
                    "PRs Created".to_string(),
                ],
                query_templates: vec![
                    QueryTemplate {
                        item: ItemKind::Issue,
                        role: MatchRole::Author,
                        scope: SearchScope::Org,
                    },
                    QueryTemplate {
                        item: ItemKind::Issue,
                        role: MatchRole::Involves,
                        scope: SearchScope::SecondaryRepo,
                    },
                    QueryTemplate {
                        item: ItemKind::Pr,
                        role: MatchRole::Author,
                        scope: SearchScope::Org,
                    },
                    QueryTemplate {
                        item: ItemKind::Issue,
                        role: MatchRole::Author,
                        scope: SearchScope::SecondaryRepo,
                    },
                ],
                transform: Some(DerivedTransform {
                    minuend_slot: 1,
                    subtrahend_slot: 3,
                    clamp_at_zero: true,
                    drop_subtrahend: true,
                }),
                retain_zero_rows: false,
            },
        );

        teams.insert(
            "alldevs".to_string(),
            TeamSpec {
                display_name: "All Developers".to_string(),
                group_ids: vec![2_059_572],
                fallback_members: Vec::new(),
                metric_names: vec!["PRs Made".to_string(), "PRs Reviewed".to_string()],
                query_templates: vec![
                    QueryTemplate {
                        item: ItemKind::Pr,
                        role: MatchRole::Author,
                        scope: SearchScope::Org,
                    },
                    QueryTemplate {
                        item: ItemKind::Pr,
                        role: MatchRole::ReviewedBy,
                        scope: SearchScope::Org,
                    },
                ],
                transform: None,
                retain_zero_rows: false,
            },
        );

        teams.insert(
            "testers".to_string(),
            TeamSpec {
                display_name: "Testing Team".to_string(),
                group_ids: vec![2_167_099],
                fallback_members: Vec::new(),
                metric_names: vec!["PRs Involved".to_string(), "PRs Made".to_string()],
                query_templates: vec![
                    QueryTemplate {
                        item: ItemKind::Pr,
                        role: MatchRole::Involves,
                        scope: SearchScope::Org,
                    },
                    QueryTemplate {
                        item: ItemKind::Pr,
                        role: MatchRole::Author,
                        scope: SearchScope::Org,
                    },
                ],
                transform: Some(DerivedTransform {
                    minuend_slot: 0,
                    subtrahend_slot: 1,
                    clamp_at_zero: false,
                    drop_subtrahend: false,
                }),
                retain_zero_rows: false,
            },
        );

        // No formal org team exists for the hired developers, so the
        // roster is specified directly.
        teams.insert(
            "paiddevs".to_string(),
            TeamSpec {
                display_name: "Hired Developers".to_string(),
                group_ids: Vec::new(),
                fallback_members: vec![
                    "UltraNix".to_string(),
                    "IntelligentQuantum".to_string(),
                    "Nyeriah".to_string(),
                    "Nefertumm".to_string(),
                    "Winfidonarleyan".to_string(),
                ],
                metric_names: vec!["PRs Made".to_string(), "PRs Reviewed".to_string()],
                query_templates: vec![
                    QueryTemplate {
                        item: ItemKind::Pr,
                        role: MatchRole::Author,
                        scope: SearchScope::Org,
                    },
                    QueryTemplate {
                        item: ItemKind::Pr,
                        role: MatchRole::ReviewedBy,
                        scope: SearchScope::Org,
                    },
                ],
                transform: None,
                retain_zero_rows: true,
            },
        );

        Self {
            org: OrgConfig {
                id: 20_147_732,
                name: "azerothcore".to_string(),
                label: "AC".to_string(),
                secondary_repo: "chromiecraft/chromiecraft".to_string(),
            },
            scan: ScanConfig {
                inter_member_delay_secs: 4,
                rate_safety_margin_secs: 20,
            },
            teams,
        }
    }
}

impl Config {
    /// Built-in defaults, optionally overridden by a TOML file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&Config::default())
            .context("Failed to serialize built-in configuration defaults")?;

        let mut builder = config::Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let config: Config = builder
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn team(&self, designator: TeamDesignator) -> Result<&TeamSpec, TeamError> {
        self.teams
            .get(designator.key())
            .ok_or_else(|| TeamError::UnknownDesignator(designator.key().to_string()))
    }

    /// Rejects team specs whose arithmetic cannot line up at runtime.
    fn validate(&self) -> Result<()> {
        for (name, team) in &self.teams {
            let slots = team.query_templates.len();
            ensure!(slots > 0, "team '{}' has no query templates", name);

            if let Some(transform) = &team.transform {
                ensure!(
                    transform.minuend_slot < slots && transform.subtrahend_slot < slots,
                    "team '{}': transform slot out of range (slots: {})",
                    name,
                    slots
                );
                ensure!(
                    transform.minuend_slot != transform.subtrahend_slot,
                    "team '{}': transform subtracts a slot from itself",
                    name
                );
            }

            let arity = team
                .transform
                .as_ref()
                .map_or(slots, |t| t.result_arity(slots));
            ensure!(
                arity == team.metric_names.len(),
                "team '{}': {} metric names for {} metric slots",
                name,
                team.metric_names.len(),
                arity
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.teams.len(), 4);
    }

    #[test]
    fn team_lookup_finds_all_designators() {
        let config = Config::default();
        for designator in [
            TeamDesignator::Triage,
            TeamDesignator::Alldevs,
            TeamDesignator::Testers,
            TeamDesignator::Paiddevs,
        ] {
            assert!(config.team(designator).is_ok());
        }
    }

    #[test]
    fn metric_name_count_mismatch_fails_validation() {
        let mut config = Config::default();
        config
            .teams
            .get_mut("testers")
            .unwrap()
            .metric_names
            .push("Extra Column".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn transform_slot_out_of_range_fails_validation() {
        let mut config = Config::default();
        config.teams.get_mut("testers").unwrap().transform = Some(DerivedTransform {
            minuend_slot: 0,
            subtrahend_slot: 5,
            clamp_at_zero: false,
            drop_subtrahend: false,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn dropping_transform_shrinks_expected_arity() {
        let transform = DerivedTransform {
            minuend_slot: 1,
            subtrahend_slot: 3,
            clamp_at_zero: true,
            drop_subtrahend: true,
        };
        assert_eq!(transform.result_arity(4), 3);
    }
}
