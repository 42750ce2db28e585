use chrono::{Local, NaiveDate};

use super::TimeWindow;
use crate::config::{ItemKind, MatchRole, OrgConfig, QueryTemplate, SearchScope, TeamSpec};

/// Expands a team's query templates for one member.
///
/// Template order is load-bearing: each query's match count lands in the
/// metric slot with the same index, and the derived-metric arithmetic
/// addresses those slots positionally.
pub struct QueryBuilder<'a> {
    spec: &'a TeamSpec,
    org: &'a OrgConfig,
    date_predicate: String,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(spec: &'a TeamSpec, org: &'a OrgConfig, window: &TimeWindow) -> Self {
        Self::anchored_at(spec, org, window, Local::now().date_naive())
    }

    /// Anchors relative windows at a fixed date instead of today.
    pub fn anchored_at(
        spec: &'a TeamSpec,
        org: &'a OrgConfig,
        window: &TimeWindow,
        today: NaiveDate,
    ) -> Self {
        Self {
            spec,
            org,
            date_predicate: window.date_predicate(today),
        }
    }

    pub fn build_queries(&self, member: &str) -> Vec<String> {
        self.spec
            .query_templates
            .iter()
            .map(|template| self.render(template, member))
            .collect()
    }

    fn render(&self, template: &QueryTemplate, member: &str) -> String {
        let item = match template.item {
            ItemKind::Issue => "issue",
            ItemKind::Pr => "pr",
        };
        let role = match template.role {
            MatchRole::Author => "author",
            MatchRole::Involves => "involves",
            MatchRole::ReviewedBy => "reviewed-by",
        };
        let scope = match template.scope {
            SearchScope::Org => format!("org:{}", self.org.name),
            SearchScope::SecondaryRepo => format!("repo:{}", self.org.secondary_repo),
        };
        format!(
            "is:{} {} {}:{} {}",
            item, self.date_predicate, role, member, scope
        )
    }
}
