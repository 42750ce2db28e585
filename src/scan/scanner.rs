use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use super::{ContributionTable, QueryBuilder, TimeWindow};
use crate::config::{Config, DerivedTransform, TeamSpec};
use crate::github::{GithubClient, GithubError, RateLimiter};
use crate::teams::{TeamDesignator, TeamError, TeamResolver};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Team(#[from] TeamError),

    #[error("rate-limit status check failed: {0}")]
    RateLimitQuery(GithubError),

    #[error("search query for {member} failed ({query}): {source}")]
    SearchQuery {
        member: String,
        query: String,
        source: GithubError,
    },
}

/// Runs the sequential fetch loop and the post-processing arithmetic:
/// one rate-limited burst of search queries per member, then the team's
/// derived-metric transform, zero-row filtering, and column totals.
pub struct ActivityScanner<'a> {
    client: &'a GithubClient,
    config: &'a Config,
    /// Abort on the first failed search query instead of recording a zero
    strict: bool,
}

impl<'a> ActivityScanner<'a> {
    pub fn new(client: &'a GithubClient, config: &'a Config, strict: bool) -> Self {
        Self {
            client,
            config,
            strict,
        }
    }

    pub async fn scan(
        &self,
        designator: TeamDesignator,
        window: &TimeWindow,
    ) -> Result<ContributionTable, ScanError> {
        let spec = self.config.team(designator)?;
        let resolver = TeamResolver::new(self.client, self.config);
        let members = resolver.resolve(designator).await?;
        info!(
            "Resolved {} members for the {} roster",
            members.len(),
            designator.key()
        );

        let limiter = RateLimiter::new(
            self.client,
            Duration::from_secs(self.config.scan.rate_safety_margin_secs),
        );
        let builder = QueryBuilder::new(spec, &self.config.org, window);
        let delay = Duration::from_secs(self.config.scan.inter_member_delay_secs);

        let pb = ProgressBar::new(members.len() as u64);
        pb.set_style(progress_style());

        let mut table = ContributionTable::new();
        for member in &members {
            pb.set_message(member.clone());
            let queries = builder.build_queries(member);
            limiter
                .ensure_quota(queries.len() as u64)
                .await
                .map_err(ScanError::RateLimitQuery)?;

            let mut counts = Vec::with_capacity(queries.len());
            for query in &queries {
                match self.client.search_count(query).await {
                    Ok(count) => counts.push(count as i64),
                    Err(source) if self.strict => {
                        return Err(ScanError::SearchQuery {
                            member: member.clone(),
                            query: query.clone(),
                            source,
                        });
                    }
                    Err(source) => {
                        warn!(
                            "Search for {} failed ({}): {} - recording zero",
                            member, query, source
                        );
                        counts.push(0);
                    }
                }
            }
            table.insert(member.clone(), counts);
            pb.inc(1);

            // flat pause between members, stays below secondary limits
            tokio::time::sleep(delay).await;
        }
        pb.finish_and_clear();

        if let Some(transform) = &spec.transform {
            apply_transform(&mut table, transform);
        }
        if !spec.retain_zero_rows {
            drop_zero_rows(&mut table);
        }
        report_totals(&table, spec);

        Ok(table)
    }
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} members {msg} ({eta})",
    )
    .unwrap()
    .progress_chars("=>-")
}

/// Corrects a double-counted slot by subtracting another slot from it,
/// e.g. a member's own authored items also matched by an `involves:`
/// query.
pub fn apply_transform(table: &mut ContributionTable, transform: &DerivedTransform) {
    for counts in table.values_mut() {
        let derived = counts[transform.minuend_slot] - counts[transform.subtrahend_slot];
        counts[transform.minuend_slot] = if transform.clamp_at_zero {
            derived.max(0)
        } else {
            derived
        };
        if transform.drop_subtrahend {
            counts.remove(transform.subtrahend_slot);
        }
    }
}

/// Drops members with no recorded activity in the window.
pub fn drop_zero_rows(table: &mut ContributionTable) {
    table.retain(|_, counts| counts.iter().any(|&count| count != 0));
}

pub fn column_totals(table: &ContributionTable) -> Vec<i64> {
    let slots = table.values().next().map_or(0, Vec::len);
    let mut totals = vec![0; slots];
    for counts in table.values() {
        for (total, count) in totals.iter_mut().zip(counts) {
            *total += count;
        }
    }
    totals
}

fn report_totals(table: &ContributionTable, spec: &TeamSpec) {
    let totals = column_totals(table);
    let summary = spec
        .metric_names
        .iter()
        .zip(&totals)
        .map(|(name, total)| format!("{}: {}", name, total))
        .collect::<Vec<_>>()
        .join(", ");
    println!("{} {}", "Totals -".bold(), summary.bright_white());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::output::TableShaper;

    fn table(rows: &[(&str, &[i64])]) -> ContributionTable {
        rows.iter()
            .map(|(name, counts)| (name.to_string(), counts.to_vec()))
            .collect()
    }

    fn transform_for(team: &str) -> DerivedTransform {
        Config::default().teams[team].transform.unwrap()
    }

    #[test]
    fn triage_transform_subtracts_authored_and_drops_the_slot() {
        let mut data = table(&[("alice", &[10, 7, 3, 2])]);
        apply_transform(&mut data, &transform_for("triage"));
        assert_eq!(data["alice"], vec![10, 5, 3]);
    }

    #[test]
    fn triage_transform_clamps_at_zero() {
        let mut data = table(&[("alice", &[4, 1, 2, 6])]);
        apply_transform(&mut data, &transform_for("triage"));
        assert_eq!(data["alice"], vec![4, 0, 2]);
    }

    #[test]
    fn testers_transform_subtracts_authored_from_involved() {
        let mut data = table(&[("bob", &[8, 3])]);
        apply_transform(&mut data, &transform_for("testers"));
        assert_eq!(data["bob"], vec![5, 3]);
    }

    #[test]
    fn zero_rows_are_dropped_in_order() {
        let mut data = table(&[("carol", &[0, 0]), ("dave", &[1, 0]), ("erin", &[0, 0])]);
        drop_zero_rows(&mut data);
        assert_eq!(data.len(), 1);
        assert!(data.contains_key("dave"));
    }

    #[test]
    fn column_totals_sum_each_slot() {
        let data = table(&[("alice", &[3, 1]), ("bob", &[2, 4])]);
        assert_eq!(column_totals(&data), vec![5, 5]);
    }

    #[test]
    fn column_totals_of_empty_table_are_empty() {
        assert_eq!(column_totals(&ContributionTable::new()), Vec::<i64>::new());
    }

    #[test]
    fn testers_pipeline_end_to_end() {
        let config = Config::default();
        let spec = &config.teams["testers"];

        let mut data = table(&[("A", &[5, 2]), ("B", &[0, 0])]);
        apply_transform(&mut data, &spec.transform.unwrap());
        drop_zero_rows(&mut data);

        assert_eq!(data.len(), 1);
        assert_eq!(data["A"], vec![3, 2]);

        let shaped = TableShaper::shape(&data, spec).unwrap();
        assert_eq!(shaped.members, vec!["A"]);
        assert_eq!(shaped.columns["PRs Involved"], vec![3]);
        assert_eq!(shaped.columns["PRs Made"], vec![2]);
    }
}
