use indexmap::IndexMap;
use serde::Serialize;

use super::ShapeError;
use crate::config::TeamSpec;
use crate::scan::ContributionTable;

/// Column-oriented contribution data, ready for charting. Member order is
/// carried separately so columns stay positionally aligned with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapedTable {
    pub members: Vec<String>,
    pub columns: IndexMap<String, Vec<i64>>,
}

pub struct TableShaper;

impl TableShaper {
    /// Turns row-per-member counts into one column per metric name,
    /// preserving the table's member order. Pure; the input table is
    /// untouched.
    pub fn shape(table: &ContributionTable, spec: &TeamSpec) -> Result<ShapedTable, ShapeError> {
        let expected = spec.metric_names.len();
        for (member, counts) in table {
            if counts.len() != expected {
                return Err(ShapeError::MetricArityMismatch {
                    member: member.clone(),
                    expected,
                    actual: counts.len(),
                });
            }
        }

        let members: Vec<String> = table.keys().cloned().collect();
        let columns = spec
            .metric_names
            .iter()
            .enumerate()
            .map(|(slot, name)| {
                let column: Vec<i64> = table.values().map(|counts| counts[slot]).collect();
                (name.clone(), column)
            })
            .collect();

        Ok(ShapedTable { members, columns })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn sample_table() -> ContributionTable {
        [
            ("zara".to_string(), vec![4, 1]),
            ("mike".to_string(), vec![0, 3]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn columns_are_taken_positionally_in_member_order() {
        let config = Config::default();
        let spec = &config.teams["alldevs"];

        let shaped = TableShaper::shape(&sample_table(), spec).unwrap();
        assert_eq!(shaped.members, vec!["zara", "mike"]);
        assert_eq!(shaped.columns["PRs Made"], vec![4, 0]);
        assert_eq!(shaped.columns["PRs Reviewed"], vec![1, 3]);
    }

    #[test]
    fn shaping_twice_yields_identical_output() {
        let config = Config::default();
        let spec = &config.teams["alldevs"];
        let table = sample_table();

        let first = TableShaper::shape(&table, spec).unwrap();
        let second = TableShaper::shape(&table, spec).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn arity_mismatch_is_fatal() {
        let config = Config::default();
        let spec = &config.teams["alldevs"];

        let table: ContributionTable =
            [("zara".to_string(), vec![4, 1, 9])].into_iter().collect();
        let err = TableShaper::shape(&table, spec).unwrap_err();
        assert!(matches!(
            err,
            ShapeError::MetricArityMismatch {
                expected: 2,
                actual: 3,
                ..
            }
        ));
    }
}
