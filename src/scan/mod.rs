use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use indexmap::IndexMap;
use thiserror::Error;

pub mod queries;
pub mod scanner;

pub use queries::QueryBuilder;
pub use scanner::ActivityScanner;

/// Raw or derived counts for one member, indexed by metric slot.
pub type MetricVector = Vec<i64>;

/// Per-member counts, in roster order.
pub type ContributionTable = IndexMap<String, MetricVector>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WindowMode {
    Daysback,
    Month,
    Year,
}

/// Date range every search query is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    /// Activity in the last N days
    DaysBack(u32),
    /// Activity in the given month of the current year
    Month(u32),
    /// Activity in the given calendar year
    Year(i32),
}

#[derive(Error, Debug)]
pub enum WindowError {
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(i64),

    #[error("invalid value for {mode} window: {value}")]
    InvalidValue { mode: &'static str, value: i64 },
}

/// Last day of each month. February stays at 28; leap years are not
/// adjusted.
const LAST_DAYS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

impl TimeWindow {
    pub fn new(mode: WindowMode, value: i64) -> Result<Self, WindowError> {
        match mode {
            WindowMode::Daysback => {
                let days = u32::try_from(value).map_err(|_| WindowError::InvalidValue {
                    mode: "daysback",
                    value,
                })?;
                Ok(TimeWindow::DaysBack(days))
            }
            WindowMode::Month => {
                if !(1..=12).contains(&value) {
                    return Err(WindowError::InvalidMonth(value));
                }
                Ok(TimeWindow::Month(value as u32))
            }
            WindowMode::Year => {
                let year = i32::try_from(value).map_err(|_| WindowError::InvalidValue {
                    mode: "year",
                    value,
                })?;
                Ok(TimeWindow::Year(year))
            }
        }
    }

    /// `created:` predicate embedded into every search query.
    pub fn date_predicate(&self, today: NaiveDate) -> String {
        match *self {
            TimeWindow::DaysBack(days) => {
                let since = today - chrono::Duration::days(i64::from(days));
                format!("created:>={}", since)
            }
            TimeWindow::Month(month) => {
                let year = today.year();
                let last_day = LAST_DAYS[(month - 1) as usize];
                format!("created:{year}-{month:02}-01..{year}-{month:02}-{last_day}")
            }
            TimeWindow::Year(year) => format!("created:{year}-01-01..{year}-12-31"),
        }
    }

    /// Human description used in chart titles.
    pub fn description(&self) -> String {
        match *self {
            TimeWindow::DaysBack(days) => format!("Last {} Days", days),
            TimeWindow::Month(month) => MONTH_NAMES[(month - 1) as usize].to_string(),
            TimeWindow::Year(year) => format!("Year {}", year),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
    }

    #[test]
    fn days_back_renders_on_or_after_predicate() {
        let window = TimeWindow::DaysBack(30);
        assert_eq!(window.date_predicate(today()), "created:>=2024-04-10");
    }

    #[test]
    fn month_renders_first_to_last_day_of_current_year() {
        let window = TimeWindow::Month(11);
        assert_eq!(
            window.date_predicate(today()),
            "created:2024-11-01..2024-11-30"
        );
    }

    #[test]
    fn february_ends_on_the_28th_even_in_leap_years() {
        let window = TimeWindow::Month(2);
        assert_eq!(
            window.date_predicate(today()),
            "created:2024-02-01..2024-02-28"
        );
    }

    #[test]
    fn year_renders_full_calendar_range() {
        let window = TimeWindow::Year(2023);
        assert_eq!(
            window.date_predicate(today()),
            "created:2023-01-01..2023-12-31"
        );
    }

    #[test]
    fn month_value_is_validated_at_construction() {
        assert!(TimeWindow::new(WindowMode::Month, 0).is_err());
        assert!(TimeWindow::new(WindowMode::Month, 13).is_err());
        assert!(TimeWindow::new(WindowMode::Month, 12).is_ok());
    }

    #[test]
    fn negative_days_back_is_rejected() {
        assert!(TimeWindow::new(WindowMode::Daysback, -1).is_err());
        assert!(TimeWindow::new(WindowMode::Daysback, 0).is_ok());
    }

    #[test]
    fn descriptions_match_title_wording() {
        assert_eq!(TimeWindow::DaysBack(30).description(), "Last 30 Days");
        assert_eq!(TimeWindow::Month(5).description(), "May");
        assert_eq!(TimeWindow::Year(2024).description(), "Year 2024");
    }
}
