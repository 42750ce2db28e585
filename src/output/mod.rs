use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod chart;
pub mod reporter;
pub mod shaper;

pub use reporter::Reporter;
pub use shaper::{ShapedTable, TableShaper};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Json,
    Svg,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Svg,
        }
    }
}

pub fn add_file_extension(path: &str, format: &OutputFormat) -> String {
    let extension = match format {
        OutputFormat::Svg => ".svg",
        OutputFormat::Json => ".json",
    };

    if path.ends_with(extension) {
        path.to_string()
    } else {
        format!("{}{}", path, extension)
    }
}

#[derive(Error, Debug)]
pub enum ShapeError {
    /// A member's vector length disagrees with the team's metric-name
    /// list; indicates a transform/config inconsistency.
    #[error("{member} has {actual} metric values, expected {expected}")]
    MetricArityMismatch {
        member: String,
        expected: usize,
        actual: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_appended_once() {
        assert_eq!(
            add_file_extension("chart", &OutputFormat::Svg),
            "chart.svg"
        );
        assert_eq!(
            add_file_extension("chart.svg", &OutputFormat::Svg),
            "chart.svg"
        );
        assert_eq!(
            add_file_extension("data", &OutputFormat::Json),
            "data.json"
        );
    }
}
