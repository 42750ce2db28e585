use anyhow::Result;
use chrono::Local;
use std::fs;
use tracing::info;

use super::chart::ChartGenerator;
use super::shaper::ShapedTable;
use super::{add_file_extension, OutputFormat};

pub struct Reporter {
    format: OutputFormat,
    output_path: String,
}

impl Reporter {
    /// The default filename is the chart title stamped with today's date,
    /// keeping repeated runs from overwriting each other.
    pub fn new(format: &str, output_file: Option<&str>, title: &str) -> Self {
        let format = OutputFormat::from(format);
        let base = match output_file {
            Some(path) => path.to_string(),
            None => format!("{} - {}", title, Local::now().date_naive()),
        };
        let output_path = add_file_extension(&base, &format);

        Self {
            format,
            output_path,
        }
    }

    pub fn write(&self, shaped: &ShapedTable, title: &str) -> Result<()> {
        let content = match self.format {
            OutputFormat::Svg => ChartGenerator::new()?.generate(shaped, title)?,
            OutputFormat::Json => serde_json::to_string_pretty(shaped)?,
        };

        fs::write(&self.output_path, content)?;
        info!("Chart saved to {}", self.output_path);
        Ok(())
    }

    pub fn output_path(&self) -> &str {
        &self.output_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_output_file_keeps_its_extension() {
        let reporter = Reporter::new("svg", Some("activity.svg"), "ignored");
        assert_eq!(reporter.output_path(), "activity.svg");
    }

    #[test]
    fn default_filename_derives_from_title_and_date() {
        let reporter = Reporter::new("json", None, "AC Testing Team Activity For May");
        let today = Local::now().date_naive().to_string();
        assert!(reporter.output_path().starts_with("AC Testing Team Activity For May - "));
        assert!(reporter.output_path().contains(&today));
        assert!(reporter.output_path().ends_with(".json"));
    }
}
