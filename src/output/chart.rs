use anyhow::Result;
use rust_embed::RustEmbed;
use serde_json::{json, Value};
use tera::{Context, Tera};

use super::shaper::ShapedTable;

#[derive(RustEmbed)]
#[folder = "src/output/templates/"]
#[include = "*.svg"]
struct Templates;

const WIDTH: f64 = 1200.0;
const HEIGHT: f64 = 750.0;
const MARGIN_LEFT: f64 = 190.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_TOP: f64 = 70.0;
const MARGIN_BOTTOM: f64 = 70.0;
/// Fraction of each row the bar occupies
const BAR_FILL: f64 = 0.75;
/// Headroom so the longest bar does not touch the plot edge
const X_HEADROOM: f64 = 1.05;
const PALETTE: [&str; 3] = ["#1f77b4", "#2ca02c", "#d62728"];

/// Renders a shaped table as a horizontal stacked bar chart. Rows are
/// drawn bottom-up, so the roster's descending sort reads alphabetically
/// from the top.
pub struct ChartGenerator {
    tera: Tera,
}

impl ChartGenerator {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Load templates from embedded resources
        for file in Templates::iter() {
            let template_name = file.as_ref();
            let template_content = Templates::get(template_name)
                .ok_or_else(|| anyhow::anyhow!("Template {} not found", template_name))?;
            let template_str = std::str::from_utf8(&template_content.data)
                .map_err(|e| anyhow::anyhow!("Invalid UTF-8 in template {}: {}", template_name, e))?;

            tera.add_raw_template(template_name, template_str)
                .map_err(|e| anyhow::anyhow!("Failed to add template {}: {}", template_name, e))?;
        }

        Ok(Self { tera })
    }

    pub fn generate(&self, shaped: &ShapedTable, title: &str) -> Result<String> {
        let context = self.prepare_context(shaped, title);
        let svg = self.tera.render("chart.svg", &context)?;
        Ok(svg)
    }

    fn prepare_context(&self, shaped: &ShapedTable, title: &str) -> Context {
        let mut context = Context::new();

        let plot_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_height = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        let plot_bottom = MARGIN_TOP + plot_height;

        let totals = row_totals(shaped);
        let max_total = totals.iter().copied().max().unwrap_or(0).max(1);
        let x_max = max_total as f64 * X_HEADROOM;
        let scale = plot_width / x_max;

        let row_count = shaped.members.len().max(1);
        let row_height = plot_height / row_count as f64;
        let bar_height = row_height * BAR_FILL;

        let rows: Vec<Value> = shaped
            .members
            .iter()
            .enumerate()
            .map(|(index, member)| {
                let center_y = plot_bottom - (index as f64 + 0.5) * row_height;
                let bar_y = center_y - bar_height / 2.0;

                let mut cursor = 0i64;
                let segments: Vec<Value> = shaped
                    .columns
                    .values()
                    .enumerate()
                    .map(|(slot, column)| {
                        let value = column[index];
                        let x = MARGIN_LEFT + cursor as f64 * scale;
                        let width = value as f64 * scale;
                        cursor += value;
                        json!({
                            "x": x,
                            "width": width,
                            "color": PALETTE[slot % PALETTE.len()],
                            "value": value,
                            "label_x": x + width / 2.0,
                        })
                    })
                    .collect();

                json!({
                    "name": member,
                    "bar_y": bar_y,
                    "center_y": center_y,
                    "segments": segments,
                })
            })
            .collect();

        let step = tick_step(max_total);
        let mut ticks = Vec::new();
        let mut value = 0i64;
        while (value as f64) <= x_max {
            ticks.push(json!({
                "x": MARGIN_LEFT + value as f64 * scale,
                "label": value,
            }));
            value += step;
        }

        let longest_name = shaped.columns.keys().map(String::len).max().unwrap_or(0);
        let legend_width = 46.0 + longest_name as f64 * 10.0;
        let legend_x = WIDTH - MARGIN_RIGHT - legend_width - 12.0;
        let legend_y = MARGIN_TOP + 12.0;
        let entries: Vec<Value> = shaped
            .columns
            .keys()
            .enumerate()
            .map(|(slot, name)| {
                let row_y = legend_y + 8.0 + slot as f64 * 28.0;
                json!({
                    "color": PALETTE[slot % PALETTE.len()],
                    "name": name,
                    "swatch_x": legend_x + 10.0,
                    "swatch_y": row_y,
                    "label_x": legend_x + 36.0,
                    "label_y": row_y + 9.0,
                })
            })
            .collect();

        context.insert("width", &WIDTH);
        context.insert("height", &HEIGHT);
        context.insert("title", title);
        context.insert("title_x", &(WIDTH / 2.0));
        context.insert(
            "plot",
            &json!({
                "x": MARGIN_LEFT,
                "y": MARGIN_TOP,
                "width": plot_width,
                "height": plot_height,
            }),
        );
        context.insert("plot_bottom", &plot_bottom);
        context.insert("tick_mark_y", &(plot_bottom + 6.0));
        context.insert("tick_label_y", &(plot_bottom + 32.0));
        context.insert("member_label_x", &(MARGIN_LEFT - 10.0));
        context.insert("bar_height", &bar_height);
        context.insert("rows", &rows);
        context.insert("ticks", &ticks);
        context.insert(
            "legend",
            &json!({
                "x": legend_x,
                "y": legend_y,
                "width": legend_width,
                "height": entries.len() as f64 * 28.0 + 8.0,
            }),
        );
        context.insert("legend_entries", &entries);

        context
    }
}

/// Stacked total per member, used to scale the x axis.
fn row_totals(shaped: &ShapedTable) -> Vec<i64> {
    (0..shaped.members.len())
        .map(|index| shaped.columns.values().map(|column| column[index]).sum())
        .collect()
}

/// Tick spacing rounded to a 1/2/5 multiple of a power of ten, targeting
/// around six ticks across the axis.
fn tick_step(max_total: i64) -> i64 {
    let raw = (max_total as f64 / 6.0).max(1.0);
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let step = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };
    (step * magnitude) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn sample_shaped() -> ShapedTable {
        let mut columns = IndexMap::new();
        columns.insert("PRs Made".to_string(), vec![12, 0]);
        columns.insert("PRs Reviewed".to_string(), vec![3, 7]);
        ShapedTable {
            members: vec!["zara".to_string(), "mike".to_string()],
            columns,
        }
    }

    #[test]
    fn row_totals_stack_all_columns() {
        assert_eq!(row_totals(&sample_shaped()), vec![15, 7]);
    }

    #[test]
    fn tick_steps_round_to_clean_intervals() {
        assert_eq!(tick_step(5), 1);
        assert_eq!(tick_step(12), 2);
        assert_eq!(tick_step(30), 5);
        assert_eq!(tick_step(60), 10);
        assert_eq!(tick_step(300), 50);
    }

    #[test]
    fn generated_svg_contains_members_and_legend() {
        let generator = ChartGenerator::new().unwrap();
        let svg = generator
            .generate(&sample_shaped(), "AC Testing Team Activity For Last 30 Days")
            .unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("zara"));
        assert!(svg.contains("mike"));
        assert!(svg.contains("PRs Reviewed"));
        assert!(svg.contains("#1f77b4"));
        assert!(svg.contains("AC Testing Team Activity For Last 30 Days"));
    }

    #[test]
    fn empty_table_still_renders_a_frame() {
        let shaped = ShapedTable {
            members: Vec::new(),
            columns: IndexMap::new(),
        };
        let generator = ChartGenerator::new().unwrap();
        let svg = generator.generate(&shaped, "Empty").unwrap();
        assert!(svg.starts_with("<svg"));
    }
}
