use anyhow::Result;
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber;

mod config;
mod github;
mod output;
mod scan;
mod teams;

use config::Config;
use github::GithubClient;
use output::{Reporter, TableShaper};
use scan::{ActivityScanner, TimeWindow, WindowMode};
use teams::TeamDesignator;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Team whose activity to chart
    #[arg(short, long, value_enum)]
    team: TeamDesignator,

    /// Date window mode (daysback, month, year)
    #[arg(short = 'w', long, value_enum, default_value = "daysback")]
    window: WindowMode,

    /// Window value: days to look back, month number, or calendar year
    #[arg(short = 'n', long, default_value = "30")]
    value: i64,

    /// GitHub API token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: String,

    /// Output format (svg, json)
    #[arg(short, long, default_value = "svg")]
    output: String,

    /// Output file (defaults to the chart title stamped with today's date)
    #[arg(long)]
    output_file: Option<String>,

    /// Configuration file overriding the built-in org and team tables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Abort the scan on the first failed search query
    #[arg(long)]
    strict: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    println!(
        "{}",
        "TeamGauge - GitHub Team Activity Charter"
            .bright_cyan()
            .bold()
    );

    let config = Config::load(cli.config.as_deref())?;
    let window = TimeWindow::new(cli.window, cli.value)?;
    let spec = config.team(cli.team)?;

    println!("Team: {}", spec.display_name.bright_white());
    println!("Window: {}", window.description().bright_white());

    let client = GithubClient::new(&cli.token)?;
    let scanner = ActivityScanner::new(&client, &config, cli.strict);

    info!("Starting contribution scan...");
    let table = scanner.scan(cli.team, &window).await?;
    info!("Scan complete, {} contributors retained", table.len());

    let shaped = TableShaper::shape(&table, spec)?;

    let title = format!(
        "{} {} Activity For {}",
        config.org.label,
        spec.display_name,
        window.description()
    );
    let reporter = Reporter::new(&cli.output, cli.output_file.as_deref(), &title);
    reporter.write(&shaped, &title)?;

    println!(
        "\n{} {}",
        "Chart generation complete!".bright_green().bold(),
        reporter.output_path().bright_white()
    );

    Ok(())
}
