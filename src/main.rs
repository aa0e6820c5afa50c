//! deal-hunter - Buys the first search listing priced below a reference price
//!
//! A WebDriver-driven shopping run with screenshots at every step.

use anyhow::Result;
use clap::{Parser, Subcommand};
use deal_hunter::commands::{LocateCommand, RunCommand};
use deal_hunter::config::{Config, OutputFormat};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "deal-hunter",
    version,
    about = "Buy the first search listing priced below a reference price",
    long_about = "Opens a storefront over WebDriver, searches for a product and opens the first \
                  listing cheaper than every price in a reference spreadsheet row."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format (text, json, markdown)
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// WebDriver server URL
    #[arg(long, global = true)]
    webdriver: Option<String>,

    /// Directory screenshots are written to
    #[arg(long, global = true)]
    screenshots: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the shopping workflow (default)
    #[command(alias = "r")]
    Run {
        /// Search query
        #[arg(short, long)]
        query: Option<String>,

        /// Number of listings to inspect
        #[arg(short, long)]
        max: Option<usize>,

        /// Reference price spreadsheet (xlsx, xls, ods)
        #[arg(long)]
        prices: Option<PathBuf>,

        /// Show the browser window
        #[arg(long)]
        headed: bool,
    },

    /// Check the listing lookup rules against a saved results page
    #[command(alias = "l")]
    Locate {
        /// Saved HTML results page
        file: PathBuf,

        /// Number of listings to check
        #[arg(short, long, default_value = "5")]
        max: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()))
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(url) = cli.webdriver {
        config.webdriver_url = url;
    }
    if let Some(dir) = cli.screenshots {
        config.screenshot_dir = dir;
    }

    match cli.command.unwrap_or(Commands::Run { query: None, max: None, prices: None, headed: false }) {
        Commands::Run { query, max, prices, headed } => {
            // Apply run-specific config
            if let Some(query) = query {
                config.query = query;
            }
            if let Some(max) = max {
                config.max_listings = max;
            }
            if let Some(path) = prices {
                config.reference.path = Some(path);
                config.reference.prices.clear();
            }
            if headed {
                config.headless = false;
            }

            let cmd = RunCommand::new(config);
            let (report, output) = cmd.execute().await;
            println!("{}", output);

            if let deal_hunter::Outcome::Aborted { reason } = &report.outcome {
                anyhow::bail!("Run aborted: {}", reason);
            }
        }

        Commands::Locate { file, max } => {
            let cmd = LocateCommand::new(config);
            let output = cmd.execute(&file, max).await?;
            println!("{}", output);
        }
    }

    Ok(())
}
