//! contact-harvest
//!
//! Logs in, walks a paginated contact list and saves every page to a
//! deduplicated CSV file. Credentials and the list URL come from the
//! environment (or a `.env` file): `HARVEST_EMAIL`, `HARVEST_PASSWORD`,
//! `HARVEST_URL`, optionally `HARVEST_LOGIN_URL` and `HARVEST_PAGES`.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use contact_harvest::browser::{BrowserSession, ConnectionOptions};
use contact_harvest::config::{HarvestConfig, cleaned_path_for};
use contact_harvest::extract::{RuleSet, presets};
use contact_harvest::session::SessionController;
use contact_harvest::store::{DedupMode, deduplicate};
use contact_harvest::{Orchestrator, StopReason};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Dedup {
    /// Collapse duplicates every time a page is saved
    Merge,
    /// Append pages as-is and write a cleaned copy at the end
    PostPass,
}

impl From<Dedup> for DedupMode {
    fn from(value: Dedup) -> Self {
        match value {
            Dedup::Merge => DedupMode::Merge,
            Dedup::PostPass => DedupMode::PostPass,
        }
    }
}

#[derive(Parser)]
#[command(name = "contact-harvest")]
#[command(version)]
#[command(about = "Paginated contact-list extraction to CSV", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and scrape the list
    Run(RunArgs),

    /// Remove duplicate rows from an existing CSV file
    Dedup {
        /// CSV file to clean; left untouched
        input: PathBuf,

        /// Where to write the cleaned file (default: cleaned_<input name>)
        #[arg(long, short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Number of pages to scrape (overrides HARVEST_PAGES)
    #[arg(long, short = 'p')]
    pages: Option<usize>,

    /// Output CSV file (default: data_<timestamp>.csv)
    #[arg(long, short = 'o', value_name = "PATH")]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "merge")]
    dedup: Dedup,

    /// Where the post-pass writes the cleaned file
    #[arg(long, value_name = "PATH")]
    cleaned: Option<PathBuf>,

    /// Built-in rule table: contacts, people or people_rows
    #[arg(long, default_value = "contacts", conflicts_with = "rules")]
    preset: String,

    /// JSON rule table to use instead of a preset
    #[arg(long, value_name = "PATH")]
    rules: Option<PathBuf>,

    /// Location filter for the contacts preset
    #[arg(long, default_value = "Australia")]
    region: String,

    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    chrome_path: Option<PathBuf>,

    /// Persistent browser profile directory
    #[arg(long, value_name = "DIR")]
    user_data_dir: Option<PathBuf>,

    /// Attach to a running browser instead of launching one
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Directory for debug screenshots
    #[arg(long, value_name = "DIR", default_value = ".")]
    debug_dir: PathBuf,

    /// Do not take screenshots when a page or the login fails
    #[arg(long)]
    no_screenshots: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Run(args) => run(args),
        Command::Dedup { input, output } => {
            let output = output.unwrap_or_else(|| cleaned_path_for(&input));
            let report = deduplicate(&input, &output).with_context(|| format!("failed to deduplicate {}", input.display()))?;
            println!(
                "{} rows in, {} rows out ({} removed), written to {}",
                report.input_rows,
                report.output_rows,
                report.removed(),
                output.display()
            );
            Ok(())
        }
    }
}

fn run(args: RunArgs) -> Result<()> {
    let mut config = HarvestConfig::from_env()?;

    if let Some(pages) = args.pages {
        config.run.page_budget = pages;
    }
    if let Some(output) = args.output {
        config.run.output_path = output;
    }
    config.run.dedup_mode = args.dedup.into();
    config.run.cleaned_path = args.cleaned;
    config.run.debug_dir = args.debug_dir;
    config.run.screenshots_on_failure = !args.no_screenshots;
    config.run.validate()?;

    config.launch.headless = !args.headed;
    config.launch.chrome_path = args.chrome_path;
    config.launch.user_data_dir = args.user_data_dir;

    let rules = match &args.rules {
        Some(path) => RuleSet::from_json_file(path).with_context(|| format!("failed to load rules from {}", path.display()))?,
        None => presets::by_name(&args.preset, &args.region).with_context(|| format!("unknown preset '{}'", args.preset))?,
    };

    log::info!("Browser mode: {}", if config.launch.headless { "headless" } else { "headed" });
    let driver = match args.ws_endpoint {
        Some(url) => BrowserSession::connect(ConnectionOptions::new(url))?,
        None => BrowserSession::launch(config.launch.clone())?,
    };

    let controller = SessionController::new(driver, config.session.clone());
    let mut orchestrator = Orchestrator::new(controller, &rules, config.run.clone())?;
    let summary = orchestrator.run(&config.credentials)?;

    println!(
        "Scraped {} pages ({} failed), {} rows written to {}",
        summary.pages_attempted,
        summary.pages_failed,
        summary.rows_written,
        config.run.output_path.display()
    );
    if summary.stop == StopReason::Exhausted {
        println!("Reached the last page of the list");
    }
    for backup in &summary.backups {
        println!("Backup written: {}", backup.display());
    }
    if let Some(report) = summary.dedup {
        println!(
            "Cleaned copy: {} ({} duplicates removed)",
            config.run.cleaned_path().display(),
            report.removed()
        );
    }
    Ok(())
}
