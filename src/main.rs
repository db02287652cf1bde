//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `tag_inspector` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - Printing results as JSON
//!
//! All core functionality is implemented in the library crate.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use tag_inspector::initialization::init_logger_with;
use tag_inspector::{
    Config, CrawlOptions, DetectionTarget, Environment, Inspector, LogFormat, LogLevel,
};

/// Detect tag managers and analytics tags on web pages.
#[derive(Debug, Parser)]
#[command(name = "tag_inspector", version, about)]
struct Cli {
    /// Log level: error/warn/info/debug/trace
    #[arg(long, value_enum, default_value = "info", global = true)]
    log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value = "plain", global = true)]
    log_format: LogFormat,

    /// Expected account (defaults to TAG_INSPECTOR_DEFAULT_ACCOUNT)
    #[arg(long, global = true)]
    account: Option<String>,

    /// Expected profile
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Expected publishing environment
    #[arg(long, value_enum, global = true)]
    environment: Option<Environment>,

    /// Expected container id (e.g. GTM-ABC1234)
    #[arg(long, global = true)]
    container: Option<String>,

    /// Never fall back to the headless browser
    #[arg(long, global = true)]
    no_render: bool,

    /// Chrome/Chromium binary for the render tier
    #[arg(long, global = true)]
    chrome: Option<PathBuf>,

    /// Lightweight request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Delay between consecutive requests in milliseconds
    #[arg(long, global = true)]
    courtesy_delay_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check one or more pages
    Check {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Crawl a site and report tagging coverage
    Crawl {
        url: String,

        /// Maximum pages to scan
        #[arg(long, default_value_t = tag_inspector::config::DEFAULT_MAX_PAGES)]
        max_pages: usize,

        /// Maximum link depth from the start page
        #[arg(long, default_value_t = tag_inspector::config::DEFAULT_MAX_DEPTH)]
        max_depth: usize,

        /// Path prefix to skip (repeatable)
        #[arg(long = "exclude")]
        exclude_paths: Vec<String>,
    },
    /// Recommend crawl budgets for a site
    Estimate { url: String },
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config {
            log_level: self.log_level,
            log_format: self.log_format,
            ..Config::default()
        };
        if let Some(timeout) = self.timeout {
            config.timeout_seconds = timeout;
        }
        if let Some(delay) = self.courtesy_delay_ms {
            config.courtesy_delay_ms = delay;
        }
        if self.no_render {
            config.render.enabled = false;
        }
        if self.chrome.is_some() {
            config.render.chrome_executable = self.chrome.clone();
        }
        config
    }

    fn target(&self) -> DetectionTarget {
        DetectionTarget {
            environment: self.environment,
            account: self.account.clone(),
            profile: self.profile.clone(),
            container_id: self.container.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Try the current directory first, then next to the executable
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let cli = Cli::parse();
    init_logger_with(cli.log_level.into(), cli.log_format)
        .context("Failed to initialize logger")?;

    if let Err(e) = run(&cli).await {
        eprintln!("tag_inspector error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}

async fn run(cli: &Cli) -> Result<()> {
    let inspector = Inspector::new(cli.config()).context("Failed to initialize inspector")?;
    let target = cli.target();

    match &cli.command {
        Command::Check { urls } => {
            let findings = inspector.check_urls(urls, &target).await?;
            print_json(&findings)
        }
        Command::Crawl {
            url,
            max_pages,
            max_depth,
            exclude_paths,
        } => {
            let options = CrawlOptions {
                max_pages: *max_pages,
                max_depth: *max_depth,
                exclude_paths: exclude_paths.clone(),
                target,
                ..CrawlOptions::default()
            };
            let report = inspector.crawl_site(url, &options).await?;
            print_json(&report)
        }
        Command::Estimate { url } => {
            let estimate = inspector.estimate_site(url).await?;
            print_json(&estimate)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{rendered}");
    Ok(())
}
