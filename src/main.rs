mod app;
mod calendar;
mod config;
mod error;
mod extractor;
mod feed;
mod filters;
mod logger;
mod models;
mod reddit;
mod utils;
mod xml;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(name = "sidebar-calendar")]
#[command(about = "Subreddit sidebar game calendar updater")]
struct Cli {
    /// Print the rendered sidebar instead of publishing it
    #[arg(long)]
    dry_run: bool,

    /// Read the sidebar template from this file instead of the wiki
    #[arg(long, value_name = "FILE")]
    template: Option<PathBuf>,

    /// Use this config file instead of the one in the XDG config dir
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Show debug output on the console
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    app::run_updater(app::RunOptions {
        dry_run: cli.dry_run,
        template: cli.template,
        config: cli.config,
        verbose: cli.verbose,
    })
    .await
}
