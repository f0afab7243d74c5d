use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use log::{debug, error, info};

use crate::calendar::Calendar;
use crate::config::{Config, EnsureOutcome};
use crate::error::CalendarError;
use crate::logger::init_logger;
use crate::reddit::{Reddit, edit_reason};

pub struct RunOptions {
    pub dry_run: bool,
    pub template: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub verbose: bool,
}

pub async fn run_updater(opts: RunOptions) -> Result<()> {
    // 0) Initialize logger
    init_logger(opts.verbose)?;
    debug!("Logger initialized");

    // 1) Load config, writing a template on first run
    let cfg = match &opts.config {
        Some(path) => Config::from_file(path)?,
        None => {
            let config_outcome: EnsureOutcome = Config::ensure_user_config()?;
            if config_outcome.created {
                info!(
                    "Config file created at {}. Please edit it and restart the app.",
                    config_outcome.path.display()
                );
                println!("Created {}. Edit it and run again.", config_outcome.path.display());
                return Ok(());
            }
            Config::get_user_config()?
        }
    };
    debug!("Config loaded, feed at {}", cfg.feed_url);

    // 1a) Reddit credentials are needed unless both the template and the
    // output stay local
    let needs_reddit = opts.template.is_none() || !opts.dry_run;
    let reddit_cfg = match (&cfg.reddit, needs_reddit) {
        (Some(reddit), _) => Some(reddit),
        (None, false) => None,
        (None, true) => {
            error!("Reddit configuration is missing. Use --template and --dry-run to run without it.");
            return Err(CalendarError::Config("missing `reddit` section".to_string()).into());
        }
    };

    // 2) Build the calendar before touching the network
    let now = Local::now().naive_local();
    let calendar = Calendar::from_config(&cfg, now)?;
    debug!("Calendar window {} to {}", calendar.start, calendar.end);

    let client = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(10))
        .build()?;

    let reddit = match reddit_cfg {
        Some(reddit) if needs_reddit => Some(Reddit::login(reddit).await?),
        _ => None,
    };

    // 3) Read the sidebar template
    let template = match (&opts.template, &reddit, reddit_cfg) {
        (Some(path), _, _) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read template {}", path.display()))?,
        (None, Some(session), Some(reddit)) => {
            session.read_wiki_page(&reddit.subreddit, &reddit.template_page).await?
        }
        _ => return Err(CalendarError::Config("no template file and no reddit session".to_string()).into()),
    };

    // 4) Render
    let markdown = calendar.render(&client, &template, now).await?;
    info!("Rendered sidebar, {} bytes", markdown.len());

    if opts.dry_run {
        info!("--dry-run flag set, printing instead of publishing");
        println!("{}", markdown);
        return Ok(());
    }

    // 5) Publish
    if let (Some(session), Some(reddit)) = (&reddit, reddit_cfg) {
        session
            .edit_wiki_page(
                &reddit.subreddit,
                &reddit.target_page,
                &markdown,
                &edit_reason(&reddit.username),
            )
            .await?;
        info!("Published sidebar to /r/{}/wiki/{}", reddit.subreddit, reddit.target_page);
    }

    Ok(())
}
