use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use serde_yaml::Deserializer;
use url::Url;

use crate::error::CalendarError;

const CONFIG_PREFIX: &str = env!("CARGO_PKG_NAME");
const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStyle {
    #[default]
    Full,
    Compact,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditConfig {
    pub subreddit: String,
    pub template_page: String,
    #[serde(default = "default_target_page")]
    pub target_page: String,
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: Option<String>,
}

impl RedditConfig {
    pub fn user_agent(&self) -> String {
        match &self.user_agent {
            Some(agent) => agent.clone(),
            None => format!(
                "{}/v{} (by /u/{})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                self.username
            ),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub feed_url: String,
    pub sports: Vec<String>,
    #[serde(default = "default_days_before")]
    pub days_before: i64,
    #[serde(default = "default_days_after")]
    pub days_after: i64,
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    #[serde(default)]
    pub table_style: TableStyle,
    pub reddit: Option<RedditConfig>,
}

fn default_target_page() -> String {
    "config/sidebar".to_string()
}

fn default_days_before() -> i64 {
    7
}

fn default_days_after() -> i64 {
    14
}

fn default_placeholder() -> String {
    r"\{\{\s*calendar\s*\}\}".to_string()
}

pub struct EnsureOutcome {
    pub path: PathBuf,
    pub created: bool,
}

impl Config {
    pub fn ensure_user_config() -> Result<EnsureOutcome> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix(CONFIG_PREFIX);

        if let Some(path) = xdg_dirs.find_config_file(CONFIG_FILE) {
            return Ok(EnsureOutcome {
                path,
                created: false,
            });
        }

        let config_path = xdg_dirs
            .place_config_file(CONFIG_FILE)
            .context("cannot create configuration directory")?;
        let mut config_file = File::create(&config_path)?;

        write!(
            &mut config_file,
            r#"# sidebar-calendar config (YAML)
# Keys are required unless marked optional.

feed_url: "http://gocards.com/calendar.ashx/calendar.rss"

# Feed titles are matched against these names (case-insensitive).
# An empty list renders an empty calendar.
sports:
  - baseball
  - basketball
  - football
  - soccer
  - volleyball

# Optional: window around today, in days
days_before: 7
days_after: 14

# Optional: regex replaced by the table (case-insensitive)
placeholder: '\{{\{{\s*calendar\s*\}}\}}'

# Optional: "full" or "compact"
table_style: full

# Optional when running with --template and --dry-run
reddit:
  subreddit: "<subreddit>"
  template_page: "<wiki page holding the sidebar template>"
  target_page: "config/sidebar"
  client_id: "<script app client id>"
  client_secret: "<script app secret>"
  username: "<bot username>"
  password: "<bot password>"
"#
        )?;

        Ok(EnsureOutcome {
            path: config_path,
            created: true,
        })
    }

    pub fn get_user_config() -> Result<Config> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix(CONFIG_PREFIX).find_config_file(CONFIG_FILE);

        match &xdg_dirs {
            Some(existing_config) => Self::from_file(existing_config),
            None => Err(anyhow!(
                "Could not read configuration file in config::get_user_config"
            )),
        }
    }

    pub fn from_file(path: &Path) -> Result<Config> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::from_yaml(&raw, &path.display().to_string())?;
        Ok(config)
    }

    /// Parse a YAML document. `origin` names the source in errors. Values are
    /// checked later by [`Config::validate`].
    pub fn from_yaml(raw: &str, origin: &str) -> Result<Config, CalendarError> {
        let deserialized = Deserializer::from_str(raw);
        let config: Config = serde_path_to_error::deserialize(deserialized).map_err(|e| {
            CalendarError::Config(format!(
                "Invalid YAML in {} at `{}`: {}",
                origin,
                e.path(),
                e.inner()
            ))
        })?;

        Ok(config)
    }

    /// Check values the types cannot express and return the compiled
    /// placeholder pattern.
    pub fn validate(&self) -> Result<Regex, CalendarError> {
        let url = Url::parse(&self.feed_url)
            .map_err(|e| CalendarError::Config(format!("`feed_url` is not a URL: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CalendarError::Config(format!(
                "`feed_url` must be http(s), got `{}`",
                url.scheme()
            )));
        }

        let placeholder = RegexBuilder::new(&self.placeholder)
            .case_insensitive(true)
            .build()
            .map_err(|e| CalendarError::Config(format!("`placeholder` is not a valid pattern: {}", e)))?;

        if self.days_before < 0 || self.days_after < 0 {
            return Err(CalendarError::Config(
                "`days_before` and `days_after` must not be negative".to_string(),
            ));
        }

        if let Some(reddit) = &self.reddit {
            let required = [
                ("subreddit", &reddit.subreddit),
                ("template_page", &reddit.template_page),
                ("target_page", &reddit.target_page),
                ("client_id", &reddit.client_id),
                ("username", &reddit.username),
            ];
            if let Some((key, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
                return Err(CalendarError::Config(format!("`reddit.{}` must not be empty", key)));
            }
        }

        Ok(placeholder)
    }
}
