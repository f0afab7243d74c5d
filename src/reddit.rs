use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use log::{debug, info};
use reqwest::Client;
use serde::Deserialize;

use crate::config::RedditConfig;
use crate::error::{CalendarError, Result};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WikiPage {
    data: WikiPageData,
}

#[derive(Debug, Deserialize)]
struct WikiPageData {
    content_md: String,
}

fn wiki_error(context: &str, e: impl std::fmt::Display) -> CalendarError {
    CalendarError::Wiki(format!("{}: {}", context, e))
}

/// An authenticated session against the wiki API of one script app.
pub struct Reddit {
    client: Client,
    token: String,
    api_base: String,
}

impl Reddit {
    pub(crate) fn with_token(client: Client, token: String, api_base: &str) -> Self {
        Reddit { client, token, api_base: api_base.trim_end_matches('/').to_string() }
    }

    /// Log in with the password grant. Nothing is retried.
    pub async fn login(cfg: &RedditConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(cfg.user_agent())
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| wiki_error("could not build HTTP client", e))?;

        let response = client
            .post(TOKEN_URL)
            .basic_auth(&cfg.client_id, Some(&cfg.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", cfg.username.as_str()),
                ("password", cfg.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| wiki_error("token request failed", e))?;

        if !response.status().is_success() {
            return Err(wiki_error("token request returned", response.status()));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| wiki_error("unexpected token response", e))?;

        match (token.access_token, token.error) {
            (Some(access_token), _) => {
                info!("Logged in to reddit as /u/{}", cfg.username);
                Ok(Self::with_token(client, access_token, API_BASE))
            }
            (None, error) => Err(wiki_error(
                "login rejected",
                error.unwrap_or_else(|| "no access token".to_string()),
            )),
        }
    }

    /// Markdown source of `/r/<subreddit>/wiki/<page>`.
    pub async fn read_wiki_page(&self, subreddit: &str, page: &str) -> Result<String> {
        let url = format!("{}/r/{}/wiki/{}?raw_json=1", self.api_base, subreddit, page);
        debug!("Reading wiki page {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| wiki_error(&format!("GET {} failed", url), e))?;

        if !response.status().is_success() {
            return Err(wiki_error(&format!("GET {} returned", url), response.status()));
        }

        let wiki: WikiPage = response
            .json()
            .await
            .map_err(|e| wiki_error(&format!("unexpected wiki page from {}", url), e))?;

        Ok(wiki.data.content_md)
    }

    /// Overwrite `/r/<subreddit>/wiki/<page>` with `content`.
    pub async fn edit_wiki_page(&self, subreddit: &str, page: &str, content: &str, reason: &str) -> Result<()> {
        let url = format!("{}/r/{}/api/wiki/edit", self.api_base, subreddit);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .form(&[("content", content), ("page", page), ("reason", reason)])
            .send()
            .await
            .map_err(|e| wiki_error(&format!("POST {} failed", url), e))?;

        if !response.status().is_success() {
            return Err(wiki_error(&format!("POST {} returned", url), response.status()));
        }

        info!("Updated /r/{}/wiki/{} ({} bytes)", subreddit, page, content.len());
        Ok(())
    }
}

/// Revision note shown in the wiki history.
pub fn edit_reason(username: &str) -> String {
    format!(
        "[{}] {}-sidebar-updater",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        username
    )
}
