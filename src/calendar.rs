use chrono::{Duration, NaiveDateTime};
use log::{debug, info};
use regex::{NoExpand, Regex};
use reqwest::Client;

use crate::config::{Config, TableStyle};
use crate::error::Result;
use crate::extractor::parse_item;
use crate::feed::request_games;
use crate::filters::{filter_by_date_range, filter_by_sports};
use crate::models::{Game, GameResult};
use crate::utils::{format_scores_for_display, format_sport_for_display, format_tv_for_display};

pub const EMPTY_CALENDAR: &str = "[](#calendar/empty)";
const HOME_TEAM: &str = "Louisville";
const TIME_FORMAT: &str = "%-m/%-d %-I:%M%p";

/// Everything one run needs: where the feed lives, what to keep from it and
/// where the table goes in the template.
#[derive(Debug, Clone)]
pub struct Calendar {
    pub url: String,
    pub sports: Vec<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub placeholder: Regex,
    pub style: TableStyle,
}

impl Calendar {
    /// Build a calendar whose window is centered on `now`.
    pub fn from_config(cfg: &Config, now: NaiveDateTime) -> Result<Self> {
        let placeholder = cfg.validate()?;

        Ok(Calendar {
            url: cfg.feed_url.clone(),
            sports: cfg.sports.clone(),
            start: now - Duration::days(cfg.days_before),
            end: now + Duration::days(cfg.days_after),
            placeholder,
            style: cfg.table_style,
        })
    }

    /// Fetch, filter and parse the feed into games.
    pub async fn games(&self, client: &Client) -> Result<Vec<Game>> {
        let items = request_games(client, &self.url).await?;
        let items = filter_by_sports(items, &self.sports);
        let items = filter_by_date_range(items, self.start, self.end);
        let games: Vec<Game> = items.iter().map(parse_item).collect();

        info!("{} games between {} and {}", games.len(), self.start, self.end);
        Ok(games)
    }

    pub fn format(&self, games: &[Game], now: NaiveDateTime) -> String {
        match self.style {
            TableStyle::Full => format_games_for_display(games, now),
            TableStyle::Compact => format_games_compact(games),
        }
    }

    /// Run the whole pipeline and return `template` with the table spliced in.
    pub async fn render(&self, client: &Client, template: &str, now: NaiveDateTime) -> Result<String> {
        let games = self.games(client).await?;
        let table = self.format(&games, now);
        Ok(splice_template(template, &self.placeholder, &table))
    }
}

fn displayable(games: &[Game]) -> Vec<(&Game, &str, &str)> {
    games
        .iter()
        .filter_map(|g| match (g.sport.as_deref(), g.opponent.as_deref()) {
            (Some(sport), Some(opponent)) => Some((g, sport, opponent)),
            _ => {
                debug!("Skipping incomplete game {:?}", g.id);
                None
            }
        })
        .collect()
}

fn winner(name: &str) -> String {
    format!("[{}](#calendar/winner)", name)
}

/// Render games as the sidebar's seven column table. Games that ended before
/// `now` show `Final` and no TV.
pub fn format_games_for_display(games: &[Game], now: NaiveDateTime) -> String {
    let games = displayable(games);
    if games.is_empty() {
        return EMPTY_CALENDAR.to_string();
    }

    let mut lines = vec![
        "Sport|Home Team|Score|Visiting Team|Score|Time|TV".to_string(),
        "-|-|-|-|-|-|-".to_string(),
    ];

    for (game, sport, opponent) in games {
        let is_final = game.end.or(game.start).is_some_and(|end| end < now);

        let louisville = if game.result == Some(GameResult::Win) {
            winner(HOME_TEAM)
        } else {
            HOME_TEAM.to_string()
        };
        let opponent = if game.result == Some(GameResult::Loss) {
            winner(opponent)
        } else {
            opponent.to_string()
        };
        let score = game.score.as_deref().unwrap_or("");
        let opponent_score = game.opponent_score.as_deref().unwrap_or("");

        let (home, home_score, visitor, visitor_score) = if game.is_home {
            (louisville, score, opponent, opponent_score)
        } else {
            (opponent, opponent_score, louisville, score)
        };

        let sport = match &game.gender {
            Some(gender) => format!("{} {}", gender, sport),
            None => sport.to_string(),
        };
        let (time, tv) = if is_final {
            ("Final".to_string(), String::new())
        } else {
            (
                game.start.map(|s| s.format(TIME_FORMAT).to_string()).unwrap_or_default(),
                format_tv_for_display(game.tv.as_deref()),
            )
        };

        lines.push(
            [sport.as_str(), home.as_str(), home_score, visitor.as_str(), visitor_score, time.as_str(), tv.as_str()]
                .join("|"),
        );
    }

    lines.join("\n")
}

/// Four column variant with abbreviated sports and the result in its own
/// column.
pub fn format_games_compact(games: &[Game]) -> String {
    let games = displayable(games);
    if games.is_empty() {
        return EMPTY_CALENDAR.to_string();
    }

    let mut lines = vec!["Game|Time|TV|Result".to_string(), ":-:|:-:|:-:|-:".to_string()];

    for (game, sport, opponent) in games {
        let matchup = format!(
            "{} {} _{}_",
            format_sport_for_display(sport, game.gender.as_deref()),
            if game.is_home { "vs" } else { "@" },
            opponent
        );
        let time = game.start.map(|s| s.format(TIME_FORMAT).to_string()).unwrap_or_default();
        let result = match (game.result, game.score.as_deref()) {
            (Some(result), Some(score)) => format!(
                "{} {}",
                result.code(),
                format_scores_for_display(score, game.opponent_score.as_deref())
            ),
            _ => String::new(),
        };

        let tv = format_tv_for_display(game.tv.as_deref());

        lines.push([matchup.as_str(), time.as_str(), tv.as_str(), result.as_str()].join("|"));
    }

    lines.join("\n")
}

/// Replace every placeholder match with `table`, taken literally.
pub fn splice_template(template: &str, placeholder: &Regex, table: &str) -> String {
    placeholder.replace_all(template, NoExpand(table)).into_owned()
}
