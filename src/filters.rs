use chrono::NaiveDateTime;
use log::{debug, warn};
use regex::{Regex, RegexBuilder};

use crate::models::FeedItem;

fn sports_regex(sports: &[String]) -> Option<Regex> {
    let pattern = sports
        .iter()
        .map(|s| regex::escape(s))
        .collect::<Vec<_>>()
        .join("|");

    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!("Could not build sport filter from {} names, keeping no games: {}", sports.len(), e);
            None
        }
    }
}

/// Keep items whose title mentions one of `sports` (case-insensitive). An
/// empty list keeps nothing.
pub fn filter_by_sports(items: Vec<FeedItem>, sports: &[String]) -> Vec<FeedItem> {
    if sports.is_empty() {
        return Vec::new();
    }

    let Some(regex) = sports_regex(sports) else {
        return Vec::new();
    };

    let before = items.len();
    let kept: Vec<FeedItem> = items
        .into_iter()
        .filter(|item| item.title.as_deref().is_some_and(|t| regex.is_match(t)))
        .collect();
    debug!("Sport filter kept {} of {} items", kept.len(), before);

    kept
}

/// Keep items starting within `[start, end]`. Items without a valid start date
/// are dropped.
pub fn filter_by_date_range(
    items: Vec<FeedItem>,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Vec<FeedItem> {
    if end < start {
        return Vec::new();
    }

    let before = items.len();
    let kept: Vec<FeedItem> = items
        .into_iter()
        .filter(|item| {
            item.localstartdate
                .as_ref()
                .and_then(|d| d.valid())
                .is_some_and(|d| d >= start && d <= end)
        })
        .collect();
    debug!("Date filter kept {} of {} items", kept.len(), before);

    kept
}
