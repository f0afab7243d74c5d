use std::sync::LazyLock;

use log::debug;
use regex::{Captures, Regex, RegexBuilder};
use url::Url;

use crate::models::{FeedItem, Game, GameResult};

fn case_insensitive(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap()
}

/// First description line, e.g.
/// `[L] University of Louisville Men's Basketball vs  Duke`.
pub static GAME_BASICS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    case_insensitive(
        r"^(?:(?P<status>cancelled|\[[lntw]\])\s+)?university of louisville\s(?:(?P<gender>men's|women's)\s)?(?P<sport>baseball|basketball|cross country|field hockey|football|golf|lacrosse|rowing|soccer|softball|swimming & diving|tennis|track & field|volleyball)(?:\s+(?:(?P<side>at|vs)\s+)?(?P<opponent>.*))?$",
    )
});

/// Result line: `L 81-77`, `N -`, `N - t-5th of 22 teams`.
pub static GAME_RESULT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    case_insensitive(
        r"^(?P<result>[lntw])\s+(?:-\s+)?(?:(?P<score>(?:t-)?\d{1,3}(?:st|nd|rd|th)?)(?:-(?P<opponent_score>\d{1,3}))?)?",
    )
});

/// `Key: value` metadata line (`TV: ESPN`, `Streaming Audio: http://...`).
pub static SUPPLEMENTARY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<key>[^:]+?):\s*(?P<value>.*)$").unwrap());

fn capture(caps: &Captures, name: &str) -> Option<String> {
    caps.name(name).and_then(|m| non_empty(m.as_str()))
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() { None } else { Some(value.to_string()) }
}

fn is_bare_url(line: &str) -> bool {
    Url::parse(line).is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
}

fn apply_basics(game: &mut Game, caps: &Captures) {
    game.is_cancelled = caps
        .name("status")
        .is_some_and(|m| m.as_str().eq_ignore_ascii_case("cancelled"));
    game.is_home = caps
        .name("side")
        .is_some_and(|m| m.as_str().eq_ignore_ascii_case("vs"));
    game.gender = capture(caps, "gender");
    game.sport = capture(caps, "sport");
    game.opponent = capture(caps, "opponent");
}

fn apply_result(game: &mut Game, caps: &Captures) {
    game.result = caps.name("result").and_then(|m| GameResult::from_code(m.as_str()));
    game.score = capture(caps, "score");
    game.opponent_score = capture(caps, "opponent_score");
}

fn apply_supplementary(game: &mut Game, caps: &Captures) -> bool {
    let value = capture(caps, "value");
    let key = caps.name("key").map(|m| m.as_str().trim().to_lowercase()).unwrap_or_default();

    match key.as_str() {
        "radio" => game.radio = value,
        "streaming audio" => game.audio = value,
        "streaming video" => game.video = value,
        "tickets" => game.tickets = value,
        "tv" => game.tv = value,
        _ => return false,
    }
    true
}

/// Pull whatever can be recognized out of a feed description. Lines that
/// match nothing are skipped; the result is never an error.
pub fn parse_item_description(description: &str) -> Game {
    let mut game = Game::default();

    // The feed escapes newlines as a literal backslash-n.
    let unescaped = description.replace("\\n", "\n");
    let lines: Vec<&str> = unescaped
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let last = lines.len().saturating_sub(1);

    for (index, line) in lines.iter().enumerate() {
        if index == 0 {
            match GAME_BASICS_REGEX.captures(line) {
                Some(caps) => apply_basics(&mut game, &caps),
                None => debug!("Unrecognized game summary: {}", line),
            }
            continue;
        }

        if index == last && is_bare_url(line) {
            continue;
        }

        // Known keys win over the result pattern; any other `x: y` line may
        // still be a result with a note, e.g. `W 3-1 (Note: 7 innings)`.
        let supplementary = SUPPLEMENTARY_REGEX
            .captures(line)
            .is_some_and(|caps| apply_supplementary(&mut game, &caps));
        if supplementary {
            continue;
        }

        if let Some(caps) = GAME_RESULT_REGEX.captures(line) {
            apply_result(&mut game, &caps);
        }
    }

    game
}

/// Build the game for a feed item: defaults, then the parsed description,
/// then the item's own fields, which always win.
pub fn parse_item(item: &FeedItem) -> Game {
    let described = item
        .description
        .as_deref()
        .map(parse_item_description)
        .unwrap_or_default();

    Game {
        start: item.localstartdate.as_ref().and_then(|d| d.valid()),
        end: item.localenddate.as_ref().and_then(|d| d.valid()),
        location: item.location.as_deref().and_then(non_empty),
        url: item.link.as_deref().and_then(non_empty),
        id: item.gameid.as_deref().and_then(non_empty),
        promo_name: item.gamepromoname.as_deref().and_then(non_empty),
        ..described
    }
}
