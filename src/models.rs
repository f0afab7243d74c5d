use chrono::NaiveDateTime;

/// A date-like leaf from the feed. Only the `YYYY-MM-DD` prefix decides that a
/// value is a date; whatever follows may still fail to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedDate {
    Valid(NaiveDateTime),
    Invalid(String),
}

impl FeedDate {
    pub fn valid(&self) -> Option<NaiveDateTime> {
        match self {
            FeedDate::Valid(dt) => Some(*dt),
            FeedDate::Invalid(_) => None,
        }
    }
}

/// One `channel.item` of the schedule feed, as decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedItem {
    pub title: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub location: Option<String>,
    pub localstartdate: Option<FeedDate>,
    pub localenddate: Option<FeedDate>,
    pub gameid: Option<String>,
    pub gamepromoname: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Win,
    Loss,
    Tie,
    NoDecision,
}

impl GameResult {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "w" => Some(GameResult::Win),
            "l" => Some(GameResult::Loss),
            "t" => Some(GameResult::Tie),
            "n" => Some(GameResult::NoDecision),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            GameResult::Win => "W",
            GameResult::Loss => "L",
            GameResult::Tie => "T",
            GameResult::NoDecision => "N",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Game {
    pub sport: Option<String>,
    pub gender: Option<String>,
    pub opponent: Option<String>,
    pub is_home: bool,
    pub is_cancelled: bool,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub location: Option<String>,
    pub result: Option<GameResult>,
    pub score: Option<String>, // numeric or a placement like "t-5th"
    pub opponent_score: Option<String>,
    pub tv: Option<String>,
    pub radio: Option<String>,
    pub audio: Option<String>,
    pub video: Option<String>,
    pub tickets: Option<String>,
    pub url: Option<String>,
    pub id: Option<String>,
    pub promo_name: Option<String>,
}
