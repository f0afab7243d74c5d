use thiserror::Error;

/// Fatal failures of a calendar run. Malformed description lines are never
/// reported here; they just leave fields of the game empty.
#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("Request to {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Could not decode feed: {0}")]
    Decode(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Wiki request failed: {0}")]
    Wiki(String),
}

pub type Result<T> = std::result::Result<T, CalendarError>;
