use thiserror::Error;

/// Unified error type for the cup engine.
///
/// Nothing in here is fatal to the host process: callers at the event
/// boundary log these and carry on, so the worst case is stale or missing
/// statistics for one player.
#[derive(Error, Debug)]
pub enum CupError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No current cup for server {0}")]
    NoCurrentCup(String),

    #[error("Cup {0} is closed; refusing to write")]
    CupClosed(i64),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for CupError {
    fn from(e: sqlx::Error) -> Self {
        CupError::Database(e.to_string())
    }
}
