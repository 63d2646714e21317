//! Error kinds shared by storage, the quiz engine and the controller

/// Everything that can go wrong while serving a chat event or starting up
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("storage unavailable: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("no word available for training")]
    NotFound,
    #[error("session data missing or outdated")]
    StaleSession,
    #[error("validation error: {0}")]
    Validation(String),
    #[error("schema check failed: {0}")]
    Schema(String),
    #[error("vocabulary import failed: {0}")]
    Import(String),
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BotError>;
