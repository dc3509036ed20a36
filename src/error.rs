pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Content load error: {0}")]
    ContentLoad(String),

    #[error("Invalid dialogue state: {0}")]
    InvalidState(String),

    #[error("Grading service error: {0}")]
    GradingService(String),

    #[error("Queue corruption: {0}")]
    QueueCorruption(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl Error {
    /// True for errors that end the whole session rather than the current
    /// item; the host must route to a best-effort results screen.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Error::QueueCorruption(_))
    }

    /// True for errors the host may resolve by retrying the remote call.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::ContentLoad(_) | Error::GradingService(_) | Error::Reqwest(_)
        )
    }
}
