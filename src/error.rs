use thiserror::Error;

/// Failures surfaced by the article backend and the layers above it.
///
/// Errors are `Clone` so a single failed fetch can be handed to every
/// subscriber of the same cache key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlogError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Article not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl BlogError {
    /// Only transport failures are worth retrying.
    pub fn is_transport(&self) -> bool {
        matches!(self, BlogError::Transport(_))
    }
}

impl From<reqwest::Error> for BlogError {
    fn from(err: reqwest::Error) -> Self {
        BlogError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BlogError>;
