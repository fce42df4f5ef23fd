use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommentWatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Comment source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Comment source timed out after {0:?}")]
    Timeout(Duration),

    #[error("Report error: {0}")]
    Report(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
