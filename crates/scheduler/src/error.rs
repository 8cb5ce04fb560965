use page_port::{looks_like_closed_target, PageError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("browser launch failed after {attempts} attempts: {source}")]
    LaunchFailed { attempts: u32, source: PageError },
}

/// Why a checker could not finish.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Page(#[from] PageError),
    #[error("{0}")]
    Failed(String),
}

impl CheckError {
    pub fn failed(message: impl Into<String>) -> Self {
        CheckError::Failed(message.into())
    }

    /// Whether the page, context or browser went away under the checker.
    pub fn is_closed_target(&self) -> bool {
        match self {
            CheckError::Page(err) => err.is_closed_target(),
            CheckError::Failed(message) => looks_like_closed_target(message),
        }
    }

    /// Closed-page failures are worth a relaunch and another attempt; nothing else is.
    pub fn is_retryable(&self) -> bool {
        self.is_closed_target()
    }
}
