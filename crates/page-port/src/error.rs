use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Message fragments browsers emit when the page, context or browser went away.
const CLOSED_TARGET_MARKERS: &[&str] = &[
    "has been closed",
    "target closed",
    "browser has disconnected",
    "page crashed",
];

/// High-level error categories surfaced by a page provider.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum PageErrorKind {
    #[error("Target page, context or browser has been closed")]
    TargetClosed,
    #[error("invalid query")]
    InvalidQuery,
    #[error("protocol error")]
    Protocol,
    #[error("page operation timed out")]
    Timeout,
    #[error("operation not supported")]
    Unsupported,
    #[error("internal error")]
    Internal,
}

/// Enriched error metadata passed back to the identity and orchestration layers.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageError {
    pub kind: PageErrorKind,
    pub hint: Option<String>,
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(hint) = &self.hint {
            write!(f, ": {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for PageError {}

impl PageError {
    pub fn new(kind: PageErrorKind) -> Self {
        Self { kind, hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn closed() -> Self {
        Self::new(PageErrorKind::TargetClosed)
    }

    pub fn invalid_query(hint: impl Into<String>) -> Self {
        Self::new(PageErrorKind::InvalidQuery).with_hint(hint)
    }

    /// Classify a free-form automation error message.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let kind = if looks_like_closed_target(&message) {
            PageErrorKind::TargetClosed
        } else if message.to_ascii_lowercase().contains("protocol error") {
            PageErrorKind::Protocol
        } else {
            PageErrorKind::Internal
        };
        Self::new(kind).with_hint(message)
    }

    /// True when the page, its context or the whole browser is gone.
    pub fn is_closed_target(&self) -> bool {
        self.kind == PageErrorKind::TargetClosed
    }

    pub fn is_invalid_query(&self) -> bool {
        self.kind == PageErrorKind::InvalidQuery
    }
}

pub fn looks_like_closed_target(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    CLOSED_TARGET_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_closed_target_messages() {
        let err = PageError::from_message(
            "page.evaluate: Target page, context or browser has been closed",
        );
        assert!(err.is_closed_target());
        assert!(looks_like_closed_target("Protocol error: Target closed."));
        assert!(!looks_like_closed_target("selector resolved to hidden element"));
    }

    #[test]
    fn display_includes_hint() {
        let err = PageError::invalid_query("unexpected token '{'");
        assert_eq!(err.to_string(), "invalid query: unexpected token '{'");
        assert!(err.is_invalid_query());
    }
}
