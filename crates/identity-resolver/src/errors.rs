//! Error types for identity resolution

use page_port::PageError;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ResolveError {
    /// The specifier is syntactically invalid for the page's query engine
    #[error("invalid {kind} specifier '{spec}': {reason}")]
    InvalidSpecifier {
        kind: String,
        spec: String,
        reason: String,
    },

    /// The page could not answer
    #[error("page error: {0}")]
    Page(PageError),
}

impl ResolveError {
    pub(crate) fn from_page(kind: &str, spec: &str, err: PageError) -> Self {
        if err.is_invalid_query() {
            ResolveError::InvalidSpecifier {
                kind: kind.to_string(),
                spec: spec.to_string(),
                reason: err.hint.unwrap_or_else(|| err.kind.to_string()),
            }
        } else {
            ResolveError::Page(err)
        }
    }

    /// Whether further strategies are pointless because the page is gone.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ResolveError::Page(err) if err.is_closed_target())
    }
}
