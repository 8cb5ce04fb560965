//! Accord page port.
//!
//! The orchestration and identity layers never drive a browser directly. They consume
//! the narrow surface defined here: descriptor queries, element facts, absolute XPaths,
//! a document-order element walk and page lifecycle events. A real automation backend
//! implements [`PagePort`] and [`BrowserLauncher`]; the [`fixture`] module provides a
//! deterministic in-memory page used by tests and by the CLI.

pub mod error;
pub mod fixture;
pub mod port;
pub mod types;

pub use error::{looks_like_closed_target, PageError, PageErrorKind};
pub use port::{BrowserLauncher, PagePort};
pub use types::{
    BoundingBox, ElementFacts, ElementHandle, ElementSnapshot, PageEvent, QueryMatch, QuerySpec,
};
