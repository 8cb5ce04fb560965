//! Result standardization.
//!
//! Every checker speaks its own dialect: different severity words, different ways of
//! pointing at elements. This crate converts a checker's native output into one
//! [`StandardResult`], attaching catalog positions or XPath identifiers to each instance
//! so reports can cross-reference elements between checkers.

mod convert;
pub mod errors;
pub mod identity;
pub mod schema;
pub mod severity;
pub mod standardizer;

pub use errors::StandardizeError;
pub use schema::{round_totals, CheckerKind, NativeOutcome, StandardInstance, StandardResult};
pub use standardizer::{StandardizeInput, Standardizer, DEFAULT_DENY_LIST};
