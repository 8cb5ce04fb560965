//! Element catalog.
//!
//! One flat, immutable snapshot of every element on a loaded page. Positions are dense
//! indices assigned in document order; side indices map each fingerprint value (tag
//! name, id, start tag, text, box, normalized XPath) to the positions sharing it.
//! Positions are only meaningful within one build.

pub mod builder;
pub mod errors;
pub mod fingerprint;
pub mod model;
pub mod xpath;

pub use builder::build;
pub use errors::CatalogError;
pub use fingerprint::text_fingerprint;
pub use model::{Catalog, CatalogElement, IndexName};
pub use xpath::normalize;
