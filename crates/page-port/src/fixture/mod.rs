//! Deterministic in-memory pages.
//!
//! Fixture documents are plain element trees (buildable in code or loaded from JSON)
//! with explicit layout boxes. They stand in for a live browser wherever the
//! orchestration, catalog or identity layers need a page.

mod dom;
mod page;
mod selector;
mod xpath;

pub use dom::{DomChild, DomNode, FixtureDocument};
pub use page::{FixtureLauncher, FixturePage};
