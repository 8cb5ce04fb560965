//! Identity resolution for checker-reported elements.
//!
//! Checkers describe the elements they complain about in whatever way they can: a CSS
//! selector, an XPath, an id, a tag name, an HTML excerpt. This crate turns such a
//! descriptor into a box identifier and a normalized-XPath identifier by asking the live
//! page, trying increasingly coarse strategies:
//! - selector / XPath location (must match exactly one element)
//! - element id
//! - tag name (unique on the page)
//! - tag name plus excerpt text

pub mod errors;
pub mod excerpt;
pub mod resolver;
pub mod strategies;
pub mod types;

pub use errors::ResolveError;
pub use excerpt::{css_escape, excerpt_start_tag, excerpt_text, injected_xpath, StartTag};
pub use resolver::{IdentityResolver, DEFAULT_PATH_TIMEOUT};
pub use strategies::Strategy;
pub use types::{ElementDescriptor, Location, LocationKind, Resolution, ResolutionStrategy};
