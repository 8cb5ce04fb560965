//! Core types for identity resolution

use serde::{Deserialize, Serialize};

/// How a checker located an element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    Selector,
    Xpath,
    Box,
    Line,
    #[default]
    #[serde(rename = "")]
    None,
}

/// A checker's native location for an element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "type", default)]
    pub kind: LocationKind,
    #[serde(default)]
    pub spec: String,
    /// Set when the specifier is syntactically invalid for the page's query engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalidity: Option<String>,
}

impl Location {
    pub fn new(kind: LocationKind, spec: impl Into<String>) -> Self {
        Self {
            kind,
            spec: spec.into(),
            invalidity: None,
        }
    }

    pub fn selector(spec: impl Into<String>) -> Self {
        Self::new(LocationKind::Selector, spec)
    }

    pub fn xpath(spec: impl Into<String>) -> Self {
        Self::new(LocationKind::Xpath, spec)
    }

    pub fn is_empty(&self) -> bool {
        self.kind == LocationKind::None && self.spec.is_empty()
    }
}

/// Whatever a checker told us about an element. Every field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDescriptor {
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub location: Location,
}

impl ElementDescriptor {
    pub fn with_location(location: Location) -> Self {
        Self {
            location,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_tag_name(mut self, tag_name: impl Into<String>) -> Self {
        self.tag_name = tag_name.into();
        self
    }

    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = excerpt.into();
        self
    }
}

/// Resolution strategies in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionStrategy {
    /// The checker's own selector or XPath
    Locator,

    /// The element id
    Id,

    /// The tag name, when the page has one element of that tag
    TagName,

    /// The tag name narrowed by the excerpt's text
    TagText,
}

impl ResolutionStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ResolutionStrategy::Locator => "locator",
            ResolutionStrategy::Id => "id",
            ResolutionStrategy::TagName => "tag-name",
            ResolutionStrategy::TagText => "tag-text",
        }
    }

    /// All strategies in fallback order
    pub fn fallback_chain() -> [ResolutionStrategy; 4] {
        [
            ResolutionStrategy::Locator,
            ResolutionStrategy::Id,
            ResolutionStrategy::TagName,
            ResolutionStrategy::TagText,
        ]
    }
}

/// What the resolver could establish about a descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    #[serde(rename = "boxID", skip_serializing_if = "Option::is_none")]
    pub box_id: Option<String>,
    #[serde(rename = "pathID", skip_serializing_if = "Option::is_none")]
    pub path_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<ResolutionStrategy>,
    /// Whether `path_id` came from a live element rather than a literal XPath.
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalidity: Option<String>,
}

impl Resolution {
    pub fn is_complete(&self) -> bool {
        self.box_id.is_some() && self.path_id.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.box_id.is_none() && self.path_id.is_none()
    }
}
