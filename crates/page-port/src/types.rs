use serde::{Deserialize, Serialize};

/// A descriptor query the page can answer with a match count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "spec", rename_all = "camelCase")]
pub enum QuerySpec {
    Selector(String),
    XPath(String),
    Id(String),
    Tag(String),
    TagText { tag: String, text: String },
}

impl QuerySpec {
    pub fn kind(&self) -> &'static str {
        match self {
            QuerySpec::Selector(_) => "selector",
            QuerySpec::XPath(_) => "xpath",
            QuerySpec::Id(_) => "id",
            QuerySpec::Tag(_) => "tag",
            QuerySpec::TagText { .. } => "tag-text",
        }
    }
}

/// Opaque reference to a live element, valid only while the page that issued it lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(pub u64);

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryMatch {
    pub count: usize,
    pub first: Option<ElementHandle>,
}

impl QueryMatch {
    /// The handle, when exactly one element matched.
    pub fn unique(&self) -> Option<ElementHandle> {
        if self.count == 1 {
            self.first
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// `"x:y:width:height"` of rounded pixel integers.
    pub fn box_id(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.x.round() as i64,
            self.y.round() as i64,
            self.width.round() as i64,
            self.height.round() as i64
        )
    }

    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Computed facts about one live element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElementFacts {
    pub bounding_box: Option<BoundingBox>,
    pub visible: bool,
    pub outer_html: String,
}

/// One element as seen during a document-order walk.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    pub tag_name: String,
    pub id: String,
    pub start_tag: String,
    pub inner_text: String,
    pub bounding_box: Option<BoundingBox>,
    pub xpath: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageEvent {
    Closed,
    NavigationCommitted { url: String },
}
