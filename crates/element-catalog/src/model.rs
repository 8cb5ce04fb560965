use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::xpath::normalize;

/// The fingerprint indices every catalog carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexName {
    TagName,
    Id,
    StartTag,
    Text,
    BoxId,
    PathId,
}

impl IndexName {
    pub const ALL: [IndexName; 6] = [
        IndexName::TagName,
        IndexName::Id,
        IndexName::StartTag,
        IndexName::Text,
        IndexName::BoxId,
        IndexName::PathId,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexName::TagName => "tagName",
            IndexName::Id => "id",
            IndexName::StartTag => "startTag",
            IndexName::Text => "text",
            IndexName::BoxId => "boxID",
            IndexName::PathId => "pathID",
        }
    }
}

/// One catalogued element.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogElement {
    pub tag_name: String,
    pub id: String,
    pub start_tag: String,
    pub text: String,
    #[serde(rename = "boxID")]
    pub box_id: String,
    #[serde(rename = "pathID")]
    pub path_id: String,
    pub text_linkable: bool,
}

impl CatalogElement {
    pub fn fingerprint(&self, index: IndexName) -> &str {
        match index {
            IndexName::TagName => &self.tag_name,
            IndexName::Id => &self.id,
            IndexName::StartTag => &self.start_tag,
            IndexName::Text => &self.text,
            IndexName::BoxId => &self.box_id,
            IndexName::PathId => &self.path_id,
        }
    }
}

pub type Index = BTreeMap<String, Vec<usize>>;

/// Arena of elements plus one side index per fingerprint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(rename = "element", with = "positional")]
    pub(crate) elements: Vec<CatalogElement>,
    #[serde(rename = "tagName")]
    pub(crate) tag_name: Index,
    pub(crate) id: Index,
    #[serde(rename = "startTag")]
    pub(crate) start_tag: Index,
    pub(crate) text: Index,
    #[serde(rename = "boxID")]
    pub(crate) box_id: Index,
    #[serde(rename = "pathID")]
    pub(crate) path_id: Index,
}

impl Catalog {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn element(&self, position: usize) -> Option<&CatalogElement> {
        self.elements.get(position)
    }

    pub fn elements(&self) -> impl Iterator<Item = (usize, &CatalogElement)> {
        self.elements.iter().enumerate()
    }

    pub fn index(&self, name: IndexName) -> &Index {
        match name {
            IndexName::TagName => &self.tag_name,
            IndexName::Id => &self.id,
            IndexName::StartTag => &self.start_tag,
            IndexName::Text => &self.text,
            IndexName::BoxId => &self.box_id,
            IndexName::PathId => &self.path_id,
        }
    }

    pub(crate) fn index_mut(&mut self, name: IndexName) -> &mut Index {
        match name {
            IndexName::TagName => &mut self.tag_name,
            IndexName::Id => &mut self.id,
            IndexName::StartTag => &mut self.start_tag,
            IndexName::Text => &mut self.text,
            IndexName::BoxId => &mut self.box_id,
            IndexName::PathId => &mut self.path_id,
        }
    }

    /// Positions sharing `value` in the named index, in document order.
    pub fn positions_for(&self, name: IndexName, value: &str) -> &[usize] {
        self.index(name)
            .get(value)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First position whose normalized XPath equals the normalized `path`.
    pub fn first_by_path(&self, path: &str) -> Option<usize> {
        let normalized = normalize(path);
        self.positions_for(IndexName::PathId, &normalized)
            .first()
            .copied()
    }

    /// The position holding `box_id`, when no other element shares it.
    pub fn unique_by_box(&self, box_id: &str) -> Option<usize> {
        match self.positions_for(IndexName::BoxId, box_id) {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Catalog position of an element identified by path and/or box.
    pub fn locate(&self, path_id: Option<&str>, box_id: Option<&str>) -> Option<usize> {
        path_id
            .filter(|p| !p.is_empty())
            .and_then(|p| self.first_by_path(p))
            .or_else(|| {
                box_id
                    .filter(|b| !b.is_empty())
                    .and_then(|b| self.unique_by_box(b))
            })
    }
}

/// (De)serializes the element arena as a map keyed by stringified position.
mod positional {
    use std::collections::BTreeMap;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::CatalogElement;

    pub fn serialize<S>(elements: &[CatalogElement], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(elements.iter().enumerate())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<CatalogElement>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = BTreeMap::<usize, CatalogElement>::deserialize(deserializer)?;
        let mut elements = Vec::with_capacity(map.len());
        for (expected, (position, element)) in map.into_iter().enumerate() {
            if position != expected {
                return Err(D::Error::custom(format!(
                    "element positions must be contiguous; missing {expected}"
                )));
            }
            elements.push(element);
        }
        Ok(elements)
    }
}
