use serde::{Deserialize, Serialize};

use crate::types::{BoundingBox, ElementSnapshot};

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "details", "dialog", "div",
    "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4",
    "h5", "h6", "header", "hr", "html", "li", "main", "nav", "ol", "p", "pre", "section",
    "summary", "table", "tr", "ul",
];

const UNRENDERED_TAGS: &[&str] = &[
    "head", "link", "meta", "noscript", "script", "style", "template", "title",
];

/// One element of a fixture document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DomNode {
    pub tag: String,
    #[serde(default)]
    pub attrs: Vec<(String, String)>,
    #[serde(default)]
    pub children: Vec<DomChild>,
    #[serde(default, rename = "box")]
    pub bounding_box: Option<BoundingBox>,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DomChild {
    Text(String),
    Element(DomNode),
}

impl DomNode {
    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(DomChild::Text(text.into()));
        self
    }

    pub fn child(mut self, node: DomNode) -> Self {
        self.children.push(DomChild::Element(node));
        self
    }

    pub fn with_box(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bounding_box = Some(BoundingBox::new(x, y, width, height));
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// A whole fixture page: doctype, URL and the `html` root element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixtureDocument {
    #[serde(default)]
    pub doctype: Option<String>,
    pub url: String,
    pub root: DomNode,
}

impl FixtureDocument {
    pub fn new(url: impl Into<String>, root: DomNode) -> Self {
        Self {
            doctype: Some("html".to_string()),
            url: url.into(),
            root,
        }
    }

    /// Wrap `body` in `html` with an empty `head`.
    pub fn from_body(url: impl Into<String>, body: DomNode) -> Self {
        let root = DomNode::element("html")
            .attr("lang", "en")
            .child(DomNode::element("head"))
            .child(body);
        Self::new(url, root)
    }

    pub fn with_doctype(mut self, doctype: Option<&str>) -> Self {
        self.doctype = doctype.map(str::to_string);
        self
    }
}

#[derive(Clone, Debug)]
pub(crate) enum Content {
    Text(String),
    Element(usize),
}

#[derive(Clone, Debug)]
pub(crate) struct FlatNode {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub content: Vec<Content>,
    pub xpath: String,
    pub rendered: bool,
    pub bounding_box: Option<BoundingBox>,
}

impl FlatNode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }
}

/// Arena form of a fixture document; node 0 is the root, indices follow document order.
#[derive(Clone, Debug)]
pub(crate) struct FlatDom {
    pub nodes: Vec<FlatNode>,
}

impl FlatDom {
    pub fn from_root(root: &DomNode) -> Self {
        let mut dom = FlatDom { nodes: Vec::new() };
        dom.push(root, None, 1, true);
        dom
    }

    fn push(&mut self, node: &DomNode, parent: Option<usize>, position: usize, rendered: bool) -> usize {
        let tag = node.tag.to_ascii_lowercase();
        let xpath = match parent {
            Some(p) => format!("{}/{}[{}]", self.nodes[p].xpath, tag, position),
            None => format!("/{}[{}]", tag, position),
        };
        let rendered = rendered && !node.hidden && !UNRENDERED_TAGS.contains(&tag.as_str());
        let idx = self.nodes.len();
        self.nodes.push(FlatNode {
            tag: tag.clone(),
            attrs: node.attrs.clone(),
            parent,
            children: Vec::new(),
            content: Vec::new(),
            xpath,
            rendered,
            bounding_box: if rendered { node.bounding_box } else { None },
        });

        let mut seen: Vec<(String, usize)> = Vec::new();
        for child in &node.children {
            match child {
                DomChild::Text(text) => self.nodes[idx].content.push(Content::Text(text.clone())),
                DomChild::Element(element) => {
                    let child_tag = element.tag.to_ascii_lowercase();
                    let position = match seen.iter_mut().find(|(t, _)| *t == child_tag) {
                        Some((_, count)) => {
                            *count += 1;
                            *count
                        }
                        None => {
                            seen.push((child_tag, 1));
                            1
                        }
                    };
                    let child_idx = self.push(element, Some(idx), position, rendered);
                    self.nodes[idx].children.push(child_idx);
                    self.nodes[idx].content.push(Content::Element(child_idx));
                }
            }
        }
        idx
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, idx: usize) -> &FlatNode {
        &self.nodes[idx]
    }

    pub fn text_content(&self, idx: usize) -> String {
        let mut out = String::new();
        for item in &self.nodes[idx].content {
            match item {
                Content::Text(text) => out.push_str(text),
                Content::Element(child) => out.push_str(&self.text_content(*child)),
            }
        }
        out
    }

    /// Approximates `HTMLElement.innerText`: unrendered elements report their text
    /// content, rendered ones skip unrendered descendants and break lines around blocks.
    pub fn inner_text(&self, idx: usize) -> String {
        if !self.nodes[idx].rendered {
            return self.text_content(idx);
        }
        self.rendered_text(idx)
    }

    fn rendered_text(&self, idx: usize) -> String {
        let mut out = String::new();
        for item in &self.nodes[idx].content {
            match item {
                Content::Text(text) => out.push_str(text),
                Content::Element(child) => {
                    let node = &self.nodes[*child];
                    if !node.rendered {
                        continue;
                    }
                    if node.tag == "br" {
                        out.push('\n');
                    } else if BLOCK_TAGS.contains(&node.tag.as_str()) {
                        out.push('\n');
                        out.push_str(&self.rendered_text(*child));
                        out.push('\n');
                    } else {
                        out.push_str(&self.rendered_text(*child));
                    }
                }
            }
        }
        out
    }

    pub fn start_tag(&self, idx: usize) -> String {
        let node = &self.nodes[idx];
        let mut out = format!("<{}", node.tag);
        for (name, value) in &node.attrs {
            out.push_str(&format!(" {}=\"{}\"", name, escape_attr(value)));
        }
        out.push('>');
        out
    }

    pub fn outer_html(&self, idx: usize) -> String {
        let node = &self.nodes[idx];
        let mut out = self.start_tag(idx);
        if VOID_TAGS.contains(&node.tag.as_str()) {
            return out;
        }
        for item in &node.content {
            match item {
                Content::Text(text) => out.push_str(&escape_text(text)),
                Content::Element(child) => out.push_str(&self.outer_html(*child)),
            }
        }
        out.push_str(&format!("</{}>", node.tag));
        out
    }

    pub fn is_ancestor(&self, ancestor: usize, mut idx: usize) -> bool {
        while let Some(parent) = self.nodes[idx].parent {
            if parent == ancestor {
                return true;
            }
            idx = parent;
        }
        false
    }

    pub fn snapshot(&self, idx: usize) -> ElementSnapshot {
        let node = &self.nodes[idx];
        ElementSnapshot {
            tag_name: node.tag.to_ascii_uppercase(),
            id: node.attr("id").unwrap_or("").to_string(),
            start_tag: self.start_tag(idx),
            inner_text: self.inner_text(idx),
            bounding_box: node.bounding_box,
            xpath: node.xpath.clone(),
        }
    }
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
