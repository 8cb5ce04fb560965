//! Absolute location-path XPath evaluation for fixture pages.

use super::dom::FlatDom;
use crate::error::PageError;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Clone, Debug, PartialEq)]
struct Step {
    axis: Axis,
    name: Option<String>,
    index: Option<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct XPath {
    steps: Vec<Step>,
}

impl XPath {
    pub fn parse(input: &str) -> Result<Self, PageError> {
        let invalid = |reason: &str| {
            PageError::invalid_query(format!("'{}' is not a valid XPath: {}", input, reason))
        };
        let trimmed = input.trim();
        if !trimmed.starts_with('/') {
            return Err(invalid("only absolute paths are supported"));
        }
        let mut steps = Vec::new();
        let mut rest = trimmed;
        while !rest.is_empty() {
            let axis = if let Some(after) = rest.strip_prefix("//") {
                rest = after;
                Axis::Descendant
            } else if let Some(after) = rest.strip_prefix('/') {
                rest = after;
                Axis::Child
            } else {
                return Err(invalid("expected '/'"));
            };
            let end = rest.find('/').unwrap_or(rest.len());
            let raw = &rest[..end];
            rest = &rest[end..];
            if raw.is_empty() {
                return Err(invalid("empty step"));
            }
            steps.push(parse_step(raw, axis).ok_or_else(|| invalid("unsupported step"))?);
        }
        if steps.is_empty() {
            return Err(invalid("no steps"));
        }
        Ok(Self { steps })
    }

    /// Matching node indices in document order.
    pub fn evaluate(&self, dom: &FlatDom) -> Vec<usize> {
        // `None` stands for the document node above the root element.
        let mut context: Vec<Option<usize>> = vec![None];
        for step in &self.steps {
            let mut parents: Vec<Option<usize>> = Vec::new();
            for node in &context {
                parents.push(*node);
                if step.axis == Axis::Descendant {
                    let start = node.map(|n| n + 1).unwrap_or(0);
                    for idx in start..dom.len() {
                        let inside = match node {
                            Some(anchor) => dom.is_ancestor(*anchor, idx),
                            None => true,
                        };
                        if inside {
                            parents.push(Some(idx));
                        }
                    }
                }
            }
            let mut next: Vec<usize> = Vec::new();
            for parent in parents {
                let children: Vec<usize> = match parent {
                    Some(p) => dom.node(p).children.clone(),
                    None => vec![0],
                };
                let named: Vec<usize> = children
                    .into_iter()
                    .filter(|c| match &step.name {
                        Some(name) => dom.node(*c).tag.eq_ignore_ascii_case(name),
                        None => true,
                    })
                    .collect();
                match step.index {
                    Some(n) => next.extend(named.get(n - 1).copied()),
                    None => next.extend(named),
                }
            }
            next.sort_unstable();
            next.dedup();
            context = next.into_iter().map(Some).collect();
        }
        context.into_iter().flatten().collect()
    }
}

fn parse_step(raw: &str, axis: Axis) -> Option<Step> {
    let (name_part, index) = match raw.find('[') {
        Some(open) => {
            let close = raw.strip_suffix(']')?;
            let digits = &close[open + 1..];
            let n: usize = digits.trim().parse().ok()?;
            if n == 0 {
                return None;
            }
            (&raw[..open], Some(n))
        }
        None => (raw, None),
    };
    let name = if name_part == "*" {
        None
    } else if !name_part.is_empty()
        && name_part.chars().next()?.is_ascii_alphabetic()
        && name_part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Some(name_part.to_ascii_lowercase())
    } else {
        return None;
    };
    Some(Step { axis, name, index })
}
