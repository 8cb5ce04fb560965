//! Element location strategies
//!
//! Each strategy asks the page for the element it can vouch for, and answers `None`
//! when it has nothing to go on or the page does not single one element out.

use crate::{
    errors::ResolveError,
    excerpt::{css_escape, excerpt_start_tag, excerpt_text},
    types::{ElementDescriptor, LocationKind, ResolutionStrategy},
};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use page_port::{ElementHandle, PagePort, QuerySpec};
use regex::Regex;
use tracing::debug;

static TRAILING_TEXT_STEP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/text\(\)(\[\d+\])?$").expect("text step pattern"));

/// Strategy trait for element location
#[async_trait]
pub trait Strategy: Send + Sync {
    async fn locate(
        &self,
        descriptor: &ElementDescriptor,
        page: &dyn PagePort,
    ) -> Result<Option<ElementHandle>, ResolveError>;

    fn strategy_type(&self) -> ResolutionStrategy;

    fn name(&self) -> &'static str {
        self.strategy_type().name()
    }
}

/// Build the strategy for a chain step.
pub fn strategy_for(kind: ResolutionStrategy) -> Box<dyn Strategy> {
    match kind {
        ResolutionStrategy::Locator => Box::new(LocatorStrategy),
        ResolutionStrategy::Id => Box::new(IdStrategy),
        ResolutionStrategy::TagName => Box::new(TagNameStrategy),
        ResolutionStrategy::TagText => Box::new(TagTextStrategy),
    }
}

/// Strip a trailing text-node step so the XPath addresses the owning element.
pub fn strip_text_step(xpath: &str) -> &str {
    match TRAILING_TEXT_STEP.find(xpath) {
        Some(found) => &xpath[..found.start()],
        None => xpath,
    }
}

/// The descriptor's tag name, or the one its excerpt starts with.
fn tag_of(descriptor: &ElementDescriptor) -> Option<String> {
    let tag = descriptor.tag_name.trim();
    if !tag.is_empty() {
        return Some(tag.to_ascii_lowercase());
    }
    excerpt_start_tag(&descriptor.excerpt).map(|start| start.tag_name)
}

/// The checker's own selector or XPath, which must match exactly one element
pub struct LocatorStrategy;

#[async_trait]
impl Strategy for LocatorStrategy {
    async fn locate(
        &self,
        descriptor: &ElementDescriptor,
        page: &dyn PagePort,
    ) -> Result<Option<ElementHandle>, ResolveError> {
        let spec = descriptor.location.spec.trim();
        if spec.is_empty() {
            return Ok(None);
        }
        let (kind, query) = match descriptor.location.kind {
            LocationKind::Selector => ("selector", QuerySpec::Selector(spec.to_string())),
            LocationKind::Xpath => {
                let path = strip_text_step(spec);
                if path.is_empty() {
                    return Ok(None);
                }
                ("xpath", QuerySpec::XPath(path.to_string()))
            }
            _ => return Ok(None),
        };
        let found = page
            .query(&query)
            .await
            .map_err(|err| ResolveError::from_page(kind, spec, err))?;
        debug!(target: "resolver", kind, spec, count = found.count, "locator matched");
        Ok(found.unique())
    }

    fn strategy_type(&self) -> ResolutionStrategy {
        ResolutionStrategy::Locator
    }
}

/// First element carrying the descriptor's id
pub struct IdStrategy;

#[async_trait]
impl Strategy for IdStrategy {
    async fn locate(
        &self,
        descriptor: &ElementDescriptor,
        page: &dyn PagePort,
    ) -> Result<Option<ElementHandle>, ResolveError> {
        let id = if descriptor.id.is_empty() {
            excerpt_start_tag(&descriptor.excerpt)
                .and_then(|start| start.id)
                .unwrap_or_default()
        } else {
            descriptor.id.clone()
        };
        if id.is_empty() {
            return Ok(None);
        }
        let selector = format!("#{}", css_escape(&id));
        let found = page
            .query(&QuerySpec::Selector(selector.clone()))
            .await
            .map_err(|err| ResolveError::from_page("selector", &selector, err))?;
        Ok(found.first)
    }

    fn strategy_type(&self) -> ResolutionStrategy {
        ResolutionStrategy::Id
    }
}

/// The page's only element of the descriptor's tag
pub struct TagNameStrategy;

#[async_trait]
impl Strategy for TagNameStrategy {
    async fn locate(
        &self,
        descriptor: &ElementDescriptor,
        page: &dyn PagePort,
    ) -> Result<Option<ElementHandle>, ResolveError> {
        let Some(tag) = tag_of(descriptor) else {
            return Ok(None);
        };
        let found = page
            .query(&QuerySpec::Tag(tag.clone()))
            .await
            .map_err(|err| ResolveError::from_page("tagName", &tag, err))?;
        Ok(found.unique())
    }

    fn strategy_type(&self) -> ResolutionStrategy {
        ResolutionStrategy::TagName
    }
}

/// Among several elements of a tag, the only one containing the excerpt's text
pub struct TagTextStrategy;

#[async_trait]
impl Strategy for TagTextStrategy {
    async fn locate(
        &self,
        descriptor: &ElementDescriptor,
        page: &dyn PagePort,
    ) -> Result<Option<ElementHandle>, ResolveError> {
        let Some(tag) = tag_of(descriptor) else {
            return Ok(None);
        };
        let text = excerpt_text(&descriptor.excerpt);
        if text.is_empty() {
            return Ok(None);
        }
        let same_tag = page
            .query(&QuerySpec::Tag(tag.clone()))
            .await
            .map_err(|err| ResolveError::from_page("tagName", &tag, err))?;
        if same_tag.count < 2 {
            return Ok(None);
        }
        let found = page
            .query(&QuerySpec::TagText { tag: tag.clone(), text })
            .await
            .map_err(|err| ResolveError::from_page("tagName", &tag, err))?;
        Ok(found.unique())
    }

    fn strategy_type(&self) -> ResolutionStrategy {
        ResolutionStrategy::TagText
    }
}
