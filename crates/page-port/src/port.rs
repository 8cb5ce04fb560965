use std::sync::Arc;

use accord_core_types::Target;
use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::PageError;
use crate::types::{ElementFacts, ElementHandle, ElementSnapshot, PageEvent, QueryMatch, QuerySpec};

/// The live page surface the catalog, resolver and checkers consume.
///
/// Handles returned by [`PagePort::query`] are only meaningful to the page that issued
/// them and only until the page closes or navigates.
#[async_trait]
pub trait PagePort: Send + Sync {
    /// Count the elements matching `spec` and return the first in document order.
    async fn query(&self, spec: &QuerySpec) -> Result<QueryMatch, PageError>;

    /// Bounding box, visibility and outer HTML of one element.
    async fn element_facts(&self, handle: ElementHandle) -> Result<ElementFacts, PageError>;

    /// Absolute XPath of one element, as produced by the page-injected XPath function.
    async fn xpath_of(&self, handle: ElementHandle) -> Result<String, PageError>;

    /// Every element of the document in document order.
    async fn elements(&self) -> Result<Vec<ElementSnapshot>, PageError>;

    async fn doctype(&self) -> Result<Option<String>, PageError>;

    async fn screenshot(&self) -> Result<Vec<u8>, PageError>;

    fn url(&self) -> String;

    fn is_closed(&self) -> bool;

    fn subscribe(&self) -> broadcast::Receiver<PageEvent>;

    async fn close(&self);
}

/// Launches a fresh browser and returns its page loaded with the target.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, target: &Target) -> Result<Arc<dyn PagePort>, PageError>;
}

#[async_trait]
impl<L> BrowserLauncher for Arc<L>
where
    L: BrowserLauncher + ?Sized,
{
    async fn launch(&self, target: &Target) -> Result<Arc<dyn PagePort>, PageError> {
        (**self).launch(target).await
    }
}
