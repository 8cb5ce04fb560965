use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use accord_core_types::Target;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::debug;

use super::dom::{FixtureDocument, FlatDom};
use super::selector::Selector;
use super::xpath::XPath;
use crate::error::{PageError, PageErrorKind};
use crate::port::{BrowserLauncher, PagePort};
use crate::types::{
    ElementFacts, ElementHandle, ElementSnapshot, PageEvent, QueryMatch, QuerySpec,
};

/// A live-looking page backed by a fixture document.
pub struct FixturePage {
    document: FixtureDocument,
    dom: FlatDom,
    url: RwLock<String>,
    closed: AtomicBool,
    events: broadcast::Sender<PageEvent>,
    xpath_delay: Mutex<Option<Duration>>,
}

impl FixturePage {
    pub fn new(document: FixtureDocument) -> Self {
        let dom = FlatDom::from_root(&document.root);
        let (events, _) = broadcast::channel(16);
        Self {
            url: RwLock::new(document.url.clone()),
            document,
            dom,
            closed: AtomicBool::new(false),
            events,
            xpath_delay: Mutex::new(None),
        }
    }

    /// Slow down [`PagePort::xpath_of`], simulating a pathological DOM.
    pub fn set_xpath_delay(&self, delay: Option<Duration>) {
        *self.xpath_delay.lock() = delay;
    }

    /// Pretend the page committed a navigation to `url`.
    pub fn navigate(&self, url: impl Into<String>) {
        let url = url.into();
        *self.url.write() = url.clone();
        let _ = self.events.send(PageEvent::NavigationCommitted { url });
    }

    pub fn document(&self) -> &FixtureDocument {
        &self.document
    }

    fn ensure_open(&self) -> Result<(), PageError> {
        if self.is_closed() {
            Err(PageError::closed())
        } else {
            Ok(())
        }
    }

    fn node_for(&self, handle: ElementHandle) -> Result<usize, PageError> {
        let idx = handle.0 as usize;
        if idx < self.dom.len() {
            Ok(idx)
        } else {
            Err(PageError::new(PageErrorKind::Internal)
                .with_hint(format!("stale element handle {}", handle.0)))
        }
    }

    fn matches(&self, spec: &QuerySpec) -> Result<Vec<usize>, PageError> {
        let all = 0..self.dom.len();
        let hits = match spec {
            QuerySpec::Selector(selector) => {
                let parsed = Selector::parse(selector)?;
                all.filter(|idx| parsed.matches(&self.dom, *idx)).collect()
            }
            QuerySpec::XPath(path) => XPath::parse(path)?.evaluate(&self.dom),
            QuerySpec::Id(id) => all
                .filter(|idx| self.dom.node(*idx).attr("id") == Some(id.as_str()))
                .collect(),
            QuerySpec::Tag(tag) => {
                validate_tag(tag)?;
                all.filter(|idx| self.dom.node(*idx).tag.eq_ignore_ascii_case(tag))
                    .collect()
            }
            QuerySpec::TagText { tag, text } => {
                validate_tag(tag)?;
                let needle = collapse(text).to_lowercase();
                all.filter(|idx| {
                    self.dom.node(*idx).tag.eq_ignore_ascii_case(tag)
                        && collapse(&self.dom.inner_text(*idx))
                            .to_lowercase()
                            .contains(&needle)
                })
                .collect()
            }
        };
        Ok(hits)
    }
}

fn validate_tag(tag: &str) -> Result<(), PageError> {
    let valid = tag.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(PageError::invalid_query(format!("'{}' is not a valid tag name", tag)))
    }
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl PagePort for FixturePage {
    async fn query(&self, spec: &QuerySpec) -> Result<QueryMatch, PageError> {
        self.ensure_open()?;
        let hits = self.matches(spec)?;
        debug!(kind = spec.kind(), count = hits.len(), "fixture query");
        Ok(QueryMatch {
            count: hits.len(),
            first: hits.first().map(|idx| ElementHandle(*idx as u64)),
        })
    }

    async fn element_facts(&self, handle: ElementHandle) -> Result<ElementFacts, PageError> {
        self.ensure_open()?;
        let idx = self.node_for(handle)?;
        let bounding_box = self.dom.node(idx).bounding_box;
        Ok(ElementFacts {
            bounding_box,
            visible: bounding_box.map(|b| b.has_area()).unwrap_or(false),
            outer_html: self.dom.outer_html(idx),
        })
    }

    async fn xpath_of(&self, handle: ElementHandle) -> Result<String, PageError> {
        self.ensure_open()?;
        let idx = self.node_for(handle)?;
        let delay = *self.xpath_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.dom.node(idx).xpath.clone())
    }

    async fn elements(&self) -> Result<Vec<ElementSnapshot>, PageError> {
        self.ensure_open()?;
        Ok((0..self.dom.len()).map(|idx| self.dom.snapshot(idx)).collect())
    }

    async fn doctype(&self) -> Result<Option<String>, PageError> {
        self.ensure_open()?;
        Ok(self.document.doctype.clone())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, PageError> {
        self.ensure_open()?;
        // A deterministic stand-in image: the serialized document.
        Ok(self.dom.outer_html(0).into_bytes())
    }

    fn url(&self) -> String {
        self.url.read().clone()
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<PageEvent> {
        self.events.subscribe()
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            let _ = self.events.send(PageEvent::Closed);
        }
    }
}

/// Launches fresh [`FixturePage`]s of one document and records every launch.
pub struct FixtureLauncher {
    document: FixtureDocument,
    launches: AtomicUsize,
    failures_left: AtomicUsize,
    pages: Mutex<Vec<Arc<FixturePage>>>,
}

impl FixtureLauncher {
    pub fn new(document: FixtureDocument) -> Self {
        Self {
            document,
            launches: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(0),
            pages: Mutex::new(Vec::new()),
        }
    }

    /// Make the next `count` launches fail.
    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Launch attempts so far, failed ones included.
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn last_page(&self) -> Option<Arc<FixturePage>> {
        self.pages.lock().last().cloned()
    }

    pub fn pages(&self) -> Vec<Arc<FixturePage>> {
        self.pages.lock().clone()
    }
}

#[async_trait]
impl BrowserLauncher for FixtureLauncher {
    async fn launch(&self, target: &Target) -> Result<Arc<dyn PagePort>, PageError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(PageError::new(PageErrorKind::Protocol)
                .with_hint(format!("browser launch failed for {}", target.url)));
        }
        let mut document = self.document.clone();
        if !target.url.is_empty() {
            document.url = target.url.clone();
        }
        let page = Arc::new(FixturePage::new(document));
        self.pages.lock().push(Arc::clone(&page));
        Ok(page)
    }
}
