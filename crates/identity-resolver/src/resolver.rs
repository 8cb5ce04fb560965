//! Fallback-chain resolver

use crate::{
    errors::ResolveError,
    strategies::{strategy_for, strip_text_step, Strategy},
    types::{ElementDescriptor, LocationKind, Resolution, ResolutionStrategy},
};
use element_catalog::normalize;
use page_port::{ElementHandle, PagePort};
use std::time::Duration;
use tracing::{debug, warn};

/// Bound on a single XPath computation.
pub const DEFAULT_PATH_TIMEOUT: Duration = Duration::from_millis(500);

/// Resolves checker descriptors to box and path identifiers against a live page.
pub struct IdentityResolver {
    path_timeout: Duration,
    strategies: Vec<Box<dyn Strategy>>,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new(DEFAULT_PATH_TIMEOUT)
    }
}

impl IdentityResolver {
    pub fn new(path_timeout: Duration) -> Self {
        Self {
            path_timeout,
            strategies: ResolutionStrategy::fallback_chain()
                .into_iter()
                .map(strategy_for)
                .collect(),
        }
    }

    pub fn path_timeout(&self) -> Duration {
        self.path_timeout
    }

    /// Resolve as much identity as the page allows. Resolution failure is not an error;
    /// the result simply keeps whichever fields could be established.
    pub async fn resolve(&self, descriptor: &ElementDescriptor, page: &dyn PagePort) -> Resolution {
        let mut resolution = Resolution::default();
        let location = &descriptor.location;
        if location.kind == LocationKind::Box && !location.spec.trim().is_empty() {
            resolution.box_id = Some(location.spec.trim().to_string());
        }

        for strategy in &self.strategies {
            if resolution.is_complete() {
                break;
            }
            let located = strategy.locate(descriptor, page).await;
            let handle = match located {
                Ok(Some(handle)) => handle,
                Ok(None) => {
                    if strategy.strategy_type() == ResolutionStrategy::Locator {
                        Self::literal_path(descriptor, &mut resolution);
                    }
                    continue;
                }
                Err(err) if err.is_fatal() => {
                    warn!(target: "resolver", strategy = strategy.name(), error = %err, "page closed during resolution");
                    break;
                }
                Err(err @ ResolveError::InvalidSpecifier { .. }) => {
                    debug!(target: "resolver", strategy = strategy.name(), error = %err, "invalid specifier");
                    if resolution.invalidity.is_none() {
                        resolution.invalidity = Some(err.to_string());
                    }
                    continue;
                }
                Err(err) => {
                    debug!(target: "resolver", strategy = strategy.name(), error = %err, "strategy failed");
                    continue;
                }
            };

            match self.derive(handle, page).await {
                Ok((box_id, path_id)) => {
                    // Coarser strategies only fill what finer ones left empty.
                    let fills_box = resolution.box_id.is_none() && box_id.is_some();
                    let fills_path = resolution.path_id.is_none() && path_id.is_some();
                    if !fills_box && !fills_path {
                        continue;
                    }
                    if fills_box {
                        resolution.box_id = box_id;
                    }
                    if fills_path {
                        resolution.path_id = path_id;
                        resolution.verified = true;
                    }
                    if resolution.strategy.is_none() {
                        resolution.strategy = Some(strategy.strategy_type());
                    }
                    debug!(
                        target: "resolver",
                        strategy = strategy.name(),
                        box_id = ?resolution.box_id,
                        path_id = ?resolution.path_id,
                        "element resolved"
                    );
                    if resolution.verified {
                        break;
                    }
                }
                Err(err) if err.is_fatal() => {
                    warn!(target: "resolver", error = %err, "page closed during derivation");
                    break;
                }
                Err(err) => {
                    debug!(target: "resolver", error = %err, "derivation failed");
                }
            }
        }
        resolution
    }

    /// Resolve and record any specifier invalidity on the descriptor's location.
    pub async fn resolve_and_flag(
        &self,
        descriptor: &mut ElementDescriptor,
        page: &dyn PagePort,
    ) -> Resolution {
        let resolution = self.resolve(descriptor, page).await;
        if let Some(invalidity) = &resolution.invalidity {
            descriptor.location.invalidity = Some(invalidity.clone());
        }
        resolution
    }

    fn literal_path(descriptor: &ElementDescriptor, resolution: &mut Resolution) {
        if descriptor.location.kind != LocationKind::Xpath || resolution.path_id.is_some() {
            return;
        }
        let literal = strip_text_step(descriptor.location.spec.trim());
        if !literal.is_empty() {
            resolution.path_id = Some(normalize(literal));
        }
    }

    async fn derive(
        &self,
        handle: ElementHandle,
        page: &dyn PagePort,
    ) -> Result<(Option<String>, Option<String>), ResolveError> {
        let facts = page
            .element_facts(handle)
            .await
            .map_err(ResolveError::Page)?;
        let box_id = facts
            .bounding_box
            .filter(|bounds| facts.visible && bounds.has_area())
            .map(|bounds| bounds.box_id());

        let path_id = match tokio::time::timeout(self.path_timeout, page.xpath_of(handle)).await {
            Ok(Ok(path)) if !path.is_empty() => Some(normalize(&path)),
            Ok(Ok(_)) => None,
            Ok(Err(err)) if err.is_closed_target() => return Err(ResolveError::Page(err)),
            Ok(Err(err)) => {
                debug!(target: "resolver", error = %err, "xpath computation failed");
                None
            }
            Err(_) => {
                debug!(target: "resolver", timeout_ms = self.path_timeout.as_millis() as u64, "xpath computation timed out");
                None
            }
        };
        Ok((box_id, path_id))
    }
}
