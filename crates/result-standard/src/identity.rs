//! Attaching element identity to converted instances.
//!
//! Preference order: a catalog position, then a path, then a box, then nothing beyond
//! the raw excerpt. A path the checker supplied is kept even when the catalog lacks it.

use crate::{convert::Finding, schema::StandardInstance};
use element_catalog::{normalize, Catalog};
use identity_resolver::{injected_xpath, ElementDescriptor, IdentityResolver, LocationKind};
use page_port::PagePort;
use tracing::trace;

/// What identity attachment may consult.
#[derive(Clone, Copy)]
pub struct IdentitySources<'a> {
    pub catalog: Option<&'a Catalog>,
    pub page: Option<&'a dyn PagePort>,
    pub resolver: &'a IdentityResolver,
}

pub(crate) async fn attach(finding: Finding, sources: IdentitySources<'_>) -> StandardInstance {
    let mut instance = StandardInstance::new(
        finding.rule_id.clone(),
        finding.what.clone(),
        finding.severity,
        finding.count,
    );
    let mut descriptor = ElementDescriptor {
        excerpt: finding.excerpt,
        id: finding.id,
        tag_name: finding.tag_name,
        location: finding.location,
    };

    let native_path = injected_xpath(&descriptor.excerpt)
        .or(finding.xpath)
        .map(|path| normalize(&path))
        .filter(|path| !path.is_empty());
    let mut path_id = native_path.clone();
    let mut box_id = (descriptor.location.kind == LocationKind::Box)
        .then(|| descriptor.location.spec.clone())
        .filter(|spec| !spec.is_empty());

    let mut catalog_index = match (sources.catalog, native_path.as_deref()) {
        (Some(catalog), Some(path)) => catalog.first_by_path(path),
        _ => None,
    };

    // A checker's own path outranks anything the resolver could guess from weaker evidence.
    if catalog_index.is_none() && native_path.is_none() && has_evidence(&descriptor) {
        if let Some(page) = sources.page {
            let resolution = sources.resolver.resolve_and_flag(&mut descriptor, page).await;
            path_id = resolution.path_id.clone();
            if box_id.is_none() {
                box_id = resolution.box_id.clone();
            }
            if let Some(catalog) = sources.catalog {
                catalog_index =
                    catalog.locate(resolution.path_id.as_deref(), resolution.box_id.as_deref());
            }
        }
    }

    if catalog_index.is_none() && path_id.is_none() {
        if let (Some(catalog), Some(bounds)) = (sources.catalog, box_id.as_deref()) {
            catalog_index = catalog.unique_by_box(bounds);
        }
    }

    match catalog_index {
        Some(position) => instance.catalog_index = Some(position),
        None => {
            instance.path_id = path_id;
            instance.box_id = box_id;
        }
    }
    trace!(
        target: "standardize",
        rule = %instance.rule_id,
        catalog_index = ?instance.catalog_index,
        path_id = ?instance.path_id,
        "identity attached"
    );

    instance.tag_name = non_empty(descriptor.tag_name);
    instance.id = non_empty(descriptor.id);
    instance.excerpt = non_empty(descriptor.excerpt);
    if !descriptor.location.is_empty() {
        instance.location = Some(descriptor.location);
    }
    instance
}

fn has_evidence(descriptor: &ElementDescriptor) -> bool {
    !(descriptor.location.spec.is_empty()
        && descriptor.id.is_empty()
        && descriptor.tag_name.is_empty()
        && descriptor.excerpt.is_empty())
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}
