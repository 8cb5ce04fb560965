use page_port::{ElementSnapshot, PagePort};
use tracing::{debug, info};

use crate::errors::CatalogError;
use crate::fingerprint::text_fingerprint;
use crate::model::{Catalog, CatalogElement, IndexName};
use crate::xpath::{is_descendant_or_self, is_under_head, normalize};

/// Walk a fully loaded page once and catalog every element.
pub async fn build(page: &dyn PagePort) -> Result<Catalog, CatalogError> {
    let snapshots = page.elements().await?;
    let catalog = Catalog::from_snapshots(snapshots);
    info!(
        target: "catalog",
        url = %page.url(),
        elements = catalog.len(),
        texts = catalog.index(IndexName::Text).len(),
        "element catalog built"
    );
    Ok(catalog)
}

impl Catalog {
    /// Build a catalog from a document-order element walk.
    pub fn from_snapshots(snapshots: Vec<ElementSnapshot>) -> Self {
        let mut catalog = Catalog::default();
        for snapshot in snapshots {
            let element = CatalogElement {
                tag_name: snapshot.tag_name,
                id: snapshot.id,
                start_tag: snapshot.start_tag,
                text: text_fingerprint(&snapshot.inner_text),
                box_id: snapshot
                    .bounding_box
                    .map(|bbox| bbox.box_id())
                    .unwrap_or_default(),
                path_id: normalize(&snapshot.xpath),
                text_linkable: false,
            };
            let position = catalog.elements.len();
            for name in IndexName::ALL {
                let value = element.fingerprint(name);
                if value.is_empty() {
                    continue;
                }
                catalog
                    .index_mut(name)
                    .entry(value.to_string())
                    .or_default()
                    .push(position);
            }
            catalog.elements.push(element);
        }
        catalog.mark_linkable_texts();
        catalog
    }

    /// Mark elements whose text occurs in one logical place on the page: either alone,
    /// or in a chain where each holder contains the next.
    fn mark_linkable_texts(&mut self) {
        let mut linkable: Vec<usize> = Vec::new();
        for (text, positions) in &self.text {
            let chained = positions.windows(2).all(|pair| {
                is_descendant_or_self(
                    &self.elements[pair[0]].path_id,
                    &self.elements[pair[1]].path_id,
                )
            });
            if !chained {
                debug!(target: "catalog", text = %text, holders = positions.len(), "text not linkable");
                continue;
            }
            linkable.extend(
                positions
                    .iter()
                    .copied()
                    .filter(|position| !is_under_head(&self.elements[*position].path_id)),
            );
        }
        for position in linkable {
            self.elements[position].text_linkable = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_port::BoundingBox;

    fn snapshot(tag: &str, xpath: &str, text: &str) -> ElementSnapshot {
        ElementSnapshot {
            tag_name: tag.to_string(),
            start_tag: format!("<{}>", tag.to_ascii_lowercase()),
            inner_text: text.to_string(),
            xpath: xpath.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn skips_empty_fingerprints() {
        let mut boxed = snapshot("DIV", "/html[1]/body[1]/div[1]", "");
        boxed.bounding_box = Some(BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        let catalog = Catalog::from_snapshots(vec![boxed, snapshot("P", "/html[1]/body[1]/p[1]", "")]);
        assert_eq!(catalog.positions_for(IndexName::BoxId, "0:0:10:10"), &[0]);
        assert!(catalog.index(IndexName::Id).is_empty());
        assert!(catalog.index(IndexName::Text).is_empty());
        assert_eq!(catalog.element(1).unwrap().box_id, "");
    }

    #[test]
    fn broken_chains_are_not_linkable() {
        let catalog = Catalog::from_snapshots(vec![
            snapshot("P", "/html[1]/body[1]/p[1]", "Same"),
            snapshot("P", "/html[1]/body[1]/p[2]", "Same"),
            snapshot("TITLE", "/html[1]/head[1]/title[1]", "Only"),
        ]);
        assert!(!catalog.element(0).unwrap().text_linkable);
        assert!(!catalog.element(1).unwrap().text_linkable);
        assert!(!catalog.element(2).unwrap().text_linkable);
    }

    #[test]
    fn sole_holder_outside_head_is_linkable() {
        let catalog = Catalog::from_snapshots(vec![snapshot("A", "/html[1]/body[1]/a[1]", "Go")]);
        assert!(catalog.element(0).unwrap().text_linkable);
    }
}
