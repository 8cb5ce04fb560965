use page_port::PageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("page walk failed: {0}")]
    Page(#[from] PageError),
}
