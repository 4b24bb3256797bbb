use crate::error::{OcrError, PageError};
use crate::models::PageImage;
use std::path::Path;
use std::sync::Arc;

/// An opened PDF. Shared read-only across search workers for one search.
pub trait PdfDocument: Send + Sync {
    fn page_count(&self) -> usize;

    /// Plain text of the page at 0-based `index`, trimmed.
    fn extract_text(&self, index: usize) -> Result<String, PageError>;

    fn render_page(&self, index: usize) -> Result<PageImage, PageError>;
}

pub trait PageStore: Send + Sync {
    fn open(&self, path: &Path) -> Result<Arc<dyn PdfDocument>, PageError>;
}

pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &PageImage) -> Result<String, OcrError>;
}
