use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("PDF file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("text extraction failed on page {page}: {details}")]
    Text { page: usize, details: String },

    #[error("page {page} is out of range for a {page_count}-page document")]
    OutOfRange { page: usize, page_count: usize },

    #[error("render failed on page {page}: {details}")]
    Render { page: usize, details: String },
}

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("tesseract failed: {0}")]
    Tesseract(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OCR request to {endpoint} returned {status}")]
    Endpoint { endpoint: String, status: u16 },

    #[error("OCR response had no text")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("PDF file not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    #[error(transparent)]
    Page(PageError),

    #[error("OCR failed on page {page}: {source}")]
    Ocr {
        page: usize,
        #[source]
        source: OcrError,
    },

    #[error("search worker failed: {0}")]
    Worker(String),
}

impl From<PageError> for SearchError {
    fn from(error: PageError) -> Self {
        match error {
            PageError::NotFound(path) => SearchError::DocumentNotFound(path),
            other => SearchError::Page(other),
        }
    }
}

pub type Result<T, E = SearchError> = std::result::Result<T, E>;
