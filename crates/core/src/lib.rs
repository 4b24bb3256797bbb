pub mod cache;
pub mod error;
pub mod extractor;
pub mod models;
pub mod ocr;
pub mod orchestrator;
pub mod traits;

pub use cache::{ImageCache, DEFAULT_CACHE_CAPACITY};
pub use error::{OcrError, PageError, SearchError};
pub use extractor::{LopdfDocument, LopdfPageStore, PdftoppmRenderer, DEFAULT_RENDER_DPI};
pub use models::{
    ImageFormat, ImageHandle, ImageMatch, MatchResult, PageImage, SearchOptions,
    DEFAULT_MAX_WORKERS,
};
pub use ocr::{HttpOcrEngine, TesseractEngine};
pub use orchestrator::SearchCoordinator;
pub use traits::{OcrEngine, PageStore, PdfDocument};
