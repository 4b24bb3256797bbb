use crate::error::PageError;
use crate::models::{ImageFormat, PageImage};
use crate::traits::{PageStore, PdfDocument};
use lopdf::Document;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_RENDER_DPI: u32 = 200;

/// Rasterizes single pages with poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PdftoppmRenderer {
    pub binary: PathBuf,
    pub dpi: u32,
    pub format: ImageFormat,
}

impl Default for PdftoppmRenderer {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("pdftoppm"),
            dpi: DEFAULT_RENDER_DPI,
            format: ImageFormat::Png,
        }
    }
}

impl PdftoppmRenderer {
    /// Whether the `pdftoppm` binary can be started at all.
    pub fn probe(&self) -> bool {
        Command::new(&self.binary).arg("-v").output().is_ok()
    }

    /// Renders the 1-based `page_number` of the PDF at `path`.
    pub fn render(&self, path: &Path, page_number: usize) -> Result<PageImage, PageError> {
        let render_error = |details: String| PageError::Render {
            page: page_number,
            details,
        };

        let workdir = tempfile::tempdir()?;
        let prefix = workdir.path().join("page");
        let page_arg = page_number.to_string();

        let output = Command::new(&self.binary)
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(self.format.pdftoppm_flag())
            .arg("-f")
            .arg(&page_arg)
            .arg("-l")
            .arg(&page_arg)
            .arg("-singlefile")
            .arg(path)
            .arg(&prefix)
            .output()
            .map_err(|error| {
                render_error(format!("failed to run {}: {error}", self.binary.display()))
            })?;

        if !output.status.success() {
            return Err(render_error(format!(
                "pdftoppm exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let rendered = prefix.with_extension(self.format.extension());
        let bytes = std::fs::read(&rendered)
            .map_err(|error| render_error(format!("pdftoppm produced no image: {error}")))?;

        if bytes.is_empty() {
            return Err(render_error("pdftoppm produced an empty image".to_string()));
        }

        debug!(page = page_number, size = bytes.len(), "rendered page");
        Ok(PageImage {
            bytes: bytes.into(),
            format: self.format,
        })
    }
}

/// Page store backed by `lopdf` for the text layer and `pdftoppm` for bitmaps.
#[derive(Debug, Clone, Default)]
pub struct LopdfPageStore {
    renderer: PdftoppmRenderer,
}

impl LopdfPageStore {
    pub fn new(renderer: PdftoppmRenderer) -> Self {
        Self { renderer }
    }

    pub fn renderer(&self) -> &PdftoppmRenderer {
        &self.renderer
    }
}

impl PageStore for LopdfPageStore {
    fn open(&self, path: &Path) -> Result<Arc<dyn PdfDocument>, PageError> {
        Ok(Arc::new(LopdfDocument::load(path, self.renderer.clone())?))
    }
}

/// Parsed document; each worker renders from the source file independently.
pub struct LopdfDocument {
    path: PathBuf,
    document: Document,
    page_numbers: Vec<u32>,
    renderer: PdftoppmRenderer,
}

impl LopdfDocument {
    pub fn load(path: &Path, renderer: PdftoppmRenderer) -> Result<Self, PageError> {
        if !path.is_file() {
            return Err(PageError::NotFound(path.to_path_buf()));
        }

        let document =
            Document::load(path).map_err(|error| PageError::PdfParse(error.to_string()))?;
        let page_numbers = document.get_pages().into_keys().collect();

        Ok(Self {
            path: path.to_path_buf(),
            document,
            page_numbers,
            renderer,
        })
    }

    fn page_number(&self, index: usize) -> Result<u32, PageError> {
        self.page_numbers
            .get(index)
            .copied()
            .ok_or(PageError::OutOfRange {
                page: index + 1,
                page_count: self.page_numbers.len(),
            })
    }
}

impl PdfDocument for LopdfDocument {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn extract_text(&self, index: usize) -> Result<String, PageError> {
        let page_no = self.page_number(index)?;
        let text = self
            .document
            .extract_text(&[page_no])
            .map_err(|error| PageError::Text {
                page: index + 1,
                details: error.to_string(),
            })?;

        Ok(text.trim().to_string())
    }

    fn render_page(&self, index: usize) -> Result<PageImage, PageError> {
        self.page_number(index)?;
        self.renderer.render(&self.path, index + 1)
    }
}
