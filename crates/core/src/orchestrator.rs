use crate::cache::ImageCache;
use crate::error::SearchError;
use crate::models::{ImageHandle, ImageMatch, MatchResult, SearchOptions};
use crate::traits::{OcrEngine, PageStore, PdfDocument};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Fans a keyword search out over every page of a document, matching both the
/// text layer and the OCR output of each rendered page.
#[derive(Clone)]
pub struct SearchCoordinator {
    pages: Arc<dyn PageStore>,
    ocr: Arc<dyn OcrEngine>,
    cache: ImageCache,
    options: SearchOptions,
}

impl SearchCoordinator {
    pub fn new(pages: Arc<dyn PageStore>, ocr: Arc<dyn OcrEngine>, cache: ImageCache) -> Self {
        Self {
            pages,
            ocr,
            cache,
            options: SearchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// min(max_workers, N/2 + 1); never more than `page_count` for N >= 1.
    pub fn worker_pool_width(&self, page_count: usize) -> usize {
        (page_count / 2 + 1).min(self.options.max_workers.max(1))
    }

    /// Opens `path` through the page store and searches it. The document is
    /// dropped when the search ends.
    pub async fn search_file(
        &self,
        path: &Path,
        keyword: &str,
    ) -> Result<Vec<MatchResult>, SearchError> {
        let pages = Arc::clone(&self.pages);
        let owned_path = path.to_path_buf();
        let document = tokio::task::spawn_blocking(move || pages.open(&owned_path))
            .await
            .map_err(|error| SearchError::Worker(error.to_string()))??;

        info!(path = %path.display(), pages = document.page_count(), "opened document");
        self.search(document, keyword).await
    }

    /// Returns matches ordered by ascending page number. The first failing
    /// page aborts the remaining work and fails the whole search.
    pub async fn search(
        &self,
        document: Arc<dyn PdfDocument>,
        keyword: &str,
    ) -> Result<Vec<MatchResult>, SearchError> {
        if keyword.trim().is_empty() {
            debug!("empty keyword matches nothing");
            return Ok(Vec::new());
        }

        let page_count = document.page_count();
        if page_count == 0 {
            return Ok(Vec::new());
        }

        let needle: Arc<str> = Arc::from(keyword.to_lowercase());
        let width = self.worker_pool_width(page_count);
        info!(page_count, width, keyword, "dispatching page search");

        let permits = Arc::new(Semaphore::new(width));
        let mut tasks = JoinSet::new();

        for index in 0..page_count {
            let permits = Arc::clone(&permits);
            let document = Arc::clone(&document);
            let ocr = Arc::clone(&self.ocr);
            let cache = self.cache.clone();
            let needle = Arc::clone(&needle);

            tasks.spawn(async move {
                let permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|error| SearchError::Worker(error.to_string()))?;

                tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    evaluate_page(document.as_ref(), ocr.as_ref(), &cache, index, &needle)
                })
                .await
                .map_err(|error| SearchError::Worker(error.to_string()))?
            });
        }

        let mut found = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined
                .map_err(|error| SearchError::Worker(error.to_string()))
                .and_then(|result| result);

            match outcome {
                Ok(Some(result)) => found.push(result),
                Ok(None) => {}
                Err(error) => {
                    warn!(%error, "page task failed, aborting search");
                    tasks.abort_all();
                    return Err(error);
                }
            }
        }

        found.sort_by_key(|result| result.page_number);
        Ok(found)
    }
}

fn evaluate_page(
    document: &dyn PdfDocument,
    ocr: &dyn OcrEngine,
    cache: &ImageCache,
    index: usize,
    needle: &str,
) -> Result<Option<MatchResult>, SearchError> {
    let page_number = index + 1;

    let text = document.extract_text(index)?;
    let text_match = if contains_keyword(&text, needle) {
        info!(page = page_number, "keyword found in page text");
        Some(text)
    } else {
        None
    };

    // Always render and OCR: image evidence is returned even for text hits.
    let image = document.render_page(index)?;
    let image_text = ocr
        .recognize(&image)
        .map_err(|source| SearchError::Ocr {
            page: page_number,
            source,
        })?;

    let image_match = if contains_keyword(&image_text, needle) {
        let handle = ImageHandle::for_page(page_number);
        cache.put(handle.clone(), image);
        info!(page = page_number, %handle, "keyword found in page image");
        Some(ImageMatch {
            handle,
            text: image_text,
        })
    } else {
        debug!(page = page_number, "keyword not found in page image");
        None
    };

    Ok(MatchResult::new(page_number, text_match, image_match))
}

fn contains_keyword(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
