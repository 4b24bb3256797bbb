//! Application state management

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pdf_keyword_core::{ImageCache, SearchCoordinator};
use sqlx::SqlitePool;
use url::Url;

use crate::mailer::PdfMailer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    coordinator: SearchCoordinator,
    pdf_path: PathBuf,
    public_base_url: Option<Url>,
    db: SqlitePool,
    mailer: Arc<dyn PdfMailer>,
}

impl AppState {
    pub fn new(
        coordinator: SearchCoordinator,
        pdf_path: impl Into<PathBuf>,
        public_base_url: Option<Url>,
        db: SqlitePool,
        mailer: Arc<dyn PdfMailer>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                coordinator,
                pdf_path: pdf_path.into(),
                public_base_url: public_base_url.map(with_trailing_slash),
                db,
                mailer,
            }),
        }
    }

    pub fn coordinator(&self) -> &SearchCoordinator {
        &self.inner.coordinator
    }

    pub fn image_cache(&self) -> &ImageCache {
        self.inner.coordinator.cache()
    }

    pub fn pdf_path(&self) -> &Path {
        &self.inner.pdf_path
    }

    pub fn public_base_url(&self) -> Option<&Url> {
        self.inner.public_base_url.as_ref()
    }

    pub fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    pub fn mailer(&self) -> &dyn PdfMailer {
        self.inner.mailer.as_ref()
    }
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
pub fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
