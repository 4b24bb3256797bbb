//! Integration tests for the HTTP surface.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use pdf_keyword_core::{
    ImageCache, OcrEngine, OcrError, PageError, PageImage, PageStore, PdfDocument,
    SearchCoordinator,
};
use pdf_keyword_server::{
    create_router, db, AppState, ErrorBody, MailError, PageMatch, PdfAttachment, PdfMailer,
};
use tempfile::TempDir;
use tokio::sync::Mutex;
use tower::ServiceExt;
use url::Url;

/// Records every delivery the fake mailer accepts.
#[derive(Default)]
struct Recorder {
    sent: Mutex<Vec<(String, String, String)>>,
}

struct FakeDocument {
    pages: Vec<(String, String)>,
    broken_page: Option<usize>,
}

impl PdfDocument for FakeDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn extract_text(&self, index: usize) -> Result<String, PageError> {
        Ok(self.pages[index].0.clone())
    }

    fn render_page(&self, index: usize) -> Result<PageImage, PageError> {
        if self.broken_page == Some(index) {
            return Err(PageError::Render {
                page: index + 1,
                details: "pdftoppm exited with 1".to_string(),
            });
        }
        Ok(PageImage::png(format!("png:{index}").into_bytes()))
    }
}

/// Serves the fake document only while the PDF file exists on disk.
struct FakeStore {
    document: Arc<FakeDocument>,
}

impl PageStore for FakeStore {
    fn open(&self, path: &Path) -> Result<Arc<dyn PdfDocument>, PageError> {
        if !path.is_file() {
            return Err(PageError::NotFound(path.to_path_buf()));
        }
        Ok(Arc::clone(&self.document) as Arc<dyn PdfDocument>)
    }
}

struct FakeOcr {
    texts: Vec<String>,
}

impl OcrEngine for FakeOcr {
    fn recognize(&self, image: &PageImage) -> Result<String, OcrError> {
        let raw = String::from_utf8_lossy(&image.bytes);
        let index: usize = raw
            .trim_start_matches("png:")
            .parse()
            .map_err(|_| OcrError::EmptyResponse)?;
        Ok(self.texts[index].clone())
    }
}

struct FakeMailer {
    recorder: Arc<Recorder>,
    fail: bool,
}

#[async_trait]
impl PdfMailer for FakeMailer {
    async fn send_pdf(
        &self,
        username: &str,
        recipient: &str,
        attachment: PdfAttachment,
    ) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::NotConfigured);
        }
        self.recorder.sent.lock().await.push((
            username.to_string(),
            recipient.to_string(),
            attachment.file_name,
        ));
        Ok(())
    }
}

struct Harness {
    app: Router,
    cache: ImageCache,
    recorder: Arc<Recorder>,
    _dir: TempDir,
}

struct Setup {
    pages: Vec<(&'static str, &'static str)>,
    broken_page: Option<usize>,
    pdf_exists: bool,
    capacity: usize,
    failing_mailer: bool,
    public_base_url: Option<&'static str>,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            pages: vec![
                ("Welcome to the catalog", "cover art"),
                ("Hydraulic pump P-100", "pump drawing"),
                ("Index", "index"),
            ],
            broken_page: None,
            pdf_exists: true,
            capacity: 100,
            failing_mailer: false,
            public_base_url: None,
        }
    }
}

async fn harness(setup: Setup) -> Harness {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let pdf_path: PathBuf = dir.path().join("catalog.pdf");
    if setup.pdf_exists {
        std::fs::write(&pdf_path, b"%PDF-1.4\n%fake").expect("pdf should be written");
    }

    let document = Arc::new(FakeDocument {
        pages: setup
            .pages
            .iter()
            .map(|(text, ocr)| (text.to_string(), ocr.to_string()))
            .collect(),
        broken_page: setup.broken_page,
    });
    let ocr = FakeOcr {
        texts: setup.pages.iter().map(|(_, ocr)| ocr.to_string()).collect(),
    };

    let cache = ImageCache::new(setup.capacity);
    let coordinator = SearchCoordinator::new(
        Arc::new(FakeStore { document }),
        Arc::new(ocr),
        cache.clone(),
    );

    let pool = db::create_memory_pool().await.expect("memory pool should open");
    let recorder = Arc::new(Recorder::default());
    let mailer = FakeMailer {
        recorder: Arc::clone(&recorder),
        fail: setup.failing_mailer,
    };

    let base = setup
        .public_base_url
        .map(|raw| Url::parse(raw).expect("valid base url"));
    let state = AppState::new(coordinator, pdf_path, base, pool, Arc::new(mailer));

    Harness {
        app: create_router(state),
        cache,
        recorder,
        _dir: dir,
    }
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>, Option<String>) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::HOST, "testhost:8000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec(), content_type)
}

fn detail(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(body).unwrap().detail
}

#[tokio::test]
async fn text_only_match_returns_page_without_image() {
    let harness = harness(Setup::default()).await;

    let (status, body, _) = send(&harness.app, "GET", "/read-pdf-steps/?keyword=hydraulic").await;

    assert_eq!(status, StatusCode::OK);
    let pages: Vec<PageMatch> = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        pages,
        vec![PageMatch {
            page_number: 2,
            text: Some("Hydraulic pump P-100".to_string()),
            image_url: None,
            image_text: None,
        }]
    );
    assert!(harness.cache.is_empty());
}

#[tokio::test]
async fn ocr_only_match_links_to_a_fetchable_image() {
    let harness = harness(Setup::default()).await;

    let (status, body, _) = send(&harness.app, "GET", "/read-pdf-steps/?keyword=COVER").await;

    assert_eq!(status, StatusCode::OK);
    let pages: Vec<PageMatch> = serde_json::from_slice(&body).unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].page_number, 1);
    assert!(pages[0].text.is_none());
    assert_eq!(pages[0].image_text.as_deref(), Some("cover art"));

    let image_url = pages[0].image_url.clone().unwrap();
    assert_eq!(image_url, "http://testhost:8000/get-image/page_1_image");

    let path = Url::parse(&image_url).unwrap().path().to_string();
    let (status, bytes, content_type) = send(&harness.app, "GET", &path).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));
    assert_eq!(bytes, b"png:0".to_vec());
}

#[tokio::test]
async fn public_base_url_overrides_the_host_header() {
    let harness = harness(Setup {
        public_base_url: Some("https://pdf.example.com/api"),
        ..Setup::default()
    })
    .await;

    let (status, body, _) = send(&harness.app, "GET", "/read-pdf-steps/?keyword=pump").await;

    assert_eq!(status, StatusCode::OK);
    let pages: Vec<PageMatch> = serde_json::from_slice(&body).unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].text.as_deref(), Some("Hydraulic pump P-100"));
    assert_eq!(
        pages[0].image_url.as_deref(),
        Some("https://pdf.example.com/api/get-image/page_2_image")
    );
}

#[tokio::test]
async fn absent_keyword_is_not_found_and_cache_unchanged() {
    let harness = harness(Setup::default()).await;

    let (status, body, _) = send(&harness.app, "GET", "/read-pdf-steps/?keyword=turbine").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(detail(&body), "Keyword not found in the PDF.");
    assert!(harness.cache.is_empty());
}

#[tokio::test]
async fn missing_keyword_parameter_is_a_json_error() {
    let harness = harness(Setup::default()).await;

    let (status, body, content_type) = send(&harness.app, "GET", "/read-pdf-steps/").await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert!(detail(&body).contains("keyword"));
    assert!(harness.cache.is_empty());
}

#[tokio::test]
async fn missing_pdf_is_not_found() {
    let harness = harness(Setup {
        pdf_exists: false,
        ..Setup::default()
    })
    .await;

    let (status, body, _) = send(&harness.app, "GET", "/read-pdf-steps/?keyword=pump").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(detail(&body), "PDF file not found.");
}

#[tokio::test]
async fn processing_failure_is_a_server_error() {
    let harness = harness(Setup {
        broken_page: Some(2),
        ..Setup::default()
    })
    .await;

    let (status, body, _) = send(&harness.app, "GET", "/read-pdf-steps/?keyword=pump").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = detail(&body);
    assert!(message.starts_with("Failed to search keyword in PDF:"), "{message}");
    assert!(message.contains("page 3"), "{message}");
}

#[tokio::test]
async fn earliest_image_is_evicted_past_capacity() {
    let pages: Vec<(&'static str, &'static str)> = (0..101).map(|_| ("", "bolt")).collect();
    let harness = harness(Setup {
        pages,
        capacity: 100,
        ..Setup::default()
    })
    .await;

    let (status, body, _) = send(&harness.app, "GET", "/read-pdf-steps/?keyword=bolt").await;
    assert_eq!(status, StatusCode::OK);
    let pages: Vec<PageMatch> = serde_json::from_slice(&body).unwrap();
    assert_eq!(pages.len(), 101);
    assert_eq!(harness.cache.len(), 100);

    let retained = harness.cache.handles();
    let mut missing = 0;
    for page in &pages {
        let handle = format!("page_{}_image", page.page_number);
        let (status, body, _) = send(&harness.app, "GET", &format!("/get-image/{handle}")).await;
        if retained.iter().any(|kept| kept.as_str() == handle) {
            assert_eq!(status, StatusCode::OK);
        } else {
            missing += 1;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(detail(&body), "Image not found.");
        }
    }
    assert_eq!(missing, 1);
}

#[tokio::test]
async fn unknown_image_is_not_found() {
    let harness = harness(Setup::default()).await;

    let (status, body, _) = send(&harness.app, "GET", "/get-image/page_9_image").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(detail(&body), "Image not found.");
}

#[tokio::test]
async fn sent_pdf_is_recorded_and_listed() {
    let harness = harness(Setup::default()).await;

    let (status, body, _) = send(
        &harness.app,
        "POST",
        "/send-pdf/?username=ana&email=ana%40example.com",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let reply: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(reply["message"], "PDF file sent successfully to ana@example.com");

    let sent = harness.recorder.sent.lock().await.clone();
    assert_eq!(
        sent,
        vec![(
            "ana".to_string(),
            "ana@example.com".to_string(),
            "catalog.pdf".to_string()
        )]
    );

    let (status, body, _) = send(&harness.app, "GET", "/get-emails/").await;
    assert_eq!(status, StatusCode::OK);
    let rows: Vec<db::SentPdf> = serde_json::from_slice(&body).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].username, "ana");
    assert_eq!(rows[0].email, "ana@example.com");
    assert_eq!(rows[0].pdf_sent.as_deref(), Some("catalog.pdf"));
}

#[tokio::test]
async fn failed_delivery_is_not_recorded() {
    let harness = harness(Setup {
        failing_mailer: true,
        ..Setup::default()
    })
    .await;

    let (status, body, _) = send(
        &harness.app,
        "POST",
        "/send-pdf/?username=ana&email=ana%40example.com",
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(detail(&body).starts_with("Failed to send email"));

    let (_, body, _) = send(&harness.app, "GET", "/get-emails/").await;
    let rows: Vec<db::SentPdf> = serde_json::from_slice(&body).unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn send_without_email_is_a_json_error() {
    let harness = harness(Setup::default()).await;

    let (status, body, _) = send(&harness.app, "POST", "/send-pdf/?username=ana").await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(detail(&body).contains("email"));
    assert!(harness.recorder.sent.lock().await.is_empty());
}

#[tokio::test]
async fn sending_a_missing_pdf_is_not_found() {
    let harness = harness(Setup {
        pdf_exists: false,
        ..Setup::default()
    })
    .await;

    let (status, body, _) = send(
        &harness.app,
        "POST",
        "/send-pdf/?username=ana&email=ana%40example.com",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(detail(&body), "PDF file not found.");
    assert!(harness.recorder.sent.lock().await.is_empty());
}

#[tokio::test]
async fn health_reports_service_name() {
    let harness = harness(Setup::default()).await;

    let (status, body, _) = send(&harness.app, "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["service"], "pdf-keyword-server");
}
