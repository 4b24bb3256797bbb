use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use pdf_keyword_core::{
    HttpOcrEngine, ImageCache, LopdfPageStore, OcrEngine, SearchCoordinator, SearchOptions,
    TesseractEngine,
};
use pdf_keyword_server::{
    create_router, db, AppState, PdfMailer, Settings, SmtpMailer, UnconfiguredMailer,
};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "pdf_keyword_server=info,pdf_keyword_core=info,tower_http=info".into()
        }))
        .with(fmt::layer())
        .init();

    let settings = Settings::parse();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        started_at = %Utc::now().to_rfc3339(),
        pdf = %settings.pdf_path.display(),
        "pdf-keyword-server boot"
    );

    if !settings.pdf_path.is_file() {
        warn!(pdf = %settings.pdf_path.display(), "source PDF is missing; searches will return 404");
    }

    let renderer = settings.renderer();
    if !renderer.probe() {
        warn!(binary = %renderer.binary.display(), "pdftoppm is not runnable; install poppler-utils");
    }
    let pages = Arc::new(LopdfPageStore::new(renderer));

    let ocr: Arc<dyn OcrEngine> = match &settings.ocr_endpoint {
        Some(endpoint) => {
            info!(%endpoint, "using multimodal OCR endpoint");
            let endpoint = endpoint.clone();
            let api_key = settings.ocr_api_key.clone();
            let engine =
                tokio::task::spawn_blocking(move || HttpOcrEngine::new(endpoint, api_key))
                    .await?
                    .context("failed to build OCR client")?;
            Arc::new(engine)
        }
        None => {
            let engine =
                TesseractEngine::new(settings.tesseract_path.clone(), settings.tesseract_lang.clone());
            if !engine.probe() {
                warn!(binary = %engine.binary.display(), "tesseract is not runnable; install tesseract-ocr");
            }
            Arc::new(engine)
        }
    };

    let cache = ImageCache::new(settings.cache_capacity);
    let coordinator = SearchCoordinator::new(pages, ocr, cache).with_options(SearchOptions {
        max_workers: settings.max_workers,
    });

    let pool = db::create_pool(&settings.database_url)
        .await
        .with_context(|| format!("failed to open database {}", settings.database_url))?;
    info!(url = %settings.database_url, "database initialized");

    let mailer: Arc<dyn PdfMailer> = match settings.smtp() {
        Some(smtp) => Arc::new(SmtpMailer::new(&smtp).context("invalid SMTP settings")?),
        None => {
            warn!("SENDER_EMAIL or SMTP_PASSWORD missing; /send-pdf/ is disabled");
            Arc::new(UnconfiguredMailer)
        }
    };

    let state = AppState::new(
        coordinator,
        settings.pdf_path.clone(),
        settings.public_base_url.clone(),
        pool,
        mailer,
    );
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(settings.bind)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind))?;
    info!(addr = %settings.bind, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
