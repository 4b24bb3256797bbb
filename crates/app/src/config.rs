//! Process configuration, read from flags or the environment (`.env` included).

use clap::Parser;
use pdf_keyword_core::{
    ImageFormat, PdftoppmRenderer, DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_WORKERS,
    DEFAULT_RENDER_DPI,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug, Clone)]
#[command(name = "pdf-keyword-server", version)]
pub struct Settings {
    /// Address the HTTP server listens on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// PDF that is searched and mailed
    #[arg(long, env = "PDF_PATH", default_value = "pdfs/MANAPRODUCTLIST.pdf")]
    pub pdf_path: PathBuf,

    /// Maximum number of rendered page images kept in memory
    #[arg(long, env = "IMAGE_CACHE_CAPACITY", default_value_t = DEFAULT_CACHE_CAPACITY)]
    pub cache_capacity: usize,

    /// Upper bound on concurrent page workers per search
    #[arg(long, env = "MAX_SEARCH_WORKERS", default_value_t = DEFAULT_MAX_WORKERS)]
    pub max_workers: usize,

    /// Resolution pages are rendered at before OCR
    #[arg(long, env = "RENDER_DPI", default_value_t = DEFAULT_RENDER_DPI)]
    pub render_dpi: u32,

    #[arg(long, env = "PDFTOPPM_PATH", default_value = "pdftoppm")]
    pub pdftoppm_path: PathBuf,

    #[arg(long, env = "TESSERACT_PATH", default_value = "tesseract")]
    pub tesseract_path: PathBuf,

    /// Tesseract language pack
    #[arg(long, env = "TESSERACT_LANG", default_value = "eng")]
    pub tesseract_lang: String,

    /// Multimodal OCR endpoint; replaces tesseract when set
    #[arg(long, env = "LLM_OCR_ENDPOINT")]
    pub ocr_endpoint: Option<String>,

    #[arg(long, env = "LLM_OCR_API_KEY", hide_env_values = true)]
    pub ocr_api_key: Option<String>,

    /// Base for image links; defaults to the request's Host header
    #[arg(long, env = "PUBLIC_BASE_URL")]
    pub public_base_url: Option<Url>,

    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://sent_pdfs.db")]
    pub database_url: String,

    #[arg(long, env = "SMTP_HOST", default_value = "smtp.gmail.com")]
    pub smtp_host: String,

    #[arg(long, env = "SMTP_PORT", default_value_t = 465)]
    pub smtp_port: u16,

    #[arg(long, env = "SENDER_NAME")]
    pub sender_name: Option<String>,

    #[arg(long, env = "SENDER_EMAIL")]
    pub sender_email: Option<String>,

    #[arg(long, env = "SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,
}

impl Settings {
    pub fn renderer(&self) -> PdftoppmRenderer {
        PdftoppmRenderer {
            binary: self.pdftoppm_path.clone(),
            dpi: self.render_dpi,
            format: ImageFormat::Png,
        }
    }

    /// SMTP settings, when both a sender address and a password are present.
    pub fn smtp(&self) -> Option<SmtpSettings> {
        let sender_email = non_blank(self.sender_email.as_deref())?;
        let password = non_blank(self.smtp_password.as_deref())?;

        Some(SmtpSettings {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            sender_name: non_blank(self.sender_name.as_deref()).map(str::to_string),
            sender_email: sender_email.to_string(),
            password: password.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub sender_name: Option<String>,
    pub sender_email: String,
    pub password: String,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
