use crate::error::OcrError;
use crate::models::PageImage;
use crate::traits::OcrEngine;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

/// Runs the `tesseract` executable on a temporary copy of each page image.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    pub binary: PathBuf,
    pub language: String,
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            language: "eng".to_string(),
        }
    }
}

impl TesseractEngine {
    pub fn new(binary: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }

    pub fn probe(&self) -> bool {
        Command::new(&self.binary).arg("--version").output().is_ok()
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &PageImage) -> Result<String, OcrError> {
        let mut input = tempfile::Builder::new()
            .prefix("ocr_input_")
            .suffix(&format!(".{}", image.format.extension()))
            .tempfile()?;
        input.write_all(&image.bytes)?;
        input.flush()?;

        let output = Command::new(&self.binary)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|error| {
                OcrError::Tesseract(format!("failed to run {}: {error}", self.binary.display()))
            })?;

        if !output.status.success() {
            return Err(OcrError::Tesseract(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
struct HttpOcrRequest<'a> {
    image_base64: String,
    mime_type: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct HttpOcrResponse {
    #[serde(default)]
    text: Option<String>,
}

/// Sends page images to a multimodal OCR endpoint as base64 JSON. One
/// client, and its connection pool, is shared by every page.
#[derive(Debug, Clone)]
pub struct HttpOcrEngine {
    pub endpoint: String,
    pub api_key: Option<String>,
    client: Client,
}

impl HttpOcrEngine {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Builds the blocking client; call this outside of async code.
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self, OcrError> {
        Self::with_timeout(endpoint, api_key, Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, OcrError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            client,
        })
    }
}

impl OcrEngine for HttpOcrEngine {
    // Must run off the async runtime: reqwest's blocking client owns its own.
    fn recognize(&self, image: &PageImage) -> Result<String, OcrError> {
        let payload = HttpOcrRequest {
            image_base64: STANDARD.encode(&image.bytes),
            mime_type: image.format.mime_type(),
        };

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .json(&payload);

        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send()?;
        if !response.status().is_success() {
            return Err(OcrError::Endpoint {
                endpoint: self.endpoint.clone(),
                status: response.status().as_u16(),
            });
        }

        let payload: HttpOcrResponse = response.json()?;
        response_text(payload)
    }
}

fn response_text(payload: HttpOcrResponse) -> Result<String, OcrError> {
    payload
        .text
        .map(|text| text.trim().to_string())
        .ok_or(OcrError::EmptyResponse)
}
