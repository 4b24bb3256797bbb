use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }

    /// Output-format flag understood by `pdftoppm`.
    pub fn pdftoppm_flag(self) -> &'static str {
        match self {
            ImageFormat::Png => "-png",
            ImageFormat::Jpeg => "-jpeg",
        }
    }
}

/// An encoded page bitmap. Render output and cache entries share this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    pub bytes: Bytes,
    pub format: ImageFormat,
}

impl PageImage {
    pub fn png(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            format: ImageFormat::Png,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageHandle(String);

impl ImageHandle {
    /// Deterministic handle for a 1-based page number.
    pub fn for_page(page_number: usize) -> Self {
        Self(format!("page_{page_number}_image"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ImageHandle {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ImageHandle {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Borrow<str> for ImageHandle {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMatch {
    pub handle: ImageHandle,
    pub text: String,
}

/// One page's search outcome. At least one of `text` or `image` is set on
/// every value the coordinator returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub page_number: usize,
    pub text: Option<String>,
    pub image: Option<ImageMatch>,
}

impl MatchResult {
    pub fn new(page_number: usize, text: Option<String>, image: Option<ImageMatch>) -> Option<Self> {
        if text.is_none() && image.is_none() {
            return None;
        }

        Some(Self {
            page_number,
            text,
            image,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub max_workers: usize,
}

pub const DEFAULT_MAX_WORKERS: usize = 8;

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}
