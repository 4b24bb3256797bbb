//! Keyword search over the configured PDF

use axum::{
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use pdf_keyword_core::{ImageHandle, MatchResult};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ApiError, Result, KEYWORD_NOT_FOUND};
use crate::routes::QueryParams;
use crate::state::{with_trailing_slash, AppState};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub keyword: String,
}

/// One matching page as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMatch {
    pub page_number: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_text: Option<String>,
}

pub async fn search_keyword(
    State(state): State<AppState>,
    headers: HeaderMap,
    QueryParams(params): QueryParams<SearchParams>,
) -> Result<Json<Vec<PageMatch>>> {
    let results = state
        .coordinator()
        .search_file(state.pdf_path(), &params.keyword)
        .await?;

    if results.is_empty() {
        return Err(ApiError::NotFound(KEYWORD_NOT_FOUND));
    }

    let base = match state.public_base_url() {
        Some(base) => base.clone(),
        None => request_base_url(&headers)?,
    };

    let pages = results
        .into_iter()
        .map(|result| to_page_match(result, &base))
        .collect::<Result<Vec<_>>>()?;

    Ok(Json(pages))
}

fn to_page_match(result: MatchResult, base: &Url) -> Result<PageMatch> {
    let (image_url, image_text) = match result.image {
        Some(image) => (Some(image_url(base, &image.handle)?.to_string()), Some(image.text)),
        None => (None, None),
    };

    Ok(PageMatch {
        page_number: result.page_number,
        text: result.text,
        image_url,
        image_text,
    })
}

/// Absolute link to the image route for `handle`.
pub fn image_url(base: &Url, handle: &ImageHandle) -> Result<Url> {
    base.join(&format!("get-image/{handle}"))
        .map_err(|e| ApiError::Internal(format!("invalid image url: {e}")))
}

/// Base URL as seen by the client, from `Host` and `X-Forwarded-Proto`.
fn request_base_url(headers: &HeaderMap) -> Result<Url> {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("http");

    Url::parse(&format!("{scheme}://{host}/"))
        .map(with_trailing_slash)
        .map_err(|e| ApiError::Internal(format!("invalid request host: {e}")))
}
