//! Serves page images cached by earlier searches

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};

use crate::error::{ApiError, Result, IMAGE_NOT_FOUND};
use crate::state::AppState;

pub async fn get_image(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
) -> Result<Response> {
    let image = state
        .image_cache()
        .get(&image_id)
        .ok_or(ApiError::NotFound(IMAGE_NOT_FOUND))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, image.format.mime_type())
        .header(header::CONTENT_LENGTH, image.len())
        .body(Body::from(image.bytes))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
