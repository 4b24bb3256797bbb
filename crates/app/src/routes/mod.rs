//! HTTP routes

pub mod health;
pub mod images;
pub mod mail;
pub mod search;

use axum::{
    extract::{FromRequestParts, Query},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::AppState;

/// `Query` that rejects with the JSON error body instead of plain text.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/read-pdf-steps/", get(search::search_keyword))
        .route("/get-image/:image_id", get(images::get_image))
        .route("/send-pdf/", post(mail::send_pdf))
        .route("/get-emails/", get(mail::list_emails))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
