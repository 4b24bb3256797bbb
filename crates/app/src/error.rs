//! HTTP-facing errors

use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pdf_keyword_core::SearchError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mailer::MailError;

pub type Result<T> = std::result::Result<T, ApiError>;

pub const PDF_NOT_FOUND: &str = "PDF file not found.";
pub const KEYWORD_NOT_FOUND: &str = "Keyword not found in the PDF.";
pub const IMAGE_NOT_FOUND: &str = "Image not found.";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    InvalidQuery(#[from] QueryRejection),

    #[error("Failed to search keyword in PDF: {0}")]
    Search(SearchError),

    #[error("Failed to send email: {0}")]
    Mail(#[from] MailError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SearchError> for ApiError {
    fn from(error: SearchError) -> Self {
        match error {
            SearchError::DocumentNotFound(_) => ApiError::NotFound(PDF_NOT_FOUND),
            other => ApiError::Search(other),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidQuery(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(ErrorBody {
            detail: self.to_string(),
        });

        (status, body).into_response()
    }
}
