//! Mailing the PDF and listing who received it

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::db::{self, SentPdf};
use crate::error::{ApiError, Result, PDF_NOT_FOUND};
use crate::mailer::PdfAttachment;
use crate::routes::QueryParams;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendPdfParams {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendPdfResponse {
    pub message: String,
}

/// Mails the PDF, then records the delivery. Nothing is recorded when
/// sending fails.
pub async fn send_pdf(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<SendPdfParams>,
) -> Result<Json<SendPdfResponse>> {
    let path = state.pdf_path();
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(ApiError::NotFound(PDF_NOT_FOUND));
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| ApiError::Internal(format!("path has no file name: {}", path.display())))?;
    let bytes = tokio::fs::read(path).await?;

    state
        .mailer()
        .send_pdf(
            &params.username,
            &params.email,
            PdfAttachment {
                file_name: file_name.clone(),
                bytes,
            },
        )
        .await?;

    let record = db::record_sent(state.db(), &params.username, &params.email, &file_name).await?;
    tracing::info!(id = record.id, email = %record.email, "recorded sent pdf");

    Ok(Json(SendPdfResponse {
        message: format!("PDF file sent successfully to {}", params.email),
    }))
}

pub async fn list_emails(State(state): State<AppState>) -> Result<Json<Vec<SentPdf>>> {
    Ok(Json(db::list_sent(state.db()).await?))
}
