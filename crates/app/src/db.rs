//! SQLite log of PDFs that were mailed out

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SentPdf {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub pdf_sent: Option<String>,
    pub sent_at: String,
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS sent_pdfs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    email TEXT NOT NULL,
    pdf_sent TEXT,
    sent_at TEXT NOT NULL
);
"#;

/// Create a connection pool and make sure the schema exists
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    initialize_schema(&pool).await?;
    Ok(pool)
}

/// Single-connection in-memory pool; every connection would otherwise see
/// its own empty database.
pub async fn create_memory_pool() -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    initialize_schema(&pool).await?;
    Ok(pool)
}

pub async fn initialize_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

pub async fn record_sent(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    pdf_sent: &str,
) -> Result<SentPdf, sqlx::Error> {
    sqlx::query_as::<_, SentPdf>(
        "INSERT INTO sent_pdfs (username, email, pdf_sent, sent_at) VALUES (?, ?, ?, ?) \
         RETURNING id, username, email, pdf_sent, sent_at",
    )
    .bind(username)
    .bind(email)
    .bind(pdf_sent)
    .bind(Utc::now().to_rfc3339())
    .fetch_one(pool)
    .await
}

pub async fn list_sent(pool: &SqlitePool) -> Result<Vec<SentPdf>, sqlx::Error> {
    sqlx::query_as::<_, SentPdf>(
        "SELECT id, username, email, pdf_sent, sent_at FROM sent_pdfs ORDER BY id",
    )
    .fetch_all(pool)
    .await
}
