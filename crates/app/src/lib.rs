pub mod config;
pub mod db;
pub mod error;
pub mod mailer;
pub mod routes;
pub mod state;

pub use config::{Settings, SmtpSettings};
pub use error::{ApiError, ErrorBody};
pub use mailer::{MailError, PdfAttachment, PdfMailer, SmtpMailer, UnconfiguredMailer};
pub use routes::create_router;
pub use routes::search::PageMatch;
pub use state::AppState;
