use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = UploadError> = std::result::Result<T, E>;

/// Longest slice of a response body carried into an error message.
const MAX_BODY_IN_ERROR: usize = 200;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Usage: {0}")]
    Usage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Directory {} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("HTTP {status}: {body}")]
    Transfer { status: StatusCode, body: String },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to create upload: {0}")]
    SessionCreate(String),

    #[error("Failed to upload chunk at offset {offset}: {reason}")]
    Chunk { offset: u64, reason: String },

    #[error("Source ended after {read} of {expected} bytes")]
    ShortRead { read: u64, expected: u64 },
}

impl UploadError {
    /// Builds a transfer error from a non-success response, consuming its body.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        UploadError::Transfer {
            status,
            body: truncate_body(&body),
        }
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_BODY_IN_ERROR) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
