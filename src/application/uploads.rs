//! Document uploads delegated to an external image host.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Largest accepted document, in bytes.
pub const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

const ALLOWED_DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid document: {0}")]
    InvalidArgument(String),
    #[error("image host unavailable: {0}")]
    Unavailable(String),
    #[error("image host rejected upload with status {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// A file received from a client, not yet stored anywhere.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub filename: Option<String>,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Location of a file stored by the image host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedFile {
    pub public_id: String,
    pub url: String,
    pub format: Option<String>,
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, document: &DocumentUpload) -> Result<HostedFile, UploadError>;
}

/// Checks size and content type before anything leaves the process.
pub fn validate_document(label: &str, document: &DocumentUpload) -> Result<(), UploadError> {
    if document.bytes.is_empty() {
        return Err(UploadError::InvalidArgument(format!("{label} file is empty")));
    }

    if document.bytes.len() > MAX_DOCUMENT_BYTES {
        return Err(UploadError::InvalidArgument(format!(
            "{label} file must not exceed {} MB",
            MAX_DOCUMENT_BYTES / (1024 * 1024)
        )));
    }

    let content_type = document.content_type.to_ascii_lowercase();
    if !ALLOWED_DOCUMENT_TYPES.contains(&content_type.as_str()) {
        return Err(UploadError::InvalidArgument(format!(
            "{label} has unsupported format `{}`",
            document.content_type
        )));
    }

    Ok(())
}
