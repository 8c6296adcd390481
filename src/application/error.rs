use std::error::Error as StdError;

use axum::{http::StatusCode, response::Response};
use thiserror::Error;

use crate::{
    application::{
        admins::AdminError,
        listing::ListingError,
        onboarding::OnboardingError,
        pagination::PaginationError,
        profiles::ProfileError,
        repos::RepoError,
        snapshots::SnapshotError,
        uploads::UploadError,
    },
    cache::CacheError,
    infra::error::InfraError,
};

/// Failure details attached to error responses for the logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// Classification shared by every layer's errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Conflict,
    Unavailable,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::Internal => "internal",
        }
    }
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RepoError::NotFound => ErrorKind::NotFound,
            RepoError::InvalidInput { .. } => ErrorKind::InvalidArgument,
            RepoError::Duplicate { .. } | RepoError::Integrity { .. } => ErrorKind::Conflict,
            RepoError::Timeout | RepoError::Unavailable(_) => ErrorKind::Unavailable,
            RepoError::Persistence(_) => ErrorKind::Internal,
        }
    }
}

impl CacheError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Unavailable
    }
}

impl PaginationError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidArgument
    }
}

impl UploadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UploadError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            UploadError::Unavailable(_) | UploadError::Rejected { .. } => ErrorKind::Unavailable,
        }
    }
}

impl SnapshotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SnapshotError::NotFound(_) => ErrorKind::NotFound,
            SnapshotError::Repo(err) => err.kind(),
            SnapshotError::Cache(err) => err.kind(),
            SnapshotError::Encode(_) => ErrorKind::Internal,
        }
    }
}

impl ListingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ListingError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ListingError::Pagination(err) => err.kind(),
            ListingError::Repo(err) => err.kind(),
        }
    }
}

impl ProfileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProfileError::Snapshot(err) => err.kind(),
        }
    }
}

impl OnboardingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OnboardingError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            OnboardingError::NotFound(_) => ErrorKind::NotFound,
            OnboardingError::Repo(err) => err.kind(),
            OnboardingError::Snapshot(err) => err.kind(),
            OnboardingError::Upload(err) => err.kind(),
        }
    }
}

impl AdminError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdminError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            AdminError::NotFound(_) => ErrorKind::NotFound,
            AdminError::Repo(err) => err.kind(),
        }
    }
}

/// Top-level error for the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
