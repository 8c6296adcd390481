use std::error::Error as StdError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::{ErrorKind, ErrorReport};

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// JSON error response carrying the diagnostic chain for the logging middleware.
#[derive(Debug)]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    hint: Option<String>,
    report: ErrorReport,
}

impl ApiError {
    /// Classifies `err` and keeps its full chain for the response log.
    ///
    /// Messages of unavailable and internal failures stay out of the body.
    pub fn from_error(source: &'static str, kind: ErrorKind, err: &dyn StdError) -> Self {
        let status = kind.status();
        let (message, hint) = match kind {
            ErrorKind::Unavailable => (
                "service temporarily unavailable".to_string(),
                Some("retry the request later".to_string()),
            ),
            ErrorKind::Internal => ("internal error".to_string(), None),
            _ => (err.to_string(), None),
        };
        Self {
            kind,
            message,
            hint,
            report: ErrorReport::from_error(source, status, err),
        }
    }

    pub fn bad_request(source: &'static str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: ErrorKind::InvalidArgument,
            report: ErrorReport::from_message(source, StatusCode::BAD_REQUEST, message.clone()),
            message,
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.kind.code().to_string(),
                message: self.message,
                hint: self.hint,
            },
        };
        let mut response = (self.kind.status(), Json(body)).into_response();
        self.report.attach(&mut response);
        response
    }
}
