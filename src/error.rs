use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Domain failure taxonomy. Every variant maps to a stable wire code so
/// clients can branch without parsing messages.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("account not found")]
    NotFound,
    #[error("account is not active")]
    NotActive,
    #[error("account is deleted")]
    Deleted,
    #[error("{message}")]
    BadRequest { message: String },
    #[error("{message}")]
    Unauthorized { message: String },
    #[error("internal error")]
    System { developer_message: String },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn system(developer_message: impl Into<String>) -> Self {
        Self::System {
            developer_message: developer_message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::System { .. } => "NS-000001",
            AppError::BadRequest { .. } => "NS-000002",
            AppError::Unauthorized { .. } => "NS-000003",
            AppError::NotFound => "NS-000010",
            AppError::NotActive => "NS-000011",
            AppError::Deleted => "NS-000012",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::System { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::NotActive => StatusCode::FORBIDDEN,
            AppError::Deleted => StatusCode::GONE,
        }
    }

    /// Prefixes a system error's internal detail with the failing operation.
    /// Typed domain errors pass through untouched.
    pub fn context(self, op: &str) -> Self {
        match self {
            AppError::System { developer_message } => AppError::System {
                developer_message: format!("{op}: {developer_message}"),
            },
            other => other,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            message: self.to_string(),
            code: self.code(),
            developer_message: self.developer_message(),
        }
    }

    fn developer_message(&self) -> Option<String> {
        match self {
            AppError::NotActive => {
                Some("check the account mailbox for an activation link".to_string())
            }
            AppError::Deleted => {
                Some("the account was deleted and can no longer be used".to_string())
            }
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer_message: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Internal detail goes to the logs only, never into the body.
        if let AppError::System { developer_message } = &self {
            error!(code = self.code(), detail = %developer_message, "request failed");
        }
        (self.status(), Json(self.body())).into_response()
    }
}
