use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::{ApiErrorResponse, ErrorDetail};

/// Error taxonomy for the charge platform.
///
/// Domain checks fail fast with the typed variant at the point of violation;
/// storage and collaborator errors are translated into these variants at the
/// repository/gateway boundary, never deeper inside business logic.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<ErrorDetail>,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("Forbidden: {0}")]
    Forbidden(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(anyhow::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Single-field validation failure.
    pub fn validation_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        AppError::Validation {
            message: message.clone(),
            errors: vec![ErrorDetail::for_field(field, message)],
        }
    }

    /// Validation failure with a bare message and no per-field detail.
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable label for error metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Upstream(_) => "upstream",
            AppError::Database(_) => "db_error",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, field_errors)| {
                field_errors.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid value for {field}"));
                    ErrorDetail::for_field(field.to_string(), message).with_code(e.code.to_string())
                })
            })
            .collect();

        AppError::Validation {
            message: "Validation failed".to_string(),
            errors: details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Unmapped internals are logged in full and surfaced generically,
        // without leaking storage metadata to the caller.
        let (message, errors) = match self {
            AppError::Validation { message, errors } => {
                (message, if errors.is_empty() { None } else { Some(errors) })
            }
            AppError::Database(err) => {
                tracing::error!(error = ?err, "Database error");
                ("Internal server error".to_string(), None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "Unhandled error");
                ("Internal server error".to_string(), None)
            }
            AppError::Upstream(msg) => {
                tracing::error!(error = %msg, "Upstream service error");
                ("Upstream service error".to_string(), None)
            }
            AppError::Unauthorized(err)
            | AppError::Forbidden(err)
            | AppError::NotFound(err)
            | AppError::Conflict(err) => (err.to_string(), None),
        };

        let body = ApiErrorResponse::new(message, status.as_u16(), errors);

        let mut response = (status, Json(body.clone())).into_response();
        // The path-attaching middleware rewrites the body from this extension.
        response.extensions_mut().insert(body);
        response
    }
}
