//! Uniform response envelope shared by all endpoints.
//!
//! Success responses carry `{status, message, data}` for single objects and
//! `{status, message, count, data}` for collections. Error responses carry
//! `{status, message, statusCode, timestamp, path, errors?}` and are produced
//! by [`crate::error::AppError`].

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Envelope for a single-object success response.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success",
            message: message.into(),
            data: Some(data),
        }
    }

    /// Success with no payload (logout, delete).
    pub fn success_empty(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
            data: None,
        }
    }
}

/// Envelope for a collection success response.
#[derive(Debug, Clone, Serialize)]
pub struct ApiListResponse<T> {
    pub status: &'static str,
    pub message: String,
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> ApiListResponse<T> {
    pub fn success(message: impl Into<String>, data: Vec<T>) -> Self {
        Self {
            status: "success",
            message: message.into(),
            count: data.len(),
            data,
        }
    }
}

/// One entry in an error response's `errors` list.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorDetail {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
            code: None,
        }
    }

    pub fn for_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Envelope for an error response.
///
/// Also inserted into the response extensions so the path-attaching
/// middleware can fill in `path` from the request URI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub status: &'static str,
    pub message: String,
    pub status_code: u16,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorDetail>>,
}

impl ApiErrorResponse {
    pub fn new(message: impl Into<String>, status_code: u16, errors: Option<Vec<ErrorDetail>>) -> Self {
        Self {
            status: "error",
            message: message.into(),
            status_code,
            timestamp: Utc::now(),
            path: None,
            errors,
        }
    }
}
