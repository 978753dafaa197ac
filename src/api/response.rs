//! Response envelopes and error mapping for the HTTP API.
//!
//! Successful responses are wrapped as `{success, message, data}`; list
//! responses as `{success, data, total, page, totalPages, count}`; failures
//! as `{success: false, code, message, details?}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::services::Page;

/// Envelope for a single successful result.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// Always true.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
    /// The payload.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wraps a payload.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }

    /// Responds with 200.
    pub fn into_ok(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }

    /// Responds with 201.
    pub fn into_created(self) -> Response {
        (StatusCode::CREATED, Json(self)).into_response()
    }
}

/// Envelope for one page of a list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    /// Always true.
    pub success: bool,
    /// Items on this page.
    pub data: Vec<T>,
    /// Items across all pages.
    pub total: usize,
    /// This page number.
    pub page: u32,
    /// Number of pages.
    pub total_pages: u32,
    /// Items on this page.
    pub count: usize,
}

impl<T: Serialize> From<Page<T>> for ListResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            success: true,
            count: page.items.len(),
            data: page.items,
            total: page.total,
            page: page.page,
            total_pages: page.total_pages,
        }
    }
}

impl<T: Serialize> IntoResponse for ListResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// API error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Always false.
    pub success: bool,
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            details: Some(details.into()),
            ..Self::new(code, message)
        }
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// Creates an error response.
    pub fn new(status: StatusCode, error: ApiError) -> Self {
        Self { status, error }
    }

    /// A 400 with code `VALIDATION_ERROR`.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiError::new("VALIDATION_ERROR", message))
    }

    /// A 401 for requests without caller identity.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ApiError::new("UNAUTHORIZED", message))
    }

    /// Drops `details` (production responses never carry them).
    pub fn without_details(mut self) -> Self {
        self.error.details = None;
        self
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        let (status, error) = match error {
            EngineError::ConfigNotFound { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
            ),
            EngineError::ConfigParseError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("CONFIG_ERROR", "Configuration parse error", message),
            ),
            EngineError::Validation { field, message: reason } => (
                StatusCode::BAD_REQUEST,
                ApiError::with_details("VALIDATION_ERROR", reason, format!("field: {}", field)),
            ),
            EngineError::NotFound { entity, .. } => (
                StatusCode::NOT_FOUND,
                ApiError::with_details("NOT_FOUND", format!("{} not found", entity), message),
            ),
            EngineError::EmployeeNotFound { .. } => (
                StatusCode::NOT_FOUND,
                ApiError::new("EMPLOYEE_NOT_FOUND", message),
            ),
            EngineError::Permission { .. } => (StatusCode::FORBIDDEN, ApiError::new("FORBIDDEN", message)),
            EngineError::DuplicatePeriod { .. } => (
                StatusCode::BAD_REQUEST,
                ApiError::new("DUPLICATE_PERIOD", message),
            ),
            EngineError::DuplicateAttendanceDay { .. } => (
                StatusCode::BAD_REQUEST,
                ApiError::new("DUPLICATE_ATTENDANCE", message),
            ),
            EngineError::OverlappingLeave { .. } => (
                StatusCode::BAD_REQUEST,
                ApiError::new("OVERLAPPING_LEAVE", message),
            ),
            EngineError::DuplicateRuleCode { .. } => (
                StatusCode::BAD_REQUEST,
                ApiError::new("DUPLICATE_RULE_CODE", message),
            ),
            EngineError::AlreadyProcessed { .. } => (
                StatusCode::BAD_REQUEST,
                ApiError::new("ALREADY_PROCESSED", message),
            ),
            EngineError::ProtectedRule { .. } => (
                StatusCode::BAD_REQUEST,
                ApiError::new("PROTECTED_RULE", message),
            ),
            EngineError::ConfigurationMissing { message: reason } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("CONFIGURATION_MISSING", "Salary configuration missing", reason),
            ),
            EngineError::InvalidFormula { .. } => (
                StatusCode::BAD_REQUEST,
                ApiError::new("INVALID_FORMULA", message),
            ),
            EngineError::Downstream { .. } => (
                StatusCode::BAD_GATEWAY,
                ApiError::with_details("DOWNSTREAM_ERROR", "External service failed", message),
            ),
            EngineError::Storage { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("STORAGE_ERROR", "Storage failure", message),
            ),
        };
        Self { status, error }
    }
}
