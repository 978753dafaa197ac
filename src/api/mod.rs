//! HTTP API module for the payroll engine.
//!
//! This module provides the REST endpoints for leave, payroll, salary rules
//! and attendance. Every endpoint answers with the `{ success, ... }`
//! envelope and identifies the caller from gateway headers.

mod auth;
mod handlers;
mod request;
mod response;
mod state;

pub use auth::{USER_ID_HEADER, USER_ROLE_HEADER};
pub use handlers::create_router;
pub use response::{ApiError, ApiErrorResponse, ApiResponse, ListResponse};
pub use state::AppState;
