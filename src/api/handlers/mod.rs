//! HTTP request handlers.
//!
//! Every handler opens a correlation id, resolves the caller from the
//! gateway headers, delegates to one service call and wraps the result in
//! the response envelope.

mod attendance;
mod leaves;
mod payroll;
mod rules;

use axum::{
    Json, Router,
    extract::{
        Query,
        rejection::{JsonRejection, QueryRejection},
    },
    response::IntoResponse,
    routing::{get, patch, post, put},
};
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;
use crate::error::EngineError;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // leaves
        .route("/leaves", post(leaves::create_leave).get(leaves::list_leaves))
        .route("/leaves/mine", get(leaves::my_leaves))
        .route("/leaves/stats", get(leaves::stats))
        .route("/leaves/type-summary", get(leaves::type_summary))
        .route("/leaves/balance", get(leaves::balance))
        .route("/leaves/departments", get(leaves::departments))
        .route("/leaves/export", get(leaves::export))
        .route("/leaves/bulk-approve", post(leaves::bulk_approve))
        .route("/leaves/bulk-reject", post(leaves::bulk_reject))
        .route("/leaves/bulk-delete", post(leaves::bulk_delete))
        .route(
            "/leaves/:id",
            patch(leaves::update_leave).delete(leaves::delete_leave),
        )
        .route("/leaves/:id/approve", patch(leaves::approve_leave))
        .route("/leaves/:id/reject", patch(leaves::reject_leave))
        // payroll
        .route(
            "/payroll",
            post(payroll::create_payroll).get(payroll::list_payrolls),
        )
        .route("/payroll/preview", post(payroll::preview))
        .route("/payroll/generate-monthly", post(payroll::generate_monthly))
        .route("/payroll/employee/:employee_id", get(payroll::employee_payrolls))
        .route(
            "/payroll/:id",
            get(payroll::get_payroll).delete(payroll::delete_payroll),
        )
        .route("/payroll/:id/status", patch(payroll::update_status))
        .route("/payroll/:id/action", patch(payroll::employee_action))
        // salary rules
        .route("/salary-rules", get(rules::list_rules).post(rules::create_rule))
        .route("/salary-rules/active", get(rules::active_rules))
        .route(
            "/salary-rules/sets",
            get(rules::list_rule_sets).post(rules::create_rule_set),
        )
        .route("/salary-rules/sets/current", get(rules::current_rule_set))
        .route(
            "/salary-rules/:id",
            get(rules::get_rule)
                .put(rules::update_rule)
                .delete(rules::delete_rule),
        )
        .route("/salary-rules/:id/toggle", patch(rules::toggle_rule))
        // attendance
        .route("/attendance", put(attendance::record_day))
        .route(
            "/attendance/employee/:employee_id",
            get(attendance::employee_range),
        )
        .with_state(state)
}

/// Handler for GET /health.
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

/// Logs a failed request and maps the error for the deployment environment.
fn fail(state: &AppState, correlation_id: Uuid, error: EngineError) -> ApiErrorResponse {
    warn!(correlation_id = %correlation_id, error = %error, "Request failed");
    let response = ApiErrorResponse::from(error);
    if state.environment().is_production() {
        response.without_details()
    } else {
        response
    }
}

/// Unwraps a JSON body, turning serde failures into 400 responses.
fn json_body<T>(
    payload: Result<Json<T>, JsonRejection>,
    correlation_id: Uuid,
) -> Result<T, ApiErrorResponse> {
    let rejection = match payload {
        Ok(Json(body)) => return Ok(body),
        Err(rejection) => rejection,
    };
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") || body_text.contains("unknown variant") {
                ApiError::new("VALIDATION_ERROR", body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    Err(ApiErrorResponse::new(
        axum::http::StatusCode::BAD_REQUEST,
        error,
    ))
}

/// Unwraps a query string, turning parse failures into 400 responses.
fn query_params<T>(
    query: Result<Query<T>, QueryRejection>,
    correlation_id: Uuid,
) -> Result<T, ApiErrorResponse> {
    query.map(|Query(params)| params).map_err(|rejection| {
        let body_text = rejection.body_text();
        warn!(correlation_id = %correlation_id, error = %body_text, "Invalid query string");
        ApiErrorResponse::bad_request(body_text)
    })
}

/// Parses a document id from the path.
fn parse_id(raw: &str, correlation_id: Uuid) -> Result<Uuid, ApiErrorResponse> {
    Uuid::parse_str(raw).map_err(|_| {
        warn!(correlation_id = %correlation_id, id = %raw, "Invalid id in path");
        ApiErrorResponse::bad_request(format!("Invalid id: {}", raw))
    })
}
