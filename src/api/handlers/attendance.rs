//! Attendance endpoints.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    response::Response,
};
use tracing::info;
use uuid::Uuid;

use super::{fail, json_body, query_params};
use crate::api::request::RangeQuery;
use crate::api::response::{ApiErrorResponse, ApiResponse};
use crate::api::state::AppState;
use crate::services::{Actor, AttendanceEntry};

type HandlerResult = Result<Response, ApiErrorResponse>;

/// Handler for PUT /attendance. Creates or corrects one day.
pub(super) async fn record_day(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<AttendanceEntry>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let entry = json_body(payload, correlation_id)?;
    info!(
        correlation_id = %correlation_id,
        employee_id = %entry.employee_id,
        date = %entry.date,
        "Processing attendance entry"
    );
    let record = state
        .attendance()
        .record_day(&actor, entry)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    Ok(ApiResponse::ok("Attendance recorded", record).into_ok())
}

/// Handler for GET /attendance/employee/:employee_id?from=&to=.
pub(super) async fn employee_range(
    State(state): State<AppState>,
    actor: Actor,
    Path(employee_id): Path<String>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let range = query_params(query, correlation_id)?;
    let records = state
        .attendance()
        .range(&actor, &employee_id, range.period())
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    Ok(ApiResponse::ok("Attendance", records).into_ok())
}
