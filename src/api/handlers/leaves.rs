//! Leave endpoints.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    response::{IntoResponse, Response},
};
use tracing::info;
use uuid::Uuid;

use super::{fail, json_body, parse_id, query_params};
use crate::api::request::{ApproveBody, BalanceQuery, BulkBody, LeaveQuery, MyLeavesQuery, RejectBody};
use crate::api::response::{ApiErrorResponse, ApiResponse, ListResponse};
use crate::api::state::AppState;
use crate::services::{Actor, LeaveUpdate, NewLeave};

type HandlerResult = Result<Response, ApiErrorResponse>;

/// Handler for POST /leaves.
pub(super) async fn create_leave(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<NewLeave>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, actor = %actor.user_id, "Processing leave request");
    let input = json_body(payload, correlation_id)?;
    let leave = state
        .leaves()
        .request_leave(&actor, input)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    Ok(ApiResponse::ok("Leave request submitted successfully", leave).into_created())
}

/// Handler for GET /leaves/mine.
pub(super) async fn my_leaves(
    State(state): State<AppState>,
    actor: Actor,
    query: Result<Query<MyLeavesQuery>, QueryRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let query = query_params(query, correlation_id)?;
    let page = state
        .leaves()
        .my_leaves(&actor, query.status, query.page_request())
        .await;
    Ok(ListResponse::from(page).into_response())
}

/// Handler for GET /leaves.
pub(super) async fn list_leaves(
    State(state): State<AppState>,
    actor: Actor,
    query: Result<Query<LeaveQuery>, QueryRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let (filter, page) = query_params(query, correlation_id)?.into_parts();
    let page = state
        .leaves()
        .list_leaves(&actor, filter, page)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    Ok(ListResponse::from(page).into_response())
}

/// Handler for PATCH /leaves/:id/approve. The body is optional.
pub(super) async fn approve_leave(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    body: Option<Json<ApproveBody>>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, leave_id = %id, actor = %actor.user_id, "Processing leave approval");
    let id = parse_id(&id, correlation_id)?;
    let pay_status = body.and_then(|Json(body)| body.pay_status);
    let outcome = state
        .leaves()
        .approve_leave(&actor, id, pay_status)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    Ok(ApiResponse::ok("Leave approved successfully", outcome).into_ok())
}

/// Handler for PATCH /leaves/:id/reject.
pub(super) async fn reject_leave(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    payload: Result<Json<RejectBody>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, leave_id = %id, actor = %actor.user_id, "Processing leave rejection");
    let id = parse_id(&id, correlation_id)?;
    let body = json_body(payload, correlation_id)?;
    let leave = state
        .leaves()
        .reject_leave(&actor, id, &body.reason)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    Ok(ApiResponse::ok("Leave rejected successfully", leave).into_ok())
}

/// Handler for PATCH /leaves/:id.
pub(super) async fn update_leave(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    payload: Result<Json<LeaveUpdate>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let id = parse_id(&id, correlation_id)?;
    let update = json_body(payload, correlation_id)?;
    let leave = state
        .leaves()
        .update_leave(&actor, id, update)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    Ok(ApiResponse::ok("Leave updated successfully", leave).into_ok())
}

/// Handler for DELETE /leaves/:id.
pub(super) async fn delete_leave(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let id = parse_id(&id, correlation_id)?;
    let leave = state
        .leaves()
        .delete_leave(&actor, id)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    Ok(ApiResponse::ok("Leave deleted successfully", leave).into_ok())
}

/// Handler for POST /leaves/bulk-approve.
pub(super) async fn bulk_approve(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<BulkBody>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let body = json_body(payload, correlation_id)?;
    info!(correlation_id = %correlation_id, count = body.ids.len(), "Processing bulk approval");
    let outcome = state
        .leaves()
        .bulk_approve(&actor, &body.ids, body.pay_status)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    let message = format!(
        "{} of {} leave(s) approved",
        outcome.summary.successful, outcome.summary.total
    );
    Ok(ApiResponse::ok(message, outcome).into_ok())
}

/// Handler for POST /leaves/bulk-reject.
pub(super) async fn bulk_reject(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<BulkBody>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let body = json_body(payload, correlation_id)?;
    info!(correlation_id = %correlation_id, count = body.ids.len(), "Processing bulk rejection");
    let reason = body.reason.unwrap_or_default();
    let outcome = state
        .leaves()
        .bulk_reject(&actor, &body.ids, &reason)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    let message = format!(
        "{} of {} leave(s) rejected",
        outcome.summary.successful, outcome.summary.total
    );
    Ok(ApiResponse::ok(message, outcome).into_ok())
}

/// Handler for POST /leaves/bulk-delete.
pub(super) async fn bulk_delete(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<BulkBody>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let body = json_body(payload, correlation_id)?;
    info!(correlation_id = %correlation_id, count = body.ids.len(), "Processing bulk delete");
    let outcome = state
        .leaves()
        .bulk_delete(&actor, &body.ids)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    let message = format!(
        "{} of {} leave(s) deleted",
        outcome.summary.successful, outcome.summary.total
    );
    Ok(ApiResponse::ok(message, outcome).into_ok())
}

/// Handler for GET /leaves/stats.
pub(super) async fn stats(
    State(state): State<AppState>,
    actor: Actor,
    query: Result<Query<LeaveQuery>, QueryRejection>,
) -> HandlerResult {
    let (filter, _) = query_params(query, Uuid::new_v4())?.into_parts();
    let stats = state.leaves().stats(&actor, filter).await;
    Ok(ApiResponse::ok("Leave statistics", stats).into_ok())
}

/// Handler for GET /leaves/type-summary.
pub(super) async fn type_summary(
    State(state): State<AppState>,
    actor: Actor,
    query: Result<Query<LeaveQuery>, QueryRejection>,
) -> HandlerResult {
    let (filter, _) = query_params(query, Uuid::new_v4())?.into_parts();
    let summary = state.leaves().type_summary(&actor, filter).await;
    Ok(ApiResponse::ok("Leave type summary", summary).into_ok())
}

/// Handler for GET /leaves/balance.
pub(super) async fn balance(
    State(state): State<AppState>,
    actor: Actor,
    query: Result<Query<BalanceQuery>, QueryRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let query = query_params(query, correlation_id)?;
    let balance = state
        .leaves()
        .balance(&actor, query.employee_id.as_deref())
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    Ok(ApiResponse::ok("Leave balance", balance).into_ok())
}

/// Handler for GET /leaves/departments.
pub(super) async fn departments(State(state): State<AppState>, actor: Actor) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let departments = state
        .leaves()
        .departments(&actor)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    Ok(ApiResponse::ok("Departments", departments).into_ok())
}

/// Handler for GET /leaves/export.
pub(super) async fn export(
    State(state): State<AppState>,
    actor: Actor,
    query: Result<Query<LeaveQuery>, QueryRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let (filter, _) = query_params(query, correlation_id)?.into_parts();
    let rows = state
        .leaves()
        .export(&actor, filter)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    info!(correlation_id = %correlation_id, rows = rows.len(), "Leave export generated");
    Ok(ApiResponse::ok("Leave export", rows).into_ok())
}
