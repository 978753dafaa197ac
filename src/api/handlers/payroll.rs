//! Payroll endpoints.

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
use crate::api::request::{ActionBody, GenerateBody, PageQuery, PayrollQuery, PreviewBody};
use crate::api::response::{ApiErrorResponse, ApiResponse, ListResponse};
use crate::api::state::AppState;
use crate::services::{Actor, ClientInfo, NewPayroll, StatusUpdate};

type HandlerResult = Result<Response, ApiErrorResponse>;

/// Handler for POST /payroll.
pub(super) async fn create_payroll(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<NewPayroll>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, actor = %actor.user_id, "Processing payroll creation");
    let input = json_body(payload, correlation_id)?;
    let record = state
        .payroll()
        .create_payroll(&actor, input)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    info!(
        correlation_id = %correlation_id,
        payroll_id = %record.id,
        net_payable = %record.summary.net_payable,
        "Payroll created"
    );
    Ok(ApiResponse::ok("Payroll created successfully", record).into_created())
}

/// Handler for POST /payroll/preview.
///
/// Runs the salary calculation without storing anything and returns the
/// breakdown with its audit trail.
pub(super) async fn preview(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<PreviewBody>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let body = json_body(payload, correlation_id)?;
    info!(
        correlation_id = %correlation_id,
        employee_id = %body.employee_id,
        period_start = %body.period_start,
        period_end = %body.period_end,
        "Processing payroll preview"
    );
    let breakdown = state
        .payroll()
        .preview(&actor, &body.employee_id, body.period())
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    Ok(ApiResponse::ok("Salary calculated", breakdown).into_ok())
}

/// Handler for POST /payroll/generate-monthly. The body is optional.
pub(super) async fn generate_monthly(
    State(state): State<AppState>,
    actor: Actor,
    body: Option<Json<GenerateBody>>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let today = body
        .and_then(|Json(body)| body.date)
        .unwrap_or_else(|| state.today());
    info!(correlation_id = %correlation_id, today = %today, "Processing monthly payroll generation");
    let outcome = state
        .payroll()
        .generate_monthly_batch(&actor, today)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    let message = format!(
        "Generated {} payroll(s), skipped {}, failed {}",
        outcome.generated, outcome.skipped, outcome.failed
    );
    Ok(ApiResponse::ok(message, outcome).into_ok())
}

/// Handler for GET /payroll.
pub(super) async fn list_payrolls(
    State(state): State<AppState>,
    actor: Actor,
    query: Result<Query<PayrollQuery>, QueryRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let (filter, page) = query_params(query, correlation_id)?.into_parts();
    let page = state
        .payroll()
        .list_payrolls(&actor, filter, page)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    Ok(ListResponse::from(page).into_response())
}

/// Handler for GET /payroll/:id.
pub(super) async fn get_payroll(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let id = parse_id(&id, correlation_id)?;
    let record = state
        .payroll()
        .get_payroll(&actor, id)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    Ok(ApiResponse::ok("Payroll", record).into_ok())
}

/// Handler for GET /payroll/employee/:employee_id.
pub(super) async fn employee_payrolls(
    State(state): State<AppState>,
    actor: Actor,
    Path(employee_id): Path<String>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let page = query_params(query, correlation_id)?.request();
    let page = state
        .payroll()
        .employee_payrolls(&actor, &employee_id, page)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    Ok(ListResponse::from(page).into_response())
}

/// Handler for PATCH /payroll/:id/status.
pub(super) async fn update_status(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let id = parse_id(&id, correlation_id)?;
    let update = json_body(payload, correlation_id)?;
    info!(correlation_id = %correlation_id, payroll_id = %id, status = ?update.status, "Processing payroll status change");
    let record = state
        .payroll()
        .update_status(&actor, id, update)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    Ok(ApiResponse::ok("Payroll status updated", record).into_ok())
}

/// Handler for PATCH /payroll/:id/action.
pub(super) async fn employee_action(
    State(state): State<AppState>,
    actor: Actor,
    client: ClientInfo,
    Path(id): Path<String>,
    payload: Result<Json<ActionBody>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let id = parse_id(&id, correlation_id)?;
    let body = json_body(payload, correlation_id)?;
    info!(correlation_id = %correlation_id, payroll_id = %id, action = ?body.action, "Processing payroll action");
    let record = state
        .payroll()
        .employee_action(&actor, id, body.action, body.reason, client)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    let message = format!("Payroll {}", record.status);
    Ok(ApiResponse::ok(message, record).into_ok())
}

/// Handler for DELETE /payroll/:id.
pub(super) async fn delete_payroll(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let id = parse_id(&id, correlation_id)?;
    let record = state
        .payroll()
        .delete_payroll(&actor, id)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    Ok(ApiResponse::ok("Payroll deleted successfully", record).into_ok())
}
