//! Salary rule and rule set endpoints.

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

use super::{fail, json_body, parse_id, query_params};
use crate::api::request::{DateQuery, RuleQuery};
use crate::api::response::{ApiErrorResponse, ApiResponse};
use crate::api::state::AppState;
use crate::models::RuleSetDraft;
use crate::services::{Actor, NewSalaryRule, SalaryRuleUpdate};

type HandlerResult = Result<Response, ApiErrorResponse>;

/// Handler for GET /salary-rules.
pub(super) async fn list_rules(
    State(state): State<AppState>,
    actor: Actor,
    query: Result<Query<RuleQuery>, QueryRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let filter = query_params(query, correlation_id)?.into();
    let rules = state
        .rules()
        .list_rules(&actor, filter)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    Ok(ApiResponse::ok("Salary rules", rules).into_ok())
}

/// Handler for POST /salary-rules.
pub(super) async fn create_rule(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<NewSalaryRule>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let input = json_body(payload, correlation_id)?;
    info!(correlation_id = %correlation_id, title = %input.title, "Processing salary rule creation");
    let rule = state
        .rules()
        .create_rule(&actor, input)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    Ok(ApiResponse::ok("Salary rule created successfully", rule).into_created())
}

/// Handler for GET /salary-rules/active. Open to every role.
pub(super) async fn active_rules(State(state): State<AppState>, _actor: Actor) -> HandlerResult {
    let rules = state.rules().active_rules().await;
    Ok(ApiResponse::ok("Active salary rules", rules).into_ok())
}

/// Handler for GET /salary-rules/:id.
pub(super) async fn get_rule(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let id = parse_id(&id, correlation_id)?;
    let rule = state
        .rules()
        .get_rule(&actor, id)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    Ok(ApiResponse::ok("Salary rule", rule).into_ok())
}

/// Handler for PUT /salary-rules/:id.
pub(super) async fn update_rule(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    payload: Result<Json<SalaryRuleUpdate>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let id = parse_id(&id, correlation_id)?;
    let update = json_body(payload, correlation_id)?;
    let rule = state
        .rules()
        .update_rule(&actor, id, update)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    Ok(ApiResponse::ok("Salary rule updated successfully", rule).into_ok())
}

/// Handler for DELETE /salary-rules/:id.
pub(super) async fn delete_rule(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let id = parse_id(&id, correlation_id)?;
    let rule = state
        .rules()
        .delete_rule(&actor, id)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    Ok(ApiResponse::ok("Salary rule deleted successfully", rule).into_ok())
}

/// Handler for PATCH /salary-rules/:id/toggle.
pub(super) async fn toggle_rule(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let id = parse_id(&id, correlation_id)?;
    let rule = state
        .rules()
        .toggle_rule(&actor, id)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    let message = if rule.is_active {
        "Salary rule activated"
    } else {
        "Salary rule deactivated"
    };
    Ok(ApiResponse::ok(message, rule).into_ok())
}

/// Handler for GET /salary-rules/sets.
pub(super) async fn list_rule_sets(State(state): State<AppState>, actor: Actor) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let sets = state
        .rules()
        .list_rule_sets(&actor)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    Ok(ApiResponse::ok("Rule sets", sets).into_ok())
}

/// Handler for POST /salary-rules/sets.
pub(super) async fn create_rule_set(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<RuleSetDraft>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let draft = json_body(payload, correlation_id)?;
    info!(
        correlation_id = %correlation_id,
        name = %draft.name,
        effective_from = %draft.effective_from,
        "Processing rule set creation"
    );
    let set = state
        .rules()
        .create_rule_set(&actor, draft)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    Ok(ApiResponse::ok("Rule set created successfully", set).into_created())
}

/// Handler for GET /salary-rules/sets/current.
pub(super) async fn current_rule_set(
    State(state): State<AppState>,
    _actor: Actor,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let query = query_params(query, correlation_id)?;
    let set = state
        .rules()
        .current_rule_set(query.date)
        .await
        .map_err(|e| fail(&state, correlation_id, e))?;
    Ok(ApiResponse::ok("Current rule set", set).into_ok())
}
