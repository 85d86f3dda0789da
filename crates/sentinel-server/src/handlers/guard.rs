use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatementGuardRequest {
    pub sql: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatementGuardResponse {
    pub sanitized: String,
    pub allowed: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PromptGuardRequest {
    pub content: String,
}

/// Pre-execution check for a generated statement. Callers must not execute
/// anything when `allowed` is false.
pub async fn statement(
    state: web::Data<AppState>,
    body: web::Json<StatementGuardRequest>,
) -> HttpResponse {
    let checked = state.coordinator.firewall().guard_statement(&body.sql);
    state.metrics.record_statement(checked.is_allowed());

    let (sanitized, reason) = checked.into_parts();
    HttpResponse::Ok().json(StatementGuardResponse {
        allowed: reason.is_none(),
        sanitized,
        reason,
    })
}

pub async fn prompt(
    state: web::Data<AppState>,
    body: web::Json<PromptGuardRequest>,
) -> HttpResponse {
    let result = state.coordinator.firewall().guard_prompt(&body.content);
    if !result.is_allowed() {
        state.metrics.record_prompt_blocked();
    }
    HttpResponse::Ok().json(result)
}
