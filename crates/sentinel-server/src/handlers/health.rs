use std::time::Duration;

use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::state::AppState;

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Serialize)]
struct HealthResponse<'a> {
    status: &'static str,
    backend: &'static str,
    model: &'a str,
}

pub async fn handler(state: web::Data<AppState>) -> HttpResponse {
    let backend = state.coordinator.backend();

    let reachable = matches!(
        tokio::time::timeout(PROBE_TIMEOUT, backend.list_models()).await,
        Ok(Ok(_))
    );

    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        backend: if reachable { "reachable" } else { "unreachable" },
        model: backend.model(),
    })
}
