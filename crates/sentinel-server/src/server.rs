use std::io;

use actix_cors::Cors;
use actix_web::{error, web, App, HttpResponse, HttpServer};
use serde_json::json;

use crate::handlers;
use crate::middleware::RequestTracing;
use crate::state::AppState;

/// Routes shared by the real server and the tests.
pub fn app_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/health", web::get().to(handlers::health::handler))
        .route("/metrics", web::get().to(handlers::metrics::handler))
        .service(
            web::scope("/api/v1")
                .route("/chat", web::post().to(handlers::chat::handler))
                .route("/sql/guard", web::post().to(handlers::guard::statement))
                .route("/prompt/guard", web::post().to(handlers::guard::prompt)),
        );
}

/// Malformed bodies get the same `{detail, blocked_term}` shape as turn errors.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let detail = err.to_string();
        error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(json!({ "detail": detail, "blocked_term": null })),
        )
        .into()
    })
}

pub fn build_cors(origins: &[String]) -> Cors {
    origins.iter().fold(
        Cors::default()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600),
        |cors, origin| {
            if origin == "*" {
                cors.allow_any_origin()
            } else {
                cors.allowed_origin(origin)
            }
        },
    )
}

/// Log whether the configured model is installed. Never fatal.
pub async fn check_backend(state: &AppState) {
    let backend = state.coordinator.backend();
    match backend.list_models().await {
        Ok(models) => {
            if models.iter().any(|m| m == backend.model()) {
                log::info!("Backend is up and model '{}' is installed", backend.model());
            } else {
                log::warn!(
                    "Model '{}' not found on backend. Installed: {:?}",
                    backend.model(),
                    models
                );
            }
        }
        Err(e) => log::warn!("Backend not reachable at startup: {}", e),
    }
}

pub async fn run(state: AppState) -> io::Result<()> {
    check_backend(&state).await;

    let host = state.config.server.host.clone();
    let port = state.config.server.port;
    let origins = state.config.server.cors_origins.clone();
    let data = web::Data::new(state);

    log::info!("Listening on http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(build_cors(&origins))
            .wrap(RequestTracing)
            .configure(app_config)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
