use actix_web::http::header;
use actix_web::web::Bytes;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use sentinel_core::{Message, Mode};
use sentinel_llm::TurnError;

use crate::error::Result;
use crate::middleware::extract_request_id;
use crate::sse::{spawn_sse_sender, SSE_CHANNEL_CAPACITY};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub mode: Mode,
}

pub async fn handler(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ChatRequest>,
) -> Result<HttpResponse> {
    let ChatRequest { messages, mode } = body.into_inner();
    let request_id = extract_request_id(&req).unwrap_or_default();
    state.metrics.record_chat_request(mode);

    let cancel = CancellationToken::new();
    let fragments = match state
        .coordinator
        .run_turn(&messages, mode, cancel.clone())
        .await
    {
        Ok(fragments) => fragments,
        Err(err) => {
            if matches!(err, TurnError::Policy(_)) {
                state.metrics.record_prompt_blocked();
            }
            log::info!("[{}] Chat turn refused: {}", request_id, err);
            return Err(err.into());
        }
    };

    log::info!(
        "[{}] Streaming {} turn ({} messages)",
        request_id,
        mode,
        messages.len()
    );

    let (tx, mut rx) = mpsc::channel::<Bytes>(SSE_CHANNEL_CAPACITY);
    spawn_sse_sender(fragments, tx, cancel);

    Ok(HttpResponse::Ok()
        .append_header((header::CONTENT_TYPE, "text/event-stream"))
        .append_header((header::CACHE_CONTROL, "no-cache"))
        .append_header((header::CONNECTION, "keep-alive"))
        .streaming(async_stream::stream! {
            while let Some(item) = rx.recv().await {
                yield Ok::<_, actix_web::Error>(item);
            }
        }))
}
