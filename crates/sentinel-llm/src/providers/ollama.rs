use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use sentinel_core::config::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use sentinel_core::{BackendConfig, Message};

use crate::error::{BackendError, Result};
use crate::ndjson::backend_stream_from_ndjson;
use crate::provider::{BackendStream, GenerationBackend};

/// Client for a local Ollama server's streaming `/api/chat` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: Client,
    base_url: String,
    model: String,
}

/// One NDJSON unit from `/api/chat`.
#[derive(Debug, Default, Deserialize)]
struct ChatUnit {
    #[serde(default)]
    message: Option<UnitMessage>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Default, Deserialize)]
struct UnitMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<&'a [String]>,
}

impl OllamaBackend {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Build a client whose connect and overall request timeouts follow `config`.
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(BackendError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl Default for OllamaBackend {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn build_chat_body(model: &str, messages: &[Message]) -> Value {
    let wire: Vec<WireMessage<'_>> = messages
        .iter()
        .map(|m| WireMessage {
            role: m.role.as_str(),
            content: &m.content,
            images: m.images.as_deref().filter(|images| !images.is_empty()),
        })
        .collect();

    json!({
        "model": model,
        "messages": wire,
        "stream": true,
    })
}

/// Extract the text payload of one unit.
///
/// Lines that are not valid JSON are skipped; a unit carrying `error` fails the stream.
pub(crate) fn parse_chat_line(line: &str) -> Result<Option<String>> {
    let unit: ChatUnit = match serde_json::from_str(line) {
        Ok(unit) => unit,
        Err(e) => {
            log::debug!("Skipping malformed backend unit: {}", e);
            return Ok(None);
        }
    };

    if let Some(error) = unit.error {
        return Err(BackendError::Stream(error));
    }

    let content = unit
        .message
        .and_then(|m| m.content)
        .filter(|c| !c.is_empty());

    if content.is_none() && unit.done {
        log::debug!("Backend reported completion");
    }

    Ok(content)
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    async fn chat_stream(&self, messages: &[Message]) -> Result<BackendStream> {
        let body = build_chat_body(&self.model, messages);

        log::debug!(
            "Opening chat stream to {} with model '{}' ({} messages)",
            self.base_url,
            self.model,
            messages.len()
        );

        let response = self
            .client
            .post(self.endpoint("/api/chat"))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Api { status, body });
        }

        Ok(backend_stream_from_ndjson(response, parse_chat_line))
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let response = self.client.get(self.endpoint("/api/tags")).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Api { status, body });
        }

        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}
