use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use sentinel_core::Message;

use crate::error::Result;

/// Text payloads in the order the backend produced them.
pub type BackendStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Open a streaming chat completion.
    ///
    /// `messages` already carries the instruction block as its first, system-role
    /// entry. Dropping the returned stream releases the underlying connection.
    async fn chat_stream(&self, messages: &[Message]) -> Result<BackendStream>;

    fn model(&self) -> &str;

    /// Models installed on the backend.
    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(vec![])
    }
}
