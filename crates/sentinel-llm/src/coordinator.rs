//! Turn orchestration: guard, assemble, window, stream.
//!
//! A turn is screened synchronously. Rejections are returned as [`TurnError`] before
//! the backend is touched. Once a stream is handed out, backend faults never escape
//! it: each is replaced by one diagnostic fragment followed by [`StreamFragment::Done`].
//! The whole backend call, from connect to the last unit, is bounded by one deadline.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use futures_util::StreamExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use sentinel_core::{
    Config, ContentFirewall, ContextAssembler, EmptyReferenceSource, HistoryWindower, Message,
    Mode, ReferenceMaterial, ReferenceSource, StreamFragment,
};

use crate::error::{BackendError, FaultClass, TurnError};
use crate::provider::GenerationBackend;

pub const UNREACHABLE_DIAGNOSTIC: &str = "⚠️ **System Error**: Cannot connect to local AI engine (Ollama). Please ensure it is running (`ollama serve`).";
pub const TIMEOUT_DIAGNOSTIC: &str =
    "⚠️ **Timeout**: The AI model is taking too long to respond.";
const GENERIC_DIAGNOSTIC_PREFIX: &str = "⚠️ **Error**: ";

pub type FragmentStream = Pin<Box<dyn Stream<Item = StreamFragment> + Send>>;

/// Hooks for counting what happens inside a turn. All methods default to no-ops.
pub trait TurnObserver: Send + Sync {
    fn fragment_streamed(&self) {}

    fn backend_fault(&self, _class: FaultClass) {}
}

#[derive(Debug, Default)]
pub struct NoopObserver;

impl TurnObserver for NoopObserver {}

/// User-facing text that stands in for generated content after a backend fault.
pub fn diagnostic_for(err: &BackendError) -> String {
    match err.class() {
        FaultClass::Unreachable => UNREACHABLE_DIAGNOSTIC.to_string(),
        FaultClass::Timeout => TIMEOUT_DIAGNOSTIC.to_string(),
        FaultClass::Other => format!("{GENERIC_DIAGNOSTIC_PREFIX}{err}"),
    }
}

pub struct GenerationCoordinator {
    backend: Arc<dyn GenerationBackend>,
    firewall: ContentFirewall,
    assembler: ContextAssembler,
    windower: HistoryWindower,
    reference: Arc<dyn ReferenceSource>,
    observer: Arc<dyn TurnObserver>,
    timeout: Duration,
}

impl GenerationCoordinator {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        let defaults = Config::default();
        Self {
            backend,
            firewall: ContentFirewall::new(),
            assembler: ContextAssembler::new(defaults.max_reference_chars),
            windower: HistoryWindower::new(defaults.max_history_messages),
            reference: Arc::new(EmptyReferenceSource),
            observer: Arc::new(NoopObserver),
            timeout: Duration::from_secs(defaults.backend.timeout_secs),
        }
    }

    pub fn from_config(backend: Arc<dyn GenerationBackend>, config: &Config) -> Self {
        Self::new(backend)
            .with_assembler(ContextAssembler::new(config.max_reference_chars))
            .with_windower(HistoryWindower::new(config.max_history_messages))
            .with_timeout(Duration::from_secs(config.backend.timeout_secs))
    }

    pub fn with_firewall(mut self, firewall: ContentFirewall) -> Self {
        self.firewall = firewall;
        self
    }

    pub fn with_assembler(mut self, assembler: ContextAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_windower(mut self, windower: HistoryWindower) -> Self {
        self.windower = windower;
        self
    }

    pub fn with_reference_source(mut self, reference: Arc<dyn ReferenceSource>) -> Self {
        self.reference = reference;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn TurnObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn backend(&self) -> &Arc<dyn GenerationBackend> {
        &self.backend
    }

    pub fn firewall(&self) -> &ContentFirewall {
        &self.firewall
    }

    /// Reject empty conversations and destructive intent in the newest message.
    pub fn screen(&self, messages: &[Message]) -> Result<(), TurnError> {
        let last = messages.last().ok_or(TurnError::EmptyConversation)?;
        self.firewall.check_prompt(&last.content)?;
        Ok(())
    }

    /// Screen the turn and return its fragment stream.
    ///
    /// The backend is not contacted until the stream is first polled.
    pub fn stream(
        &self,
        messages: &[Message],
        mode: Mode,
        reference: &ReferenceMaterial,
    ) -> Result<FragmentStream, TurnError> {
        self.stream_with_cancel(messages, mode, reference, CancellationToken::new())
    }

    /// Like [`stream`](Self::stream); cancelling `cancel` ends the stream without the
    /// terminal fragment and drops the backend connection.
    pub fn stream_with_cancel(
        &self,
        messages: &[Message],
        mode: Mode,
        reference: &ReferenceMaterial,
        cancel: CancellationToken,
    ) -> Result<FragmentStream, TurnError> {
        self.screen(messages)?;
        Ok(self.open(self.build_request(messages, mode, reference), cancel))
    }

    /// Screen, then load reference material from the configured source and stream.
    pub async fn run_turn(
        &self,
        messages: &[Message],
        mode: Mode,
        cancel: CancellationToken,
    ) -> Result<FragmentStream, TurnError> {
        self.screen(messages)?;
        let reference = self.reference.load(mode).await;
        Ok(self.open(self.build_request(messages, mode, &reference), cancel))
    }

    /// Instruction block as a system message, then the bounded history.
    pub fn build_request(
        &self,
        messages: &[Message],
        mode: Mode,
        reference: &ReferenceMaterial,
    ) -> Vec<Message> {
        let instructions = self.assembler.assemble(mode, reference);
        let bounded = self.windower.window(messages);

        let mut request = Vec::with_capacity(bounded.len() + 1);
        request.push(Message::system(instructions));
        request.extend(bounded);
        request
    }

    fn open(&self, request: Vec<Message>, cancel: CancellationToken) -> FragmentStream {
        let backend = Arc::clone(&self.backend);
        let observer = Arc::clone(&self.observer);
        let timeout = self.timeout;

        let stream = async_stream::stream! {
            let deadline = Instant::now() + timeout;

            let opened = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                opened = tokio::time::timeout_at(deadline, backend.chat_stream(&request)) => Some(opened),
            };

            let mut inner = match opened {
                None => {
                    log::debug!("Turn cancelled before the backend answered");
                    return;
                }
                Some(Err(_elapsed)) => {
                    yield degrade(BackendError::Timeout, observer.as_ref());
                    yield StreamFragment::Done;
                    return;
                }
                Some(Ok(Err(err))) => {
                    yield degrade(err, observer.as_ref());
                    yield StreamFragment::Done;
                    return;
                }
                Some(Ok(Ok(inner))) => inner,
            };

            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    next = tokio::time::timeout_at(deadline, inner.next()) => Some(next),
                };

                match next {
                    None => {
                        log::debug!("Turn cancelled, releasing backend stream");
                        return;
                    }
                    Some(Err(_elapsed)) => {
                        yield degrade(BackendError::Timeout, observer.as_ref());
                        break;
                    }
                    Some(Ok(None)) => break,
                    Some(Ok(Some(Ok(text)))) => {
                        observer.fragment_streamed();
                        yield StreamFragment::text(text);
                    }
                    Some(Ok(Some(Err(err)))) => {
                        yield degrade(err, observer.as_ref());
                        break;
                    }
                }
            }

            yield StreamFragment::Done;
        };

        Box::pin(stream)
    }
}

fn degrade(err: BackendError, observer: &dyn TurnObserver) -> StreamFragment {
    let class = err.class();
    match class {
        FaultClass::Timeout => log::warn!("Backend timed out: {}", err),
        FaultClass::Unreachable => log::error!("Backend unreachable: {}", err),
        FaultClass::Other => log::error!("Backend error: {}", err),
    }
    observer.backend_fault(class);
    StreamFragment::text(diagnostic_for(&err))
}
