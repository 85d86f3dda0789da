use std::sync::Arc;

use sentinel_core::{
    Config, DirectoryReferenceSource, EmptyReferenceSource, ReferenceSource,
};
use sentinel_llm::{GenerationBackend, GenerationCoordinator, OllamaBackend};

use crate::metrics::Metrics;

/// Shared, read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub coordinator: Arc<GenerationCoordinator>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: Config, backend: Arc<dyn GenerationBackend>) -> Self {
        let metrics = Arc::new(Metrics::new());

        let reference: Arc<dyn ReferenceSource> = match &config.resources_dir {
            Some(dir) => {
                log::info!("Loading reference material from {}", dir.display());
                Arc::new(DirectoryReferenceSource::new(dir.clone()))
            }
            None => Arc::new(EmptyReferenceSource),
        };

        let coordinator = GenerationCoordinator::from_config(backend, &config)
            .with_reference_source(reference)
            .with_observer(metrics.clone());

        Self {
            config: Arc::new(config),
            coordinator: Arc::new(coordinator),
            metrics,
        }
    }

    /// State backed by the Ollama server named in `config`.
    pub fn with_ollama(config: Config) -> anyhow::Result<Self> {
        let backend = OllamaBackend::from_config(&config.backend)?;
        Ok(Self::new(config, Arc::new(backend)))
    }
}
