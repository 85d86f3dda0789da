pub mod coordinator;
pub mod error;
pub mod ndjson;
pub mod provider;
pub mod providers;

pub use coordinator::{
    diagnostic_for, FragmentStream, GenerationCoordinator, NoopObserver, TurnObserver,
    TIMEOUT_DIAGNOSTIC, UNREACHABLE_DIAGNOSTIC,
};
pub use error::{BackendError, FaultClass, TurnError};
pub use provider::{BackendStream, GenerationBackend};
pub use providers::OllamaBackend;
