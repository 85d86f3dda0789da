//! sentinel-core - policy core for the read-only assistant
//!
//! This crate holds the pieces that never touch the network:
//! - `message` - Message and Role, the unit of conversation history
//! - `mode` - the closed set of assistant modes
//! - `firewall` - prompt and statement guards
//! - `context` - instruction block assembly and reference material
//! - `history` - bounded history windows
//! - `fragment` - the unit relayed to clients while streaming
//! - `config` - read-only runtime configuration

pub mod config;
pub mod context;
pub mod firewall;
pub mod fragment;
pub mod history;
pub mod message;
pub mod mode;

// Re-export commonly used types
pub use config::{BackendConfig, Config, ConfigError, ServerConfig};
pub use context::{
    ContextAssembler, DirectoryReferenceSource, EmptyReferenceSource, ReferenceMaterial,
    ReferenceSource,
};
pub use firewall::{
    ContentFirewall, GuardResult, KeywordSet, PolicyRejection, SanitizedStatement,
    StatementRejection,
};
pub use fragment::StreamFragment;
pub use history::HistoryWindower;
pub use message::{Message, Role};
pub use mode::Mode;
