pub mod ollama;

pub use ollama::OllamaBackend;
