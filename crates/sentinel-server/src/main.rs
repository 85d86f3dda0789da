use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use sentinel_core::Config;
use sentinel_server::{logging::init_tracing, run, AppState};

#[derive(Parser, Debug, Clone)]
#[command(name = "sentinel-server")]
#[command(about = "Read-only assistant gateway in front of a local Ollama server")]
#[command(version)]
struct Cli {
    /// Config file (JSON or TOML). Replaces the ~/.sentinel/config.json / ./config.toml lookup
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Server port
    #[arg(long, short)]
    port: Option<u16>,

    /// Ollama base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Model name
    #[arg(long)]
    model: Option<String>,

    /// Directory holding schema.txt, examples.txt and packages.txt
    #[arg(long)]
    resources_dir: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `sentinel_llm=debug,info`. Overrides RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(base_url) = self.base_url {
            config.backend.base_url = base_url;
        }
        if let Some(model) = self.model {
            config.backend.model = model;
        }
        if let Some(dir) = self.resources_dir {
            config.resources_dir = Some(dir);
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load().context("loading config")?,
    };
    cli.apply(&mut config);
    config.validate().context("validating config")?;

    tracing::info!("Starting sentinel-server");
    tracing::info!("  Backend: {}", config.backend.base_url);
    tracing::info!("  Model: {}", config.backend.model);
    tracing::info!("  History window: {} messages", config.max_history_messages);

    let state = AppState::with_ollama(config)?;
    run(state).await.context("server terminated")?;
    Ok(())
}
