pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod sse;
pub mod state;

pub use error::AppError;
pub use metrics::{Metrics, MetricsSnapshot};
pub use server::{app_config, build_cors, run};
pub use state::AppState;
