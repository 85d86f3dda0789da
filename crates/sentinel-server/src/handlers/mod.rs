pub mod chat;
pub mod guard;
pub mod health;
pub mod metrics;
