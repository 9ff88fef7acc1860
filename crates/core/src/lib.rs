// Facebatch Core - Domain Logic, Ports & Orchestration
// NO infrastructure dependencies: adapters live in the infra crates

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use config::AppConfig;
pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
