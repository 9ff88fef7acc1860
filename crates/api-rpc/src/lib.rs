//! JSON-RPC API Layer
//!
//! Request/response surface over the task registry.

pub mod error;
pub mod handler;
pub mod rate_limiter;
pub mod server;
pub mod types;

pub use handler::RpcHandler;
pub use rate_limiter::RateLimiter;
pub use server::{RpcServer, RpcServerConfig};

pub use jsonrpsee::server::ServerHandle;
