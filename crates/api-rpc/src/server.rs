//! JSON-RPC Server
//!
//! Serves the task methods over HTTP on the configured address (localhost by default).

use crate::error::ServerError;
use crate::handler::RpcHandler;
use crate::types::{SubmitRequest, TaskRef};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

pub const METHOD_SUBMIT: &str = "task.submit.v1";
pub const METHOD_STATUS: &str = "task.status.v1";
pub const METHOD_FETCH: &str = "task.fetch.v1";
pub const METHOD_STATS: &str = "admin.stats.v1";

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    /// 0 picks a free port
    pub port: u16,
}

impl From<&facebatch_core::config::ServerConfig> for RpcServerConfig {
    fn from(config: &facebatch_core::config::ServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, handler: RpcHandler) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
        }
    }

    /// Bind and start serving. Returns the bound address and a stop handle.
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle), ServerError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                message: e.to_string(),
            })?;
        let local_addr = server.local_addr().map_err(|e| ServerError::Bind {
            addr: addr.clone(),
            message: e.to_string(),
        })?;

        let mut module = RpcModule::new(());

        let handler = self.handler.clone();
        module
            .register_async_method(METHOD_SUBMIT, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: SubmitRequest = params.parse()?;
                    handler.submit(req).await
                }
            })
            .map_err(|e| ServerError::Register(e.to_string()))?;

        let handler = self.handler.clone();
        module
            .register_async_method(METHOD_STATUS, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: TaskRef = params.parse()?;
                    handler.status(req).await
                }
            })
            .map_err(|e| ServerError::Register(e.to_string()))?;

        let handler = self.handler.clone();
        module
            .register_async_method(METHOD_FETCH, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: TaskRef = params.parse()?;
                    handler.fetch(req).await
                }
            })
            .map_err(|e| ServerError::Register(e.to_string()))?;

        let handler = self.handler.clone();
        module
            .register_async_method(METHOD_STATS, move |_, _, _| {
                let handler = handler.clone();
                async move { handler.stats().await }
            })
            .map_err(|e| ServerError::Register(e.to_string()))?;

        info!(address = %local_addr, "JSON-RPC server listening");

        Ok((local_addr, server.start(module)))
    }
}
