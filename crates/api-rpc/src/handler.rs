//! RPC Method Handlers
//!
//! Thin translation between wire types and the TaskRegistry.

use crate::error::{throttled, to_rpc_error};
use crate::rate_limiter::RateLimiter;
use crate::types::{
    FetchResponse, ResourceView, StatsResponse, StatusResponse, SubmitRequest,
    SubmitResponse, TaskCounts, TaskRef,
};
use facebatch_core::application::{classify, SubmitRequest as RegistrySubmit, TaskRegistry};
use facebatch_core::config::PathsConfig;
use facebatch_core::domain::SafetyThresholds;
use facebatch_core::error::AppError;
use facebatch_core::port::ResourceMonitor;
use jsonrpsee::types::ErrorObjectOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    registry: Arc<TaskRegistry>,
    monitor: Arc<dyn ResourceMonitor>,
    thresholds: Arc<SafetyThresholds>,
    upload_source_dir: PathBuf,
    upload_target_dir: PathBuf,
    rate_limiter: RateLimiter,
    start_time: Instant,
}

impl RpcHandler {
    pub fn new(
        registry: Arc<TaskRegistry>,
        monitor: Arc<dyn ResourceMonitor>,
        thresholds: Arc<SafetyThresholds>,
        paths: &PathsConfig,
        rate_limiter: RateLimiter,
    ) -> Self {
        Self {
            registry,
            monitor,
            thresholds,
            upload_source_dir: paths.upload_source_dir.clone(),
            upload_target_dir: paths.upload_target_dir.clone(),
            rate_limiter,
            start_time: Instant::now(),
        }
    }

    /// task.submit.v1
    pub async fn submit(&self, params: SubmitRequest) -> Result<SubmitResponse, ErrorObjectOwned> {
        if !self.rate_limiter.try_acquire() {
            warn!("Submission rejected by rate limiter");
            return Err(throttled());
        }

        let source = resolve(&self.upload_source_dir, &params.source_path);
        let target = resolve(&self.upload_target_dir, &params.target_path);
        debug!(source = %source.display(), target_path = %target.display(), "task.submit.v1");

        let mut request = RegistrySubmit::new(source, target);
        if let Some(options) = params.options {
            request = request.with_options(options);
        }

        let task = self.registry.submit(request).await.map_err(to_rpc_error)?;
        Ok(SubmitResponse::from(&task))
    }

    /// task.status.v1
    pub async fn status(&self, params: TaskRef) -> Result<StatusResponse, ErrorObjectOwned> {
        let task = self.registry.status(&params.task_id).map_err(to_rpc_error)?;
        Ok(StatusResponse::from(&task))
    }

    /// task.fetch.v1
    pub async fn fetch(&self, params: TaskRef) -> Result<FetchResponse, ErrorObjectOwned> {
        let output_path = self
            .registry
            .fetch_output(&params.task_id)
            .await
            .map_err(to_rpc_error)?;

        let size_bytes = tokio::fs::metadata(&output_path)
            .await
            .map_err(|e| to_rpc_error(AppError::Io(e)))?
            .len();

        Ok(FetchResponse {
            task_id: params.task_id,
            output_path,
            size_bytes,
        })
    }

    /// admin.stats.v1
    pub async fn stats(&self) -> Result<StatsResponse, ErrorObjectOwned> {
        let mut tasks = TaskCounts::default();
        for (status, count) in self.registry.counts() {
            tasks.add(status, count);
        }

        let snapshot = self.monitor.sample().await;
        let verdict = classify(&snapshot, &self.thresholds);

        Ok(StatsResponse {
            tasks,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            resources: ResourceView::new(&snapshot, verdict.is_safe(), verdict.to_string()),
        })
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
