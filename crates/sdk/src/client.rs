//! Facebatch Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{FetchResponse, StatsResponse, StatusResponse, SubmitResponse, TaskOptions};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use std::time::Duration;
use tokio::time::Instant;

/// Facebatch daemon client
///
/// # Example
///
/// ```no_run
/// use facebatch_sdk::FacebatchClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = FacebatchClient::connect("http://127.0.0.1:9527").await?;
/// let task = client.submit("face.png", "clip.mp4", None).await?;
/// println!("submitted {}", task.task_id);
/// # Ok(())
/// # }
/// ```
pub struct FacebatchClient {
    client: HttpClient,
}

impl FacebatchClient {
    /// Connect to the daemon
    ///
    /// # Arguments
    ///
    /// * `url` - RPC endpoint URL (e.g., `http://127.0.0.1:9527`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();

        let client = HttpClientBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .build(url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client })
    }

    /// Submit a task. Paths may be absolute or relative to the daemon's upload directories.
    ///
    /// Image tasks come back terminal; video tasks come back queued.
    pub async fn submit(
        &self,
        source_path: impl Into<String>,
        target_path: impl Into<String>,
        options: Option<TaskOptions>,
    ) -> Result<SubmitResponse> {
        let mut params = ObjectParams::new();
        params.insert("source_path", source_path.into())?;
        params.insert("target_path", target_path.into())?;
        if let Some(options) = options {
            params.insert("options", options)?;
        }
        Ok(self.client.request("task.submit.v1", params).await?)
    }

    pub async fn status(&self, task_id: &str) -> Result<StatusResponse> {
        Ok(self.client.request("task.status.v1", task_params(task_id)?).await?)
    }

    /// Locate a completed task's output on the daemon host
    pub async fn fetch(&self, task_id: &str) -> Result<FetchResponse> {
        Ok(self.client.request("task.fetch.v1", task_params(task_id)?).await?)
    }

    pub async fn stats(&self) -> Result<StatsResponse> {
        Ok(self.client.request("admin.stats.v1", ObjectParams::new()).await?)
    }

    /// Poll `status` until the task completes or fails
    ///
    /// # Errors
    /// - `SdkError::Timeout` if the task is still running after `timeout`
    pub async fn wait_for_terminal(
        &self,
        task_id: &str,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<StatusResponse> {
        let started = Instant::now();
        loop {
            let status = self.status(task_id).await?;
            if status.status.is_terminal() {
                return Ok(status);
            }
            if started.elapsed() >= timeout {
                return Err(SdkError::Timeout {
                    task_id: task_id.to_string(),
                    waited: started.elapsed(),
                });
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}

fn task_params(task_id: &str) -> Result<ObjectParams> {
    let mut params = ObjectParams::new();
    params.insert("task_id", task_id)?;
    Ok(params)
}
