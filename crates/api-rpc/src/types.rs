//! RPC Request/Response Types

use facebatch_core::domain::{JobOptions, ResourceSnapshot, Task, TaskStatus};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// task.submit.v1
///
/// Relative paths resolve against the configured upload directories.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub source_path: PathBuf,
    pub target_path: PathBuf,
    #[serde(default)]
    pub options: Option<JobOptions>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Task> for SubmitResponse {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            status: task.status,
            output_filename: task.output_filename(),
            error: task.error.clone(),
        }
    }
}

/// task.status.v1 and task.fetch.v1
#[derive(Debug, Deserialize)]
pub struct TaskRef {
    pub task_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub source_filename: String,
    pub target_filename: String,
}

impl From<&Task> for StatusResponse {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            status: task.status,
            output_filename: task.output_filename(),
            error: task.error.clone(),
            source_filename: task.source_filename(),
            target_filename: task.target_filename(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchResponse {
    pub task_id: String,
    pub output_path: PathBuf,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskCounts {
    pub pending: usize,
    pub processing_image: usize,
    pub processing_video_queued: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
}

impl TaskCounts {
    pub fn add(&mut self, status: TaskStatus, count: usize) {
        let slot = match status {
            TaskStatus::Pending => &mut self.pending,
            TaskStatus::ProcessingImage => &mut self.processing_image,
            TaskStatus::ProcessingVideoQueued => &mut self.processing_video_queued,
            TaskStatus::Processing => &mut self.processing,
            TaskStatus::Completed => &mut self.completed,
            TaskStatus::Failed => &mut self.failed,
        };
        *slot += count;
        self.total += count;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceView {
    pub temperature_celsius: Option<f32>,
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub sampled_at: String,
    pub safe: bool,
    pub verdict: String,
}

impl ResourceView {
    pub fn new(snapshot: &ResourceSnapshot, safe: bool, verdict: String) -> Self {
        Self {
            temperature_celsius: snapshot.temperature_celsius,
            cpu_percent: snapshot.cpu_percent,
            memory_percent: snapshot.memory_percent,
            sampled_at: snapshot.sampled_at.to_rfc3339(),
            safe,
            verdict,
        }
    }
}

/// admin.stats.v1
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub tasks: TaskCounts,
    pub uptime_seconds: u64,
    pub resources: ResourceView,
}
