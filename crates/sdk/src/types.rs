//! SDK Request/Response Types
//!
//! Mirrors the JSON-RPC types served by the daemon.

use serde::{Deserialize, Serialize};

/// Task lifecycle status as reported by the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    ProcessingImage,
    ProcessingVideoQueued,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Per-task overrides; unset fields take the daemon defaults
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_fps: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_audio: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_enhancer: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub many_faces: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_quality: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_encoder: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub output_filename: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub output_filename: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    pub source_filename: String,
    pub target_filename: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchResponse {
    pub task_id: String,
    pub output_path: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskCounts {
    pub pending: usize,
    pub processing_image: usize,
    pub processing_video_queued: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceView {
    pub temperature_celsius: Option<f32>,
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub sampled_at: String,
    pub safe: bool,
    pub verdict: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsResponse {
    pub tasks: TaskCounts,
    pub uptime_seconds: u64,
    pub resources: ResourceView,
}
