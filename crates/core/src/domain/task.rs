// Task Domain Model (async request/poll lifecycle)

use crate::domain::error::{DomainError, Result};
use crate::domain::media::MediaKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Task ID (UUID v4)
pub type TaskId = String;

/// Task lifecycle status
///
/// pending → {processing_image | processing_video_queued → processing} → {completed | failed}
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
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

    fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, ProcessingImage)
                | (Pending, ProcessingVideoQueued)
                | (Pending, Failed)
                | (ProcessingImage, Completed)
                | (ProcessingImage, Failed)
                | (ProcessingVideoQueued, Processing)
                | (ProcessingVideoQueued, Completed)
                | (ProcessingVideoQueued, Failed)
                | (Processing, Completed)
                | (Processing, Failed)
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::ProcessingImage => "processing_image",
            TaskStatus::ProcessingVideoQueued => "processing_video_queued",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Task Entity
///
/// `output_path` is set only once completed, `error` only once failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub status: TaskStatus,
    pub media_kind: MediaKind,
    pub source: PathBuf,
    pub target: PathBuf,
    pub output_path: Option<PathBuf>,
    pub error: Option<String>,
    pub created_at: i64, // epoch ms
    pub finished_at: Option<i64>,
}

impl Task {
    /// Create a pending task
    ///
    /// # Arguments
    ///
    /// * `id` - Unique task ID (injected, not generated)
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        media_kind: MediaKind,
        source: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            status: TaskStatus::Pending,
            media_kind,
            source: source.into(),
            target: target.into(),
            output_path: None,
            error: None,
            created_at,
            finished_at: None,
        }
    }

    fn transition(&mut self, next: TaskStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn mark_processing_image(&mut self) -> Result<()> {
        self.transition(TaskStatus::ProcessingImage)
    }

    pub fn mark_video_queued(&mut self) -> Result<()> {
        self.transition(TaskStatus::ProcessingVideoQueued)
    }

    /// Background unit picked the task up
    pub fn mark_processing(&mut self) -> Result<()> {
        self.transition(TaskStatus::Processing)
    }

    pub fn complete(&mut self, output_path: impl Into<PathBuf>, now_millis: i64) -> Result<()> {
        self.transition(TaskStatus::Completed)?;
        self.output_path = Some(output_path.into());
        self.finished_at = Some(now_millis);
        Ok(())
    }

    pub fn fail(&mut self, message: impl Into<String>, now_millis: i64) -> Result<()> {
        self.transition(TaskStatus::Failed)?;
        self.error = Some(message.into());
        self.finished_at = Some(now_millis);
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn output_filename(&self) -> Option<String> {
        self.output_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|name| name.to_string_lossy().into_owned())
    }

    pub fn source_filename(&self) -> String {
        file_name_of(&self.source)
    }

    pub fn target_filename(&self) -> String {
        file_name_of(&self.target)
    }
}

fn file_name_of(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
