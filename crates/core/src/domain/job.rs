// Job Domain Model

use crate::domain::error::{DomainError, Result};
use crate::domain::priority::extract_priority_key;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::PathBuf;

/// Highest accepted encoder quality value (CRF scale)
pub const MAX_VIDEO_QUALITY: u8 = 51;

/// Default encoder quality
pub const DEFAULT_VIDEO_QUALITY: u8 = 18;

/// One unit of work: a source face applied to one target, written to one destination.
///
/// Jobs are immutable once enumerated. The ordering key is derived on demand and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub source: PathBuf,
    pub target: PathBuf,
    pub destination: PathBuf,
}

impl Job {
    pub fn new(
        source: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            destination: destination.into(),
        }
    }

    /// File name of the target, used for ordering and logs
    pub fn display_name(&self) -> Cow<'_, str> {
        self.target
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default()
    }

    /// Popularity key parsed from the display name (0 when absent)
    pub fn ordering_key(&self) -> f64 {
        extract_priority_key(&self.display_name())
    }
}

/// Per-job processing options.
///
/// Passed by value into every job or task invocation; never shared mutably.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobOptions {
    pub keep_fps: bool,
    pub keep_audio: bool,
    pub keep_frames: bool,
    pub face_enhancer: bool,
    pub many_faces: bool,
    pub video_quality: u8,
    pub video_encoder: Option<String>,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            keep_fps: true,
            keep_audio: true,
            keep_frames: false,
            face_enhancer: true,
            many_faces: false,
            video_quality: DEFAULT_VIDEO_QUALITY,
            video_encoder: None,
        }
    }
}

impl JobOptions {
    /// Frame processors the engine should apply, in order
    pub fn frame_processors(&self) -> Vec<&'static str> {
        if self.face_enhancer {
            vec!["face_swapper", "face_enhancer"]
        } else {
            vec!["face_swapper"]
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.video_quality > MAX_VIDEO_QUALITY {
            return Err(DomainError::ValidationError(format!(
                "video_quality {} out of range 0-{}",
                self.video_quality, MAX_VIDEO_QUALITY
            )));
        }
        Ok(())
    }
}
