// Media I/O port: frame extraction, video assembly, audio restoration

use crate::domain::JobOptions;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Media toolkit errors
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("{program} failed: {stderr}")]
    CommandFailed { program: String, stderr: String },

    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("{program} timed out after {timeout_ms}ms")]
    Timeout { program: String, timeout_ms: u64 },

    #[error("No frames extracted from {0}")]
    NoFrames(String),

    #[error("Invalid tool output: {0}")]
    InvalidOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Media toolkit trait
///
/// The pipeline calls it in a fixed order:
/// extract_frames → (engine) → assemble_video → restore_audio | move_artifact
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Decode `target` into numbered frames inside `workdir`
    async fn extract_frames(
        &self,
        target: &Path,
        workdir: &Path,
        keep_fps: bool,
    ) -> Result<Vec<PathBuf>, MediaError>;

    /// Frame rate of `target`
    async fn detect_fps(&self, target: &Path) -> Result<f64, MediaError>;

    /// Encode the frames in `workdir` into a silent video, returning its path
    async fn assemble_video(
        &self,
        workdir: &Path,
        fps: f64,
        options: &JobOptions,
    ) -> Result<PathBuf, MediaError>;

    /// Mux the audio track of `target` with `video` into `destination`
    async fn restore_audio(
        &self,
        target: &Path,
        video: &Path,
        destination: &Path,
    ) -> Result<(), MediaError>;

    /// Move a finished artifact to `destination`
    async fn move_artifact(&self, from: &Path, destination: &Path) -> Result<(), MediaError> {
        if tokio::fs::rename(from, destination).await.is_err() {
            // cross-device: copy then drop the original
            tokio::fs::copy(from, destination).await?;
            tokio::fs::remove_file(from).await?;
        }
        Ok(())
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::port::transform_engine::mocks::Journal;

    /// Writes real placeholder files so the pipeline's output checks work
    pub struct MockMediaToolkit {
        frame_count: usize,
        fps: f64,
        fail_audio: bool,
        skip_output: bool,
        journal: Journal,
    }

    impl MockMediaToolkit {
        pub fn new(frame_count: usize) -> Self {
            Self {
                frame_count,
                fps: 25.0,
                fail_audio: false,
                skip_output: false,
                journal: Journal::default(),
            }
        }

        /// restore_audio errors, forcing the silent-video fallback
        pub fn failing_audio(mut self) -> Self {
            self.fail_audio = true;
            self
        }

        /// Report success without writing the destination artifact
        pub fn skipping_output(mut self) -> Self {
            self.skip_output = true;
            self
        }

        pub fn with_journal(mut self, journal: Journal) -> Self {
            self.journal = journal;
            self
        }

        pub fn journal(&self) -> Vec<String> {
            self.journal.lock().unwrap().clone()
        }

        fn record(&self, entry: impl Into<String>) {
            self.journal.lock().unwrap().push(entry.into());
        }
    }

    #[async_trait]
    impl MediaToolkit for MockMediaToolkit {
        async fn extract_frames(
            &self,
            _target: &Path,
            workdir: &Path,
            _keep_fps: bool,
        ) -> Result<Vec<PathBuf>, MediaError> {
            self.record("extract");
            let mut frames = Vec::with_capacity(self.frame_count);
            for i in 1..=self.frame_count {
                let frame = workdir.join(format!("{:04}.png", i));
                tokio::fs::write(&frame, b"frame").await?;
                frames.push(frame);
            }
            Ok(frames)
        }

        async fn detect_fps(&self, _target: &Path) -> Result<f64, MediaError> {
            self.record("detect_fps");
            Ok(self.fps)
        }

        async fn assemble_video(
            &self,
            workdir: &Path,
            fps: f64,
            _options: &JobOptions,
        ) -> Result<PathBuf, MediaError> {
            self.record(format!("assemble:{}", fps));
            let video = workdir.join("temp.mp4");
            tokio::fs::write(&video, b"video").await?;
            Ok(video)
        }

        async fn restore_audio(
            &self,
            _target: &Path,
            video: &Path,
            destination: &Path,
        ) -> Result<(), MediaError> {
            self.record("restore_audio");
            if self.fail_audio {
                return Err(MediaError::CommandFailed {
                    program: "ffmpeg".to_string(),
                    stderr: "no audio stream".to_string(),
                });
            }
            if !self.skip_output {
                tokio::fs::copy(video, destination).await?;
            }
            Ok(())
        }

        async fn move_artifact(&self, from: &Path, destination: &Path) -> Result<(), MediaError> {
            self.record("move");
            if !self.skip_output {
                tokio::fs::rename(from, destination).await?;
            }
            Ok(())
        }
    }
}
