//! MediaPipeline - drives one job through the media and engine collaborators
//!
//! Video: extract → transform → assemble → (restore audio | move)
//! Image: copy → transform in place

use crate::application::constants::DEFAULT_FPS;
use crate::application::engine::EngineHandle;
use crate::domain::{DomainError, Job, JobOptions, MediaKind};
use crate::error::{AppError, Result};
use crate::port::{ArtifactSet, MediaError, MediaToolkit, TransformRequest};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct MediaPipeline {
    engine: Arc<EngineHandle>,
    media: Arc<dyn MediaToolkit>,
    default_fps: f64,
}

impl MediaPipeline {
    pub fn new(engine: Arc<EngineHandle>, media: Arc<dyn MediaToolkit>) -> Self {
        Self {
            engine,
            media,
            default_fps: DEFAULT_FPS,
        }
    }

    pub fn with_default_fps(mut self, fps: f64) -> Self {
        self.default_fps = fps;
        self
    }

    pub fn engine(&self) -> &Arc<EngineHandle> {
        &self.engine
    }

    /// Dispatch on media kind. `workdir` is only touched for video.
    pub async fn run(
        &self,
        kind: MediaKind,
        job: &Job,
        workdir: &Path,
        options: &JobOptions,
    ) -> Result<PathBuf> {
        match kind {
            MediaKind::Image => self.run_image(job, options).await,
            MediaKind::Video => self.run_video(job, workdir, options).await,
            MediaKind::Unsupported => Err(DomainError::UnsupportedMedia(job.target.clone()).into()),
        }
    }

    pub async fn run_video(&self, job: &Job, workdir: &Path, options: &JobOptions) -> Result<PathBuf> {
        info!(job = %job.display_name(), "Processing video");
        tokio::fs::create_dir_all(workdir).await?;
        ensure_parent(&job.destination).await?;

        let frames = self
            .media
            .extract_frames(&job.target, workdir, options.keep_fps)
            .await?;
        if frames.is_empty() {
            return Err(MediaError::NoFrames(job.target.display().to_string()).into());
        }
        debug!(frames = frames.len(), "Frames extracted");

        let artifacts = ArtifactSet::Frames {
            dir: workdir.to_path_buf(),
            frames,
        };
        self.engine
            .process(TransformRequest {
                source: &job.source,
                target: &job.target,
                artifacts: &artifacts,
                options,
            })
            .await?;

        let fps = if options.keep_fps {
            match self.media.detect_fps(&job.target).await {
                Ok(fps) => fps,
                Err(e) => {
                    warn!(error = %e, fallback = self.default_fps, "FPS detection failed");
                    self.default_fps
                }
            }
        } else {
            self.default_fps
        };
        debug!(fps, "Assembling video");
        let video = self.media.assemble_video(workdir, fps, options).await?;

        if options.keep_audio {
            if let Err(e) = self
                .media
                .restore_audio(&job.target, &video, &job.destination)
                .await
            {
                warn!(error = %e, "Audio restore failed, keeping silent video");
                self.media.move_artifact(&video, &job.destination).await?;
            }
        } else {
            self.media.move_artifact(&video, &job.destination).await?;
        }

        verify_output(&job.destination).await
    }

    pub async fn run_image(&self, job: &Job, options: &JobOptions) -> Result<PathBuf> {
        info!(job = %job.display_name(), "Processing image");
        ensure_parent(&job.destination).await?;
        tokio::fs::copy(&job.target, &job.destination).await?;

        let artifacts = ArtifactSet::Image(job.destination.clone());
        let processed = self
            .engine
            .process(TransformRequest {
                source: &job.source,
                target: &job.target,
                artifacts: &artifacts,
                options,
            })
            .await;
        if let Err(e) = processed {
            // never leave an untransformed copy behind as if it were output
            let _ = tokio::fs::remove_file(&job.destination).await;
            return Err(e.into());
        }

        verify_output(&job.destination).await
    }
}

/// Delete a per-job working directory. Missing directories are fine.
pub async fn remove_workdir(workdir: &Path) {
    match tokio::fs::remove_dir_all(workdir).await {
        Ok(()) => debug!(workdir = %workdir.display(), "Working directory removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(workdir = %workdir.display(), error = %e, "Failed to remove working directory"),
    }
}

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

async fn verify_output(destination: &Path) -> Result<PathBuf> {
    match tokio::fs::metadata(destination).await {
        Ok(meta) if meta.is_file() => Ok(destination.to_path_buf()),
        _ => Err(AppError::MissingOutput(destination.display().to_string())),
    }
}
