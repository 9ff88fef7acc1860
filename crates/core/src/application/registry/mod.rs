//! TaskRegistry - submit one job, poll its lifecycle, fetch its output

mod executable;

pub use executable::{ExecutableTask, ExecutionContext, ExecutionStrategy, TaskStore};

use crate::application::pipeline::MediaPipeline;
use crate::domain::media::is_image;
use crate::domain::{DomainError, Job, JobOptions, MediaKind, Task, TaskStatus};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, TimeProvider};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// One submission
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub source: PathBuf,
    pub target: PathBuf,
    pub options: JobOptions,
}

impl SubmitRequest {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            options: JobOptions::default(),
        }
    }

    pub fn with_options(mut self, options: JobOptions) -> Self {
        self.options = options;
        self
    }
}

/// In-memory task registry. Tasks live for the process lifetime.
pub struct TaskRegistry {
    ctx: Arc<ExecutionContext>,
    ids: Arc<dyn IdProvider>,
    output_dir: PathBuf,
    temp_dir: PathBuf,
}

impl TaskRegistry {
    pub fn new(
        pipeline: Arc<MediaPipeline>,
        ids: Arc<dyn IdProvider>,
        clock: Arc<dyn TimeProvider>,
        output_dir: impl Into<PathBuf>,
        temp_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            ctx: Arc::new(ExecutionContext {
                store: TaskStore::default(),
                pipeline,
                clock,
            }),
            ids,
            output_dir: output_dir.into(),
            temp_dir: temp_dir.into(),
        }
    }

    /// Register and start a task.
    ///
    /// Images finish before this returns. Videos return `processing_video_queued`
    /// and finish on a background unit. Unsupported targets come back failed.
    ///
    /// # Errors
    /// - Validation: missing source/target, non-image source or invalid options (nothing registered)
    pub async fn submit(&self, request: SubmitRequest) -> Result<Task> {
        require_file(&request.source, "source").await?;
        require_file(&request.target, "target").await?;
        if !is_image(&request.source) {
            return Err(AppError::Validation(format!(
                "source is not a supported image: {}",
                request.source.display()
            )));
        }
        request
            .options
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let id = self.ids.generate_id();
        let now = self.ctx.clock.now_millis();
        let kind = MediaKind::classify(&request.target);
        let task = Task::new(id.clone(), now, kind, &request.source, &request.target);
        self.ctx.store.insert(task);
        info!(task_id = %id, kind = %kind, "Task submitted");

        let executable = ExecutableTask {
            task_id: id.clone(),
            kind,
            job: Job::new(
                &request.source,
                &request.target,
                self.output_path_for(&id, &request.target),
            ),
            options: request.options,
            workdir: self.temp_dir.join(&id),
        };

        let registered = match ExecutionStrategy::for_kind(kind) {
            Some(ExecutionStrategy::Immediate) => executable.run_immediate(Arc::clone(&self.ctx)).await,
            Some(ExecutionStrategy::Background) => executable
                .spawn_background(Arc::clone(&self.ctx))
                .map(|(queued, _handle)| queued),
            None => {
                warn!(task_id = %id, target_path = %request.target.display(), "Unsupported media type");
                let message = DomainError::UnsupportedMedia(request.target.clone()).to_string();
                let now = self.ctx.clock.now_millis();
                self.ctx.store.update(&id, |task| task.fail(message, now))
            }
        };

        registered.ok_or_else(|| AppError::Internal(format!("task {} missing after submit", id)))
    }

    pub fn status(&self, id: &str) -> Result<Task> {
        self.ctx
            .store
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("task {}", id)))
    }

    /// Path of a completed task's artifact
    ///
    /// # Errors
    /// - NotFound: unknown task, or the artifact has since disappeared
    /// - InvalidState: task is still running or failed
    pub async fn fetch_output(&self, id: &str) -> Result<PathBuf> {
        let task = self.status(id)?;
        if task.status != TaskStatus::Completed {
            return Err(AppError::InvalidState(format!(
                "task {} is {}, not completed",
                id, task.status
            )));
        }
        let output = task
            .output_path
            .ok_or_else(|| AppError::Internal(format!("completed task {} has no output", id)))?;
        match tokio::fs::metadata(&output).await {
            Ok(meta) if meta.is_file() => Ok(output),
            _ => Err(AppError::NotFound(format!(
                "output file {}",
                output.display()
            ))),
        }
    }

    /// Number of tasks per status
    pub fn counts(&self) -> BTreeMap<TaskStatus, usize> {
        let mut counts = BTreeMap::new();
        for task in self.ctx.store.snapshot() {
            *counts.entry(task.status).or_insert(0) += 1;
        }
        counts
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn output_path_for(&self, id: &str, target: &Path) -> PathBuf {
        let stem = target
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = target
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        self.output_dir
            .join(format!("{}_{}_swapped{}", stem, id, extension))
    }
}

async fn require_file(path: &Path, role: &str) -> Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => Err(AppError::Validation(format!(
            "{} file not found: {}",
            role,
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::engine::EngineHandle;
    use crate::port::id_provider::SequentialIdProvider;
    use crate::port::media_toolkit::mocks::MockMediaToolkit;
    use crate::port::time_provider::mocks::SteppingClock;
    use crate::port::transform_engine::mocks::MockTransformEngine;
    use std::fs;
    use std::time::Duration;

    struct Fixture {
        dir: tempfile::TempDir,
        registry: TaskRegistry,
    }

    impl Fixture {
        fn new(engine: MockTransformEngine) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let pipeline = Arc::new(MediaPipeline::new(
                Arc::new(EngineHandle::new(Arc::new(engine))),
                Arc::new(MockMediaToolkit::new(2)),
            ));
            let registry = TaskRegistry::new(
                pipeline,
                Arc::new(SequentialIdProvider::default()),
                Arc::new(SteppingClock::new(1_000, 10)),
                dir.path().join("outputs"),
                dir.path().join("tmp"),
            );
            Self { dir, registry }
        }

        fn file(&self, name: &str) -> PathBuf {
            let path = self.dir.path().join(name);
            fs::write(&path, b"data").unwrap();
            path
        }

        async fn wait_terminal(&self, id: &str) -> Task {
            for _ in 0..200 {
                let task = self.registry.status(id).unwrap();
                if task.is_terminal() {
                    return task;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            panic!("task {} never reached a terminal state", id);
        }
    }

    #[tokio::test]
    async fn test_image_submit_is_terminal_on_return() {
        let fx = Fixture::new(MockTransformEngine::new_success());
        let request = SubmitRequest::new(fx.file("face.png"), fx.file("photo.jpg"));

        let task = fx.registry.submit(request).await.unwrap();

        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.output_filename().as_deref(), Some("photo_task-1_swapped.jpg"));
        assert_eq!(task.created_at, 1_000);
        assert!(task.finished_at.is_some_and(|at| at > task.created_at));
        let output = fx.registry.fetch_output(&task.id).await.unwrap();
        assert!(output.exists());
    }

    #[tokio::test]
    async fn test_failed_image_carries_error() {
        let fx = Fixture::new(MockTransformEngine::new_fail("no face detected"));
        let request = SubmitRequest::new(fx.file("face.png"), fx.file("photo.png"));

        let task = fx.registry.submit(request).await.unwrap();

        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error.unwrap().contains("no face detected"));
        assert!(matches!(
            fx.registry.fetch_output(&task.id).await,
            Err(AppError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_video_submit_queues_then_completes() {
        let fx = Fixture::new(
            MockTransformEngine::new_success().with_delay(Duration::from_millis(50)),
        );
        let request = SubmitRequest::new(fx.file("face.png"), fx.file("clip.mp4"));

        let task = fx.registry.submit(request).await.unwrap();
        assert_eq!(task.status, TaskStatus::ProcessingVideoQueued);
        assert!(matches!(
            fx.registry.fetch_output(&task.id).await,
            Err(AppError::InvalidState(_))
        ));

        let done = fx.wait_terminal(&task.id).await;
        assert_eq!(done.status, TaskStatus::Completed);
        assert!(!fx.dir.path().join("tmp").join(&task.id).exists());
        assert!(fx.registry.fetch_output(&task.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_video_panic_becomes_failed_task() {
        let fx = Fixture::new(MockTransformEngine::new_panic_inducing("engine exploded"));
        let request = SubmitRequest::new(fx.file("face.png"), fx.file("clip.mov"));

        let task = fx.registry.submit(request).await.unwrap();
        let done = fx.wait_terminal(&task.id).await;

        assert_eq!(done.status, TaskStatus::Failed);
        assert!(done.error.unwrap().contains("engine exploded"));
        assert!(!fx.dir.path().join("tmp").join(&task.id).exists());
    }

    #[tokio::test]
    async fn test_unsupported_kind_fails_without_execution() {
        let fx = Fixture::new(MockTransformEngine::new_success());
        let request = SubmitRequest::new(fx.file("face.png"), fx.file("notes.txt"));

        let task = fx.registry.submit(request).await.unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error.unwrap().contains("unsupported media type"));
    }

    #[tokio::test]
    async fn test_missing_files_register_nothing() {
        let fx = Fixture::new(MockTransformEngine::new_success());
        let request = SubmitRequest::new(fx.file("face.png"), fx.dir.path().join("gone.mp4"));

        assert!(matches!(
            fx.registry.submit(request).await,
            Err(AppError::Validation(_))
        ));
        assert!(fx.registry.counts().is_empty());
    }

    #[tokio::test]
    async fn test_non_image_source_registers_nothing() {
        let fx = Fixture::new(MockTransformEngine::new_success());
        let request = SubmitRequest::new(fx.file("face.mp4"), fx.file("photo.jpg"));

        let err = fx.registry.submit(request).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("face.mp4"));
        assert!(fx.registry.counts().is_empty());
    }

    #[tokio::test]
    async fn test_abandoned_image_submit_still_reaches_terminal_state() {
        let fx = Fixture::new(
            MockTransformEngine::new_success().with_delay(Duration::from_millis(100)),
        );
        let request = SubmitRequest::new(fx.file("face.png"), fx.file("photo.jpg"));

        let abandoned =
            tokio::time::timeout(Duration::from_millis(20), fx.registry.submit(request)).await;
        assert!(abandoned.is_err());
        assert_eq!(
            fx.registry.status("task-1").unwrap().status,
            TaskStatus::ProcessingImage
        );

        let done = fx.wait_terminal("task-1").await;
        assert_eq!(done.status, TaskStatus::Completed);
        assert!(fx.registry.fetch_output("task-1").await.unwrap().exists());
    }

    #[tokio::test]
    async fn test_unknown_task_is_not_found() {
        let fx = Fixture::new(MockTransformEngine::new_success());
        assert!(matches!(fx.registry.status("nope"), Err(AppError::NotFound(_))));
        assert!(matches!(
            fx.registry.fetch_output("nope").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_videos_with_same_name_keep_separate_workdirs() {
        let fx = Fixture::new(
            MockTransformEngine::new_success().with_delay(Duration::from_millis(20)),
        );
        let source = fx.file("face.png");
        fs::create_dir_all(fx.dir.path().join("a")).unwrap();
        fs::create_dir_all(fx.dir.path().join("b")).unwrap();
        let first = fx.file("a/clip.mp4");
        let second = fx.file("b/clip.mp4");

        let t1 = fx.registry.submit(SubmitRequest::new(&source, first)).await.unwrap();
        let t2 = fx.registry.submit(SubmitRequest::new(&source, second)).await.unwrap();

        assert_eq!(fx.wait_terminal(&t1.id).await.status, TaskStatus::Completed);
        assert_eq!(fx.wait_terminal(&t2.id).await.status, TaskStatus::Completed);
        assert_ne!(
            fx.registry.fetch_output(&t1.id).await.unwrap(),
            fx.registry.fetch_output(&t2.id).await.unwrap()
        );
        assert_eq!(fx.registry.counts().get(&TaskStatus::Completed), Some(&2));
    }
}
