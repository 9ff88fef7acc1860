// Executable task: one submitted job plus how it runs

use crate::application::pipeline::{remove_workdir, MediaPipeline};
use crate::domain::{Job, JobOptions, MediaKind, Task, TaskId};
use crate::port::TimeProvider;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

/// Shared task map. Each entry is mutated by exactly one execution context.
#[derive(Clone, Default)]
pub struct TaskStore {
    inner: Arc<Mutex<HashMap<TaskId, Task>>>,
}

impl TaskStore {
    fn lock(&self) -> MutexGuard<'_, HashMap<TaskId, Task>> {
        // a panicking writer cannot leave a Task half-updated; keep serving
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, task: Task) {
        self.lock().insert(task.id.clone(), task);
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        self.lock().get(id).cloned()
    }

    pub fn snapshot(&self) -> Vec<Task> {
        self.lock().values().cloned().collect()
    }

    /// Apply a lifecycle transition and return the updated task.
    ///
    /// Rejected transitions are logged and leave the task unchanged.
    pub fn update<F>(&self, id: &str, apply: F) -> Option<Task>
    where
        F: FnOnce(&mut Task) -> crate::domain::error::Result<()>,
    {
        let mut tasks = self.lock();
        let task = tasks.get_mut(id)?;
        if let Err(e) = apply(task) {
            warn!(task_id = %id, error = %e, "Rejected task transition");
        }
        Some(task.clone())
    }
}

/// Where a task's work runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// In the submitting context; `submit` returns a terminal task
    Immediate,
    /// On its own spawned unit; `submit` returns `processing_video_queued`
    Background,
}

impl ExecutionStrategy {
    pub fn for_kind(kind: MediaKind) -> Option<Self> {
        match kind {
            MediaKind::Image => Some(ExecutionStrategy::Immediate),
            MediaKind::Video => Some(ExecutionStrategy::Background),
            MediaKind::Unsupported => None,
        }
    }
}

/// Collaborators every execution needs
pub struct ExecutionContext {
    pub store: TaskStore,
    pub pipeline: Arc<MediaPipeline>,
    pub clock: Arc<dyn TimeProvider>,
}

/// A registered task ready to run.
///
/// The working directory is fixed at submission so cleanup never depends on
/// state another task may have changed.
pub struct ExecutableTask {
    pub task_id: TaskId,
    pub kind: MediaKind,
    pub job: Job,
    pub options: JobOptions,
    pub workdir: PathBuf,
}

impl ExecutableTask {
    /// Run to completion and return the terminal task.
    ///
    /// The work and its terminal transition live on a spawned unit, so a caller
    /// that stops waiting cannot leave the task in `processing_image`.
    pub async fn run_immediate(self, ctx: Arc<ExecutionContext>) -> Option<Task> {
        ctx.store
            .update(&self.task_id, |task| task.mark_processing_image())?;
        let task_id = self.task_id.clone();
        let unit_ctx = Arc::clone(&ctx);
        match tokio::spawn(async move { self.execute(&unit_ctx).await }).await {
            Ok(task) => task,
            Err(join_err) => {
                warn!(task_id = %task_id, error = %join_err, "Immediate task unit did not finish");
                ctx.store.get(&task_id)
            }
        }
    }

    /// Queue on a background unit; returns right after the queued transition
    pub fn spawn_background(self, ctx: Arc<ExecutionContext>) -> Option<(Task, JoinHandle<()>)> {
        let queued = ctx
            .store
            .update(&self.task_id, |task| task.mark_video_queued())?;
        let handle = tokio::spawn(async move {
            ctx.store.update(&self.task_id, |task| task.mark_processing());
            self.execute(&ctx).await;
        });
        Some((queued, handle))
    }

    async fn execute(self, ctx: &ExecutionContext) -> Option<Task> {
        let ExecutableTask {
            task_id,
            kind,
            job,
            options,
            workdir,
        } = self;

        let pipeline = Arc::clone(&ctx.pipeline);
        let unit_workdir = workdir.clone();
        // inner spawn turns a panic into a JoinError instead of unwinding through us
        let outcome = tokio::spawn(async move {
            pipeline.run(kind, &job, &unit_workdir, &options).await
        })
        .await;

        if kind == MediaKind::Video {
            remove_workdir(&workdir).await;
        }

        let now = ctx.clock.now_millis();
        match outcome {
            Ok(Ok(output)) => {
                info!(task_id = %task_id, output = %output.display(), "Task completed");
                ctx.store.update(&task_id, |task| task.complete(output, now))
            }
            Ok(Err(e)) => {
                error!(task_id = %task_id, error = %e, "Task failed");
                let message = e.to_string();
                ctx.store.update(&task_id, |task| task.fail(message, now))
            }
            Err(join_err) => {
                let message = describe_join_error(join_err);
                error!(task_id = %task_id, error = %message, "Task execution aborted");
                ctx.store.update(&task_id, |task| task.fail(message, now))
            }
        }
    }
}

fn describe_join_error(err: JoinError) -> String {
    if !err.is_panic() {
        return "task was cancelled".to_string();
    }
    let payload = err.into_panic();
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    format!("processing panicked: {}", message)
}
