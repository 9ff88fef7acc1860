//! BatchOrchestrator - sequential, throttled processing of a directory of videos

mod discovery;

pub use discovery::{discover_jobs, validate_inputs};

use crate::application::constants::{DEFAULT_REST_DURATION, PREFLIGHT_MEMORY_ADVISORY};
use crate::application::cooldown::{CooldownScheduler, ReclaimReport};
use crate::application::pipeline::{remove_workdir, MediaPipeline};
use crate::application::sequencer::{log_preview, order_jobs};
use crate::application::throttle::ThrottleController;
use crate::domain::{BatchResult, Job, JobOptions};
use crate::error::{AppError, Result};
use crate::port::{PreflightPrompt, ResourceMonitor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Inputs for one batch run. Passed by reference, never mutated by the run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub source: PathBuf,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub recursive: bool,
    /// Rest after a successful job; failures rest half as long
    pub rest: Duration,
    /// When false the post-job cooldown is skipped (throttling still applies)
    pub auto_clean: bool,
    pub job: JobOptions,
    /// Root for per-job working directories
    pub temp_dir: PathBuf,
}

impl BatchOptions {
    pub fn new(
        source: impl Into<PathBuf>,
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            recursive: true,
            rest: DEFAULT_REST_DURATION,
            auto_clean: true,
            job: JobOptions::default(),
            temp_dir: std::env::temp_dir().join("facebatch"),
        }
    }
}

/// What a finished batch reports
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub result: BatchResult,
    pub jobs_found: usize,
    /// Final reclaim; absent when no job ran
    pub final_reclaim: Option<ReclaimReport>,
    /// Set when throttling escalated and the remaining jobs were abandoned
    pub aborted: Option<String>,
}

pub struct BatchOrchestrator {
    pipeline: Arc<MediaPipeline>,
    throttle: ThrottleController,
    cooldown: CooldownScheduler,
    monitor: Arc<dyn ResourceMonitor>,
    prompt: Arc<dyn PreflightPrompt>,
    preflight_advisory: f32,
}

impl BatchOrchestrator {
    pub fn new(
        pipeline: Arc<MediaPipeline>,
        throttle: ThrottleController,
        cooldown: CooldownScheduler,
        monitor: Arc<dyn ResourceMonitor>,
        prompt: Arc<dyn PreflightPrompt>,
    ) -> Self {
        Self {
            pipeline,
            throttle,
            cooldown,
            monitor,
            prompt,
            preflight_advisory: PREFLIGHT_MEMORY_ADVISORY,
        }
    }

    pub fn with_preflight_advisory(mut self, memory_percent: f32) -> Self {
        self.preflight_advisory = memory_percent;
        self
    }

    /// Run the whole batch.
    ///
    /// # Errors
    /// - Validation: bad source or input directory (nothing is attempted)
    /// - Engine: initialization failed
    ///
    /// Per-job failures are tallied, never returned.
    pub async fn run(&self, options: &BatchOptions) -> Result<BatchOutcome> {
        info!(
            source = %options.source.display(),
            input = %options.input_dir.display(),
            output = %options.output_dir.display(),
            recursive = options.recursive,
            face_enhancer = options.job.face_enhancer,
            keep_audio = options.job.keep_audio,
            keep_fps = options.job.keep_fps,
            "Starting batch"
        );

        validate_inputs(&options.source, &options.input_dir).await?;
        options
            .job
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        tokio::fs::create_dir_all(&options.output_dir).await?;

        let jobs = discover_jobs(
            &options.source,
            &options.input_dir,
            &options.output_dir,
            options.recursive,
        )
        .await?;
        if jobs.is_empty() {
            info!("No videos found, nothing to do");
            return Ok(BatchOutcome::default());
        }
        info!(count = jobs.len(), "Videos found");

        let ordered = order_jobs(&jobs);
        log_preview(&ordered);

        self.preflight().await;

        self.pipeline.engine().ensure_initialized().await?;

        let mut outcome = BatchOutcome {
            jobs_found: ordered.len(),
            ..Default::default()
        };
        let total = ordered.len();

        for (index, job) in ordered.iter().enumerate() {
            let position = index + 1;
            info!(position, total, job = %job.display_name(), "Processing job");

            let workdir = workdir_for(&options.temp_dir, position, job);
            let succeeded = match self.pipeline.run_video(job, &workdir, &options.job).await {
                Ok(output) => {
                    outcome.result.record_success();
                    info!(position, output = %output.display(), "Job completed");
                    if !options.job.keep_frames {
                        remove_workdir(&workdir).await;
                    }
                    true
                }
                Err(e) => {
                    outcome.result.record_failure();
                    error!(position, job = %job.display_name(), error = %e, "Job failed");
                    remove_workdir(&workdir).await;
                    false
                }
            };
            info!(
                success = outcome.result.success_count,
                failure = outcome.result.failure_count,
                "Running tally"
            );

            if position == total {
                break;
            }

            match self.throttle.wait_until_safe().await {
                Ok(_) => {}
                Err(e @ AppError::ThrottleEscalated { .. }) => {
                    error!(error = %e, remaining = total - position, "Aborting batch");
                    outcome.aborted = Some(e.to_string());
                    break;
                }
                Err(e) => return Err(e),
            }

            if options.auto_clean {
                if succeeded {
                    self.cooldown.rest(options.rest, true).await;
                } else {
                    self.cooldown.rest(options.rest / 2, true).await;
                }
            }
        }

        info!(
            success = outcome.result.success_count,
            failure = outcome.result.failure_count,
            output = %options.output_dir.display(),
            "Batch finished"
        );
        outcome.final_reclaim = Some(self.cooldown.reclaim().await);
        Ok(outcome)
    }

    async fn preflight(&self) {
        let memory = self.monitor.sample().await.memory_percent;
        info!(memory, "Pre-flight memory check");
        if memory <= self.preflight_advisory {
            return;
        }
        warn!(
            memory,
            advisory = self.preflight_advisory,
            "Memory load is high before starting"
        );
        if self.prompt.confirm_reclaim(memory).await {
            self.cooldown.reclaim().await;
        } else {
            info!("Pre-flight reclaim declined");
        }
    }
}

fn workdir_for(temp_dir: &Path, position: usize, job: &Job) -> PathBuf {
    let stem = job
        .target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    temp_dir.join(format!("{:04}-{}", position, stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::constants::RECLAIM_SETTLE_DURATION;
    use crate::application::engine::EngineHandle;
    use crate::domain::{ResourceSnapshot, SafetyThresholds};
    use crate::port::media_toolkit::mocks::MockMediaToolkit;
    use crate::port::prompt::FixedPrompt;
    use crate::port::resource_monitor::mocks::{reading, ScriptedResourceMonitor};
    use crate::port::system_action::mocks::RecordingSystemAction;
    use crate::port::transform_engine::mocks::{MockBehavior, MockTransformEngine};
    use crate::port::SystemActionKind;
    use std::fs;

    struct Harness {
        dir: tempfile::TempDir,
        engine: Arc<MockTransformEngine>,
        action: Arc<RecordingSystemAction>,
        orchestrator: BatchOrchestrator,
    }

    impl Harness {
        fn new(engine: MockTransformEngine, readings: Vec<ResourceSnapshot>) -> Self {
            Self::with_thresholds(engine, readings, SafetyThresholds::default(), true)
        }

        fn with_thresholds(
            engine: MockTransformEngine,
            readings: Vec<ResourceSnapshot>,
            thresholds: SafetyThresholds,
            accept_preflight: bool,
        ) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let engine = Arc::new(engine);
            let action = Arc::new(RecordingSystemAction::new());
            let monitor: Arc<dyn ResourceMonitor> =
                Arc::new(ScriptedResourceMonitor::new(readings));
            let pipeline = Arc::new(MediaPipeline::new(
                Arc::new(EngineHandle::new(engine.clone())),
                Arc::new(MockMediaToolkit::new(2)),
            ));
            let orchestrator = BatchOrchestrator::new(
                pipeline,
                ThrottleController::new(monitor.clone(), Arc::new(thresholds)),
                CooldownScheduler::new(monitor.clone(), action.clone()),
                monitor,
                Arc::new(FixedPrompt(accept_preflight)),
            );
            Self {
                dir,
                engine,
                action,
                orchestrator,
            }
        }

        fn options(&self, videos: &[&str]) -> BatchOptions {
            let root = self.dir.path();
            fs::write(root.join("face.png"), b"face").unwrap();
            let input = root.join("videos");
            fs::create_dir_all(&input).unwrap();
            for name in videos {
                fs::write(input.join(name), b"video").unwrap();
            }
            let mut options = BatchOptions::new(root.join("face.png"), input, root.join("out"));
            options.rest = Duration::from_secs(10);
            options.temp_dir = root.join("work");
            options
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_failing_job_is_tallied_not_raised() {
        let harness = Harness::new(MockTransformEngine::new_fail("no face"), vec![reading(None, 10.0, 40.0)]);
        let options = harness.options(&["only.mp4"]);

        let outcome = harness.orchestrator.run(&options).await.unwrap();

        assert_eq!(outcome.result, BatchResult { success_count: 0, failure_count: 1 });
        assert!(outcome.final_reclaim.is_some());
        // last job: no cooldown, only the final reclaim
        assert_eq!(harness.action.count(SystemActionKind::ReclaimMemory), 1);
        assert!(!options.temp_dir.join("0001-only").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_jobs_run_by_popularity_with_cooldowns_between() {
        let harness = Harness::new(
            MockTransformEngine::new_success().failing_on("broken"),
            vec![reading(None, 10.0, 40.0)],
        );
        let options = harness.options(&["200-a.mp4", "3万-b.mp4", "broken.mp4", "5千-c.mp4"]);

        let outcome = harness.orchestrator.run(&options).await.unwrap();

        assert_eq!(outcome.result, BatchResult { success_count: 3, failure_count: 1 });
        assert_eq!(outcome.jobs_found, 4);
        let order: Vec<String> = harness
            .engine
            .processed_targets()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(order, vec!["3万-b.mp4", "5千-c.mp4", "200-a.mp4", "broken.mp4"]);
        // three between-job cooldowns plus the final reclaim
        assert_eq!(harness.action.count(SystemActionKind::ReclaimMemory), 4);
        assert!(options.output_dir.join("3万-b-swapped.mp4").exists());
        assert!(!options.output_dir.join("broken-swapped.mp4").exists());
        assert_eq!(harness.engine.init_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_job_rests_half_duration_with_reclaim() {
        let harness = Harness::new(
            MockTransformEngine::new_success().failing_on("broken"),
            vec![reading(None, 10.0, 40.0)],
        );
        let options = harness.options(&["9万-broken.mp4", "1-fine.mp4"]);

        let started = tokio::time::Instant::now();
        let outcome = harness.orchestrator.run(&options).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(outcome.result, BatchResult { success_count: 1, failure_count: 1 });
        // cooldown after the failure plus the final reclaim
        assert_eq!(harness.action.count(SystemActionKind::ReclaimMemory), 2);
        let settles = RECLAIM_SETTLE_DURATION * 2;
        assert!(elapsed >= options.rest / 2 + settles, "elapsed {:?}", elapsed);
        assert!(elapsed < options.rest + settles, "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_auto_clean_skips_cooldown() {
        let harness = Harness::new(MockTransformEngine::new_success(), vec![reading(None, 10.0, 40.0)]);
        let mut options = harness.options(&["1-a.mp4", "2-b.mp4"]);
        options.auto_clean = false;

        let outcome = harness.orchestrator.run(&options).await.unwrap();
        assert_eq!(outcome.result.success_count, 2);
        assert_eq!(harness.action.count(SystemActionKind::ReclaimMemory), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_frames_retains_workdir() {
        let harness = Harness::new(MockTransformEngine::new_success(), vec![reading(None, 10.0, 40.0)]);
        let mut options = harness.options(&["clip.mp4"]);
        options.job.keep_frames = true;

        harness.orchestrator.run(&options).await.unwrap();
        assert!(options.temp_dir.join("0001-clip").join("0001.png").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_input_is_noop() {
        let harness = Harness::new(MockTransformEngine::new_success(), vec![reading(None, 10.0, 40.0)]);
        let options = harness.options(&[]);

        let outcome = harness.orchestrator.run(&options).await.unwrap();
        assert_eq!(outcome.result.total(), 0);
        assert!(outcome.final_reclaim.is_none());
        assert_eq!(harness.engine.init_calls(), 0);
        assert!(harness.action.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_source_fails_before_any_job() {
        let harness = Harness::new(MockTransformEngine::new_success(), vec![reading(None, 10.0, 40.0)]);
        let mut options = harness.options(&["a.mp4"]);
        options.source = harness.dir.path().join("missing.png");

        let err = harness.orchestrator.run(&options).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(harness.engine.process_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_init_failure_is_fatal() {
        let harness = Harness::new(
            MockTransformEngine::new(MockBehavior::FailInit("models missing".to_string())),
            vec![reading(None, 10.0, 40.0)],
        );
        let options = harness.options(&["a.mp4", "b.mp4"]);

        let err = harness.orchestrator.run(&options).await.unwrap_err();
        assert!(matches!(err, AppError::Engine(_)));
        assert_eq!(harness.engine.process_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_preflight_reclaim_when_memory_high_and_accepted() {
        let harness = Harness::new(MockTransformEngine::new_success(), vec![reading(None, 10.0, 80.0)]);
        let options = harness.options(&["a.mp4"]);

        harness.orchestrator.run(&options).await.unwrap();
        // pre-flight plus final
        assert_eq!(harness.action.count(SystemActionKind::ReclaimMemory), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_preflight_declined_does_not_block() {
        let harness = Harness::with_thresholds(
            MockTransformEngine::new_success(),
            vec![reading(None, 10.0, 80.0)],
            SafetyThresholds::default(),
            false,
        );
        let options = harness.options(&["a.mp4"]);

        let outcome = harness.orchestrator.run(&options).await.unwrap();
        assert_eq!(outcome.result.success_count, 1);
        assert_eq!(harness.action.count(SystemActionKind::ReclaimMemory), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_escalation_aborts_remaining_jobs() {
        let thresholds = SafetyThresholds {
            max_wait_cycles: Some(1),
            ..Default::default()
        };
        let harness = Harness::with_thresholds(
            MockTransformEngine::new_success(),
            vec![reading(None, 99.0, 40.0)],
            thresholds,
            true,
        );
        let options = harness.options(&["2-a.mp4", "1-b.mp4"]);

        let outcome = harness.orchestrator.run(&options).await.unwrap();
        assert_eq!(outcome.result, BatchResult { success_count: 1, failure_count: 0 });
        assert!(outcome.aborted.unwrap().contains("CPU"));
        assert!(outcome.final_reclaim.is_some());
        assert_eq!(harness.engine.process_calls(), 1);
    }
}
