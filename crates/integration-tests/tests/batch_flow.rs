//! Batch runs across a real directory tree with scripted host readings

use facebatch_core::application::{
    BatchOptions, BatchOrchestrator, CooldownScheduler, EngineHandle, MediaPipeline,
    ThrottleController,
};
use facebatch_core::domain::{BatchResult, ResourceSnapshot, SafetyThresholds};
use facebatch_core::port::media_toolkit::mocks::MockMediaToolkit;
use facebatch_core::port::prompt::FixedPrompt;
use facebatch_core::port::resource_monitor::mocks::{calm, reading, ScriptedResourceMonitor};
use facebatch_core::port::system_action::mocks::RecordingSystemAction;
use facebatch_core::port::transform_engine::mocks::MockTransformEngine;
use facebatch_core::port::{ResourceMonitor, SystemActionKind};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct World {
    dir: TempDir,
    engine: Arc<MockTransformEngine>,
    action: Arc<RecordingSystemAction>,
    monitor: Arc<ScriptedResourceMonitor>,
    orchestrator: BatchOrchestrator,
}

fn world(engine: MockTransformEngine, readings: Vec<ResourceSnapshot>, thresholds: SafetyThresholds) -> World {
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(engine);
    let action = Arc::new(RecordingSystemAction::new());
    let monitor = Arc::new(ScriptedResourceMonitor::new(readings));
    let shared: Arc<dyn ResourceMonitor> = monitor.clone();

    let pipeline = Arc::new(MediaPipeline::new(
        Arc::new(EngineHandle::new(engine.clone())),
        Arc::new(MockMediaToolkit::new(3)),
    ));
    let orchestrator = BatchOrchestrator::new(
        pipeline,
        ThrottleController::new(shared.clone(), Arc::new(thresholds)),
        CooldownScheduler::new(shared.clone(), action.clone()).with_settle_delay(Duration::ZERO),
        shared,
        Arc::new(FixedPrompt(false)),
    );

    World {
        dir,
        engine,
        action,
        monitor,
        orchestrator,
    }
}

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"data").unwrap();
}

fn names(paths: &[std::path::PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn nested_tree_is_mirrored_and_previous_outputs_are_skipped() {
    let w = world(MockTransformEngine::new_success(), vec![calm()], SafetyThresholds::default());
    let root = w.dir.path();
    let input = root.join("videos");
    let output = input.join("videos-swapped");

    touch(&root.join("face.jpg"));
    touch(&input.join("1.2万-top.mp4"));
    touch(&input.join("dance/300-small.MOV"));
    touch(&input.join("dance/notes.txt"));
    touch(&input.join("clip.webm"));
    // left over from an earlier run
    touch(&output.join("old-swapped.mp4"));

    let mut options = BatchOptions::new(root.join("face.jpg"), &input, &output);
    options.rest = Duration::from_secs(4);
    options.temp_dir = root.join("work");

    let outcome = w.orchestrator.run(&options).await.unwrap();

    assert_eq!(outcome.jobs_found, 2);
    assert_eq!(outcome.result, BatchResult { success_count: 2, failure_count: 0 });
    assert_eq!(names(&w.engine.processed_targets()), vec!["1.2万-top.mp4", "300-small.MOV"]);
    assert!(output.join("1.2万-top-swapped.mp4").is_file());
    assert!(output.join("dance/300-small-swapped.mp4").is_file());
    // workdirs removed after success
    assert!(!root.join("work/0001-1.2万-top").exists());
    assert!(!root.join("work/0002-300-small").exists());
}

#[tokio::test(start_paused = true)]
async fn non_recursive_run_ignores_subdirectories() {
    let w = world(MockTransformEngine::new_success(), vec![calm()], SafetyThresholds::default());
    let root = w.dir.path();
    let input = root.join("videos");
    touch(&root.join("face.png"));
    touch(&input.join("top.mp4"));
    touch(&input.join("sub/deep.mp4"));

    let mut options = BatchOptions::new(root.join("face.png"), &input, root.join("out"));
    options.recursive = false;
    options.temp_dir = root.join("work");

    let outcome = w.orchestrator.run(&options).await.unwrap();

    assert_eq!(outcome.jobs_found, 1);
    assert_eq!(names(&w.engine.processed_targets()), vec!["top.mp4"]);
}

#[tokio::test(start_paused = true)]
async fn hot_host_waits_then_continues_with_cooldowns() {
    let hot = reading(Some(82.0), 50.0, 40.0);
    // preflight, throttle check (hot), re-check (calm), then calm forever
    let w = world(
        MockTransformEngine::new_success(),
        vec![calm(), hot, calm()],
        SafetyThresholds::default(),
    );
    let root = w.dir.path();
    let input = root.join("videos");
    touch(&root.join("face.png"));
    touch(&input.join("2-b.mp4"));
    touch(&input.join("9-a.mp4"));

    let mut options = BatchOptions::new(root.join("face.png"), &input, root.join("out"));
    options.rest = Duration::from_secs(60);
    options.temp_dir = root.join("work");

    let started = tokio::time::Instant::now();
    let outcome = w.orchestrator.run(&options).await.unwrap();

    assert_eq!(outcome.result.success_count, 2);
    assert!(outcome.aborted.is_none());
    // one 30s throttle wait plus one 60s rest
    assert!(started.elapsed() >= Duration::from_secs(90));
    // one cooldown reclaim between jobs, one final
    assert_eq!(w.action.count(SystemActionKind::ReclaimMemory), 2);
    assert!(w.monitor.sample_count() >= 4);
}

#[tokio::test(start_paused = true)]
async fn persistent_overload_escalates_and_keeps_finished_work() {
    let thresholds = SafetyThresholds {
        max_wait_cycles: Some(3),
        ..Default::default()
    };
    let overloaded = reading(None, 99.0, 40.0);
    let w = world(
        MockTransformEngine::new_success(),
        vec![calm(), overloaded],
        thresholds,
    );
    let root = w.dir.path();
    let input = root.join("videos");
    touch(&root.join("face.png"));
    touch(&input.join("3-a.mp4"));
    touch(&input.join("2-b.mp4"));
    touch(&input.join("1-c.mp4"));

    let mut options = BatchOptions::new(root.join("face.png"), &input, root.join("out"));
    options.temp_dir = root.join("work");

    let outcome = w.orchestrator.run(&options).await.unwrap();

    assert_eq!(outcome.result, BatchResult { success_count: 1, failure_count: 0 });
    assert_eq!(w.engine.process_calls(), 1);
    let reason = outcome.aborted.expect("batch should abort");
    assert!(reason.contains("CPU"));
    // final reclaim still runs
    assert!(outcome.final_reclaim.is_some());
}
