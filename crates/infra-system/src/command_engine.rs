// Transformation engine driven through an external program
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use facebatch_core::config::EngineConfig;
use facebatch_core::port::{ArtifactSet, EngineError, TransformEngine, TransformRequest};

use crate::command::{default_env_allowlist, render_args, CommandError, CommandRunner};

pub struct CommandTransformEngine {
    config: EngineConfig,
    runner: CommandRunner,
}

impl CommandTransformEngine {
    pub fn new(config: EngineConfig) -> Self {
        let runner = CommandRunner::new(
            default_env_allowlist(),
            Duration::from_secs(config.timeout_secs),
        );
        Self { config, runner }
    }

    fn process_args(&self, request: &TransformRequest<'_>) -> Vec<String> {
        let options = request.options;
        let (templates, target, frames_dir): (&[String], &Path, String) = match request.artifacts {
            ArtifactSet::Image(path) => (&self.config.image_args, path.as_path(), String::new()),
            ArtifactSet::Frames { dir, .. } => (
                &self.config.frames_args,
                request.target,
                dir.to_string_lossy().into_owned(),
            ),
        };

        let mut args = render_args(
            templates,
            &[
                ("source", request.source.to_string_lossy().into_owned()),
                ("target", target.to_string_lossy().into_owned()),
                ("frames_dir", frames_dir),
                ("quality", options.video_quality.to_string()),
                ("processors", options.frame_processors().join(",")),
            ],
        );
        if options.many_faces {
            args.push("--many-faces".to_string());
        }
        args
    }

    /// Run the engine program; `failure` builds the error for a failed run
    async fn invoke(
        &self,
        args: &[String],
        failure: fn(String) -> EngineError,
    ) -> Result<(), EngineError> {
        match self.runner.run(&self.config.program, args, None).await {
            Ok(output) if output.success => Ok(()),
            Ok(output) => Err(failure(format!(
                "exit {:?}: {}",
                output.exit_code,
                output.stderr.trim()
            ))),
            Err(CommandError::Timeout { timeout_ms, .. }) => Err(EngineError::Timeout(timeout_ms)),
            Err(e) => Err(failure(e.to_string())),
        }
    }
}

#[async_trait]
impl TransformEngine for CommandTransformEngine {
    async fn initialize(&self) -> Result<(), EngineError> {
        if self.config.init_args.is_empty() {
            return Ok(());
        }
        info!(program = %self.config.program, "Checking engine models");
        self.invoke(&self.config.init_args, EngineError::Initialization)
            .await
    }

    async fn process(&self, request: TransformRequest<'_>) -> Result<(), EngineError> {
        let args = self.process_args(&request);
        self.invoke(&args, EngineError::Processing)
            .await
            .map_err(|e| {
                warn!(target_path = %request.target.display(), error = %e, "Engine run failed");
                e
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facebatch_core::domain::JobOptions;
    use std::path::PathBuf;

    fn engine(program: &str) -> CommandTransformEngine {
        CommandTransformEngine::new(EngineConfig {
            program: program.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_frames_args_are_rendered() {
        let artifacts = ArtifactSet::Frames {
            dir: PathBuf::from("/tmp/work/1"),
            frames: vec![],
        };
        let options = JobOptions {
            many_faces: true,
            ..Default::default()
        };
        let request = TransformRequest {
            source: Path::new("/in/face.png"),
            target: Path::new("/in/clip.mp4"),
            artifacts: &artifacts,
            options: &options,
        };

        let args = engine("engine").process_args(&request);
        assert_eq!(
            args,
            vec![
                "--source",
                "/in/face.png",
                "--frames",
                "/tmp/work/1",
                "--processors",
                "face_swapper,face_enhancer",
                "--quality",
                "18",
                "--many-faces"
            ]
        );
    }

    #[test]
    fn test_image_args_target_the_copied_artifact() {
        let artifacts = ArtifactSet::Image(PathBuf::from("/out/photo_t1_swapped.jpg"));
        let options = JobOptions {
            face_enhancer: false,
            ..Default::default()
        };
        let request = TransformRequest {
            source: Path::new("/in/face.png"),
            target: Path::new("/in/photo.jpg"),
            artifacts: &artifacts,
            options: &options,
        };

        let args = engine("engine").process_args(&request);
        assert!(args.contains(&"/out/photo_t1_swapped.jpg".to_string()));
        assert!(args.contains(&"face_swapper".to_string()));
    }

    #[tokio::test]
    async fn test_failing_program_maps_to_processing_error() {
        let artifacts = ArtifactSet::Image(PathBuf::from("/nonexistent.jpg"));
        let options = JobOptions::default();
        let request = TransformRequest {
            source: Path::new("/in/face.png"),
            target: Path::new("/in/photo.jpg"),
            artifacts: &artifacts,
            options: &options,
        };

        let result = engine("false").process(request).await;
        assert!(matches!(result, Err(EngineError::Processing(_))));
    }

    #[tokio::test]
    async fn test_missing_program_fails_initialization() {
        let result = engine("/no/such/engine").initialize().await;
        assert!(matches!(result, Err(EngineError::Initialization(_))));
    }
}
