// ffmpeg/ffprobe media toolkit
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use facebatch_core::config::MediaConfig;
use facebatch_core::domain::JobOptions;
use facebatch_core::port::{MediaError, MediaToolkit};

use crate::command::{default_env_allowlist, CommandError, CommandRunner};

/// Frame file pattern inside a working directory
const FRAME_PATTERN: &str = "%04d.png";
const FRAME_EXTENSION: &str = "png";
const ASSEMBLED_VIDEO: &str = "temp.mp4";

/// Encoders that take a CRF quality value
const CRF_ENCODERS: &[&str] = &["libx264", "libx265", "libvpx-vp9"];

pub struct FfmpegMediaToolkit {
    ffmpeg: String,
    ffprobe: String,
    default_fps: f64,
    video_encoder: String,
    runner: CommandRunner,
}

impl FfmpegMediaToolkit {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg.clone(),
            ffprobe: config.ffprobe.clone(),
            default_fps: config.default_fps,
            video_encoder: config.video_encoder.clone(),
            runner: CommandRunner::new(
                default_env_allowlist(),
                Duration::from_secs(config.timeout_secs),
            ),
        }
    }

    async fn run(&self, program: &str, args: Vec<String>) -> Result<String, MediaError> {
        let output = self
            .runner
            .run(program, &args, None)
            .await
            .map_err(|e| match e {
                CommandError::Timeout { program, timeout_ms } => {
                    MediaError::Timeout { program, timeout_ms }
                }
                other => MediaError::SpawnFailed(other.to_string()),
            })?;
        if !output.success {
            return Err(MediaError::CommandFailed {
                program: program.to_string(),
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output.stdout)
    }

    fn extract_args(&self, target: &Path, workdir: &Path, keep_fps: bool) -> Vec<String> {
        let mut args = ffmpeg_prelude();
        args.extend(["-i".to_string(), path_arg(target)]);
        args.extend(["-pix_fmt".to_string(), "rgb24".to_string()]);
        if !keep_fps {
            args.extend(["-vf".to_string(), format!("fps={}", self.default_fps)]);
        }
        args.push(path_arg(&workdir.join(FRAME_PATTERN)));
        args
    }

    fn assemble_args(&self, workdir: &Path, fps: f64, options: &JobOptions) -> Vec<String> {
        let encoder = options
            .video_encoder
            .clone()
            .unwrap_or_else(|| self.video_encoder.clone());

        let mut args = ffmpeg_prelude();
        args.extend(["-r".to_string(), fps.to_string()]);
        args.extend(["-i".to_string(), path_arg(&workdir.join(FRAME_PATTERN))]);
        args.extend(["-c:v".to_string(), encoder.clone()]);
        if CRF_ENCODERS.contains(&encoder.as_str()) {
            args.extend(["-crf".to_string(), options.video_quality.to_string()]);
        }
        args.extend([
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-y".to_string(),
            path_arg(&workdir.join(ASSEMBLED_VIDEO)),
        ]);
        args
    }

    fn restore_audio_args(target: &Path, video: &Path, destination: &Path) -> Vec<String> {
        let mut args = ffmpeg_prelude();
        args.extend([
            "-i".to_string(),
            path_arg(video),
            "-i".to_string(),
            path_arg(target),
            "-c:v".to_string(),
            "copy".to_string(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "1:a:0".to_string(),
            "-y".to_string(),
            path_arg(destination),
        ]);
        args
    }
}

#[async_trait]
impl MediaToolkit for FfmpegMediaToolkit {
    async fn extract_frames(
        &self,
        target: &Path,
        workdir: &Path,
        keep_fps: bool,
    ) -> Result<Vec<PathBuf>, MediaError> {
        tokio::fs::create_dir_all(workdir).await?;
        self.run(&self.ffmpeg, self.extract_args(target, workdir, keep_fps))
            .await?;

        let mut frames = Vec::new();
        let mut entries = tokio::fs::read_dir(workdir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(FRAME_EXTENSION) {
                frames.push(path);
            }
        }
        frames.sort();
        debug!(frames = frames.len(), workdir = %workdir.display(), "Frames extracted");
        Ok(frames)
    }

    async fn detect_fps(&self, target: &Path) -> Result<f64, MediaError> {
        let stdout = self
            .run(
                &self.ffprobe,
                vec![
                    "-v".to_string(),
                    "error".to_string(),
                    "-select_streams".to_string(),
                    "v:0".to_string(),
                    "-show_entries".to_string(),
                    "stream=r_frame_rate".to_string(),
                    "-of".to_string(),
                    "default=noprint_wrappers=1:nokey=1".to_string(),
                    path_arg(target),
                ],
            )
            .await?;
        parse_frame_rate(&stdout)
            .ok_or_else(|| MediaError::InvalidOutput(format!("frame rate '{}'", stdout.trim())))
    }

    async fn assemble_video(
        &self,
        workdir: &Path,
        fps: f64,
        options: &JobOptions,
    ) -> Result<PathBuf, MediaError> {
        self.run(&self.ffmpeg, self.assemble_args(workdir, fps, options))
            .await?;
        Ok(workdir.join(ASSEMBLED_VIDEO))
    }

    async fn restore_audio(
        &self,
        target: &Path,
        video: &Path,
        destination: &Path,
    ) -> Result<(), MediaError> {
        self.run(
            &self.ffmpeg,
            Self::restore_audio_args(target, video, destination),
        )
        .await
        .map(|_| ())
    }
}

fn ffmpeg_prelude() -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-hwaccel".to_string(),
        "auto".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
    ]
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Parse ffprobe's `r_frame_rate` ("30000/1001", "25/1" or "29.97")
pub fn parse_frame_rate(raw: &str) -> Option<f64> {
    let raw = raw.lines().next()?.trim();
    let fps = match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => raw.parse().ok()?,
    };
    Some(fps).filter(|f| f.is_finite() && *f > 0.0)
}
