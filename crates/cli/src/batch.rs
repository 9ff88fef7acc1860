//! `facebatch run`: batch face-swap over a directory of videos

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tabled::{Table, Tabled};

use facebatch_core::application::batch::discover_jobs;
use facebatch_core::application::{
    BatchOptions, BatchOrchestrator, BatchOutcome, CooldownScheduler, EngineHandle, MediaPipeline,
    ThrottleController,
};
use facebatch_core::domain::media::is_image;
use facebatch_core::domain::job::MAX_VIDEO_QUALITY;
use facebatch_core::AppConfig;
use facebatch_infra_system::Adapters;

use crate::prompt::{is_affirmative, is_negative, read_line, StdinPrompt};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Source face image
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Directory of videos to process
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output directory (mirrors the input tree)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only process videos directly inside the input directory
    #[arg(long)]
    pub no_recursive: bool,

    /// Drop the original audio track
    #[arg(long)]
    pub no_audio: bool,

    /// Encode at the default frame rate instead of the source's
    #[arg(long)]
    pub no_fps: bool,

    /// Disable the face enhancer
    #[arg(long)]
    pub no_enhancer: bool,

    /// Keep extracted frames after a successful job
    #[arg(long)]
    pub keep_frames: bool,

    /// Encoder quality, 0 (best) to 51
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=(MAX_VIDEO_QUALITY as i64)))]
    pub video_quality: Option<u8>,

    /// Rest after each job, in seconds
    #[arg(long)]
    pub rest_time: Option<u64>,

    /// Skip the post-job rest and memory reclaim (throttling still applies)
    #[arg(long)]
    pub no_auto_clean: bool,

    /// Accept the pre-flight memory reclaim without asking
    #[arg(short, long)]
    pub yes: bool,
}

/// Where the three paths come from
#[derive(Debug, PartialEq)]
enum PathMode {
    Interactive,
    Direct {
        source: PathBuf,
        input: PathBuf,
        output: PathBuf,
    },
}

impl RunArgs {
    fn path_mode(&self) -> Result<PathMode> {
        match (&self.source, &self.input, &self.output) {
            (None, None, None) => Ok(PathMode::Interactive),
            (Some(source), Some(input), Some(output)) => Ok(PathMode::Direct {
                source: source.clone(),
                input: input.clone(),
                output: output.clone(),
            }),
            _ => bail!(
                "--source, --input and --output must be given together (or none of them for interactive mode)"
            ),
        }
    }

    fn batch_options(
        &self,
        config: &AppConfig,
        source: PathBuf,
        input: PathBuf,
        output: PathBuf,
    ) -> BatchOptions {
        let mut options = BatchOptions::new(source, input, output);
        options.recursive = !self.no_recursive;
        options.rest = self
            .rest_time
            .map(Duration::from_secs)
            .unwrap_or_else(|| config.cooldown.rest());
        options.auto_clean = !self.no_auto_clean;
        options.temp_dir = config.paths.temp_dir.clone();

        options.job = config.job.clone();
        if self.no_audio {
            options.job.keep_audio = false;
        }
        if self.no_fps {
            options.job.keep_fps = false;
        }
        if self.no_enhancer {
            options.job.face_enhancer = false;
        }
        if self.keep_frames {
            options.job.keep_frames = true;
        }
        if let Some(quality) = self.video_quality {
            options.job.video_quality = quality;
        }
        options
    }
}

/// `<input>/<input name>-swapped`
pub fn derive_output_dir(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "batch".to_string());
    input.join(format!("{}-swapped", name))
}

/// Prompt for source and input; `None` when the user cancels
async fn interactive_paths() -> Result<Option<(PathBuf, PathBuf, PathBuf)>> {
    println!("{}", "Batch face swap - interactive setup".cyan().bold());
    println!();

    let source = loop {
        let answer = read_line("Source face image: ".to_string()).await?;
        let path = PathBuf::from(&answer);
        if answer.is_empty() {
            println!("{}", "  path cannot be empty".red());
        } else if !path.is_file() {
            println!("{} {}", "  not found:".red(), path.display());
        } else if !is_image(&path) {
            println!("{}", "  not an image (png, jpg, jpeg, webp, bmp)".red());
        } else {
            break path;
        }
    };

    let input = loop {
        let answer = read_line("Video directory: ".to_string()).await?;
        let path = PathBuf::from(&answer);
        if answer.is_empty() || !path.is_dir() {
            println!("{} {}", "  not a directory:".red(), path.display());
            continue;
        }
        let found = discover_jobs(&source, &path, &derive_output_dir(&path), true).await?;
        if found.is_empty() {
            println!("{}", "  no videos found (mp4, avi, mkv, mov, wmv, flv)".red());
            continue;
        }
        println!("  {} {} videos", "found".green(), found.len());
        break path;
    };

    let output = derive_output_dir(&input);
    println!();
    println!("  {} {}", "Source:".bold(), source.display());
    println!("  {} {}", "Input:".bold(), input.display());
    println!("  {} {}", "Output:".bold(), output.display());
    println!();

    loop {
        let answer = read_line("Start processing? (y/n): ".to_string()).await?;
        if is_affirmative(&answer) {
            return Ok(Some((source, input, output)));
        }
        if is_negative(&answer) {
            return Ok(None);
        }
    }
}

pub async fn run(args: RunArgs, config: AppConfig) -> Result<()> {
    let (source, input, output) = match args.path_mode()? {
        PathMode::Direct {
            source,
            input,
            output,
        } => (source, input, output),
        PathMode::Interactive => match interactive_paths().await? {
            Some(paths) => paths,
            None => {
                println!("{}", "Cancelled".yellow());
                return Ok(());
            }
        },
    };
    let options = args.batch_options(&config, source, input, output);

    let adapters = Adapters::from_config(&config);
    let engine = Arc::new(EngineHandle::new(adapters.engine.clone()));
    let pipeline = Arc::new(
        MediaPipeline::new(engine, adapters.media.clone()).with_default_fps(config.media.default_fps),
    );
    let throttle = ThrottleController::new(adapters.monitor.clone(), Arc::new(config.thresholds.clone()));
    let cooldown = CooldownScheduler::new(adapters.monitor.clone(), adapters.system_action.clone())
        .with_report_interval(config.cooldown.report_interval());
    let orchestrator = BatchOrchestrator::new(
        pipeline,
        throttle,
        cooldown,
        adapters.monitor.clone(),
        Arc::new(StdinPrompt::new(args.yes)),
    )
    .with_preflight_advisory(config.cooldown.preflight_memory_advisory);

    let outcome = orchestrator
        .run(&options)
        .await
        .context("batch did not start")?;
    print_summary(&options, &outcome);

    if outcome.result.failure_count > 0 || outcome.aborted.is_some() {
        std::process::exit(1);
    }
    Ok(())
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Item")]
    item: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn print_summary(options: &BatchOptions, outcome: &BatchOutcome) {
    println!();
    if outcome.jobs_found == 0 {
        println!("{}", "No videos found; nothing to do".yellow());
        return;
    }

    let mut rows = vec![
        SummaryRow {
            item: "Videos found",
            value: outcome.jobs_found.to_string(),
        },
        SummaryRow {
            item: "Succeeded",
            value: outcome.result.success_count.to_string(),
        },
        SummaryRow {
            item: "Failed",
            value: outcome.result.failure_count.to_string(),
        },
        SummaryRow {
            item: "Output",
            value: options.output_dir.display().to_string(),
        },
    ];
    if let Some(reclaim) = &outcome.final_reclaim {
        rows.push(SummaryRow {
            item: "Memory after cleanup",
            value: format!(
                "{:.1}% -> {:.1}% (freed {:.1}%)",
                reclaim.memory_before,
                reclaim.memory_after,
                reclaim.freed_percent()
            ),
        });
    }

    let headline = if let Some(reason) = &outcome.aborted {
        format!("Batch aborted: {}", reason).red().bold()
    } else if outcome.result.failure_count == 0 {
        "Batch complete".green().bold()
    } else {
        "Batch complete with failures".yellow().bold()
    };
    println!("{}", headline);
    println!("{}", Table::new(rows));
}
