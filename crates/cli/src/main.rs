//! Facebatch CLI - batch face swap on this host, or talk to a running facebatchd

mod batch;
mod prompt;
mod remote;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use facebatch_core::application::classify;
use facebatch_core::domain::job::MAX_VIDEO_QUALITY;
use facebatch_core::AppConfig;
use facebatch_infra_system::{Adapters, ConfigLoader};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9527";

#[derive(Parser)]
#[command(name = "facebatch")]
#[command(about = "Resource-aware batch face swap", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, global = true, env = "FACEBATCH_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,

    /// Configuration file (TOML)
    #[arg(long, global = true, env = "FACEBATCH_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every video in a directory, one at a time, resting between jobs
    Run(batch::RunArgs),

    /// Submit one task to the daemon
    Submit {
        /// Source face image (absolute, or relative to the daemon's upload dir)
        source: PathBuf,

        /// Target image or video
        target: PathBuf,

        #[arg(long)]
        no_audio: bool,

        #[arg(long)]
        no_fps: bool,

        #[arg(long)]
        no_enhancer: bool,

        #[arg(long)]
        many_faces: bool,

        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=(MAX_VIDEO_QUALITY as i64)))]
        video_quality: Option<u8>,

        /// Poll until the task completes or fails
        #[arg(short, long)]
        wait: bool,
    },

    /// Show one task
    Status {
        task_id: String,
    },

    /// Locate a completed task's output, optionally copying it
    Fetch {
        task_id: String,

        /// File or directory to copy the output to
        #[arg(long)]
        dest: Option<PathBuf>,
    },

    /// Show daemon task counts and host load
    Stats,

    /// Sample this host once and print the safety verdict
    Probe,
}

fn init_logging() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("facebatch=info"))?;
    let json_logs = std::env::var("FACEBATCH_LOG_FORMAT")
        .map(|format| format == "json")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);
    if json_logs {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        registry.with(fmt::layer().compact().with_writer(std::io::stderr)).init();
    }
    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<AppConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = path {
        loader = loader.with_file(path);
    }
    loader.load().context("loading configuration")
}

async fn probe(config: AppConfig) -> Result<()> {
    let adapters = Adapters::from_config(&config);
    let snapshot = adapters.monitor.sample().await;
    let verdict = classify(&snapshot, &config.thresholds);

    println!("{}", "Host Resources".cyan().bold());
    println!("  {} {}", "Temperature:".bold(), snapshot.temperature_display());
    println!("  {} {:.1}%", "CPU:".bold(), snapshot.cpu_percent);
    println!("  {} {:.1}%", "Memory:".bold(), snapshot.memory_percent);
    let verdict_text = verdict.to_string();
    if verdict.is_safe() {
        println!("  {} {}", "Verdict:".bold(), verdict_text.green());
    } else {
        println!("  {} {}", "Verdict:".bold(), verdict_text.red());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    match cli.command {
        Commands::Run(args) => {
            let config = load_config(cli.config)?;
            batch::run(args, config).await?;
        }

        Commands::Submit {
            source,
            target,
            no_audio,
            no_fps,
            no_enhancer,
            many_faces,
            video_quality,
            wait,
        } => {
            let mut options = json!({
                "keep_audio": !no_audio,
                "keep_fps": !no_fps,
                "face_enhancer": !no_enhancer,
                "many_faces": many_faces,
            });
            if let Some(quality) = video_quality {
                options["video_quality"] = json!(quality);
            }
            remote::submit(&cli.rpc_url, &source, &target, options, wait).await?;
        }

        Commands::Status { task_id } => remote::status(&cli.rpc_url, &task_id).await?,

        Commands::Fetch { task_id, dest } => remote::fetch(&cli.rpc_url, &task_id, dest).await?,

        Commands::Stats => remote::stats(&cli.rpc_url).await?,

        Commands::Probe => probe(load_config(cli.config)?).await?,
    }

    Ok(())
}
