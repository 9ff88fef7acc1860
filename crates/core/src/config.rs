// Configuration value types
//
// Loaded once by the composition root (see facebatch-infra-system::config_loader)
// and shared read-only through `Arc<AppConfig>`.

use crate::domain::{JobOptions, SafetyThresholds};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub thresholds: SafetyThresholds,
    pub cooldown: CooldownConfig,
    pub engine: EngineConfig,
    pub media: MediaConfig,
    pub system_actions: SystemActionsConfig,
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub job: JobOptions,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        self.thresholds
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;
        self.job
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;
        if self.cooldown.report_interval_secs == 0 {
            return Err(AppError::Config(
                "cooldown.report_interval_secs must be at least 1".to_string(),
            ));
        }
        if !(self.cooldown.preflight_memory_advisory > 0.0
            && self.cooldown.preflight_memory_advisory <= 100.0)
        {
            return Err(AppError::Config(format!(
                "cooldown.preflight_memory_advisory must be within (0, 100], got {}",
                self.cooldown.preflight_memory_advisory
            )));
        }
        if self.media.default_fps <= 0.0 {
            return Err(AppError::Config(format!(
                "media.default_fps must be positive, got {}",
                self.media.default_fps
            )));
        }
        if self.server.rate_limit_per_sec == 0 || self.server.rate_limit_burst == 0 {
            return Err(AppError::Config(
                "server rate limits must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    /// Rest between jobs; failures rest half as long
    pub rest_secs: u64,
    pub report_interval_secs: u64,
    /// Memory load (percent) above which a pre-flight reclaim is offered
    pub preflight_memory_advisory: f32,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            rest_secs: 180,
            report_interval_secs: 30,
            preflight_memory_advisory: 75.0,
        }
    }
}

impl CooldownConfig {
    pub fn rest(&self) -> Duration {
        Duration::from_secs(self.rest_secs)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }
}

/// Command-backed transformation engine.
///
/// Argument templates substitute `{source}`, `{target}`, `{frames_dir}`,
/// `{quality}` and `{processors}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub program: String,
    pub init_args: Vec<String>,
    pub image_args: Vec<String>,
    pub frames_args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "facefusion-engine".to_string(),
            init_args: vec!["--check-models".to_string()],
            image_args: vec![
                "--source".to_string(),
                "{source}".to_string(),
                "--target".to_string(),
                "{target}".to_string(),
                "--processors".to_string(),
                "{processors}".to_string(),
            ],
            frames_args: vec![
                "--source".to_string(),
                "{source}".to_string(),
                "--frames".to_string(),
                "{frames_dir}".to_string(),
                "--processors".to_string(),
                "{processors}".to_string(),
                "--quality".to_string(),
                "{quality}".to_string(),
            ],
            timeout_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub ffmpeg: String,
    pub ffprobe: String,
    pub default_fps: f64,
    pub video_encoder: String,
    pub timeout_secs: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            default_fps: 30.0,
            video_encoder: "libx264".to_string(),
            timeout_secs: 1800,
        }
    }
}

/// Argv for each host action. Holds no credentials: privileged actions must be
/// granted out of band (e.g. a sudoers rule for a specific binary).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemActionsConfig {
    pub reclaim_memory: Option<Vec<String>>,
    pub read_temperature: Option<Vec<String>>,
    pub timeout_secs: u64,
    pub env_allowlist: Vec<String>,
}

impl Default for SystemActionsConfig {
    fn default() -> Self {
        Self {
            reclaim_memory: None,
            read_temperature: None,
            timeout_secs: 10,
            env_allowlist: vec!["PATH".to_string(), "HOME".to_string(), "USER".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rate_limit_burst: u32,
    pub rate_limit_per_sec: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9527,
            rate_limit_burst: 200,
            rate_limit_per_sec: 100,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub upload_source_dir: PathBuf,
    pub upload_target_dir: PathBuf,
    pub output_dir: PathBuf,
    pub temp_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            upload_source_dir: PathBuf::from("uploads/source"),
            upload_target_dir: PathBuf::from("uploads/target"),
            output_dir: PathBuf::from("outputs"),
            temp_dir: std::env::temp_dir().join("facebatch"),
        }
    }
}
