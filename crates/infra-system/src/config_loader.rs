// Layered configuration: defaults → TOML file → FACEBATCH__* environment
use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use facebatch_core::config::AppConfig;
use facebatch_core::error::{AppError, Result};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "FACEBATCH_CONFIG";

const ENV_PREFIX: &str = "FACEBATCH";
const ENV_SEPARATOR: &str = "__";

/// Platform config file, e.g. `~/.config/facebatch/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "facebatch").map(|dirs| dirs.config_dir().join("config.toml"))
}

pub struct ConfigLoader {
    file: Option<PathBuf>,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            file: None,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this file instead of `FACEBATCH_CONFIG` or the platform default
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    fn resolve_file(&self) -> Option<(PathBuf, bool)> {
        if let Some(path) = &self.file {
            return Some((expand_path(path), true));
        }
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some((expand_path(Path::new(&path)), true));
        }
        default_config_path().map(|path| (path, false))
    }

    /// Load, expand `~` in paths, and validate
    pub fn load(&self) -> Result<AppConfig> {
        let defaults = Config::try_from(&AppConfig::default())
            .map_err(|e| AppError::Config(e.to_string()))?;
        let mut builder = Config::builder().add_source(defaults);

        if let Some((path, required)) = self.resolve_file() {
            debug!(path = %path.display(), required, "Config file");
            if required && !path.is_file() {
                return Err(AppError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(required),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        );

        let mut loaded: AppConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| AppError::Config(e.to_string()))?;

        let paths = &mut loaded.paths;
        paths.upload_source_dir = expand_path(&paths.upload_source_dir);
        paths.upload_target_dir = expand_path(&paths.upload_target_dir);
        paths.output_dir = expand_path(&paths.output_dir);
        paths.temp_dir = expand_path(&paths.temp_dir);

        loaded.validate()?;
        info!(
            cpu_high = loaded.thresholds.cpu_high,
            memory_high = loaded.thresholds.memory_high,
            temp_high = loaded.thresholds.temp_high,
            "Configuration loaded"
        );
        Ok(loaded)
    }
}

fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}
