// Shared child-process runner for every command-backed adapter
// reason: tokio::process with a hard timeout and an allowlisted environment
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

/// Default environment passed through to children
pub fn default_env_allowlist() -> Vec<String> {
    vec!["PATH".to_string(), "HOME".to_string(), "USER".to_string()]
}

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("failed to spawn {program}: {message}")]
    SpawnFailed { program: String, message: String },

    #[error("{program} timed out after {timeout_ms}ms")]
    Timeout { program: String, timeout_ms: u64 },

    #[error("process IO error: {0}")]
    Io(String),
}

/// Spawns isolated child processes.
///
/// The child starts from an empty environment plus the allowlisted variables
/// of this process, and is killed if it outlives the timeout.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    env_allowlist: Vec<String>,
    timeout: Duration,
}

impl CommandRunner {
    pub fn new(env_allowlist: Vec<String>, timeout: Duration) -> Self {
        Self {
            env_allowlist,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Filter environment variables to allowlist only
    fn filter_env(&self, env: &HashMap<String, String>) -> HashMap<String, String> {
        env.iter()
            .filter(|(k, _)| self.env_allowlist.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub async fn run(
        &self,
        program: &str,
        args: &[String],
        working_dir: Option<&Path>,
    ) -> Result<CommandOutput, CommandError> {
        let inherited: HashMap<String, String> = std::env::vars().collect();
        let env = self.filter_env(&inherited);

        debug!(program = %program, args = ?args, "Spawning command");
        let started = Instant::now();

        let mut command = Command::new(program);
        command
            .args(args)
            .env_clear()
            .envs(&env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = working_dir {
            command.current_dir(dir);
        }

        let child = command.spawn().map_err(|e| CommandError::SpawnFailed {
            program: program.to_string(),
            message: e.to_string(),
        })?;

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(CommandError::Io(e.to_string())),
            Err(_) => {
                return Err(CommandError::Timeout {
                    program: program.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
        };

        let result = CommandOutput {
            exit_code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            program = %program,
            duration_ms = result.duration_ms,
            exit_code = ?result.exit_code,
            "Command finished"
        );
        Ok(result)
    }
}

/// Substitute `{name}` placeholders in argument templates
pub fn render_args(templates: &[String], vars: &[(&str, String)]) -> Vec<String> {
    templates
        .iter()
        .map(|template| {
            vars.iter().fold(template.clone(), |arg, (name, value)| {
                arg.replace(&format!("{{{}}}", name), value)
            })
        })
        .collect()
}
