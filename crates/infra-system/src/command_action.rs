// Command-backed host actions (memory reclaim, temperature read)
//
// Each action is a plain argv from configuration. Nothing here supplies
// credentials: if an action needs privileges, grant them to that binary out of
// band (for example a NOPASSWD sudoers entry) and configure `sudo -n <binary>`.
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use facebatch_core::config::SystemActionsConfig;
use facebatch_core::port::{SystemAction, SystemActionError, SystemActionKind};

use crate::command::{CommandError, CommandRunner};

pub struct CommandSystemAction {
    reclaim_memory: Option<Vec<String>>,
    read_temperature: Option<Vec<String>>,
    runner: CommandRunner,
}

impl CommandSystemAction {
    pub fn new(config: &SystemActionsConfig) -> Self {
        Self {
            reclaim_memory: config.reclaim_memory.clone(),
            read_temperature: config.read_temperature.clone(),
            runner: CommandRunner::new(
                config.env_allowlist.clone(),
                Duration::from_secs(config.timeout_secs),
            ),
        }
    }

    fn argv(&self, kind: SystemActionKind) -> Option<&[String]> {
        let argv = match kind {
            SystemActionKind::ReclaimMemory => self.reclaim_memory.as_deref(),
            SystemActionKind::ReadTemperature => self.read_temperature.as_deref(),
        }?;
        if argv.is_empty() {
            None
        } else {
            Some(argv)
        }
    }
}

#[async_trait]
impl SystemAction for CommandSystemAction {
    async fn perform(&self, kind: SystemActionKind) -> Result<String, SystemActionError> {
        let argv = self
            .argv(kind)
            .ok_or(SystemActionError::Unsupported(kind))?;
        let (program, args) = argv.split_first().ok_or(SystemActionError::Unsupported(kind))?;

        debug!(action = %kind, program = %program, "Running system action");
        let output = self
            .runner
            .run(program, args, None)
            .await
            .map_err(|e| match e {
                CommandError::Timeout { timeout_ms, .. } => SystemActionError::Timeout(timeout_ms),
                other => SystemActionError::SpawnFailed(other.to_string()),
            })?;

        if output.success {
            Ok(output.stdout)
        } else {
            warn!(action = %kind, exit_code = ?output.exit_code, "System action failed");
            Err(SystemActionError::Failed {
                code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(reclaim: Option<Vec<&str>>, temperature: Option<Vec<&str>>) -> SystemActionsConfig {
        let to_argv = |v: Vec<&str>| v.into_iter().map(String::from).collect();
        SystemActionsConfig {
            reclaim_memory: reclaim.map(to_argv),
            read_temperature: temperature.map(to_argv),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_unconfigured_action_is_unsupported() {
        let action = CommandSystemAction::new(&SystemActionsConfig::default());
        let result = action.perform(SystemActionKind::ReclaimMemory).await;

        assert!(matches!(
            result,
            Err(SystemActionError::Unsupported(SystemActionKind::ReclaimMemory))
        ));
    }

    #[tokio::test]
    async fn test_configured_action_returns_stdout() {
        let action = CommandSystemAction::new(&config(None, Some(vec!["echo", "CPU die temperature: 61.25 C"])));
        let stdout = action.perform(SystemActionKind::ReadTemperature).await.unwrap();

        assert!(stdout.contains("61.25"));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let action = CommandSystemAction::new(&config(Some(vec!["false"]), None));
        let result = action.perform(SystemActionKind::ReclaimMemory).await;

        assert!(matches!(result, Err(SystemActionError::Failed { .. })));
    }

    #[tokio::test]
    async fn test_empty_argv_is_unsupported() {
        let action = CommandSystemAction::new(&config(Some(vec![]), None));
        assert!(matches!(
            action.perform(SystemActionKind::ReclaimMemory).await,
            Err(SystemActionError::Unsupported(_))
        ));
    }
}
