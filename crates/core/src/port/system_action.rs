// Privileged system action port
//
// One capability for host maintenance (memory reclaim) and sensor reads that
// the portable telemetry stack cannot reach. Implementations decide how the
// action runs; credentials never flow through this interface.

use async_trait::async_trait;
use thiserror::Error;

/// Kind of host action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemActionKind {
    /// Ask the OS to drop reclaimable memory
    ReclaimMemory,
    /// Read a CPU temperature report (stdout is parsed by the caller)
    ReadTemperature,
}

impl std::fmt::Display for SystemActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SystemActionKind::ReclaimMemory => write!(f, "reclaim_memory"),
            SystemActionKind::ReadTemperature => write!(f, "read_temperature"),
        }
    }
}

/// System action errors (never fatal to callers)
#[derive(Error, Debug, Clone)]
pub enum SystemActionError {
    #[error("Action not configured: {0}")]
    Unsupported(SystemActionKind),

    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Action timed out after {0}ms")]
    Timeout(u64),

    #[error("Action failed (exit {code:?}): {stderr}")]
    Failed { code: Option<i32>, stderr: String },
}

#[async_trait]
pub trait SystemAction: Send + Sync {
    /// Run the action and return its captured stdout
    ///
    /// # Errors
    /// - SystemActionError::Unsupported if no mechanism exists for `kind`
    /// - SystemActionError::Timeout if the action exceeds its bound
    async fn perform(&self, kind: SystemActionKind) -> Result<String, SystemActionError>;
}

/// Action provider that supports nothing (telemetry-only hosts)
pub struct NoopSystemAction;

#[async_trait]
impl SystemAction for NoopSystemAction {
    async fn perform(&self, kind: SystemActionKind) -> Result<String, SystemActionError> {
        Err(SystemActionError::Unsupported(kind))
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Records every call; answers from a per-kind script (default: empty success)
    #[derive(Default)]
    pub struct RecordingSystemAction {
        calls: Mutex<Vec<SystemActionKind>>,
        responses: HashMap<SystemActionKind, Result<String, SystemActionError>>,
    }

    impl RecordingSystemAction {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_output(mut self, kind: SystemActionKind, stdout: impl Into<String>) -> Self {
            self.responses.insert(kind, Ok(stdout.into()));
            self
        }

        pub fn failing(mut self, kind: SystemActionKind, stderr: impl Into<String>) -> Self {
            self.responses.insert(
                kind,
                Err(SystemActionError::Failed {
                    code: Some(1),
                    stderr: stderr.into(),
                }),
            );
            self
        }

        pub fn calls(&self) -> Vec<SystemActionKind> {
            self.calls.lock().unwrap().clone()
        }

        pub fn count(&self, kind: SystemActionKind) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|k| **k == kind)
                .count()
        }
    }

    #[async_trait]
    impl SystemAction for RecordingSystemAction {
        async fn perform(&self, kind: SystemActionKind) -> Result<String, SystemActionError> {
            self.calls.lock().unwrap().push(kind);
            self.responses
                .get(&kind)
                .cloned()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }
}
