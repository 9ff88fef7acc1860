//! Errors surfaced by [`FacebatchClient`](crate::FacebatchClient)

use jsonrpsee::core::ClientError;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SdkError>;

/// Error codes the daemon answers with
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const NOT_READY: i32 = 4002;
    pub const THROTTLED: i32 = 4003;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const PROCESSING_ERROR: i32 = 5002;
}

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("cannot reach daemon: {0}")]
    Connection(String),

    #[error("daemon rejected call ({code}): {message}")]
    Rpc { code: i32, message: String },

    #[error("malformed payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("task {task_id} still running after {waited:?}")]
    Timeout { task_id: String, waited: Duration },

    #[error("{0}")]
    Other(String),
}

impl SdkError {
    /// JSON-RPC error code, when the daemon answered with one
    pub fn code(&self) -> Option<i32> {
        match self {
            SdkError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code() == Some(code::NOT_FOUND)
    }

    /// Output requested before the task completed
    pub fn is_not_ready(&self) -> bool {
        self.code() == Some(code::NOT_READY)
    }

    /// Submission refused by the daemon's rate limiter; retry later
    pub fn is_throttled(&self) -> bool {
        self.code() == Some(code::THROTTLED)
    }
}

impl From<ClientError> for SdkError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Call(call) => SdkError::Rpc {
                code: call.code(),
                message: call.message().to_string(),
            },
            ClientError::Transport(e) => SdkError::Transport(e.to_string()),
            ClientError::RestartNeeded(_) => SdkError::Connection("connection lost".to_string()),
            ClientError::ParseError(e) => SdkError::Serialization(e),
            other => SdkError::Other(other.to_string()),
        }
    }
}
