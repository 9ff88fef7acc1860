// Central Error Type for the Application

use crate::domain::Violation;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Engine error: {0}")]
    Engine(#[from] crate::port::EngineError),

    #[error("Media error: {0}")]
    Media(#[from] crate::port::MediaError),

    #[error("System action error: {0}")]
    SystemAction(#[from] crate::port::SystemActionError),

    #[error("Engine produced no output at {0}")]
    MissingOutput(String),

    #[error("Host stayed unsafe for {cycles} consecutive checks ({})", format_violations(.violations))]
    ThrottleEscalated {
        cycles: u32,
        violations: Vec<Violation>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escalation_message_lists_violations() {
        let err = AppError::ThrottleEscalated {
            cycles: 3,
            violations: vec![Violation::Temp, Violation::Cpu],
        };
        assert_eq!(
            err.to_string(),
            "Host stayed unsafe for 3 consecutive checks (TEMP, CPU)"
        );
    }
}
