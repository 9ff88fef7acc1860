// Domain errors: invariant breaks on tasks, jobs and thresholds

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid task transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("invalid value: {0}")]
    ValidationError(String),

    #[error("unsupported media type: {}", .0.display())]
    UnsupportedMedia(PathBuf),
}

pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_media_names_the_file() {
        let err = DomainError::UnsupportedMedia(PathBuf::from("/up/notes.txt"));
        assert_eq!(err.to_string(), "unsupported media type: /up/notes.txt");
    }
}
