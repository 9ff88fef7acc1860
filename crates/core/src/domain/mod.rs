// Domain Layer - Pure business logic and entities

pub mod batch;
pub mod error;
pub mod job;
pub mod media;
pub mod priority;
pub mod resource;
pub mod task;

// Re-exports
pub use batch::BatchResult;
pub use error::DomainError;
pub use job::{Job, JobOptions};
pub use media::MediaKind;
pub use priority::extract_priority_key;
pub use resource::{ResourceSnapshot, SafetyThresholds, Violation};
pub use task::{Task, TaskId, TaskStatus};
