// Application Layer - Use Cases and Orchestration

pub mod batch;
pub mod constants;
pub mod cooldown;
pub mod engine;
pub mod pipeline;
pub mod registry;
pub mod safety;
pub mod sequencer;
pub mod throttle;

// Re-exports
pub use batch::{BatchOptions, BatchOrchestrator, BatchOutcome};
pub use cooldown::{CooldownReport, CooldownScheduler, ReclaimReport};
pub use engine::EngineHandle;
pub use pipeline::MediaPipeline;
pub use registry::{SubmitRequest, TaskRegistry};
pub use safety::{classify, SafetyVerdict};
pub use sequencer::order_jobs;
pub use throttle::{ThrottleController, ThrottleReport, ThrottleState};
