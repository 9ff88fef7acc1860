// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod media_toolkit;
pub mod prompt;
pub mod resource_monitor;
pub mod system_action;
pub mod time_provider;
pub mod transform_engine;

// Re-exports
pub use id_provider::IdProvider;
pub use media_toolkit::{MediaError, MediaToolkit};
pub use prompt::{FixedPrompt, PreflightPrompt};
pub use resource_monitor::ResourceMonitor;
pub use system_action::{NoopSystemAction, SystemAction, SystemActionError, SystemActionKind};
pub use time_provider::TimeProvider;
pub use transform_engine::{ArtifactSet, EngineError, TransformEngine, TransformRequest};
