// Transformation Engine Port
// Abstraction over the external face-swap engine (detection, embedding, swap, enhance)

use crate::domain::JobOptions;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// What the engine transforms in place
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSet {
    /// A single still image (already copied to its destination)
    Image(PathBuf),
    /// Extracted video frames living in `dir`
    Frames { dir: PathBuf, frames: Vec<PathBuf> },
}

impl ArtifactSet {
    pub fn len(&self) -> usize {
        match self {
            ArtifactSet::Image(_) => 1,
            ArtifactSet::Frames { frames, .. } => frames.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One engine invocation
#[derive(Debug, Clone, Copy)]
pub struct TransformRequest<'a> {
    pub source: &'a Path,
    pub target: &'a Path,
    pub artifacts: &'a ArtifactSet,
    pub options: &'a JobOptions,
}

/// Engine errors
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("Engine initialization failed: {0}")]
    Initialization(String),

    #[error("Engine processing failed: {0}")]
    Processing(String),

    #[error("Engine timed out after {0}ms")]
    Timeout(u64),
}

/// Transformation Engine trait
///
/// Implementations:
/// - CommandTransformEngine: drives an external engine program
/// - MockTransformEngine: scripted behaviour for tests
#[async_trait]
pub trait TransformEngine: Send + Sync {
    /// One-time setup (model loading). Callers go through `EngineHandle`,
    /// which guarantees a single successful call per process.
    async fn initialize(&self) -> Result<(), EngineError>;

    /// Transform the artifact set in place
    ///
    /// # Errors
    /// - EngineError::Processing if the engine rejects or fails the set
    /// - EngineError::Timeout if the engine exceeds its bound
    async fn process(&self, request: TransformRequest<'_>) -> Result<(), EngineError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Shared call log so tests can assert cross-collaborator ordering
    pub type Journal = Arc<Mutex<Vec<String>>>;

    /// Mock engine behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Always succeed
        Success,
        /// Every process call fails with message
        Fail(String),
        /// initialize fails with message
        FailInit(String),
        /// Panic with message (for panic isolation testing)
        Panic(String),
    }

    /// Mock Transformation Engine for testing
    pub struct MockTransformEngine {
        behavior: MockBehavior,
        fail_targets: Vec<String>,
        delay: Option<Duration>,
        init_calls: Mutex<usize>,
        processed: Mutex<Vec<PathBuf>>,
        journal: Journal,
    }

    impl MockTransformEngine {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior,
                fail_targets: Vec::new(),
                delay: None,
                init_calls: Mutex::new(0),
                processed: Mutex::new(Vec::new()),
                journal: Journal::default(),
            }
        }

        pub fn new_success() -> Self {
            Self::new(MockBehavior::Success)
        }

        pub fn new_fail(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Fail(message.into()))
        }

        pub fn new_panic_inducing(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Panic(message.into()))
        }

        /// Fail only targets whose file name contains `fragment`
        pub fn failing_on(mut self, fragment: impl Into<String>) -> Self {
            self.fail_targets.push(fragment.into());
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn with_journal(mut self, journal: Journal) -> Self {
            self.journal = journal;
            self
        }

        pub fn init_calls(&self) -> usize {
            *self.init_calls.lock().unwrap()
        }

        pub fn process_calls(&self) -> usize {
            self.processed.lock().unwrap().len()
        }

        /// Targets in the order they were processed
        pub fn processed_targets(&self) -> Vec<PathBuf> {
            self.processed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TransformEngine for MockTransformEngine {
        async fn initialize(&self) -> Result<(), EngineError> {
            *self.init_calls.lock().unwrap() += 1;
            match &self.behavior {
                MockBehavior::FailInit(msg) => Err(EngineError::Initialization(msg.clone())),
                _ => Ok(()),
            }
        }

        async fn process(&self, request: TransformRequest<'_>) -> Result<(), EngineError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.processed
                .lock()
                .unwrap()
                .push(request.target.to_path_buf());
            self.journal
                .lock()
                .unwrap()
                .push(format!("transform:{}", request.artifacts.len()));

            let name = request
                .target
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if self.fail_targets.iter().any(|f| name.contains(f.as_str())) {
                return Err(EngineError::Processing(format!("no face found in {}", name)));
            }

            match &self.behavior {
                MockBehavior::Success | MockBehavior::FailInit(_) => Ok(()),
                MockBehavior::Fail(msg) => Err(EngineError::Processing(msg.clone())),
                MockBehavior::Panic(msg) => panic!("{}", msg),
            }
        }
    }
}
