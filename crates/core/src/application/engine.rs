//! Once-per-process guard around the transformation engine

use crate::port::{EngineError, TransformEngine, TransformRequest};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

/// Shared handle that initializes the engine exactly once.
///
/// Concurrent callers wait on the same initialization. A failed attempt leaves
/// the cell empty so the next caller retries.
pub struct EngineHandle {
    engine: Arc<dyn TransformEngine>,
    initialized: OnceCell<()>,
}

impl EngineHandle {
    pub fn new(engine: Arc<dyn TransformEngine>) -> Self {
        Self {
            engine,
            initialized: OnceCell::new(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.initialized()
    }

    pub async fn ensure_initialized(&self) -> Result<(), EngineError> {
        self.initialized
            .get_or_try_init(|| async {
                info!("Initializing transformation engine");
                self.engine.initialize().await
            })
            .await
            .map(|_| ())
    }

    pub async fn process(&self, request: TransformRequest<'_>) -> Result<(), EngineError> {
        self.ensure_initialized().await?;
        self.engine.process(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::transform_engine::mocks::{MockBehavior, MockTransformEngine};

    #[tokio::test]
    async fn test_initializes_once_across_concurrent_callers() {
        let engine = Arc::new(MockTransformEngine::new_success());
        let handle = Arc::new(EngineHandle::new(engine.clone()));

        let mut joins = Vec::new();
        for _ in 0..8 {
            let handle = Arc::clone(&handle);
            joins.push(tokio::spawn(async move { handle.ensure_initialized().await }));
        }
        for join in joins {
            join.await.unwrap().unwrap();
        }

        assert_eq!(engine.init_calls(), 1);
        assert!(handle.is_initialized());
    }

    #[tokio::test]
    async fn test_failed_initialization_is_retried() {
        let engine = Arc::new(MockTransformEngine::new(MockBehavior::FailInit(
            "models missing".to_string(),
        )));
        let handle = EngineHandle::new(engine.clone());

        assert!(matches!(
            handle.ensure_initialized().await,
            Err(EngineError::Initialization(_))
        ));
        assert!(handle.ensure_initialized().await.is_err());
        assert_eq!(engine.init_calls(), 2);
        assert!(!handle.is_initialized());
    }
}
