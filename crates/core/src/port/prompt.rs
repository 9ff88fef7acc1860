// Operator prompt port (pre-flight decisions)

use async_trait::async_trait;

/// Asks the operator whether to reclaim memory before a batch starts
#[async_trait]
pub trait PreflightPrompt: Send + Sync {
    async fn confirm_reclaim(&self, memory_percent: f32) -> bool;
}

/// Non-interactive answer
pub struct FixedPrompt(pub bool);

#[async_trait]
impl PreflightPrompt for FixedPrompt {
    async fn confirm_reclaim(&self, _memory_percent: f32) -> bool {
        self.0
    }
}
