// Adapter wiring shared by the daemon and the CLI

use std::sync::Arc;

use facebatch_core::port::{MediaToolkit, ResourceMonitor, SystemAction, TransformEngine};
use facebatch_core::AppConfig;

use crate::{CommandSystemAction, CommandTransformEngine, FfmpegMediaToolkit, SysinfoResourceMonitor};

/// Production adapters behind every core port
#[derive(Clone)]
pub struct Adapters {
    pub monitor: Arc<dyn ResourceMonitor>,
    pub system_action: Arc<dyn SystemAction>,
    pub engine: Arc<dyn TransformEngine>,
    pub media: Arc<dyn MediaToolkit>,
}

impl Adapters {
    pub fn from_config(config: &AppConfig) -> Self {
        let system_action: Arc<dyn SystemAction> =
            Arc::new(CommandSystemAction::new(&config.system_actions));

        let mut monitor = SysinfoResourceMonitor::new();
        if config.system_actions.read_temperature.is_some() {
            monitor = monitor.with_temperature_action(system_action.clone());
        }

        Self {
            monitor: Arc::new(monitor),
            system_action,
            engine: Arc::new(CommandTransformEngine::new(config.engine.clone())),
            media: Arc::new(FfmpegMediaToolkit::new(&config.media)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facebatch_core::port::{SystemActionError, SystemActionKind};

    #[tokio::test]
    async fn test_unconfigured_reclaim_is_unsupported() {
        let adapters = Adapters::from_config(&AppConfig::default());
        let err = adapters
            .system_action
            .perform(SystemActionKind::ReclaimMemory)
            .await
            .unwrap_err();
        assert!(matches!(err, SystemActionError::Unsupported(_)));
    }
}
