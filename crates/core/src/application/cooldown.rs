//! CooldownScheduler - mandatory rest between jobs, with optional memory reclaim

use crate::application::constants::{COOLDOWN_REPORT_INTERVAL, RECLAIM_SETTLE_DURATION};
use crate::port::{ResourceMonitor, SystemAction, SystemActionKind};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Memory load around one reclaim attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReclaimReport {
    pub memory_before: f32,
    pub memory_after: f32,
    /// False when the reclaim action itself failed (non-fatal)
    pub succeeded: bool,
}

impl ReclaimReport {
    pub fn freed_percent(&self) -> f32 {
        self.memory_before - self.memory_after
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CooldownReport {
    pub rested: Duration,
    /// Remaining-time reports emitted while idling
    pub progress_reports: u32,
    pub reclaim: Option<ReclaimReport>,
}

pub struct CooldownScheduler {
    monitor: Arc<dyn ResourceMonitor>,
    action: Arc<dyn SystemAction>,
    report_interval: Duration,
    settle_delay: Duration,
}

impl CooldownScheduler {
    pub fn new(monitor: Arc<dyn ResourceMonitor>, action: Arc<dyn SystemAction>) -> Self {
        Self {
            monitor,
            action,
            report_interval: COOLDOWN_REPORT_INTERVAL,
            settle_delay: RECLAIM_SETTLE_DURATION,
        }
    }

    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Run the reclaim action once. Failures are logged, never returned.
    pub async fn reclaim(&self) -> ReclaimReport {
        let memory_before = self.monitor.sample().await.memory_percent;
        info!(memory = memory_before, "Reclaiming memory");

        let succeeded = match self.action.perform(SystemActionKind::ReclaimMemory).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Memory reclaim failed, continuing");
                false
            }
        };

        if !self.settle_delay.is_zero() {
            sleep(self.settle_delay).await;
        }

        let memory_after = self.monitor.sample().await.memory_percent;
        let report = ReclaimReport {
            memory_before,
            memory_after,
            succeeded,
        };
        info!(
            memory_before,
            memory_after,
            freed = report.freed_percent(),
            "Memory after reclaim"
        );
        report
    }

    /// Idle for `duration`, reclaiming memory first when asked.
    ///
    /// Remaining time is logged every report interval so long rests stay observable.
    pub async fn rest(&self, duration: Duration, reclaim_memory: bool) -> CooldownReport {
        info!(rest_secs = duration.as_secs(), "Resting before next job");

        let reclaim = if reclaim_memory {
            Some(self.reclaim().await)
        } else {
            None
        };

        let interval = if self.report_interval.is_zero() {
            duration
        } else {
            self.report_interval
        };

        let mut remaining = duration;
        let mut progress_reports = 0;
        while !remaining.is_zero() {
            info!(remaining_secs = remaining.as_secs(), "Cooling down");
            progress_reports += 1;
            let step = remaining.min(interval);
            sleep(step).await;
            remaining -= step;
        }

        info!("Rest complete");
        CooldownReport {
            rested: duration,
            progress_reports,
            reclaim,
        }
    }
}
