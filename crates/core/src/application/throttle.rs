//! ThrottleController - blocks until the host is back within its safety limits

use crate::application::safety::classify;
use crate::domain::{ResourceSnapshot, SafetyThresholds, Violation};
use crate::error::{AppError, Result};
use crate::port::ResourceMonitor;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Control loop states. Starts in `Check`; `Proceed` is terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum ThrottleState {
    Check,
    Wait { violations: Vec<Violation> },
    Proceed(ResourceSnapshot),
}

/// How a `wait_until_safe` call ended
#[derive(Debug, Clone)]
pub struct ThrottleReport {
    /// Number of WAIT transitions taken before proceeding
    pub wait_cycles: u32,
    /// The safe reading that released the loop
    pub final_snapshot: ResourceSnapshot,
}

pub struct ThrottleController {
    monitor: Arc<dyn ResourceMonitor>,
    thresholds: Arc<SafetyThresholds>,
}

impl ThrottleController {
    pub fn new(monitor: Arc<dyn ResourceMonitor>, thresholds: Arc<SafetyThresholds>) -> Self {
        Self { monitor, thresholds }
    }

    pub fn thresholds(&self) -> &SafetyThresholds {
        &self.thresholds
    }

    /// Sample, classify, and sleep `poll_interval` between unsafe readings.
    ///
    /// Waits without bound unless `max_wait_cycles` is set, in which case the
    /// loop gives up with `AppError::ThrottleEscalated` once that many WAIT
    /// cycles have elapsed and the host is still unsafe.
    pub async fn wait_until_safe(&self) -> Result<ThrottleReport> {
        let mut state = ThrottleState::Check;
        let mut wait_cycles: u32 = 0;

        loop {
            state = match state {
                ThrottleState::Check => self.check(wait_cycles).await,
                ThrottleState::Wait { violations } => {
                    if let Some(max) = self.thresholds.max_wait_cycles {
                        if wait_cycles >= max {
                            warn!(cycles = wait_cycles, "Host still unsafe, escalating");
                            return Err(AppError::ThrottleEscalated {
                                cycles: wait_cycles,
                                violations,
                            });
                        }
                    }
                    wait_cycles += 1;
                    debug!(
                        cycle = wait_cycles,
                        poll_secs = self.thresholds.poll_interval_secs,
                        "Waiting for host to cool down"
                    );
                    sleep(self.thresholds.poll_interval()).await;
                    ThrottleState::Check
                }
                ThrottleState::Proceed(snapshot) => {
                    if wait_cycles > 0 {
                        info!(wait_cycles, "Host back within limits, continuing");
                    }
                    return Ok(ThrottleReport {
                        wait_cycles,
                        final_snapshot: snapshot,
                    });
                }
            };
        }
    }

    async fn check(&self, wait_cycles: u32) -> ThrottleState {
        let snapshot = self.monitor.sample().await;
        let verdict = classify(&snapshot, &self.thresholds);

        info!(
            temperature = %snapshot.temperature_display(),
            cpu = snapshot.cpu_percent,
            memory = snapshot.memory_percent,
            recheck = wait_cycles > 0,
            "Host status"
        );

        if verdict.is_safe() {
            return ThrottleState::Proceed(snapshot);
        }

        for violation in &verdict.violations {
            match violation {
                Violation::Temp => warn!(
                    temperature = %snapshot.temperature_display(),
                    threshold = self.thresholds.temp_high,
                    "CPU temperature too high"
                ),
                Violation::Memory => warn!(
                    memory = snapshot.memory_percent,
                    threshold = self.thresholds.memory_high,
                    "Memory load too high"
                ),
                Violation::Cpu => warn!(
                    cpu = snapshot.cpu_percent,
                    threshold = self.thresholds.cpu_high,
                    "CPU load too high"
                ),
            }
        }

        ThrottleState::Wait {
            violations: verdict.violations(),
        }
    }
}
