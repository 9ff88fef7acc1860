// Resource monitoring port
// reason: async-trait needed for dyn-compatible async ports
use crate::domain::ResourceSnapshot;
use async_trait::async_trait;

/// Live host telemetry source
///
/// Used for throttling decisions and cooldown reporting.
#[async_trait]
pub trait ResourceMonitor: Send + Sync {
    /// Take one point-in-time reading
    ///
    /// Never fails. Unavailable readings degrade instead: temperature becomes
    /// `None`, CPU and memory fall back to 0.0. Implementations bound the call
    /// with a short timeout so a hung sensor cannot stall the control loop.
    ///
    /// # Example
    /// ```text
    /// let snapshot = monitor.sample().await;
    /// if snapshot.cpu_percent > 90.0 {
    ///     println!("CPU throttling triggered");
    /// }
    /// ```
    async fn sample(&self) -> ResourceSnapshot;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Build a snapshot stamped with the current time
    pub fn reading(temperature: Option<f32>, cpu: f32, memory: f32) -> ResourceSnapshot {
        ResourceSnapshot::new(temperature, cpu, memory, chrono::Utc::now())
    }

    /// Calm host: unknown temperature, light load
    pub fn calm() -> ResourceSnapshot {
        reading(None, 10.0, 40.0)
    }

    /// Replays a scripted sequence of readings; the last one repeats forever
    pub struct ScriptedResourceMonitor {
        script: Mutex<VecDeque<ResourceSnapshot>>,
        last: Mutex<ResourceSnapshot>,
        samples: AtomicUsize,
    }

    impl ScriptedResourceMonitor {
        pub fn new(readings: Vec<ResourceSnapshot>) -> Self {
            let last = readings.last().cloned().unwrap_or_else(calm);
            Self {
                script: Mutex::new(readings.into()),
                last: Mutex::new(last),
                samples: AtomicUsize::new(0),
            }
        }

        pub fn constant(snapshot: ResourceSnapshot) -> Self {
            Self::new(vec![snapshot])
        }

        pub fn sample_count(&self) -> usize {
            self.samples.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ResourceMonitor for ScriptedResourceMonitor {
        async fn sample(&self) -> ResourceSnapshot {
            self.samples.fetch_add(1, Ordering::SeqCst);
            match self.script.lock().unwrap().pop_front() {
                Some(next) => {
                    *self.last.lock().unwrap() = next.clone();
                    next
                }
                None => self.last.lock().unwrap().clone(),
            }
        }
    }
}
