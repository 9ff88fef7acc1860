// Resource monitor implementation
// reason: sysinfo for cross-platform CPU/memory/sensor readings
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::time::Duration;
use sysinfo::{Components, System, MINIMUM_CPU_UPDATE_INTERVAL};
use tokio::time::timeout;
use tracing::{debug, warn};

use facebatch_core::application::constants::{CPU_SAMPLE_WINDOW, SAMPLE_TIMEOUT};
use facebatch_core::domain::ResourceSnapshot;
use facebatch_core::port::{ResourceMonitor, SystemAction, SystemActionError, SystemActionKind};

/// Sensor labels that identify a CPU temperature
const CPU_SENSOR_HINTS: &[&str] = &["cpu", "package", "core", "tctl", "tdie", "die"];

static TEMPERATURE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)temp\w*[^\d\n]*(\d+(?:\.\d+)?)").expect("valid regex"));

static CELSIUS_FIGURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*°?C\b").expect("valid regex"));

/// Host readings taken on the blocking pool
struct LoadReading {
    cpu_percent: f32,
    memory_percent: f32,
    temperature: Option<f32>,
}

/// Resource monitor backed by sysinfo.
///
/// Never fails: readings that time out or are unavailable degrade to
/// `0.0` (CPU, memory) or `None` (temperature).
pub struct SysinfoResourceMonitor {
    system: Arc<Mutex<System>>,
    components: Arc<Mutex<Components>>,
    /// Fallback for hosts whose sensors sysinfo cannot see
    action: Option<Arc<dyn SystemAction>>,
    timeout: Duration,
    cpu_window: Duration,
}

impl SysinfoResourceMonitor {
    pub fn new() -> Self {
        Self {
            system: Arc::new(Mutex::new(System::new())),
            components: Arc::new(Mutex::new(Components::new_with_refreshed_list())),
            action: None,
            timeout: SAMPLE_TIMEOUT,
            cpu_window: CPU_SAMPLE_WINDOW,
        }
    }

    pub fn with_temperature_action(mut self, action: Arc<dyn SystemAction>) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cpu_window(mut self, window: Duration) -> Self {
        self.cpu_window = window;
        self
    }

    async fn read_load(&self) -> Option<LoadReading> {
        let system = Arc::clone(&self.system);
        let components = Arc::clone(&self.components);
        let window = self.cpu_window.max(MINIMUM_CPU_UPDATE_INTERVAL);

        let blocking = tokio::task::spawn_blocking(move || {
            // a stalled earlier sample still owns the handle; don't queue behind it
            let mut sys = try_guard(&system)?;

            // two refreshes one window apart give utilisation over that window
            sys.refresh_cpu();
            std::thread::sleep(window);
            sys.refresh_cpu();
            sys.refresh_memory();

            let total = sys.total_memory();
            let memory_percent = if total == 0 {
                0.0
            } else {
                (sys.used_memory() as f64 / total as f64 * 100.0) as f32
            };
            let cpu_percent = sys.global_cpu_info().cpu_usage();
            drop(sys);

            let temperature = try_guard(&components).and_then(|mut components| {
                components.refresh();
                cpu_temperature(
                    components
                        .list()
                        .iter()
                        .map(|c| (c.label().to_string(), c.temperature())),
                )
            });

            Some(LoadReading {
                cpu_percent,
                memory_percent,
                temperature,
            })
        });

        match timeout(self.timeout, blocking).await {
            Ok(Ok(Some(reading))) => Some(reading),
            Ok(Ok(None)) => {
                warn!("Previous resource sample still running");
                None
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Resource sampling task failed");
                None
            }
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Resource sampling timed out");
                None
            }
        }
    }

    async fn temperature_from_action(&self) -> Option<f32> {
        let action = self.action.as_ref()?;
        match timeout(self.timeout, action.perform(SystemActionKind::ReadTemperature)).await {
            Ok(Ok(stdout)) => {
                let parsed = parse_temperature(&stdout);
                if parsed.is_none() {
                    debug!("Temperature report had no reading");
                }
                parsed
            }
            Ok(Err(SystemActionError::Unsupported(_))) => None,
            Ok(Err(e)) => {
                warn!(error = %e, "Temperature read failed");
                None
            }
            Err(_) => {
                warn!("Temperature read timed out");
                None
            }
        }
    }
}

impl Default for SysinfoResourceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceMonitor for SysinfoResourceMonitor {
    async fn sample(&self) -> ResourceSnapshot {
        let (cpu_percent, memory_percent, sensor_temperature) = match self.read_load().await {
            Some(reading) => (reading.cpu_percent, reading.memory_percent, reading.temperature),
            None => {
                warn!("CPU and memory unavailable, reporting 0%");
                (0.0, 0.0, None)
            }
        };

        let temperature = match sensor_temperature {
            Some(t) => Some(t),
            None => self.temperature_from_action().await,
        };

        let snapshot =
            ResourceSnapshot::new(temperature, cpu_percent, memory_percent, chrono::Utc::now());
        debug!(
            cpu = snapshot.cpu_percent,
            memory = snapshot.memory_percent,
            temperature = %snapshot.temperature_display(),
            "Resource snapshot"
        );
        snapshot
    }
}

/// Lock without waiting; poisoning is ignored since readings are refreshed anyway
fn try_guard<T>(mutex: &Mutex<T>) -> Option<MutexGuard<'_, T>> {
    match mutex.try_lock() {
        Ok(guard) => Some(guard),
        Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
        Err(TryLockError::WouldBlock) => None,
    }
}

/// Hottest CPU-like sensor, ignoring readings that cannot be real
fn cpu_temperature(sensors: impl Iterator<Item = (String, f32)>) -> Option<f32> {
    sensors
        .filter(|(label, _)| {
            let label = label.to_ascii_lowercase();
            CPU_SENSOR_HINTS.iter().any(|hint| label.contains(hint))
        })
        .map(|(_, t)| t)
        .filter(|t| t.is_finite() && *t > 0.0)
        .fold(None, |hottest: Option<f32>, t| Some(hottest.map_or(t, |h| h.max(t))))
}

/// Extract a Celsius figure from a sensor tool's report.
///
/// Accepts "CPU die temperature: 61.25 C", "61.3°C" or a bare number.
pub fn parse_temperature(report: &str) -> Option<f32> {
    let trimmed = report.trim();
    if let Ok(value) = trimmed.parse::<f32>() {
        return Some(value).filter(|v| v.is_finite());
    }
    TEMPERATURE_LINE
        .captures(trimmed)
        .or_else(|| CELSIUS_FIGURE.captures(trimmed))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f32>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use facebatch_core::port::system_action::mocks::RecordingSystemAction;

    #[tokio::test]
    async fn test_sample_is_within_bounds() {
        let monitor = SysinfoResourceMonitor::new().with_cpu_window(Duration::from_millis(200));
        let snapshot = monitor.sample().await;

        assert!(snapshot.cpu_percent >= 0.0);
        assert!(snapshot.cpu_percent <= 100.0);
        assert!(snapshot.memory_percent > 0.0);
        assert!(snapshot.memory_percent <= 100.0);
    }

    #[tokio::test]
    async fn test_timeout_degrades_instead_of_blocking() {
        let monitor = SysinfoResourceMonitor::new()
            .with_cpu_window(Duration::from_secs(3))
            .with_timeout(Duration::from_millis(50));

        let started = std::time::Instant::now();
        let snapshot = monitor.sample().await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(snapshot.cpu_percent, 0.0);
        assert_eq!(snapshot.memory_percent, 0.0);
    }

    #[tokio::test]
    async fn test_busy_handle_degrades_without_queueing() {
        let monitor = SysinfoResourceMonitor::new()
            .with_cpu_window(Duration::from_millis(200))
            .with_timeout(Duration::from_secs(30));
        let held = Arc::clone(&monitor.system);
        let _guard = held.lock().unwrap();

        let started = std::time::Instant::now();
        let snapshot = monitor.sample().await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(snapshot.cpu_percent, 0.0);
        assert_eq!(snapshot.memory_percent, 0.0);
    }

    #[tokio::test]
    async fn test_action_fallback_parses_report() {
        let action = Arc::new(RecordingSystemAction::new().with_output(
            SystemActionKind::ReadTemperature,
            "**** SMC sensors ****\nCPU die temperature: 71.40 C\n",
        ));
        let monitor = SysinfoResourceMonitor::new().with_temperature_action(action);

        assert_eq!(monitor.temperature_from_action().await, Some(71.4));
    }

    #[test]
    fn test_parse_temperature_formats() {
        assert_eq!(parse_temperature("CPU die temperature: 61.25 C"), Some(61.25));
        assert_eq!(parse_temperature("CPU temp: 58.5°C"), Some(58.5));
        assert_eq!(parse_temperature("  63.0\n"), Some(63.0));
        assert_eq!(parse_temperature("62.1°C"), Some(62.1));
        assert_eq!(parse_temperature("no sensors found"), None);
    }

    #[test]
    fn test_cpu_temperature_picks_hottest_cpu_sensor() {
        let sensors = vec![
            ("acpitz temp1".to_string(), 90.0),
            ("coretemp Core 0".to_string(), 55.0),
            ("coretemp Package id 0".to_string(), 61.0),
            ("k10temp Tctl".to_string(), f32::NAN),
        ];
        assert_eq!(cpu_temperature(sensors.into_iter()), Some(61.0));
        assert_eq!(cpu_temperature(std::iter::empty()), None);
    }
}
