// Resource telemetry domain model

use crate::domain::error::{DomainError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default temperature ceiling (°C)
pub const DEFAULT_TEMP_HIGH: f32 = 75.0;

/// Default temperature considered cooled down (°C), informative only
pub const DEFAULT_TEMP_RESUME: f32 = 65.0;

/// Default memory load ceiling (percent)
pub const DEFAULT_MEMORY_HIGH: f32 = 85.0;

/// Default CPU load ceiling (percent)
pub const DEFAULT_CPU_HIGH: f32 = 90.0;

/// Default delay between throttle re-checks (seconds)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Point-in-time host reading. Produced fresh per sample, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    /// `None` when no sensor could be read (distinct from 0°C)
    pub temperature_celsius: Option<f32>,
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub sampled_at: DateTime<Utc>,
}

impl ResourceSnapshot {
    pub fn new(
        temperature_celsius: Option<f32>,
        cpu_percent: f32,
        memory_percent: f32,
        sampled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            temperature_celsius,
            cpu_percent,
            memory_percent,
            sampled_at,
        }
    }

    pub fn temperature_display(&self) -> String {
        match self.temperature_celsius {
            Some(t) => format!("{:.1}°C", t),
            None => "unknown".to_string(),
        }
    }
}

impl std::fmt::Display for ResourceSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "temperature {} | cpu {:.1}% | memory {:.1}%",
            self.temperature_display(),
            self.cpu_percent,
            self.memory_percent
        )
    }
}

/// A threshold a snapshot exceeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Violation {
    Temp,
    Memory,
    Cpu,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::Temp => write!(f, "TEMP"),
            Violation::Memory => write!(f, "MEMORY"),
            Violation::Cpu => write!(f, "CPU"),
        }
    }
}

/// Safety limits for sustained compute. Immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyThresholds {
    pub temp_high: f32,
    pub temp_resume: f32,
    pub memory_high: f32,
    pub cpu_high: f32,
    pub poll_interval_secs: u64,
    /// Consecutive unsafe re-checks tolerated before escalating; `None` waits forever
    pub max_wait_cycles: Option<u32>,
}

impl Default for SafetyThresholds {
    fn default() -> Self {
        Self {
            temp_high: DEFAULT_TEMP_HIGH,
            temp_resume: DEFAULT_TEMP_RESUME,
            memory_high: DEFAULT_MEMORY_HIGH,
            cpu_high: DEFAULT_CPU_HIGH,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            max_wait_cycles: None,
        }
    }
}

impl SafetyThresholds {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("memory_high", self.memory_high), ("cpu_high", self.cpu_high)] {
            if !(value > 0.0 && value <= 100.0) {
                return Err(DomainError::ValidationError(format!(
                    "{} must be within (0, 100], got {}",
                    name, value
                )));
            }
        }
        if self.temp_high <= 0.0 {
            return Err(DomainError::ValidationError(format!(
                "temp_high must be positive, got {}",
                self.temp_high
            )));
        }
        if self.poll_interval_secs == 0 {
            return Err(DomainError::ValidationError(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.max_wait_cycles == Some(0) {
            return Err(DomainError::ValidationError(
                "max_wait_cycles must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_temperature_display() {
        let snapshot = ResourceSnapshot::new(None, 12.0, 40.0, Utc::now());
        assert_eq!(snapshot.temperature_display(), "unknown");

        let snapshot = ResourceSnapshot::new(Some(0.0), 12.0, 40.0, Utc::now());
        assert_eq!(snapshot.temperature_display(), "0.0°C");
    }

    #[test]
    fn test_default_thresholds_are_valid() {
        let thresholds = SafetyThresholds::default();
        assert!(thresholds.validate().is_ok());
        assert_eq!(thresholds.poll_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_thresholds() {
        let thresholds = SafetyThresholds {
            memory_high: 120.0,
            ..Default::default()
        };
        assert!(thresholds.validate().is_err());

        let thresholds = SafetyThresholds {
            poll_interval_secs: 0,
            ..Default::default()
        };
        assert!(thresholds.validate().is_err());
    }

    #[test]
    fn test_zero_wait_cycles_rejected() {
        let thresholds = SafetyThresholds {
            max_wait_cycles: Some(0),
            ..Default::default()
        };
        let err = thresholds.validate().unwrap_err();
        assert!(err.to_string().contains("max_wait_cycles"));

        let thresholds = SafetyThresholds {
            max_wait_cycles: Some(1),
            ..Default::default()
        };
        assert!(thresholds.validate().is_ok());
    }
}
