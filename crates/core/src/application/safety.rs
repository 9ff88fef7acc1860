//! SafetyClassifier - pure verdict over one snapshot

use crate::domain::{ResourceSnapshot, SafetyThresholds, Violation};
use std::collections::BTreeSet;

/// Outcome of classifying one snapshot
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SafetyVerdict {
    pub violations: BTreeSet<Violation>,
}

impl SafetyVerdict {
    pub fn is_safe(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> Vec<Violation> {
        self.violations.iter().copied().collect()
    }
}

impl std::fmt::Display for SafetyVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_safe() {
            return write!(f, "safe");
        }
        let names: Vec<String> = self.violations.iter().map(|v| v.to_string()).collect();
        write!(f, "unsafe ({})", names.join(", "))
    }
}

/// Compare a snapshot with the thresholds.
///
/// Strictly-greater comparisons. An unknown temperature never violates.
pub fn classify(snapshot: &ResourceSnapshot, thresholds: &SafetyThresholds) -> SafetyVerdict {
    let mut violations = BTreeSet::new();

    if let Some(temperature) = snapshot.temperature_celsius {
        if temperature > thresholds.temp_high {
            violations.insert(Violation::Temp);
        }
    }
    if snapshot.memory_percent > thresholds.memory_high {
        violations.insert(Violation::Memory);
    }
    if snapshot.cpu_percent > thresholds.cpu_high {
        violations.insert(Violation::Cpu);
    }

    SafetyVerdict { violations }
}
