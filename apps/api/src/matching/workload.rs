//! Workload Calculator: active assignments over a configured capacity.
//!
//! The ratio is never clamped here. An employee on 7 tasks with capacity 5 is
//! at 1.4 (140%); turning that into a bounded availability score is the
//! matching engine's job.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Assigned,
    InProgress,
    Blocked,
    Completed,
    Cancelled,
}

impl AssignmentStatus {
    /// Non-terminal statuses; these count towards workload.
    pub const ACTIVE: [AssignmentStatus; 3] = [
        AssignmentStatus::Assigned,
        AssignmentStatus::InProgress,
        AssignmentStatus::Blocked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Assigned => "ASSIGNED",
            AssignmentStatus::InProgress => "IN_PROGRESS",
            AssignmentStatus::Blocked => "BLOCKED",
            AssignmentStatus::Completed => "COMPLETED",
            AssignmentStatus::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Workload capacity must be a positive number, got {0}")]
pub struct InvalidCapacity(pub f64);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkloadSnapshot {
    pub employee_id: Uuid,
    /// Active task count (or hours, if the caller measures in hours).
    pub active_load: f64,
    pub capacity: f64,
    /// active_load / capacity. May exceed 1.
    pub load_ratio: f64,
}

impl WorkloadSnapshot {
    /// Load as a display percentage, unclamped.
    pub fn percentage(&self) -> f64 {
        self.load_ratio * 100.0
    }

    pub fn is_overloaded(&self) -> bool {
        self.load_ratio > 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkloadCalculator {
    capacity: f64,
}

impl WorkloadCalculator {
    pub fn new(capacity: f64) -> Result<Self, InvalidCapacity> {
        if capacity.is_finite() && capacity > 0.0 {
            Ok(Self { capacity })
        } else {
            Err(InvalidCapacity(capacity))
        }
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn snapshot(&self, employee_id: Uuid, active_load: f64) -> WorkloadSnapshot {
        let active_load = active_load.max(0.0);
        WorkloadSnapshot {
            employee_id,
            active_load,
            capacity: self.capacity,
            load_ratio: active_load / self.capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_and_percentage() {
        let calc = WorkloadCalculator::new(5.0).unwrap();
        let snapshot = calc.snapshot(Uuid::nil(), 2.0);
        assert_eq!(snapshot.load_ratio, 0.4);
        assert_eq!(snapshot.percentage(), 40.0);
        assert!(!snapshot.is_overloaded());
    }

    #[test]
    fn test_overload_is_not_clamped() {
        let calc = WorkloadCalculator::new(5.0).unwrap();
        let snapshot = calc.snapshot(Uuid::nil(), 7.0);
        assert!((snapshot.load_ratio - 1.4).abs() < 1e-12);
        assert!((snapshot.percentage() - 140.0).abs() < 1e-9);
        assert!(snapshot.is_overloaded());
    }

    #[test]
    fn test_idle_employee() {
        let calc = WorkloadCalculator::new(3.0).unwrap();
        assert_eq!(calc.snapshot(Uuid::nil(), 0.0).load_ratio, 0.0);
    }

    #[test]
    fn test_rejects_non_positive_capacity() {
        assert_eq!(WorkloadCalculator::new(0.0), Err(InvalidCapacity(0.0)));
        assert!(WorkloadCalculator::new(-2.0).is_err());
        assert!(WorkloadCalculator::new(f64::NAN).is_err());
        assert!(WorkloadCalculator::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_terminal_statuses_are_not_active() {
        assert!(!AssignmentStatus::ACTIVE.contains(&AssignmentStatus::Completed));
        assert!(!AssignmentStatus::ACTIVE.contains(&AssignmentStatus::Cancelled));
    }

    #[test]
    fn test_status_serializes_screaming_snake() {
        let json = serde_json::to_string(&AssignmentStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
        assert_eq!(AssignmentStatus::InProgress.as_str(), "IN_PROGRESS");
    }
}
