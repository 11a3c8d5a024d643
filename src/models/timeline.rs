//! Timeline (computed schedule) model.
//!
//! A timeline assigns start and end times to every queued element. It may
//! carry violations where queue order and dependencies disagree.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::QueueId;

/// Computed times for all queued elements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timeline {
    /// One slot per queued element.
    pub slots: Vec<Slot>,
    /// Constraints the computed times could not honour.
    pub violations: Vec<Violation>,
}

/// Time interval occupied by one element on its queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Element id.
    pub element_id: String,
    /// Queue holding the element.
    pub queue_id: QueueId,
    /// Resource owning that queue (denormalized for query convenience).
    pub resource_id: String,
    /// Start time (ms).
    pub start_ms: i64,
    /// End time (ms).
    pub end_ms: i64,
}

/// A constraint violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Related element id.
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
    /// Severity (0-100, higher = worse).
    pub severity: i32,
}

/// Classification of violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// Element placed before an origin it depends on.
    PrecedenceViolation,
    /// Domain-specific violation.
    Custom(String),
}

impl Slot {
    /// Duration (end - start) in ms.
    #[inline]
    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }
}

impl Violation {
    /// Creates a precedence violation.
    pub fn precedence_violation(element_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::PrecedenceViolation,
            entity_id: element_id.into(),
            message: message.into(),
            severity: 95,
        }
    }
}

impl Timeline {
    /// Creates an empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the timeline has no violations.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Earliest start across all slots (ms), 0 when empty.
    pub fn start_ms(&self) -> i64 {
        self.slots.iter().map(|s| s.start_ms).min().unwrap_or(0)
    }

    /// Latest end across all slots (ms), 0 when empty.
    pub fn end_ms(&self) -> i64 {
        self.slots.iter().map(|s| s.end_ms).max().unwrap_or(0)
    }

    /// Span from the earliest start to the latest end (ms).
    pub fn makespan_ms(&self) -> i64 {
        self.end_ms() - self.start_ms()
    }

    /// Slot of an element.
    pub fn slot_for(&self, element_id: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.element_id == element_id)
    }

    /// Slots of one queue, in time order.
    pub fn slots_for_queue(&self, queue_id: QueueId) -> Vec<&Slot> {
        let mut slots: Vec<&Slot> = self.slots.iter().filter(|s| s.queue_id == queue_id).collect();
        slots.sort_by_key(|s| s.start_ms);
        slots
    }

    /// Busy time / makespan per resource.
    ///
    /// The horizon starts at the earliest slot, not at time zero.
    pub fn utilizations(&self) -> HashMap<String, f64> {
        let horizon = self.makespan_ms();
        if horizon <= 0 {
            return HashMap::new();
        }
        let mut busy: HashMap<String, i64> = HashMap::new();
        for s in &self.slots {
            *busy.entry(s.resource_id.clone()).or_insert(0) += s.duration_ms();
        }
        busy.into_iter()
            .map(|(id, b)| (id, b as f64 / horizon as f64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(element: &str, queue: u64, resource: &str, start: i64, end: i64) -> Slot {
        Slot {
            element_id: element.into(),
            queue_id: QueueId(queue),
            resource_id: resource.into(),
            start_ms: start,
            end_ms: end,
        }
    }

    #[test]
    fn test_timeline_queries() {
        let mut t = Timeline::new();
        t.slots.push(slot("E2", 1, "M1", 500, 800));
        t.slots.push(slot("E1", 1, "M1", 0, 500));
        t.slots.push(slot("E3", 2, "M2", 0, 400));

        assert_eq!(t.makespan_ms(), 800);
        assert_eq!(t.slot_for("E3").map(|s| s.duration_ms()), Some(400));
        assert!(t.slot_for("E9").is_none());

        let q1: Vec<_> = t.slots_for_queue(QueueId(1)).iter().map(|s| s.element_id.as_str()).collect();
        assert_eq!(q1, vec!["E1", "E2"]);

        let utils = t.utilizations();
        assert!((utils["M1"] - 1.0).abs() < 1e-10);
        assert!((utils["M2"] - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_horizon_starts_at_first_slot() {
        let mut t = Timeline::new();
        t.slots.push(slot("E1", 1, "M1", 1000, 1010));
        assert_eq!(t.start_ms(), 1000);
        assert_eq!(t.end_ms(), 1010);
        assert_eq!(t.makespan_ms(), 10);
        assert!((t.utilizations()["M1"] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_empty_timeline() {
        let mut t = Timeline::new();
        assert!(t.is_valid());
        assert_eq!(t.makespan_ms(), 0);
        assert!(t.utilizations().is_empty());

        t.violations.push(Violation::precedence_violation("E1", "late"));
        assert!(!t.is_valid());
        assert_eq!(t.violations[0].violation_type, ViolationType::PrecedenceViolation);
    }
}
