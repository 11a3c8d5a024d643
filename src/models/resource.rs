//! Resource model.
//!
//! Resources are the workers and machines work is assigned to. A resource
//! flagged as *limiting* has scarce capacity: its work must be sequenced
//! explicitly in a [`LimitingResourceQueue`](super::LimitingResourceQueue),
//! which the resource owns once work has been assigned to it.
//!
//! Workers carry two tags, `real` and `virtual`. They are set independently
//! and are not guaranteed to be complementary.

use serde::{Deserialize, Serialize};

use super::QueueId;

/// A worker, machine, or other resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Unique resource identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Resource classification.
    pub kind: ResourceKind,
    /// Tagged as an actual named worker.
    pub real: bool,
    /// Tagged as placeholder capacity.
    pub is_virtual: bool,
    /// Whether work on this resource must be sequenced in a queue.
    pub limiting: bool,
    /// Criteria this resource satisfies, each over an optional interval.
    pub satisfactions: Vec<CriterionSatisfaction>,
    /// Queue owned by this resource, created on first assignment.
    pub queue: Option<QueueId>,
}

/// Resource classification.
///
/// Only workers and machines may own a limiting queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Human resource.
    Worker,
    /// Machine resource.
    Machine,
    /// Domain-specific type.
    Custom(String),
}

/// A criterion held by a resource during `[start_ms, end_ms)`.
///
/// Missing bounds are open-ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionSatisfaction {
    /// Criterion name (e.g., "welder", "crane-operator").
    pub criterion: String,
    /// Start of validity (ms), inclusive.
    pub start_ms: Option<i64>,
    /// End of validity (ms), exclusive.
    pub end_ms: Option<i64>,
}

impl CriterionSatisfaction {
    /// Creates an unbounded satisfaction.
    pub fn new(criterion: impl Into<String>) -> Self {
        Self {
            criterion: criterion.into(),
            start_ms: None,
            end_ms: None,
        }
    }

    /// Restricts validity to `[start_ms, end_ms)`.
    pub fn between(mut self, start_ms: i64, end_ms: i64) -> Self {
        self.start_ms = Some(start_ms);
        self.end_ms = Some(end_ms);
        self
    }

    /// Whether this satisfaction holds at `time_ms`.
    pub fn is_valid_at(&self, time_ms: i64) -> bool {
        self.start_ms.is_none_or(|s| time_ms >= s) && self.end_ms.is_none_or(|e| time_ms < e)
    }
}

impl Resource {
    /// Creates a new, non-limiting resource.
    pub fn new(id: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            kind,
            real: false,
            is_virtual: false,
            limiting: false,
            satisfactions: Vec::new(),
            queue: None,
        }
    }

    /// Creates a real worker.
    pub fn worker(id: impl Into<String>) -> Self {
        let mut r = Self::new(id, ResourceKind::Worker);
        r.real = true;
        r
    }

    /// Creates a virtual worker.
    pub fn virtual_worker(id: impl Into<String>) -> Self {
        let mut r = Self::new(id, ResourceKind::Worker);
        r.is_virtual = true;
        r
    }

    /// Creates a machine.
    pub fn machine(id: impl Into<String>) -> Self {
        Self::new(id, ResourceKind::Machine)
    }

    /// Sets the resource name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Flags the resource as limiting.
    pub fn limiting(mut self) -> Self {
        self.limiting = true;
        self
    }

    /// Overrides the `real` tag.
    pub fn with_real(mut self, real: bool) -> Self {
        self.real = real;
        self
    }

    /// Overrides the `virtual` tag.
    pub fn with_virtual(mut self, is_virtual: bool) -> Self {
        self.is_virtual = is_virtual;
        self
    }

    /// Adds an unbounded criterion satisfaction.
    pub fn with_criterion(mut self, criterion: impl Into<String>) -> Self {
        self.satisfactions.push(CriterionSatisfaction::new(criterion));
        self
    }

    /// Adds a criterion satisfaction.
    pub fn with_satisfaction(mut self, satisfaction: CriterionSatisfaction) -> Self {
        self.satisfactions.push(satisfaction);
        self
    }

    /// Whether this is a worker.
    pub fn is_worker(&self) -> bool {
        self.kind == ResourceKind::Worker
    }

    /// Whether this is a machine.
    pub fn is_machine(&self) -> bool {
        self.kind == ResourceKind::Machine
    }

    /// Whether this resource may own a limiting queue.
    pub fn can_own_queue(&self) -> bool {
        self.limiting && (self.is_worker() || self.is_machine())
    }

    /// Whether the criterion is satisfied at some point in time.
    pub fn satisfies(&self, criterion: &str) -> bool {
        self.satisfactions.iter().any(|s| s.criterion == criterion)
    }

    /// Whether the criterion is satisfied at `time_ms`.
    pub fn satisfies_at(&self, criterion: &str, time_ms: i64) -> bool {
        self.satisfactions
            .iter()
            .any(|s| s.criterion == criterion && s.is_valid_at(time_ms))
    }

    /// Whether every criterion is satisfied. Vacuously true for none.
    pub fn satisfies_all<'a, I>(&self, criteria: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        criteria.into_iter().all(|c| self.satisfies(c))
    }
}
