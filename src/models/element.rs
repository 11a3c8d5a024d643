//! Queue element model.
//!
//! A queue element is one unit of work scheduled onto a limiting resource.
//! It sits in at most one queue at a time; its position is its index in
//! that queue's sequence.

use serde::{Deserialize, Serialize};

use super::QueueId;

/// A schedulable unit of work on a limiting resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueElement {
    /// Unique element identifier.
    pub id: String,
    /// Originating task, if any.
    pub task_id: Option<String>,
    /// Estimated duration (ms).
    pub duration_ms: i64,
    /// Earliest start constraint (ms). `None` = no constraint.
    pub earliest_start_ms: Option<i64>,
    /// Queue currently holding this element.
    pub queue: Option<QueueId>,
}

impl QueueElement {
    /// Creates an unqueued element with zero duration.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            task_id: None,
            duration_ms: 0,
            earliest_start_ms: None,
            queue: None,
        }
    }

    /// Sets the originating task.
    pub fn with_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// Sets the estimated duration. Negative values are rejected when the
    /// element is registered.
    pub fn with_duration(mut self, duration_ms: i64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Sets the earliest start.
    pub fn with_earliest_start(mut self, earliest_start_ms: i64) -> Self {
        self.earliest_start_ms = Some(earliest_start_ms);
        self
    }

    /// Whether this element currently sits in a queue.
    pub fn is_queued(&self) -> bool {
        self.queue.is_some()
    }
}
