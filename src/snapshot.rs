//! Flat, serializable view of queue state for persistence.
//!
//! A snapshot carries only ids and element attributes: which queue belongs
//! to which resource, the ordered element ids of each queue, every element
//! (queued or not), and every dependency. Resources themselves are owned
//! by the resource subsystem and are supplied again on restore.

use serde::{Deserialize, Serialize};

use crate::models::{DependencyType, QueueElement, QueueId};

/// Complete persisted state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Queues in creation order.
    pub queues: Vec<QueueRecord>,
    /// All elements, ordered by id.
    pub elements: Vec<ElementRecord>,
    /// All dependencies, ordered by (origin, destination).
    pub dependencies: Vec<DependencyRecord>,
}

/// Queue ↔ resource binding and element order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueRecord {
    pub queue_id: QueueId,
    pub resource_id: String,
    pub elements: Vec<String>,
}

/// Element attributes. Queue membership is carried by [`QueueRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRecord {
    pub id: String,
    pub task_id: Option<String>,
    pub duration_ms: i64,
    pub earliest_start_ms: Option<i64>,
}

/// One dependency edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub dependency_type: DependencyType,
}

impl From<&QueueElement> for ElementRecord {
    fn from(e: &QueueElement) -> Self {
        Self {
            id: e.id.clone(),
            task_id: e.task_id.clone(),
            duration_ms: e.duration_ms,
            earliest_start_ms: e.earliest_start_ms,
        }
    }
}

impl From<ElementRecord> for QueueElement {
    fn from(r: ElementRecord) -> Self {
        Self {
            id: r.id,
            task_id: r.task_id,
            duration_ms: r.duration_ms,
            earliest_start_ms: r.earliest_start_ms,
            queue: None,
        }
    }
}

impl Snapshot {
    /// Number of elements placed in some queue.
    pub fn queued_count(&self) -> usize {
        self.queues.iter().map(|q| q.elements.len()).sum()
    }
}
