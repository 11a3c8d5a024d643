//! Limiting resource queue model.
//!
//! A queue is the ordered sequence of elements assigned to one limiting
//! resource. Positions are indices into the sequence, so they are always
//! unique and strictly increasing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a [`LimitingResourceQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueueId(pub u64);

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.0)
    }
}

/// Ordered queue of elements bound to exactly one limiting resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitingResourceQueue {
    /// Queue identifier.
    pub id: QueueId,
    /// Owning resource.
    pub resource_id: String,
    elements: Vec<String>,
}

impl LimitingResourceQueue {
    /// Creates an empty queue for a resource.
    pub fn new(id: QueueId, resource_id: impl Into<String>) -> Self {
        Self {
            id,
            resource_id: resource_id.into(),
            elements: Vec::new(),
        }
    }

    /// Element ids in queue order.
    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Position of an element (linear scan).
    pub fn position_of(&self, element_id: &str) -> Option<usize> {
        self.elements.iter().position(|e| e == element_id)
    }

    /// Whether the element is in this queue.
    pub fn contains(&self, element_id: &str) -> bool {
        self.position_of(element_id).is_some()
    }

    /// `(position, element id)` pairs in queue order.
    pub fn positions(&self) -> impl Iterator<Item = (usize, &str)> {
        self.elements.iter().enumerate().map(|(i, e)| (i, e.as_str()))
    }

    /// Caller guarantees `index <= len`.
    pub(crate) fn insert(&mut self, index: usize, element_id: String) {
        self.elements.insert(index, element_id);
    }

    pub(crate) fn remove(&mut self, element_id: &str) -> Option<usize> {
        let pos = self.position_of(element_id)?;
        self.elements.remove(pos);
        Some(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_id_display() {
        assert_eq!(QueueId(7).to_string(), "Q7");
    }

    #[test]
    fn test_queue_positions() {
        let mut q = LimitingResourceQueue::new(QueueId(1), "M1");
        assert!(q.is_empty());

        q.insert(q.len(), "E1".into());
        q.insert(q.len(), "E3".into());
        q.insert(1, "E2".into());

        assert_eq!(q.elements(), &["E1", "E2", "E3"]);
        assert_eq!(q.position_of("E2"), Some(1));
        assert_eq!(q.position_of("E9"), None);
        let positions: Vec<_> = q.positions().collect();
        assert_eq!(positions, vec![(0, "E1"), (1, "E2"), (2, "E3")]);
    }

    #[test]
    fn test_queue_remove_closes_gap() {
        let mut q = LimitingResourceQueue::new(QueueId(1), "M1");
        q.insert(q.len(), "E1".into());
        q.insert(q.len(), "E2".into());
        q.insert(q.len(), "E3".into());

        assert_eq!(q.remove("E2"), Some(1));
        assert_eq!(q.remove("E2"), None);
        assert_eq!(q.position_of("E3"), Some(1));
        assert_eq!(q.len(), 2);
    }
}
