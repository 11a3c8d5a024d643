//! Queue ownership and the element registry.
//!
//! The store holds one queue per limiting resource, created on the first
//! assignment, and every queue element whether or not it is currently
//! queued. Reordering queue contents is the sequencer's job; the store
//! only exposes the structural primitives it needs.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::error::{QueueError, Result};
use crate::models::{LimitingResourceQueue, QueueElement, QueueId, Resource};

/// Owner of all queues and queue elements.
#[derive(Debug, Clone, Default)]
pub struct QueueStore {
    queues: BTreeMap<QueueId, LimitingResourceQueue>,
    by_resource: HashMap<String, QueueId>,
    elements: BTreeMap<String, QueueElement>,
    next_queue_id: u64,
}

impl QueueStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the resource's queue, creating and attaching it if needed.
    ///
    /// Only limiting workers and machines get a queue; for any other
    /// resource this returns `None` and creates nothing. Repeated calls
    /// return the same queue.
    pub fn get_or_create_queue_for(&mut self, resource: &mut Resource) -> Option<QueueId> {
        if !resource.can_own_queue() {
            return None;
        }
        let owned = |id: &QueueId| {
            self.queues
                .get(id)
                .is_some_and(|q| q.resource_id == resource.id)
        };
        if let Some(id) = resource.queue.filter(owned) {
            return Some(id);
        }
        if let Some(&id) = self.by_resource.get(&resource.id) {
            resource.queue = Some(id);
            return Some(id);
        }

        let id = QueueId(self.next_queue_id);
        self.next_queue_id += 1;
        self.queues
            .insert(id, LimitingResourceQueue::new(id, resource.id.clone()));
        self.by_resource.insert(resource.id.clone(), id);
        resource.queue = Some(id);
        debug!(queue = %id, resource = %resource.id, "created limiting resource queue");
        Some(id)
    }

    /// Re-creates a queue under a known id.
    pub(crate) fn restore_queue(&mut self, id: QueueId, resource: &mut Resource) -> Result<()> {
        if !resource.can_own_queue() {
            return Err(QueueError::NotLimiting(resource.id.clone()));
        }
        if self.queues.contains_key(&id) || self.by_resource.contains_key(&resource.id) {
            return Err(QueueError::InvalidSnapshot(format!(
                "queue {id} or resource '{}' restored twice",
                resource.id
            )));
        }
        self.queues
            .insert(id, LimitingResourceQueue::new(id, resource.id.clone()));
        self.by_resource.insert(resource.id.clone(), id);
        self.next_queue_id = self.next_queue_id.max(id.0 + 1);
        resource.queue = Some(id);
        Ok(())
    }

    /// All queues, in creation order.
    pub fn all_queues(&self) -> Vec<&LimitingResourceQueue> {
        self.queues.values().collect()
    }

    /// Looks up a queue.
    pub fn queue(&self, id: QueueId) -> Option<&LimitingResourceQueue> {
        self.queues.get(&id)
    }

    /// Looks up a queue, failing with `UnknownQueue`.
    pub fn get_queue(&self, id: QueueId) -> Result<&LimitingResourceQueue> {
        self.queue(id).ok_or(QueueError::UnknownQueue(id))
    }

    /// Queue owned by a resource, if created.
    pub fn queue_for_resource(&self, resource_id: &str) -> Option<&LimitingResourceQueue> {
        self.by_resource
            .get(resource_id)
            .and_then(|id| self.queues.get(id))
    }

    pub(crate) fn queue_mut(&mut self, id: QueueId) -> Result<&mut LimitingResourceQueue> {
        self.queues.get_mut(&id).ok_or(QueueError::UnknownQueue(id))
    }

    /// Registers an element, unqueued.
    ///
    /// # Errors
    /// - `DuplicateElement` if the id is taken.
    /// - `NegativeDuration` if `duration_ms < 0`.
    pub fn add_element(&mut self, mut element: QueueElement) -> Result<()> {
        if self.elements.contains_key(&element.id) {
            return Err(QueueError::DuplicateElement(element.id));
        }
        if element.duration_ms < 0 {
            return Err(QueueError::NegativeDuration {
                element: element.id,
                duration_ms: element.duration_ms,
            });
        }
        element.queue = None;
        self.elements.insert(element.id.clone(), element);
        Ok(())
    }

    /// Drops an unqueued element from the registry.
    pub(crate) fn take_element(&mut self, id: &str) -> Result<QueueElement> {
        let element = self.get_element(id)?;
        if let Some(queue) = element.queue {
            return Err(QueueError::AlreadyQueued {
                element: id.to_string(),
                queue,
            });
        }
        self.elements
            .remove(id)
            .ok_or_else(|| QueueError::UnknownElement(id.to_string()))
    }

    /// Looks up an element.
    pub fn element(&self, id: &str) -> Option<&QueueElement> {
        self.elements.get(id)
    }

    /// Looks up an element, failing with `UnknownElement`.
    pub fn get_element(&self, id: &str) -> Result<&QueueElement> {
        self.element(id)
            .ok_or_else(|| QueueError::UnknownElement(id.to_string()))
    }

    pub(crate) fn element_mut(&mut self, id: &str) -> Result<&mut QueueElement> {
        self.elements
            .get_mut(id)
            .ok_or_else(|| QueueError::UnknownElement(id.to_string()))
    }

    /// All elements, ordered by id.
    pub fn elements(&self) -> impl Iterator<Item = &QueueElement> {
        self.elements.values()
    }

    /// Elements of a queue in queue order.
    pub fn ordered_elements(&self, id: QueueId) -> Result<Vec<&QueueElement>> {
        let queue = self.get_queue(id)?;
        Ok(queue
            .elements()
            .iter()
            .filter_map(|e| self.elements.get(e))
            .collect())
    }

    /// Ids of all elements currently in some queue.
    pub fn placed_elements(&self) -> HashSet<&str> {
        self.elements
            .values()
            .filter(|e| e.is_queued())
            .map(|e| e.id.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourceKind;

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut store = QueueStore::new();
        let mut crane = Resource::machine("M1").limiting();

        let first = store.get_or_create_queue_for(&mut crane);
        let second = store.get_or_create_queue_for(&mut crane);

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(crane.queue, first);
        assert_eq!(store.all_queues().len(), 1);
        assert_eq!(store.queue_for_resource("M1").map(|q| q.id), first);
    }

    #[test]
    fn test_idempotent_across_resource_copies() {
        let mut store = QueueStore::new();
        let mut a = Resource::worker("W1").limiting();
        let mut b = a.clone();

        let qa = store.get_or_create_queue_for(&mut a);
        let qb = store.get_or_create_queue_for(&mut b);
        assert_eq!(qa, qb);
        assert_eq!(store.all_queues().len(), 1);
    }

    #[test]
    fn test_non_limiting_gets_no_queue() {
        let mut store = QueueStore::new();
        let mut worker = Resource::worker("W1");
        let mut tool = Resource::new("T1", ResourceKind::Custom("tool".into())).limiting();

        assert_eq!(store.get_or_create_queue_for(&mut worker), None);
        assert_eq!(store.get_or_create_queue_for(&mut tool), None);
        assert!(worker.queue.is_none());
        assert!(store.all_queues().is_empty());
    }

    #[test]
    fn test_queues_in_creation_order() {
        let mut store = QueueStore::new();
        let mut m2 = Resource::machine("M2").limiting();
        let mut m1 = Resource::machine("M1").limiting();
        store.get_or_create_queue_for(&mut m2);
        store.get_or_create_queue_for(&mut m1);

        let owners: Vec<_> = store.all_queues().iter().map(|q| q.resource_id.as_str()).collect();
        assert_eq!(owners, vec!["M2", "M1"]);
    }

    #[test]
    fn test_restore_queue_bumps_counter() {
        let mut store = QueueStore::new();
        let mut m1 = Resource::machine("M1").limiting();
        let mut m2 = Resource::machine("M2").limiting();

        store.restore_queue(QueueId(7), &mut m1).unwrap();
        assert_eq!(m1.queue, Some(QueueId(7)));
        assert_eq!(store.get_or_create_queue_for(&mut m2), Some(QueueId(8)));
        assert!(store.restore_queue(QueueId(7), &mut m2).is_err());
    }

    #[test]
    fn test_element_registry() {
        let mut store = QueueStore::new();
        store
            .add_element(QueueElement::new("E1").with_duration(100))
            .unwrap();

        assert_eq!(
            store.add_element(QueueElement::new("E1")),
            Err(QueueError::DuplicateElement("E1".into()))
        );
        assert_eq!(store.get_element("E1").unwrap().duration_ms, 100);
        assert!(store.placed_elements().is_empty());

        let taken = store.take_element("E1").unwrap();
        assert_eq!(taken.id, "E1");
        assert!(store.element("E1").is_none());
    }

    #[test]
    fn test_negative_duration_rejected() {
        let mut store = QueueStore::new();
        assert_eq!(
            store.add_element(QueueElement::new("E1").with_duration(-1)),
            Err(QueueError::NegativeDuration {
                element: "E1".into(),
                duration_ms: -1
            })
        );
        assert!(store.element("E1").is_none());
        assert!(store.add_element(QueueElement::new("E2").with_duration(0)).is_ok());
    }

    #[test]
    fn test_add_element_clears_queue_reference() {
        let mut store = QueueStore::new();
        let mut e = QueueElement::new("E1");
        e.queue = Some(QueueId(3));
        store.add_element(e).unwrap();
        assert!(!store.get_element("E1").unwrap().is_queued());
    }
}
