//! Ordering of elements within limiting resource queues.
//!
//! Every mutation validates first and mutates second, so a failed call
//! leaves all queues untouched. Positions are sequence indices and stay
//! unique and strictly increasing after any operation.
//!
//! # Placement validation
//!
//! `insert_at` and `move_element` refuse to place an element at or before
//! the position of any of its origins that already sit in the target queue,
//! so `remove` followed by `insert_at` cannot get around a rejected move.
//! `append` always passes: the tail is after every origin in the queue.
//! This is a structural check only: origins in *other* queues are not
//! compared, and true temporal consistency still needs a timeline
//! recomputation (see [`crate::timeline`]).

use std::fmt::Debug;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{QueueError, Result};
use crate::graph::DependencyGraph;
use crate::models::{Dependency, LimitingResourceQueue, QueueId};
use crate::store::QueueStore;

/// Notification sent when an element leaves its queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachEvent {
    /// Detached element.
    pub element_id: String,
    /// Queue it left.
    pub queue_id: QueueId,
    /// Position it held.
    pub position: usize,
    /// Edges that were visible and are now hidden.
    pub hidden_dependencies: Vec<Dependency>,
}

/// Collaborator reacting to queue membership changes (e.g. a renderer
/// dropping dependency arrows).
///
/// All methods default to no-ops.
pub trait QueueObserver: Send + Sync + Debug {
    /// An element was placed at `position` in `queue_id`.
    fn on_attached(&self, _element_id: &str, _queue_id: QueueId, _position: usize) {}

    /// An element was removed from its queue.
    fn on_detached(&self, _event: &DetachEvent) {}

    /// An element moved between (or within) queues.
    fn on_moved(&self, _element_id: &str, _from: QueueId, _to: QueueId, _position: usize) {}
}

/// Queue mutation operations.
#[derive(Debug, Clone)]
pub struct QueueElementSequencer {
    validate_moves: bool,
    observers: Vec<Arc<dyn QueueObserver>>,
}

impl Default for QueueElementSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueElementSequencer {
    /// Creates a sequencer with move validation enabled.
    pub fn new() -> Self {
        Self {
            validate_moves: true,
            observers: Vec::new(),
        }
    }

    /// Enables or disables the placement check.
    pub fn with_move_validation(mut self, enabled: bool) -> Self {
        self.validate_moves = enabled;
        self
    }

    /// Registers an observer.
    pub fn add_observer(&mut self, observer: Arc<dyn QueueObserver>) {
        self.observers.push(observer);
    }

    /// Appends an unqueued element to the tail of a queue.
    ///
    /// Returns its position.
    pub fn append(
        &self,
        store: &mut QueueStore,
        graph: &DependencyGraph,
        queue: QueueId,
        element: &str,
    ) -> Result<usize> {
        let len = store.get_queue(queue)?.len();
        self.insert_at(store, graph, queue, element, len)
    }

    /// Inserts an unqueued element at `index`, shifting later elements.
    ///
    /// # Errors
    /// - `InvalidPosition` if `index > len`.
    /// - `MoveRejected` if an origin of the element sits in `queue` at or
    ///   after `index`.
    pub fn insert_at(
        &self,
        store: &mut QueueStore,
        graph: &DependencyGraph,
        queue: QueueId,
        element: &str,
        index: usize,
    ) -> Result<usize> {
        let target = store.get_queue(queue)?;
        let len = target.len();
        ensure_unqueued(store, element)?;
        if index > len {
            return Err(QueueError::InvalidPosition { index, len });
        }
        self.check_origins(graph, target, element, index, None)?;

        store.queue_mut(queue)?.insert(index, element.to_string());
        store.element_mut(element)?.queue = Some(queue);
        debug!(element, queue = %queue, position = index, "element inserted");
        for o in &self.observers {
            o.on_attached(element, queue, index);
        }
        Ok(index)
    }

    /// Detaches an element from `queue`.
    ///
    /// Dependencies are kept; those that were visible become hidden and are
    /// reported to observers. Returns the position the element held.
    pub fn remove(
        &self,
        store: &mut QueueStore,
        graph: &DependencyGraph,
        queue: QueueId,
        element: &str,
    ) -> Result<usize> {
        ensure_in_queue(store, element, queue)?;
        let hidden = visible_touching(store, graph, element);

        let position = store
            .queue_mut(queue)?
            .remove(element)
            .ok_or_else(|| QueueError::NotInQueue {
                element: element.to_string(),
                queue,
            })?;
        store.element_mut(element)?.queue = None;
        debug!(element, queue = %queue, position, "element removed");

        let event = DetachEvent {
            element_id: element.to_string(),
            queue_id: queue,
            position,
            hidden_dependencies: hidden,
        };
        for o in &self.observers {
            o.on_detached(&event);
        }
        Ok(position)
    }

    /// Removes an element from whichever queue holds it.
    ///
    /// Returns the queue it left.
    pub fn unschedule(
        &self,
        store: &mut QueueStore,
        graph: &DependencyGraph,
        element: &str,
    ) -> Result<QueueId> {
        let queue = store
            .get_element(element)?
            .queue
            .ok_or_else(|| QueueError::NotQueued(element.to_string()))?;
        self.remove(store, graph, queue, element)?;
        Ok(queue)
    }

    /// Moves an element from `from` to `target_index` in `to`.
    ///
    /// For moves within one queue, `target_index` refers to the sequence
    /// with the element already taken out.
    ///
    /// # Errors
    /// - `NotInQueue` if the element is not in `from`.
    /// - `InvalidPosition` if `target_index` is out of range.
    /// - `MoveRejected` if an origin of the element sits in `to` at or
    ///   after `target_index`.
    pub fn move_element(
        &self,
        store: &mut QueueStore,
        graph: &DependencyGraph,
        element: &str,
        from: QueueId,
        to: QueueId,
        target_index: usize,
    ) -> Result<()> {
        ensure_in_queue(store, element, from)?;
        let source = store.get_queue(from)?;
        let current = source.position_of(element).unwrap_or_default();
        let target = store.get_queue(to)?;
        let len = if from == to { target.len() - 1 } else { target.len() };
        if target_index > len {
            return Err(QueueError::InvalidPosition {
                index: target_index,
                len,
            });
        }

        let moving_from = (from == to).then_some(current);
        self.check_origins(graph, target, element, target_index, moving_from)?;

        store.queue_mut(from)?.remove(element);
        store.queue_mut(to)?.insert(target_index, element.to_string());
        store.element_mut(element)?.queue = Some(to);
        debug!(element, from = %from, to = %to, position = target_index, "element moved");
        for o in &self.observers {
            o.on_moved(element, from, to, target_index);
        }
        Ok(())
    }

    /// Rejects placing `element` at `index` in `target` when one of its
    /// origins sits there at or after `index`.
    ///
    /// `moving_from` is the element's current position when it already sits
    /// in `target`; positions after it are counted as if it were removed.
    fn check_origins(
        &self,
        graph: &DependencyGraph,
        target: &LimitingResourceQueue,
        element: &str,
        index: usize,
        moving_from: Option<usize>,
    ) -> Result<()> {
        if !self.validate_moves {
            return Ok(());
        }
        for dep in graph.incoming_to(element) {
            let Some(mut origin_position) = target.position_of(&dep.origin) else {
                continue;
            };
            if moving_from.is_some_and(|current| origin_position > current) {
                origin_position -= 1;
            }
            if index <= origin_position {
                warn!(
                    element,
                    origin = %dep.origin,
                    origin_position,
                    target_index = index,
                    "placement rejected"
                );
                return Err(QueueError::MoveRejected {
                    element: element.to_string(),
                    origin: dep.origin.clone(),
                    origin_position,
                    target_index: index,
                });
            }
        }
        Ok(())
    }
}

fn ensure_unqueued(store: &QueueStore, element: &str) -> Result<()> {
    match store.get_element(element)?.queue {
        Some(queue) => Err(QueueError::AlreadyQueued {
            element: element.to_string(),
            queue,
        }),
        None => Ok(()),
    }
}

fn ensure_in_queue(store: &QueueStore, element: &str, queue: QueueId) -> Result<()> {
    store.get_queue(queue)?;
    if store.get_element(element)?.queue != Some(queue) {
        return Err(QueueError::NotInQueue {
            element: element.to_string(),
            queue,
        });
    }
    Ok(())
}

/// Visible edges touching `element` (other endpoint placed too).
fn visible_touching(store: &QueueStore, graph: &DependencyGraph, element: &str) -> Vec<Dependency> {
    let placed = store.placed_elements();
    graph
        .outgoing_from(element)
        .into_iter()
        .chain(graph.incoming_to(element))
        .filter(|d| placed.contains(d.origin.as_str()) && placed.contains(d.destination.as_str()))
        .cloned()
        .collect()
}
