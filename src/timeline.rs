//! Start/end computation for queued elements.
//!
//! # Algorithm
//!
//! Topological sweep (Kahn) over the union of two edge sets:
//! - queue order: each element follows its predecessor in its queue;
//! - dependencies whose endpoints are both queued.
//!
//! Each element starts at the latest of the epoch, its earliest start, its
//! queue predecessor's end, and the bound each incoming dependency imposes.
//!
//! Because move validation is advisory, queue order and dependencies can
//! disagree and the union can contain a cycle. When the sweep stalls, the
//! head of the first unfinished queue is placed in queue order anyway and a
//! `PrecedenceViolation` is recorded for each origin not yet placed.
//!
//! # Complexity
//! O(n + e) where n = queued elements, e = visible dependencies.
//!
//! # Reference
//! Kahn (1962), "Topological sorting of large networks"

use std::collections::{HashMap, VecDeque};

use tracing::{debug, trace};

use crate::graph::DependencyGraph;
use crate::models::{QueueId, Slot, Timeline, Violation};
use crate::store::QueueStore;

struct Node<'a> {
    queue_id: QueueId,
    resource_id: &'a str,
    duration_ms: i64,
    earliest_start_ms: Option<i64>,
    queue_predecessor: Option<&'a str>,
    queue_successor: Option<&'a str>,
    pending: usize,
}

/// Computes times for every queued element, starting no earlier than
/// `epoch_ms`.
pub fn compute_timeline(store: &QueueStore, graph: &DependencyGraph, epoch_ms: i64) -> Timeline {
    let mut nodes: HashMap<&str, Node<'_>> = HashMap::new();
    let queues = store.all_queues();

    for queue in &queues {
        let ids = queue.elements();
        for (i, id) in ids.iter().enumerate() {
            let Some(element) = store.element(id) else {
                continue;
            };
            nodes.insert(
                id.as_str(),
                Node {
                    queue_id: queue.id,
                    resource_id: queue.resource_id.as_str(),
                    duration_ms: element.duration_ms,
                    earliest_start_ms: element.earliest_start_ms,
                    queue_predecessor: i.checked_sub(1).map(|p| ids[p].as_str()),
                    queue_successor: ids.get(i + 1).map(|s| s.as_str()),
                    pending: usize::from(i > 0),
                },
            );
        }
    }

    let visible: Vec<_> = graph
        .dependencies()
        .filter(|d| nodes.contains_key(d.origin.as_str()) && nodes.contains_key(d.destination.as_str()))
        .collect();
    for d in &visible {
        if let Some(n) = nodes.get_mut(d.destination.as_str()) {
            n.pending += 1;
        }
    }

    let mut ready: VecDeque<&str> = queues
        .iter()
        .flat_map(|q| q.elements())
        .map(|s| s.as_str())
        .filter(|id| nodes.get(id).is_some_and(|n| n.pending == 0))
        .collect();
    let mut next_in_queue: HashMap<QueueId, usize> = HashMap::new();
    let mut times: HashMap<&str, (i64, i64)> = HashMap::new();
    let mut timeline = Timeline::new();

    while times.len() < nodes.len() {
        let (id, forced) = match ready.pop_front() {
            Some(id) => (id, false),
            None => match stalled_head(&queues, &next_in_queue, &times) {
                Some(id) => (id, true),
                None => break,
            },
        };
        if times.contains_key(id) {
            continue;
        }
        let Some(node) = nodes.get(id) else {
            continue;
        };

        let mut start = epoch_ms.max(node.earliest_start_ms.unwrap_or(epoch_ms));
        if let Some(&(_, pred_end)) = node.queue_predecessor.and_then(|p| times.get(p)) {
            start = start.max(pred_end);
        }
        for dep in graph.incoming_to(id) {
            if !nodes.contains_key(dep.origin.as_str()) {
                continue;
            }
            match times.get(dep.origin.as_str()) {
                Some(&(o_start, o_end)) => {
                    start = start.max(dep.earliest_destination_start(o_start, o_end, node.duration_ms));
                }
                None => {
                    timeline.violations.push(Violation::precedence_violation(
                        id,
                        format!("'{id}' is queued before its origin '{}'", dep.origin),
                    ));
                }
            }
        }
        if forced {
            debug!(element = id, "timeline placed element out of dependency order");
        }

        let end = start + node.duration_ms;
        times.insert(id, (start, end));
        *next_in_queue.entry(node.queue_id).or_insert(0) += 1;
        timeline.slots.push(Slot {
            element_id: id.to_string(),
            queue_id: node.queue_id,
            resource_id: node.resource_id.to_string(),
            start_ms: start,
            end_ms: end,
        });

        let successors = node
            .queue_successor
            .into_iter()
            .chain(graph.outgoing_from(id).into_iter().map(|d| d.destination.as_str()));
        for succ in successors {
            if times.contains_key(succ) {
                continue;
            }
            if let Some(s) = nodes.get_mut(succ) {
                s.pending = s.pending.saturating_sub(1);
                if s.pending == 0 {
                    ready.push_back(succ);
                }
            }
        }
    }

    trace!(
        slots = timeline.slots.len(),
        violations = timeline.violations.len(),
        "timeline computed"
    );
    timeline
}

/// First unplaced element of the first queue that still has one.
fn stalled_head<'a>(
    queues: &[&'a crate::models::LimitingResourceQueue],
    next_in_queue: &HashMap<QueueId, usize>,
    times: &HashMap<&str, (i64, i64)>,
) -> Option<&'a str> {
    queues.iter().find_map(|q| {
        let next = next_in_queue.get(&q.id).copied().unwrap_or(0);
        q.elements()
            .get(next)
            .map(|s| s.as_str())
            .filter(|id| !times.contains_key(id))
    })
}
