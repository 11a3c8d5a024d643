//! Snapshot validation.
//!
//! Checks a snapshot against a resource catalog and reports every problem
//! at once. `LimitingResources::restore` runs this before replaying
//! anything. Detects:
//! - Duplicate queue, element, and dependency ids
//! - Queues bound to unknown resources or resources that cannot own one
//! - Queue entries and dependency endpoints naming unknown elements
//! - Elements listed in more than one queue position
//! - Elements with a negative duration
//! - Circular dependencies, found by the same search `DependencyGraph` runs
//!   (and subject to the same search limit when one is given)

use std::collections::HashSet;

use crate::catalog::ResourceCatalog;
use crate::error::QueueError;
use crate::graph::DependencyGraph;
use crate::models::Dependency;
use crate::snapshot::Snapshot;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entries share the same id.
    DuplicateId,
    /// A queue references a resource that doesn't exist.
    InvalidResourceReference,
    /// A queue is bound to a resource that cannot own one.
    NotLimiting,
    /// A queue or dependency references an element that doesn't exist.
    InvalidElementReference,
    /// An element appears in more than one queue position.
    ElementQueuedTwice,
    /// Dependency graph contains a cycle.
    CyclicDependency,
    /// Cycle detection hit the configured search limit.
    SearchLimitExceeded,
    /// An element has a negative duration.
    InvalidDuration,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a snapshot against the resources it will be restored over,
/// with an unbounded cycle search.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_snapshot(snapshot: &Snapshot, catalog: &ResourceCatalog) -> ValidationResult {
    validate_snapshot_with_limit(snapshot, catalog, None)
}

/// Like [`validate_snapshot`], but cycle detection is capped at
/// `search_limit` visited nodes, as a graph built with the same limit
/// would be on restore.
pub fn validate_snapshot_with_limit(
    snapshot: &Snapshot,
    catalog: &ResourceCatalog,
    search_limit: Option<usize>,
) -> ValidationResult {
    let mut errors = Vec::new();

    let mut element_ids = HashSet::new();
    for e in &snapshot.elements {
        if !element_ids.insert(e.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate element ID: {}", e.id),
            ));
        }
        if e.duration_ms < 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDuration,
                format!("Element '{}' has negative duration {}", e.id, e.duration_ms),
            ));
        }
    }

    let mut queue_ids = HashSet::new();
    let mut owners = HashSet::new();
    let mut placed = HashSet::new();
    for q in &snapshot.queues {
        if !queue_ids.insert(q.queue_id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate queue ID: {}", q.queue_id),
            ));
        }
        if !owners.insert(q.resource_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Resource '{}' owns more than one queue", q.resource_id),
            ));
        }
        match catalog.resource(&q.resource_id) {
            None => errors.push(ValidationError::new(
                ValidationErrorKind::InvalidResourceReference,
                format!("Queue {} references unknown resource '{}'", q.queue_id, q.resource_id),
            )),
            Some(r) if !r.can_own_queue() => errors.push(ValidationError::new(
                ValidationErrorKind::NotLimiting,
                format!("Queue {} bound to non-limiting resource '{}'", q.queue_id, r.id),
            )),
            Some(_) => {}
        }
        for e in &q.elements {
            if !element_ids.contains(e.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidElementReference,
                    format!("Queue {} references unknown element '{e}'", q.queue_id),
                ));
            }
            if !placed.insert(e.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ElementQueuedTwice,
                    format!("Element '{e}' is queued more than once"),
                ));
            }
        }
    }

    let mut edges = HashSet::new();
    for d in &snapshot.dependencies {
        if !edges.insert((d.origin.as_str(), d.destination.as_str())) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate dependency: {} -> {}", d.origin, d.destination),
            ));
        }
        for endpoint in [&d.origin, &d.destination] {
            if !element_ids.contains(endpoint.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidElementReference,
                    format!(
                        "Dependency {} -> {} references unknown element '{endpoint}'",
                        d.origin, d.destination
                    ),
                ));
            }
        }
    }

    if let Some(cycle_err) = detect_cycles(snapshot, search_limit) {
        errors.push(cycle_err);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Replays the edges into a [`DependencyGraph`]; the first edge it refuses
/// as a cycle (or for hitting the search limit) is reported.
fn detect_cycles(snapshot: &Snapshot, search_limit: Option<usize>) -> Option<ValidationError> {
    let mut graph = DependencyGraph::new().with_search_limit(search_limit);
    snapshot.dependencies.iter().find_map(|d| {
        match graph.add_dependency(Dependency::new(d.origin.as_str(), d.destination.as_str())) {
            Err(QueueError::CycleDetected {
                origin,
                destination,
            }) => Some(ValidationError::new(
                ValidationErrorKind::CyclicDependency,
                format!("Dependency {origin} -> {destination} closes a cycle"),
            )),
            Err(QueueError::SearchLimitExceeded {
                origin,
                destination,
                limit,
            }) => Some(ValidationError::new(
                ValidationErrorKind::SearchLimitExceeded,
                format!("Dependency {origin} -> {destination}: cycle search exceeded {limit} nodes"),
            )),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DependencyType, QueueId, Resource};
    use crate::snapshot::{DependencyRecord, ElementRecord, QueueRecord};

    fn catalog() -> ResourceCatalog {
        ResourceCatalog::from_resources(vec![
            Resource::machine("M1").limiting(),
            Resource::machine("M2").limiting(),
            Resource::worker("W1"),
        ])
        .unwrap()
    }

    fn element(id: &str) -> ElementRecord {
        ElementRecord {
            id: id.into(),
            task_id: None,
            duration_ms: 100,
            earliest_start_ms: None,
        }
    }

    fn queue(id: u64, resource: &str, elements: &[&str]) -> QueueRecord {
        QueueRecord {
            queue_id: QueueId(id),
            resource_id: resource.into(),
            elements: elements.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn dep(origin: &str, destination: &str) -> DependencyRecord {
        DependencyRecord {
            origin: origin.into(),
            destination: destination.into(),
            dependency_type: DependencyType::EndStart,
        }
    }

    fn sample_snapshot() -> Snapshot {
        Snapshot {
            queues: vec![queue(0, "M1", &["E1", "E2"]), queue(1, "M2", &["E3"])],
            elements: vec![element("E1"), element("E2"), element("E3"), element("E4")],
            dependencies: vec![dep("E1", "E3"), dep("E3", "E4")],
        }
    }

    fn has(errors: &[ValidationError], kind: ValidationErrorKind) -> bool {
        errors.iter().any(|e| e.kind == kind)
    }

    #[test]
    fn test_valid_snapshot() {
        assert!(validate_snapshot(&sample_snapshot(), &catalog()).is_ok());
    }

    #[test]
    fn test_duplicate_element() {
        let mut s = sample_snapshot();
        s.elements.push(element("E1"));
        let errors = validate_snapshot(&s, &catalog()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("element")));
    }

    #[test]
    fn test_resource_references() {
        let mut s = sample_snapshot();
        s.queues.push(queue(2, "NOPE", &[]));
        s.queues.push(queue(3, "W1", &[]));
        let errors = validate_snapshot(&s, &catalog()).unwrap_err();
        assert!(has(&errors, ValidationErrorKind::InvalidResourceReference));
        assert!(has(&errors, ValidationErrorKind::NotLimiting));
    }

    #[test]
    fn test_resource_with_two_queues() {
        let mut s = sample_snapshot();
        s.queues.push(queue(2, "M1", &[]));
        let errors = validate_snapshot(&s, &catalog()).unwrap_err();
        assert!(has(&errors, ValidationErrorKind::DuplicateId));
    }

    #[test]
    fn test_element_queued_twice() {
        let mut s = sample_snapshot();
        s.queues[1].elements.push("E1".into());
        let errors = validate_snapshot(&s, &catalog()).unwrap_err();
        assert!(has(&errors, ValidationErrorKind::ElementQueuedTwice));
    }

    #[test]
    fn test_unknown_element_references() {
        let mut s = sample_snapshot();
        s.queues[0].elements.push("GHOST".into());
        s.dependencies.push(dep("E2", "PHANTOM"));
        let errors = validate_snapshot(&s, &catalog()).unwrap_err();
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.kind == ValidationErrorKind::InvalidElementReference)
                .count(),
            2
        );
    }

    #[test]
    fn test_cyclic_dependency() {
        let mut s = sample_snapshot();
        s.dependencies.push(dep("E4", "E1"));
        let errors = validate_snapshot(&s, &catalog()).unwrap_err();
        assert!(has(&errors, ValidationErrorKind::CyclicDependency));
    }

    #[test]
    fn test_search_limit_matches_restore() {
        // E5 -> E1 closes no cycle, but the search from E1 walks the chain.
        let mut s = sample_snapshot();
        s.elements.push(element("E5"));
        s.dependencies = vec![dep("E1", "E2"), dep("E2", "E3"), dep("E3", "E4"), dep("E5", "E1")];

        assert!(validate_snapshot(&s, &catalog()).is_ok());
        let errors = validate_snapshot_with_limit(&s, &catalog(), Some(2)).unwrap_err();
        assert!(has(&errors, ValidationErrorKind::SearchLimitExceeded));
        assert!(!has(&errors, ValidationErrorKind::CyclicDependency));
    }

    #[test]
    fn test_negative_duration() {
        let mut s = sample_snapshot();
        s.elements[2].duration_ms = -5;
        let errors = validate_snapshot(&s, &catalog()).unwrap_err();
        assert!(has(&errors, ValidationErrorKind::InvalidDuration));
    }

    #[test]
    fn test_multiple_errors() {
        let mut s = sample_snapshot();
        s.dependencies.push(dep("E1", "E3"));
        s.queues.push(queue(0, "W1", &[]));
        let errors = validate_snapshot(&s, &catalog()).unwrap_err();
        assert!(errors.len() >= 3);
    }
}
