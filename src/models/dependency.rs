//! Queue dependency model.
//!
//! A dependency is a directed precedence edge `origin -> destination`
//! between two queue elements. It is independent of queue membership: it
//! survives while either endpoint is unqueued and is only hidden from
//! rendering until both endpoints are placed again.

use serde::{Deserialize, Serialize};

/// Directed precedence edge between two queue elements.
///
/// Identity is the `(origin, destination)` pair; the type does not
/// distinguish edges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    /// Element that constrains.
    pub origin: String,
    /// Element that is constrained.
    pub destination: String,
    /// Which endpoints the constraint relates.
    pub dependency_type: DependencyType,
}

/// Precedence relation between origin and destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyType {
    /// Destination starts after origin ends.
    #[default]
    EndStart,
    /// Destination starts after origin starts.
    StartStart,
    /// Destination ends after origin ends.
    EndEnd,
    /// Destination ends after origin starts.
    StartEnd,
}

impl Dependency {
    /// Creates an end-to-start dependency.
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            dependency_type: DependencyType::EndStart,
        }
    }

    /// Sets the dependency type.
    pub fn with_type(mut self, dependency_type: DependencyType) -> Self {
        self.dependency_type = dependency_type;
        self
    }

    /// Whether the element is either endpoint.
    pub fn touches(&self, element_id: &str) -> bool {
        self.origin == element_id || self.destination == element_id
    }

    /// Earliest start of the destination permitted by this edge.
    ///
    /// `origin_start`/`origin_end` are the origin's computed times and
    /// `destination_duration` the destination's length.
    pub fn earliest_destination_start(
        &self,
        origin_start: i64,
        origin_end: i64,
        destination_duration: i64,
    ) -> i64 {
        match self.dependency_type {
            DependencyType::EndStart => origin_end,
            DependencyType::StartStart => origin_start,
            DependencyType::EndEnd => origin_end - destination_duration,
            DependencyType::StartEnd => origin_start - destination_duration,
        }
    }
}
