//! Task model.
//!
//! Tasks are owned by the planning engine. Here they only matter for the
//! resources their allocations reach, which drives
//! [`ResourceCatalog::find_resources_related_to`](crate::catalog::ResourceCatalog::find_resources_related_to).

use serde::{Deserialize, Serialize};

/// A planned task and its resource allocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Resource allocations of this task.
    pub allocations: Vec<ResourceAllocation>,
}

/// How a task reaches resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceAllocation {
    /// Direct assignment of one named resource.
    ///
    /// Only counts as a relation once it has at least one day assignment.
    Specific {
        resource_id: String,
        day_assignments: u32,
    },
    /// Pooled assignment; lists the resources that received day assignments.
    Generic { assigned_resources: Vec<String> },
}

impl Task {
    /// Creates a new task with the given ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            allocations: Vec::new(),
        }
    }

    /// Sets the task name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a specific allocation with `day_assignments` assigned days.
    pub fn with_specific(mut self, resource_id: impl Into<String>, day_assignments: u32) -> Self {
        self.allocations.push(ResourceAllocation::Specific {
            resource_id: resource_id.into(),
            day_assignments,
        });
        self
    }

    /// Adds a generic allocation over the given resources.
    pub fn with_generic(mut self, assigned_resources: Vec<String>) -> Self {
        self.allocations
            .push(ResourceAllocation::Generic { assigned_resources });
        self
    }

    /// Resources reached through specific allocations with assigned days.
    pub fn specific_resources(&self) -> impl Iterator<Item = &str> {
        self.allocations.iter().filter_map(|a| match a {
            ResourceAllocation::Specific {
                resource_id,
                day_assignments,
            } if *day_assignments > 0 => Some(resource_id.as_str()),
            _ => None,
        })
    }

    /// Resources reached through generic allocations.
    pub fn generic_resources(&self) -> impl Iterator<Item = &str> {
        self.allocations
            .iter()
            .filter_map(|a| match a {
                ResourceAllocation::Generic { assigned_resources } => Some(assigned_resources),
                _ => None,
            })
            .flat_map(|rs| rs.iter().map(|s| s.as_str()))
    }
}
