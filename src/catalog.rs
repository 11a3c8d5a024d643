//! Read-only queries over resources.
//!
//! The catalog is the in-memory view of the resources the resource
//! management subsystem maintains. All filters are flag- or
//! criterion-exact; nothing is inferred from queue existence.

use std::collections::HashSet;

use tracing::trace;

use crate::error::{QueueError, Result};
use crate::models::{Resource, Task};

/// Resource lookup and filtering.
#[derive(Debug, Clone, Default)]
pub struct ResourceCatalog {
    resources: Vec<Resource>,
}

impl ResourceCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog from resources.
    ///
    /// Fails on duplicate ids.
    pub fn from_resources(resources: Vec<Resource>) -> Result<Self> {
        let mut catalog = Self::new();
        for r in resources {
            catalog.add(r)?;
        }
        Ok(catalog)
    }

    /// Adds a resource.
    pub fn add(&mut self, resource: Resource) -> Result<()> {
        if self.resource(&resource.id).is_some() {
            return Err(QueueError::DuplicateResource(resource.id));
        }
        self.resources.push(resource);
        Ok(())
    }

    /// All resources, in insertion order.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Looks up a resource by id.
    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    /// Mutable lookup; used to attach queues.
    pub fn resource_mut(&mut self, id: &str) -> Option<&mut Resource> {
        self.resources.iter_mut().find(|r| r.id == id)
    }

    pub(crate) fn clear_queue_refs(&mut self) {
        for r in &mut self.resources {
            r.queue = None;
        }
    }

    /// Looks up a resource, failing with `UnknownResource`.
    pub fn get(&self, id: &str) -> Result<&Resource> {
        self.resource(id)
            .ok_or_else(|| QueueError::UnknownResource(id.to_string()))
    }

    /// All workers.
    pub fn workers(&self) -> Vec<&Resource> {
        self.resources.iter().filter(|r| r.is_worker()).collect()
    }

    /// Workers not tagged real.
    ///
    /// Independent of [`real_workers`](Self::real_workers): a worker tagged
    /// both ways (or neither) is not guaranteed to land in exactly one.
    pub fn virtual_workers(&self) -> Vec<&Resource> {
        self.resources
            .iter()
            .filter(|r| r.is_worker() && !r.real)
            .collect()
    }

    /// Workers not tagged virtual.
    pub fn real_workers(&self) -> Vec<&Resource> {
        self.resources
            .iter()
            .filter(|r| r.is_worker() && !r.is_virtual)
            .collect()
    }

    /// All machines.
    pub fn machines(&self) -> Vec<&Resource> {
        self.resources.iter().filter(|r| r.is_machine()).collect()
    }

    /// Real workers followed by machines.
    pub fn real_resources(&self) -> Vec<&Resource> {
        let mut result = self.real_workers();
        result.extend(self.machines());
        result
    }

    /// Resources flagged limiting.
    pub fn limiting_resources(&self) -> Vec<&Resource> {
        self.resources.iter().filter(|r| r.limiting).collect()
    }

    /// Resources not flagged limiting.
    pub fn non_limiting_resources(&self) -> Vec<&Resource> {
        self.resources.iter().filter(|r| !r.limiting).collect()
    }

    /// Resources whose limiting flag equals `want_limiting` and that
    /// satisfy every criterion. An empty set selects by flag only.
    pub fn find_satisfying_all_criterions(
        &self,
        criteria: &HashSet<String>,
        want_limiting: bool,
    ) -> Vec<&Resource> {
        trace!(criteria = criteria.len(), want_limiting, "find_satisfying_all_criterions");
        self.resources
            .iter()
            .filter(|r| r.limiting == want_limiting && r.satisfies_all(criteria))
            .collect()
    }

    /// Resources satisfying at least one criterion at some point.
    ///
    /// An empty set returns every resource.
    pub fn find_satisfying_some_criterion(&self, criteria: &HashSet<String>) -> Vec<&Resource> {
        trace!(criteria = criteria.len(), "find_satisfying_some_criterion");
        if criteria.is_empty() {
            return self.resources.iter().collect();
        }
        self.resources
            .iter()
            .filter(|r| criteria.iter().any(|c| r.satisfies(c)))
            .collect()
    }

    /// Resources reached by the tasks' allocations.
    ///
    /// Specific relations first, then generic ones, de-duplicated in
    /// first-seen order. Ids with no catalog entry are skipped.
    pub fn find_resources_related_to(&self, tasks: &[Task]) -> Vec<&Resource> {
        if tasks.is_empty() {
            return Vec::new();
        }
        let specific = tasks.iter().flat_map(|t| t.specific_resources());
        let generic = tasks.iter().flat_map(|t| t.generic_resources());

        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for id in specific.chain(generic) {
            if seen.insert(id) {
                if let Some(r) = self.resource(id) {
                    result.push(r);
                }
            }
        }
        trace!(tasks = tasks.len(), found = result.len(), "find_resources_related_to");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(resources: &[&Resource]) -> Vec<String> {
        resources.iter().map(|r| r.id.clone()).collect()
    }

    fn criteria(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn sample_catalog() -> ResourceCatalog {
        ResourceCatalog::from_resources(vec![
            Resource::worker("W1").with_criterion("welder"),
            Resource::virtual_worker("V1").with_criterion("welder").with_criterion("fitter"),
            Resource::machine("M1").limiting().with_criterion("crane"),
            Resource::worker("W2").limiting().with_criterion("welder"),
            Resource::machine("M2"),
        ])
        .unwrap()
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = ResourceCatalog::from_resources(vec![
            Resource::worker("W1"),
            Resource::machine("W1"),
        ])
        .unwrap_err();
        assert_eq!(err, QueueError::DuplicateResource("W1".into()));
    }

    #[test]
    fn test_worker_partition() {
        let c = sample_catalog();
        assert_eq!(ids(&c.workers()), vec!["W1", "V1", "W2"]);
        assert_eq!(ids(&c.virtual_workers()), vec!["V1"]);
        assert_eq!(ids(&c.real_workers()), vec!["W1", "W2"]);
        assert_eq!(ids(&c.machines()), vec!["M1", "M2"]);
        assert_eq!(ids(&c.real_resources()), vec!["W1", "W2", "M1", "M2"]);
    }

    #[test]
    fn test_worker_tags_not_complementary() {
        let c = ResourceCatalog::from_resources(vec![
            Resource::worker("BOTH").with_virtual(true),
            Resource::new("NEITHER", crate::models::ResourceKind::Worker),
        ])
        .unwrap();

        // Tagged both: excluded from both lists.
        // Tagged neither: included in both lists.
        assert_eq!(ids(&c.virtual_workers()), vec!["NEITHER"]);
        assert_eq!(ids(&c.real_workers()), vec!["NEITHER"]);
    }

    #[test]
    fn test_limiting_filters() {
        let c = sample_catalog();
        assert_eq!(ids(&c.limiting_resources()), vec!["M1", "W2"]);
        assert_eq!(ids(&c.non_limiting_resources()), vec!["W1", "V1", "M2"]);
    }

    #[test]
    fn test_satisfying_all_empty_selects_by_flag() {
        let c = sample_catalog();
        let found = c.find_satisfying_all_criterions(&HashSet::new(), true);
        assert_eq!(ids(&found), vec!["M1", "W2"]);
    }

    #[test]
    fn test_satisfying_all() {
        let c = sample_catalog();
        let found = c.find_satisfying_all_criterions(&criteria(&["welder", "fitter"]), false);
        assert_eq!(ids(&found), vec!["V1"]);

        let found = c.find_satisfying_all_criterions(&criteria(&["welder"]), true);
        assert_eq!(ids(&found), vec!["W2"]);
    }

    #[test]
    fn test_satisfying_some() {
        let c = sample_catalog();
        assert_eq!(c.find_satisfying_some_criterion(&HashSet::new()).len(), 5);

        let found = c.find_satisfying_some_criterion(&criteria(&["crane", "fitter"]));
        let mut found = ids(&found);
        found.sort();
        assert_eq!(found, vec!["M1", "V1"]);

        assert!(c.find_satisfying_some_criterion(&criteria(&["painter"])).is_empty());
    }

    #[test]
    fn test_related_to_tasks() {
        let c = sample_catalog();
        let tasks = vec![
            Task::new("T1")
                .with_specific("M1", 2)
                .with_specific("M2", 0)
                .with_generic(vec!["W1".into(), "M1".into()]),
            Task::new("T2")
                .with_specific("W2", 1)
                .with_generic(vec!["V1".into(), "UNKNOWN".into()]),
        ];

        let found = c.find_resources_related_to(&tasks);
        assert_eq!(ids(&found), vec!["M1", "W2", "W1", "V1"]);
    }

    #[test]
    fn test_related_to_no_tasks() {
        let c = sample_catalog();
        assert!(c.find_resources_related_to(&[]).is_empty());
    }

    #[test]
    fn test_lookup() {
        let c = sample_catalog();
        assert!(c.get("M1").is_ok());
        assert_eq!(
            c.get("nope").unwrap_err(),
            QueueError::UnknownResource("nope".into())
        );
    }
}
