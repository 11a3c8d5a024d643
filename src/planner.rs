//! Entry point for the planning engine and presentation layer.
//!
//! [`LimitingResources`] bundles the resource catalog, queue store,
//! dependency graph, and sequencer, and checks the cross-component
//! preconditions (known resources, known elements) before delegating.
//!
//! # Example
//!
//! ```
//! use u_resource_queue::config::QueueConfig;
//! use u_resource_queue::catalog::ResourceCatalog;
//! use u_resource_queue::models::{QueueElement, Resource};
//! use u_resource_queue::planner::LimitingResources;
//!
//! let catalog = ResourceCatalog::from_resources(vec![
//!     Resource::machine("CRANE").limiting(),
//! ]).unwrap();
//! let mut planner = LimitingResources::new(catalog, QueueConfig::default());
//!
//! let q = planner.schedule("CRANE", QueueElement::new("LIFT-1").with_duration(3_600_000)).unwrap();
//! planner.schedule("CRANE", QueueElement::new("LIFT-2").with_duration(1_800_000)).unwrap();
//! planner.add_dependency("LIFT-1", "LIFT-2").unwrap();
//!
//! assert_eq!(planner.ordered_elements(q).unwrap().len(), 2);
//! assert_eq!(planner.visible_dependencies().len(), 1);
//! ```

use std::sync::Arc;

use tracing::{debug, warn};

use crate::catalog::ResourceCatalog;
use crate::config::QueueConfig;
use crate::error::{QueueError, Result};
use crate::graph::DependencyGraph;
use crate::models::{
    Dependency, DependencyType, LimitingResourceQueue, QueueElement, QueueId, Resource, Timeline,
};
use crate::sequencer::{QueueElementSequencer, QueueObserver};
use crate::snapshot::{DependencyRecord, ElementRecord, QueueRecord, Snapshot};
use crate::store::QueueStore;
use crate::timeline::compute_timeline;
use crate::validation::validate_snapshot_with_limit;

/// Limiting-resource queues with their dependencies.
#[derive(Debug, Clone)]
pub struct LimitingResources {
    catalog: ResourceCatalog,
    store: QueueStore,
    graph: DependencyGraph,
    sequencer: QueueElementSequencer,
    config: QueueConfig,
}

impl LimitingResources {
    /// Creates an empty planner over a resource catalog.
    ///
    /// Queue references already held by the catalog's resources are
    /// dropped; queues belong to the store that created them.
    pub fn new(mut catalog: ResourceCatalog, config: QueueConfig) -> Self {
        catalog.clear_queue_refs();
        Self {
            catalog,
            store: QueueStore::new(),
            graph: DependencyGraph::new().with_search_limit(config.cycle_search_limit),
            sequencer: QueueElementSequencer::new().with_move_validation(config.validate_moves),
            config,
        }
    }

    /// Resource catalog.
    pub fn catalog(&self) -> &ResourceCatalog {
        &self.catalog
    }

    /// Queue store.
    pub fn store(&self) -> &QueueStore {
        &self.store
    }

    /// Dependency graph.
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Active configuration.
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Registers a membership observer.
    pub fn add_observer(&mut self, observer: Arc<dyn QueueObserver>) {
        self.sequencer.add_observer(observer);
    }

    // ---- queues ----

    /// Returns the resource's queue, creating it on first use.
    ///
    /// `Ok(None)` for resources that cannot own a queue.
    pub fn get_or_create_queue_for(&mut self, resource_id: &str) -> Result<Option<QueueId>> {
        let resource = self
            .catalog
            .resource_mut(resource_id)
            .ok_or_else(|| QueueError::UnknownResource(resource_id.to_string()))?;
        Ok(self.store.get_or_create_queue_for(resource))
    }

    /// All queues, in creation order.
    pub fn all_queues(&self) -> Vec<&LimitingResourceQueue> {
        self.store.all_queues()
    }

    /// Resources flagged limiting.
    pub fn limiting_resources(&self) -> Vec<&Resource> {
        self.catalog.limiting_resources()
    }

    /// Resources not flagged limiting.
    pub fn non_limiting_resources(&self) -> Vec<&Resource> {
        self.catalog.non_limiting_resources()
    }

    /// Queue owned by a resource, if created.
    pub fn queue_for(&self, resource_id: &str) -> Option<&LimitingResourceQueue> {
        self.store.queue_for_resource(resource_id)
    }

    /// Elements of a queue in order.
    pub fn ordered_elements(&self, queue: QueueId) -> Result<Vec<&QueueElement>> {
        self.store.ordered_elements(queue)
    }

    // ---- elements ----

    /// Registers an unqueued element.
    pub fn create_element(&mut self, element: QueueElement) -> Result<()> {
        self.store.add_element(element)
    }

    /// Registers an element and appends it to the resource's queue,
    /// creating the queue if needed.
    ///
    /// # Errors
    /// - `UnknownResource`, `NotLimiting` for a resource without a queue.
    /// - `DuplicateElement` if the id is taken.
    /// - `NegativeDuration` for a negative duration.
    pub fn schedule(&mut self, resource_id: &str, element: QueueElement) -> Result<QueueId> {
        if !self.catalog.get(resource_id)?.can_own_queue() {
            return Err(QueueError::NotLimiting(resource_id.to_string()));
        }
        if self.store.element(&element.id).is_some() {
            return Err(QueueError::DuplicateElement(element.id));
        }
        if element.duration_ms < 0 {
            return Err(QueueError::NegativeDuration {
                element: element.id,
                duration_ms: element.duration_ms,
            });
        }
        let queue = self
            .get_or_create_queue_for(resource_id)?
            .ok_or_else(|| QueueError::NotLimiting(resource_id.to_string()))?;
        let id = element.id.clone();
        self.store.add_element(element)?;
        self.sequencer
            .append(&mut self.store, &self.graph, queue, &id)?;
        Ok(queue)
    }

    /// Appends an unqueued element to a queue.
    pub fn append(&mut self, queue: QueueId, element: &str) -> Result<usize> {
        self.sequencer
            .append(&mut self.store, &self.graph, queue, element)
    }

    /// Inserts an unqueued element at `index`.
    pub fn insert_at(&mut self, queue: QueueId, element: &str, index: usize) -> Result<usize> {
        self.sequencer
            .insert_at(&mut self.store, &self.graph, queue, element, index)
    }

    /// Detaches an element from a queue, keeping its dependencies.
    pub fn remove(&mut self, queue: QueueId, element: &str) -> Result<usize> {
        self.sequencer
            .remove(&mut self.store, &self.graph, queue, element)
    }

    /// Moves an element between (or within) queues.
    pub fn move_element(
        &mut self,
        element: &str,
        from: QueueId,
        to: QueueId,
        target_index: usize,
    ) -> Result<()> {
        self.sequencer
            .move_element(&mut self.store, &self.graph, element, from, to, target_index)
    }

    /// Removes an element from whichever queue holds it.
    pub fn unschedule(&mut self, element: &str) -> Result<QueueId> {
        self.sequencer
            .unschedule(&mut self.store, &self.graph, element)
    }

    /// Destroys an element together with every dependency touching it.
    pub fn delete_element(&mut self, element: &str) -> Result<QueueElement> {
        if self.store.get_element(element)?.is_queued() {
            self.unschedule(element)?;
        }
        let removed = self.store.take_element(element)?;
        let dropped = self.graph.remove_touching(element);
        debug!(element, dependencies = dropped.len(), "element deleted");
        Ok(removed)
    }

    // ---- dependencies ----

    /// Adds an end-to-start dependency.
    pub fn add_dependency(&mut self, origin: &str, destination: &str) -> Result<Dependency> {
        self.add_typed_dependency(origin, destination, DependencyType::EndStart)
    }

    /// Adds a dependency of the given type between two known elements.
    pub fn add_typed_dependency(
        &mut self,
        origin: &str,
        destination: &str,
        dependency_type: DependencyType,
    ) -> Result<Dependency> {
        self.store.get_element(origin)?;
        self.store.get_element(destination)?;
        self.graph
            .add_dependency(Dependency::new(origin, destination).with_type(dependency_type))
    }

    /// Removes a dependency.
    pub fn remove_dependency(&mut self, origin: &str, destination: &str) -> Result<Dependency> {
        self.graph.remove_dependency(origin, destination)
    }

    /// Dependencies whose endpoints are both queued.
    pub fn visible_dependencies(&self) -> Vec<&Dependency> {
        self.graph
            .dependencies_visible_given(&self.store.placed_elements())
    }

    // ---- derived views ----

    /// Computes element times from the configured epoch.
    pub fn timeline(&self) -> Timeline {
        compute_timeline(&self.store, &self.graph, self.config.epoch_ms)
    }

    /// Flat records of the current state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            queues: self
                .store
                .all_queues()
                .into_iter()
                .map(|q| QueueRecord {
                    queue_id: q.id,
                    resource_id: q.resource_id.clone(),
                    elements: q.elements().to_vec(),
                })
                .collect(),
            elements: self.store.elements().map(ElementRecord::from).collect(),
            dependencies: self
                .graph
                .dependencies()
                .map(|d| DependencyRecord {
                    origin: d.origin.clone(),
                    destination: d.destination.clone(),
                    dependency_type: d.dependency_type,
                })
                .collect(),
        }
    }

    /// Rebuilds state by replaying a snapshot over a resource catalog.
    ///
    /// The snapshot is checked first, with the same cycle search limit the
    /// restored graph uses (see
    /// [`validate_snapshot_with_limit`](crate::validation::validate_snapshot_with_limit)); any
    /// inconsistency (unknown resource, resource that cannot own a queue,
    /// unknown or repeated element, cyclic or duplicate edge) fails with
    /// `InvalidSnapshot` listing every problem found.
    pub fn restore(catalog: ResourceCatalog, snapshot: Snapshot, config: QueueConfig) -> Result<Self> {
        if let Err(errors) =
            validate_snapshot_with_limit(&snapshot, &catalog, config.cycle_search_limit)
        {
            let messages: Vec<_> = errors.into_iter().map(|e| e.message).collect();
            warn!(problems = messages.len(), "snapshot rejected");
            return Err(QueueError::InvalidSnapshot(messages.join("; ")));
        }

        let mut planner = Self::new(catalog, config);
        let invalid = |e: QueueError| QueueError::InvalidSnapshot(e.to_string());

        for record in &snapshot.queues {
            let resource = planner
                .catalog
                .resource_mut(&record.resource_id)
                .ok_or_else(|| invalid(QueueError::UnknownResource(record.resource_id.clone())))?;
            planner
                .store
                .restore_queue(record.queue_id, resource)
                .map_err(invalid)?;
        }

        for record in snapshot.elements {
            planner
                .store
                .add_element(QueueElement::from(record))
                .map_err(invalid)?;
        }
        for record in &snapshot.queues {
            for element in &record.elements {
                planner
                    .sequencer
                    .append(&mut planner.store, &planner.graph, record.queue_id, element)
                    .map_err(invalid)?;
            }
        }
        for record in snapshot.dependencies {
            planner
                .add_typed_dependency(&record.origin, &record.destination, record.dependency_type)
                .map_err(invalid)?;
        }

        debug!(
            queues = planner.store.all_queues().len(),
            dependencies = planner.graph.len(),
            "restored from snapshot"
        );
        Ok(planner)
    }
}
