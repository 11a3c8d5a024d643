//! Dependency graph between queue elements.
//!
//! Edges are independent of queue membership. The graph stays acyclic:
//! every insertion first searches for a path from the destination back to
//! the origin and refuses the edge if one exists.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.2 (BFS)

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use tracing::{debug, warn};

use crate::error::{QueueError, Result};
use crate::models::Dependency;

/// Directed, acyclic precedence graph over element ids.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    dependencies: BTreeMap<(String, String), Dependency>,
    outgoing: HashMap<String, Vec<String>>,
    incoming: HashMap<String, Vec<String>>,
    search_limit: Option<usize>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the cycle search at `limit` visited nodes. `None` searches the
    /// whole graph.
    ///
    /// A search that hits the cap refuses the edge with
    /// `SearchLimitExceeded`; it is never reported as a cycle.
    pub fn with_search_limit(mut self, limit: Option<usize>) -> Self {
        self.search_limit = limit;
        self
    }

    /// Adds an edge.
    ///
    /// # Errors
    /// - `DuplicateDependency` if the same origin/destination pair exists.
    /// - `CycleDetected` if destination already reaches origin (including
    ///   `origin == destination`).
    /// - `SearchLimitExceeded` if the search was capped before it finished.
    pub fn add_dependency(&mut self, dependency: Dependency) -> Result<Dependency> {
        let key = (dependency.origin.clone(), dependency.destination.clone());
        if self.dependencies.contains_key(&key) {
            return Err(QueueError::DuplicateDependency {
                origin: key.0,
                destination: key.1,
            });
        }
        match self.search(&dependency.destination, &dependency.origin) {
            Search::Found => {
                warn!(
                    origin = %dependency.origin,
                    destination = %dependency.destination,
                    "dependency refused: cycle"
                );
                return Err(QueueError::CycleDetected {
                    origin: key.0,
                    destination: key.1,
                });
            }
            Search::LimitExceeded(limit) => {
                warn!(
                    origin = %dependency.origin,
                    destination = %dependency.destination,
                    limit,
                    "dependency refused: cycle search limit exceeded"
                );
                return Err(QueueError::SearchLimitExceeded {
                    origin: key.0,
                    destination: key.1,
                    limit,
                });
            }
            Search::NotFound => {}
        }

        self.outgoing
            .entry(key.0.clone())
            .or_default()
            .push(key.1.clone());
        self.incoming
            .entry(key.1.clone())
            .or_default()
            .push(key.0.clone());
        debug!(origin = %key.0, destination = %key.1, "dependency added");
        self.dependencies.insert(key, dependency.clone());
        Ok(dependency)
    }

    /// Removes an edge. Queue membership is unaffected.
    pub fn remove_dependency(&mut self, origin: &str, destination: &str) -> Result<Dependency> {
        let removed = self
            .dependencies
            .remove(&(origin.to_string(), destination.to_string()))
            .ok_or_else(|| QueueError::UnknownDependency {
                origin: origin.to_string(),
                destination: destination.to_string(),
            })?;
        detach(&mut self.outgoing, origin, destination);
        detach(&mut self.incoming, destination, origin);
        debug!(origin, destination, "dependency removed");
        Ok(removed)
    }

    /// Removes every edge touching an element.
    pub fn remove_touching(&mut self, element_id: &str) -> Vec<Dependency> {
        let touching: Vec<(String, String)> = self
            .dependencies
            .values()
            .filter(|d| d.touches(element_id))
            .map(|d| (d.origin.clone(), d.destination.clone()))
            .collect();

        touching
            .iter()
            .filter_map(|(o, d)| self.remove_dependency(o, d).ok())
            .collect()
    }

    /// Looks up an edge.
    pub fn dependency(&self, origin: &str, destination: &str) -> Option<&Dependency> {
        self.dependencies
            .get(&(origin.to_string(), destination.to_string()))
    }

    /// Whether an edge exists.
    pub fn contains(&self, origin: &str, destination: &str) -> bool {
        self.dependency(origin, destination).is_some()
    }

    /// Edges leaving an element, in insertion order.
    pub fn outgoing_from(&self, element_id: &str) -> Vec<&Dependency> {
        self.outgoing
            .get(element_id)
            .into_iter()
            .flatten()
            .filter_map(|dest| self.dependency(element_id, dest))
            .collect()
    }

    /// Edges entering an element, in insertion order.
    pub fn incoming_to(&self, element_id: &str) -> Vec<&Dependency> {
        self.incoming
            .get(element_id)
            .into_iter()
            .flatten()
            .filter_map(|origin| self.dependency(origin, element_id))
            .collect()
    }

    /// Edges whose origin and destination are both placed.
    ///
    /// Edges touching an unqueued element are retained but hidden here
    /// until the element is placed again.
    pub fn dependencies_visible_given(&self, placed: &HashSet<&str>) -> Vec<&Dependency> {
        self.dependencies
            .values()
            .filter(|d| placed.contains(d.origin.as_str()) && placed.contains(d.destination.as_str()))
            .collect()
    }

    /// All edges, ordered by (origin, destination).
    pub fn dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.values()
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    /// Whether the graph has no edges.
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Number of distinct elements touched by any edge.
    pub fn node_count(&self) -> usize {
        self.outgoing
            .keys()
            .chain(self.incoming.keys())
            .collect::<HashSet<_>>()
            .len()
    }

    /// BFS over outgoing edges from `from`, looking for `to`.
    fn search(&self, from: &str, to: &str) -> Search {
        if from == to {
            return Search::Found;
        }
        let mut visited: HashSet<&str> = HashSet::new();
        let mut frontier: VecDeque<&str> = VecDeque::new();
        visited.insert(from);
        frontier.push_back(from);

        while let Some(node) = frontier.pop_front() {
            for next in self.outgoing.get(node).into_iter().flatten() {
                if next == to {
                    return Search::Found;
                }
                if visited.insert(next.as_str()) {
                    if let Some(limit) = self.search_limit.filter(|&l| visited.len() > l) {
                        return Search::LimitExceeded(limit);
                    }
                    frontier.push_back(next);
                }
            }
        }
        Search::NotFound
    }
}

/// Outcome of a reachability search.
enum Search {
    Found,
    NotFound,
    LimitExceeded(usize),
}

fn detach(adjacency: &mut HashMap<String, Vec<String>>, key: &str, value: &str) {
    if let Some(list) = adjacency.get_mut(key) {
        list.retain(|v| v != value);
        if list.is_empty() {
            adjacency.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DependencyType;

    fn chain(ids: &[&str]) -> DependencyGraph {
        let mut g = DependencyGraph::new();
        for pair in ids.windows(2) {
            g.add_dependency(Dependency::new(pair[0], pair[1])).unwrap();
        }
        g
    }

    #[test]
    fn test_add_and_query() {
        let mut g = DependencyGraph::new();
        let d = g
            .add_dependency(Dependency::new("E1", "E2").with_type(DependencyType::StartStart))
            .unwrap();
        assert_eq!(d.dependency_type, DependencyType::StartStart);
        g.add_dependency(Dependency::new("E1", "E3")).unwrap();

        assert_eq!(g.len(), 2);
        assert!(g.contains("E1", "E2"));
        assert!(!g.contains("E2", "E1"));

        let out: Vec<_> = g.outgoing_from("E1").iter().map(|d| d.destination.as_str()).collect();
        assert_eq!(out, vec!["E2", "E3"]);
        let inc: Vec<_> = g.incoming_to("E3").iter().map(|d| d.origin.as_str()).collect();
        assert_eq!(inc, vec!["E1"]);
        assert!(g.incoming_to("E1").is_empty());
        assert_eq!(g.node_count(), 3);
    }

    #[test]
    fn test_reverse_edge_is_cycle() {
        let mut g = chain(&["A", "B"]);
        let err = g.add_dependency(Dependency::new("B", "A")).unwrap_err();
        assert_eq!(
            err,
            QueueError::CycleDetected {
                origin: "B".into(),
                destination: "A".into()
            }
        );
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_self_loop_is_cycle() {
        let mut g = DependencyGraph::new();
        assert!(matches!(
            g.add_dependency(Dependency::new("A", "A")),
            Err(QueueError::CycleDetected { .. })
        ));
        assert!(g.is_empty());
    }

    #[test]
    fn test_transitive_cycle() {
        let mut g = chain(&["A", "B", "C", "D"]);
        assert!(matches!(
            g.add_dependency(Dependency::new("D", "A")),
            Err(QueueError::CycleDetected { .. })
        ));
        // Shortcut in the same direction is fine.
        assert!(g.add_dependency(Dependency::new("A", "D")).is_ok());
    }

    #[test]
    fn test_duplicate_rejected_regardless_of_type() {
        let mut g = chain(&["A", "B"]);
        let err = g
            .add_dependency(Dependency::new("A", "B").with_type(DependencyType::EndEnd))
            .unwrap_err();
        assert!(matches!(err, QueueError::DuplicateDependency { .. }));
    }

    #[test]
    fn test_search_limit_is_not_a_cycle() {
        let mut g = chain(&["A", "B", "C", "D"]).with_search_limit(Some(2));
        // Nothing reaches Z, but the search from A passes the cap.
        let err = g.add_dependency(Dependency::new("Z", "A")).unwrap_err();
        assert_eq!(
            err,
            QueueError::SearchLimitExceeded {
                origin: "Z".into(),
                destination: "A".into(),
                limit: 2
            }
        );
        assert!(!g.contains("Z", "A"));

        // Short searches and real cycles are unaffected.
        assert!(g.add_dependency(Dependency::new("X", "C")).is_ok());
        assert!(matches!(
            g.add_dependency(Dependency::new("B", "A")),
            Err(QueueError::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_unbounded_search_accepts_long_chain() {
        let ids: Vec<String> = (0..50).map(|i| format!("N{i}")).collect();
        let refs: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();
        let mut g = chain(&refs);
        assert!(g.add_dependency(Dependency::new("ROOT", "N0")).is_ok());
        assert!(matches!(
            g.add_dependency(Dependency::new("N49", "ROOT")),
            Err(QueueError::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_remove_dependency() {
        let mut g = chain(&["A", "B", "C"]);
        let removed = g.remove_dependency("A", "B").unwrap();
        assert_eq!(removed.origin, "A");
        assert!(g.outgoing_from("A").is_empty());
        assert!(g.incoming_to("B").is_empty());
        // Now B -> A no longer closes a cycle.
        assert!(g.add_dependency(Dependency::new("B", "A")).is_ok());

        assert!(matches!(
            g.remove_dependency("A", "B"),
            Err(QueueError::UnknownDependency { .. })
        ));
    }

    #[test]
    fn test_remove_touching() {
        let mut g = chain(&["A", "B", "C"]);
        g.add_dependency(Dependency::new("X", "Y")).unwrap();
        let removed = g.remove_touching("B");
        assert_eq!(removed.len(), 2);
        assert_eq!(g.len(), 1);
        assert!(g.contains("X", "Y"));
    }

    #[test]
    fn test_visible_given_placed() {
        let g = chain(&["A", "B", "C"]);
        let placed: HashSet<&str> = ["A", "B"].into_iter().collect();
        let visible = g.dependencies_visible_given(&placed);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].destination, "B");

        let none: HashSet<&str> = HashSet::new();
        assert!(g.dependencies_visible_given(&none).is_empty());
    }
}
