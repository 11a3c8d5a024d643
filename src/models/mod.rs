//! Limiting-resource domain models.
//!
//! Plain data types for resources, tasks, queues, queue elements, and the
//! dependencies between elements. Behaviour that spans several of them
//! lives in the engine modules (`catalog`, `store`, `sequencer`, `graph`).
//!
//! # Domain Mappings
//!
//! | u-resource-queue | Shipyard | Manufacturing |
//! |------------------|----------|---------------|
//! | Resource (limiting) | Crane / Welder | Bottleneck Machine |
//! | LimitingResourceQueue | Crane Schedule | Machine Queue |
//! | QueueElement | Lift / Weld Job | Operation |
//! | Dependency | Hull Block Order | Routing Precedence |

mod dependency;
mod element;
mod queue;
mod resource;
mod task;
mod timeline;

pub use dependency::{Dependency, DependencyType};
pub use element::QueueElement;
pub use queue::{LimitingResourceQueue, QueueId};
pub use resource::{CriterionSatisfaction, Resource, ResourceKind};
pub use task::{ResourceAllocation, Task};
pub use timeline::{Slot, Timeline, Violation, ViolationType};
