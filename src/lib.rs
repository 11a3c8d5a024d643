//! Limiting-resource queues for the U-Engine ecosystem.
//!
//! Work assigned to a *limiting* resource (a scarce worker or machine) is
//! sequenced explicitly in a queue owned by that resource. Queue elements
//! can be linked by precedence dependencies that hold regardless of which
//! queue each element sits in.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Resource`, `Task`, `LimitingResourceQueue`,
//!   `QueueElement`, `Dependency`, `Timeline`
//! - **`catalog`**: Read-only resource queries (worker tags, limiting flag,
//!   criteria, task relations)
//! - **`store`**: Lazy one-queue-per-resource creation and element registry
//! - **`sequencer`**: Append / insert / remove / move / unschedule with
//!   atomic validation and membership observers
//! - **`graph`**: Acyclic dependency graph and the "visible when placed" view
//! - **`timeline`**: Start/end computation over queue order and dependencies
//! - **`snapshot`**: Flat records for persistence
//! - **`validation`**: Multi-error snapshot checks before restore
//! - **`planner`**: `LimitingResources` facade tying the above together
//! - **`config`**, **`error`**, **`logging`**: ambient support
//!
//! # Concurrency
//!
//! Single-writer: nothing here locks. Wrap a `LimitingResources` in a mutex
//! (or a transaction scope) per request if it is shared.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Cormen et al. (2009), "Introduction to Algorithms", Ch. 22

pub mod catalog;
pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod models;
pub mod planner;
pub mod sequencer;
pub mod snapshot;
pub mod store;
pub mod timeline;
pub mod validation;

pub use error::{QueueError, Result};
pub use planner::LimitingResources;
