//! Error types for queue and dependency operations.
//!
//! Every operation validates before it mutates, so an `Err` always means
//! the queues and the dependency graph are exactly as they were before
//! the call.

use thiserror::Error;

use crate::models::QueueId;

/// Errors returned by queue, sequencing, and dependency operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// Insertion index outside `[0, len]`.
    #[error("invalid position {index} for queue of length {len}")]
    InvalidPosition { index: usize, len: usize },

    /// A move or insertion would place an element at or ahead of one of
    /// its origins in the same queue.
    #[error(
        "placing '{element}' at index {target_index} rejected: depends on '{origin}' at position {origin_position}"
    )]
    MoveRejected {
        element: String,
        origin: String,
        origin_position: usize,
        target_index: usize,
    },

    /// Adding the edge would close a cycle.
    #[error("dependency {origin} -> {destination} would create a cycle")]
    CycleDetected { origin: String, destination: String },

    /// Cycle detection hit `cycle_search_limit` before finishing, so the
    /// edge could be neither accepted nor proven cyclic.
    #[error("dependency {origin} -> {destination} refused: cycle search exceeded {limit} nodes")]
    SearchLimitExceeded {
        origin: String,
        destination: String,
        limit: usize,
    },

    /// The identical edge already exists.
    #[error("dependency {origin} -> {destination} already exists")]
    DuplicateDependency { origin: String, destination: String },

    #[error("dependency {origin} -> {destination} not found")]
    UnknownDependency { origin: String, destination: String },

    #[error("queue element not found: {0}")]
    UnknownElement(String),

    #[error("element '{element}' has negative duration {duration_ms}")]
    NegativeDuration { element: String, duration_ms: i64 },

    #[error("duplicate queue element: {0}")]
    DuplicateElement(String),

    #[error("queue not found: {0}")]
    UnknownQueue(QueueId),

    #[error("duplicate resource: {0}")]
    DuplicateResource(String),

    #[error("resource not found: {0}")]
    UnknownResource(String),

    /// The resource cannot own a queue (not a limiting worker or machine).
    #[error("resource '{0}' is not a limiting worker or machine")]
    NotLimiting(String),

    #[error("element '{element}' is already in queue {queue}")]
    AlreadyQueued { element: String, queue: QueueId },

    #[error("element '{element}' is not in queue {queue}")]
    NotInQueue { element: String, queue: QueueId },

    #[error("element '{0}' is not in any queue")]
    NotQueued(String),

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(String),
}

impl From<toml::de::Error> for QueueError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for QueueError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, QueueError>;
