//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! The library only emits events; installing a subscriber is up to the
//! host. This helper covers hosts without their own setup.
//!
//! Priority for determining the filter:
//! 1. explicit `level` argument
//! 2. `U_QUEUE_LOG` environment variable, in `EnvFilter` syntax
//!    (e.g. "debug", "u_resource_queue::sequencer=trace")
//! 3. default to `info`

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable consulted when no explicit level is given.
pub const LOG_ENV: &str = "U_QUEUE_LOG";

/// Installs a global fmt subscriber.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_logging(level: Option<Level>) -> bool {
    let filter = match level {
        Some(level) => EnvFilter::new(level.as_str()),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .try_init()
        .is_ok()
}

/// Parses a level name, case-insensitively.
pub fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_str() {
        assert_eq!(parse_level_str("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_level_str(" warning "), Some(Level::WARN));
        assert_eq!(parse_level_str("loud"), None);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let _ = init_logging(Some(Level::TRACE));
        assert!(!init_logging(Some(Level::TRACE)));
    }
}
