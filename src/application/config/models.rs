use crate::common::constants::{DEFAULT_EVENT_CAPACITY, DEFAULT_THREAD_NAME, DEFAULT_TIMEOUT_MS};
use serde::{Deserialize, Serialize};

/// Polling loop configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Number of readiness records one wait can return
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Wait timeout in milliseconds, -1 blocks until something is ready
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: i64,

    /// Create the loop's wake signal in blocking mode
    #[serde(default)]
    pub wake_blocking: bool,

    /// Resume the wait when a signal interrupts it
    #[serde(default = "default_retry_interrupted")]
    pub retry_interrupted: bool,

    /// Name of the dedicated polling thread
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

fn default_timeout_ms() -> i64 {
    DEFAULT_TIMEOUT_MS
}

fn default_retry_interrupted() -> bool {
    true
}

fn default_thread_name() -> String {
    DEFAULT_THREAD_NAME.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            event_capacity: default_event_capacity(),
            timeout_ms: default_timeout_ms(),
            wake_blocking: false,
            retry_interrupted: default_retry_interrupted(),
            thread_name: default_thread_name(),
        }
    }
}
