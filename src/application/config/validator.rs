use crate::application::config::models::Config;
use crate::common::constants::{MAX_EVENT_CAPACITY, WAIT_FOREVER};
use crate::common::error::{MuxError, Result};

/// Validate configuration for correctness and consistency
pub fn validate_config(config: &Config) -> Result<()> {
    if config.event_capacity == 0 {
        return Err(MuxError::Config(
            "event_capacity must be greater than 0".to_string(),
        ));
    }

    if config.event_capacity > MAX_EVENT_CAPACITY {
        return Err(MuxError::Config(format!(
            "event_capacity must not exceed {}, got {}",
            MAX_EVENT_CAPACITY, config.event_capacity
        )));
    }

    if config.timeout_ms < WAIT_FOREVER {
        return Err(MuxError::Config(format!(
            "timeout_ms must be -1 or a non-negative number of milliseconds, got {}",
            config.timeout_ms
        )));
    }

    if config.thread_name.trim().is_empty() {
        return Err(MuxError::Config(
            "thread_name cannot be empty".to_string(),
        ));
    }

    // Thread names are handed to the OS as C strings.
    if config.thread_name.contains('\0') {
        return Err(MuxError::Config(
            "thread_name cannot contain NUL bytes".to_string(),
        ));
    }

    Ok(())
}
