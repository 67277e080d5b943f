use crate::application::config::models::Config;
use crate::common::error::{MuxError, Result};
use crate::core::event::event::ReadinessEvent;
use crate::core::event::event_loop::{EventLoop, LoopWaker};
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// Dedicated thread running an [`EventLoop`] until it is shut down.
///
/// Descriptors are registered on the loop before it is handed over. The loop
/// is closed on the polling thread once it stops.
pub struct PollingThread {
    name: String,
    waker: LoopWaker,
    handle: Option<JoinHandle<Result<()>>>,
}

impl PollingThread {
    /// Build a loop from `config` and start polling it.
    ///
    /// Nothing but the loop's own wake signal is registered; use
    /// [`spawn_loop`](Self::spawn_loop) to poll descriptors.
    pub fn spawn<F>(config: &Config, handler: F) -> Result<Self>
    where
        F: FnMut(ReadinessEvent) -> Result<()> + Send + 'static,
    {
        let event_loop = EventLoop::with_config(config)?;
        Self::spawn_loop(&config.thread_name, event_loop, handler)
    }

    pub fn spawn_loop<F>(name: &str, mut event_loop: EventLoop, handler: F) -> Result<Self>
    where
        F: FnMut(ReadinessEvent) -> Result<()> + Send + 'static,
    {
        if name.contains('\0') {
            return Err(MuxError::invalid_argument(
                "spawn",
                "thread name cannot contain NUL bytes",
            ));
        }

        let waker = event_loop.waker();
        let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            let result = event_loop.run(handler);
            if let Err(ref e) = result {
                error!(error = %e, "polling loop failed");
            }
            result.and(event_loop.close())
        })?;

        debug!(thread = name, "polling thread started");
        Ok(Self {
            name: name.to_string(),
            waker,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn waker(&self) -> LoopWaker {
        self.waker.clone()
    }

    /// True once the loop has stopped, for example after a handler error.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Wake the loop, wait for the thread and return the loop's result.
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        // The loop may already be gone; its result is what matters then.
        let wake_result = if handle.is_finished() {
            Ok(())
        } else {
            self.waker.wake()
        };

        let loop_result = handle.join().map_err(|_| MuxError::ThreadPanicked {
            name: self.name.clone(),
        })?;
        debug!(thread = %self.name, "polling thread stopped");
        loop_result.and(wake_result)
    }
}

impl Drop for PollingThread {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!(thread = %self.name, error = %e, "polling thread shut down with an error");
        }
    }
}
