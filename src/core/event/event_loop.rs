// Consumer loop: wait, extract, hand out, repeat until woken.
use crate::application::config::models::Config;
use crate::common::error::{MuxError, Result};
use crate::core::event::event::{interest, ReadinessEvent};
use crate::core::event::event_buffer::EventBuffer;
use crate::core::event::extractor::BatchExtractor;
use crate::core::event::poller::Multiplexer;
use crate::core::event::wake_signal::WakeSignal;
use std::os::unix::io::RawFd;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Result of one wait-and-extract cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The timeout elapsed with nothing ready.
    Timeout,
    /// This many I/O records are available through [`EventLoop::events`].
    Ready(usize),
    /// The loop was woken. Records observed in the same wait are still
    /// available through [`EventLoop::events`].
    Cancelled,
}

/// Handle for cancelling a running [`EventLoop`] from another thread.
#[derive(Debug, Clone)]
pub struct LoopWaker {
    signal: Arc<WakeSignal>,
}

impl LoopWaker {
    pub fn wake(&self) -> Result<()> {
        self.signal.wake()
    }
}

/// A multiplexer, its buffer and a wake signal driven as one polling loop.
#[derive(Debug)]
pub struct EventLoop {
    mux: Multiplexer,
    buffer: EventBuffer,
    batch: BatchExtractor,
    wake: Arc<WakeSignal>,
    timeout_ms: i64,
    retry_interrupted: bool,
}

impl EventLoop {
    pub fn new() -> Result<Self> {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Result<Self> {
        let mux = Multiplexer::open()?;
        let buffer = EventBuffer::allocate(config.event_capacity)?;
        let batch = BatchExtractor::for_buffer(&buffer);
        let wake = WakeSignal::create(config.wake_blocking)?;
        mux.register(wake.as_raw_fd(), interest::READABLE)?;

        debug!(
            epfd = mux.as_raw_fd(),
            wake_fd = wake.as_raw_fd(),
            capacity = config.event_capacity,
            "event loop ready"
        );

        Ok(Self {
            mux,
            buffer,
            batch,
            wake: Arc::new(wake),
            timeout_ms: config.timeout_ms,
            retry_interrupted: config.retry_interrupted,
        })
    }

    pub fn register(&self, fd: RawFd, mask: u32) -> Result<()> {
        self.check_not_wake_fd("register", fd)?;
        self.mux.register(fd, mask)
    }

    pub fn modify(&self, fd: RawFd, mask: u32) -> Result<()> {
        self.check_not_wake_fd("modify", fd)?;
        self.mux.modify(fd, mask)
    }

    pub fn unregister(&self, fd: RawFd) -> Result<()> {
        self.check_not_wake_fd("unregister", fd)?;
        self.mux.unregister(fd)
    }

    fn check_not_wake_fd(&self, op: &'static str, fd: RawFd) -> Result<()> {
        if fd == self.wake.as_raw_fd() {
            return Err(MuxError::invalid_argument(
                op,
                format!("fd {} is the loop's own wake signal", fd),
            ));
        }
        Ok(())
    }

    pub fn waker(&self) -> LoopWaker {
        LoopWaker {
            signal: Arc::clone(&self.wake),
        }
    }

    pub fn multiplexer(&self) -> &Multiplexer {
        &self.mux
    }

    pub fn timeout_ms(&self) -> i64 {
        self.timeout_ms
    }

    /// One cycle with the configured timeout.
    pub fn poll_once(&mut self) -> Result<PollOutcome> {
        self.poll_timeout(self.timeout_ms)
    }

    /// One cycle: wait, then extract the ready set.
    ///
    /// Errors from the wait are returned as they are, `Interrupted` included.
    pub fn poll_timeout(&mut self, timeout_ms: i64) -> Result<PollOutcome> {
        let n = match self.mux.wait(&mut self.buffer, timeout_ms) {
            Ok(n) => n,
            Err(e) => {
                self.batch.clear();
                return Err(e);
            }
        };

        if n == 0 {
            self.batch.clear();
            return Ok(PollOutcome::Timeout);
        }

        self.batch.extract(&self.buffer, n)?;

        let wake_fd = self.wake.as_raw_fd();
        let mut woken = false;
        self.batch.retain(|event| {
            let is_wake = event.fd == wake_fd;
            woken |= is_wake;
            !is_wake
        });

        if woken {
            let value = self.wake.drain()?;
            trace!(wake_fd, value, "wake signal observed");
            return Ok(PollOutcome::Cancelled);
        }

        Ok(PollOutcome::Ready(self.batch.len()))
    }

    /// Records of the last cycle, wake signal excluded.
    pub fn events(&self) -> impl Iterator<Item = ReadinessEvent> + '_ {
        self.batch.events()
    }

    /// Dispatch every ready record to `handler` until the loop is woken.
    ///
    /// Records that arrive together with the wake are still dispatched. A
    /// handler error stops the loop and is returned.
    pub fn run<F>(&mut self, mut handler: F) -> Result<()>
    where
        F: FnMut(ReadinessEvent) -> Result<()>,
    {
        loop {
            let outcome = match self.poll_once() {
                Ok(outcome) => outcome,
                Err(e) if e.is_interrupted() && self.retry_interrupted => {
                    warn!(epfd = self.mux.as_raw_fd(), "wait interrupted, retrying");
                    continue;
                }
                Err(e) => return Err(e),
            };

            for event in self.batch.events() {
                handler(event)?;
            }

            if outcome == PollOutcome::Cancelled {
                debug!(epfd = self.mux.as_raw_fd(), "event loop cancelled");
                return Ok(());
            }
        }
    }

    /// Release the multiplexer and, once no waker refers to it, the wake signal.
    pub fn close(self) -> Result<()> {
        let mux_result = self.mux.close();
        let wake_result = match Arc::try_unwrap(self.wake) {
            Ok(wake) => wake.close(),
            Err(_) => Ok(()),
        };
        mux_result.and(wake_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::constants::WAIT_NONE;
    use std::io::Write;
    use std::os::unix::io::AsRawFd;
    use std::os::unix::net::UnixStream;

    #[test]
    fn test_poll_without_activity_times_out() {
        let mut event_loop = EventLoop::new().unwrap();
        assert_eq!(event_loop.poll_timeout(WAIT_NONE).unwrap(), PollOutcome::Timeout);
        assert_eq!(event_loop.events().count(), 0);
    }

    #[test]
    fn test_wake_fd_cannot_be_registered_again() {
        let event_loop = EventLoop::new().unwrap();
        let wake_fd = event_loop.wake.as_raw_fd();
        let err = event_loop.register(wake_fd, interest::READABLE).unwrap_err();
        assert!(matches!(err, MuxError::InvalidArgument { op: "register", .. }));
        assert!(event_loop.unregister(wake_fd).is_err());
    }

    #[test]
    fn test_wake_is_reported_as_cancelled_and_drained() {
        let mut event_loop = EventLoop::new().unwrap();
        let waker = event_loop.waker();
        waker.wake().unwrap();
        waker.wake().unwrap();

        assert_eq!(event_loop.poll_timeout(1000).unwrap(), PollOutcome::Cancelled);
        assert_eq!(event_loop.events().count(), 0);
        assert_eq!(event_loop.poll_timeout(WAIT_NONE).unwrap(), PollOutcome::Timeout);
    }

    #[test]
    fn test_ready_records_survive_a_concurrent_wake() {
        let mut event_loop = EventLoop::new().unwrap();
        let (a, mut peer) = UnixStream::pair().unwrap();
        event_loop.register(a.as_raw_fd(), interest::READABLE).unwrap();
        peer.write_all(b"ping").unwrap();
        event_loop.waker().wake().unwrap();

        assert_eq!(event_loop.poll_timeout(1000).unwrap(), PollOutcome::Cancelled);
        let fds: Vec<_> = event_loop.events().map(|e| e.fd).collect();
        assert_eq!(fds, vec![a.as_raw_fd()]);
    }

    #[test]
    fn test_run_stops_on_handler_error() {
        let mut event_loop = EventLoop::new().unwrap();
        let (a, mut peer) = UnixStream::pair().unwrap();
        event_loop.register(a.as_raw_fd(), interest::READABLE).unwrap();
        peer.write_all(b"x").unwrap();

        let err = event_loop
            .run(|_| Err(MuxError::Config("stop".to_string())))
            .unwrap_err();
        assert!(matches!(err, MuxError::Config(_)));
    }

    #[test]
    fn test_close_with_live_waker() {
        let event_loop = EventLoop::new().unwrap();
        let waker = event_loop.waker();
        event_loop.close().unwrap();
        waker.wake().unwrap();
    }
}
