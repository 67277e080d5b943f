use crate::common::constants::EVENTFD_WORD_SIZE;
use crate::common::error::{MuxError, Result};
use crate::core::os::FileDescriptor;
use std::os::unix::io::{AsRawFd, RawFd};
use tracing::trace;

/// Counter-backed descriptor used to wake a blocked wait from another thread.
///
/// Signals add to the counter, a clear reads and resets it. Increments from
/// any number of threads between two clears are summed. All methods take
/// `&self`; share it with `Arc`.
#[derive(Debug)]
pub struct WakeSignal {
    fd: FileDescriptor,
    blocking: bool,
}

impl WakeSignal {
    /// Create a signal with a zero counter.
    ///
    /// With `blocking == false`, clearing a zero counter fails with
    /// [`MuxError::WouldBlock`] instead of suspending. The descriptor itself is
    /// always non-blocking, so `signal` never suspends in either mode.
    pub fn create(blocking: bool) -> Result<Self> {
        let raw = unsafe { libc::eventfd(0, libc::EFD_CLOEXEC | libc::EFD_NONBLOCK) };
        let fd = FileDescriptor::from_syscall(raw, "eventfd", "eventfd")?;
        Ok(Self { fd, blocking })
    }

    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    /// Add `value` to the counter.
    ///
    /// Fails with `EAGAIN` when the addition would overflow the counter and
    /// with `EINVAL` when `value` is `u64::MAX`.
    pub fn signal(&self, value: u64) -> Result<()> {
        let bytes = value.to_ne_bytes();
        let rc = unsafe {
            libc::write(
                self.as_raw_fd(),
                bytes.as_ptr() as *const libc::c_void,
                EVENTFD_WORD_SIZE,
            )
        };
        if rc < 0 {
            let source = std::io::Error::last_os_error();
            return Err(MuxError::Os {
                op: "eventfd_write",
                source,
            });
        }
        trace!(fd = self.as_raw_fd(), value, "signalled");
        Ok(())
    }

    pub fn wake(&self) -> Result<()> {
        self.signal(1)
    }

    /// Read and reset the counter, returning the accumulated value.
    ///
    /// In blocking mode this suspends until the counter is non-zero.
    pub fn clear(&self) -> Result<u64> {
        if !self.blocking {
            return self.read_counter();
        }

        loop {
            match self.read_counter() {
                Err(e) if e.is_would_block() => self.wait_readable()?,
                other => return other,
            }
        }
    }

    /// Read and reset the counter without ever suspending; empty reads as `0`.
    pub fn drain(&self) -> Result<u64> {
        match self.read_counter() {
            Err(e) if e.is_would_block() => Ok(0),
            other => other,
        }
    }

    fn read_counter(&self) -> Result<u64> {
        let mut bytes = [0u8; EVENTFD_WORD_SIZE];
        let rc = unsafe {
            libc::read(
                self.as_raw_fd(),
                bytes.as_mut_ptr() as *mut libc::c_void,
                EVENTFD_WORD_SIZE,
            )
        };
        if rc < 0 {
            return Err(MuxError::last_os_error("eventfd_read", Some(self.as_raw_fd())));
        }
        let value = u64::from_ne_bytes(bytes);
        trace!(fd = self.as_raw_fd(), value, "cleared");
        Ok(value)
    }

    // Another thread may win the read after poll returns; callers loop.
    fn wait_readable(&self) -> Result<()> {
        let mut pollfd = libc::pollfd {
            fd: self.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        if unsafe { libc::poll(&mut pollfd, 1, -1) } < 0 {
            return Err(MuxError::last_os_error("poll", Some(self.as_raw_fd())));
        }
        Ok(())
    }

    pub fn close(self) -> Result<()> {
        self.fd.close()
    }

    pub fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl AsRawFd for WakeSignal {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_then_clear_returns_sum() {
        let wake = WakeSignal::create(false).unwrap();
        wake.signal(3).unwrap();
        wake.signal(4).unwrap();
        assert_eq!(wake.clear().unwrap(), 7);
    }

    #[test]
    fn test_clear_resets_counter() {
        let wake = WakeSignal::create(false).unwrap();
        wake.wake().unwrap();
        assert_eq!(wake.clear().unwrap(), 1);
        assert!(wake.clear().unwrap_err().is_would_block());
    }

    #[test]
    fn test_drain_on_empty_counter_is_zero() {
        let wake = WakeSignal::create(false).unwrap();
        assert_eq!(wake.drain().unwrap(), 0);
    }

    #[test]
    fn test_signal_max_value_is_rejected() {
        let wake = WakeSignal::create(false).unwrap();
        let err = wake.signal(u64::MAX).unwrap_err();
        assert!(matches!(err, MuxError::Os { op: "eventfd_write", .. }));
        assert_eq!(err.errno(), Some(libc::EINVAL));
    }

    #[test]
    fn test_signal_overflow_fails_in_non_blocking_mode() {
        let wake = WakeSignal::create(false).unwrap();
        wake.signal(u64::MAX - 1).unwrap();
        let err = wake.signal(1).unwrap_err();
        assert_eq!(err.errno(), Some(libc::EAGAIN));
    }

    #[test]
    fn test_blocking_flag_is_recorded() {
        let wake = WakeSignal::create(true).unwrap();
        assert!(wake.is_blocking());
        assert!(!WakeSignal::create(false).unwrap().is_blocking());
        wake.close().unwrap();
    }

    #[test]
    fn test_signal_overflow_fails_in_blocking_mode() {
        let wake = WakeSignal::create(true).unwrap();
        wake.signal(u64::MAX - 1).unwrap();
        let err = wake.signal(1).unwrap_err();
        assert!(matches!(err, MuxError::Os { op: "eventfd_write", .. }));
        assert_eq!(err.errno(), Some(libc::EAGAIN));
        assert_eq!(wake.clear().unwrap(), u64::MAX - 1);
    }

    #[test]
    fn test_drain_never_blocks_in_blocking_mode() {
        let wake = WakeSignal::create(true).unwrap();
        assert_eq!(wake.drain().unwrap(), 0);
    }
}
