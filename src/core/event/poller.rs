use crate::common::error::{MuxError, Result};
use crate::core::event::event::epoll_record;
use crate::core::event::event_buffer::EventBuffer;
use crate::core::os::FileDescriptor;
use libc::{c_int, EPOLL_CLOEXEC, EPOLL_CTL_ADD, EPOLL_CTL_DEL, EPOLL_CTL_MOD};
use std::os::unix::io::{AsRawFd, RawFd};
use tracing::{debug, trace};

/// One kernel epoll instance.
///
/// The multiplexer owns only its watch set. Records land in a caller-owned
/// [`EventBuffer`]. Registration calls take `&self` and may come from any
/// thread; the kernel serializes them.
#[derive(Debug)]
pub struct Multiplexer {
    epfd: FileDescriptor,
}

impl Multiplexer {
    /// Create an epoll instance that is closed across `exec`.
    pub fn open() -> Result<Self> {
        let raw = unsafe { libc::epoll_create1(EPOLL_CLOEXEC) };
        let epfd = FileDescriptor::from_syscall(raw, "epoll", "epoll_create1")?;
        Ok(Self { epfd })
    }

    /// Add `fd` to the watch set with `mask` as its interest.
    pub fn register(&self, fd: RawFd, mask: u32) -> Result<()> {
        self.control(EPOLL_CTL_ADD, "epoll_ctl(ADD)", fd, Some(mask))?;
        debug!(epfd = self.as_raw_fd(), fd, mask, "registered fd");
        Ok(())
    }

    /// Replace the interest mask of an already registered `fd`.
    pub fn modify(&self, fd: RawFd, mask: u32) -> Result<()> {
        self.control(EPOLL_CTL_MOD, "epoll_ctl(MOD)", fd, Some(mask))?;
        debug!(epfd = self.as_raw_fd(), fd, mask, "modified fd");
        Ok(())
    }

    /// Remove `fd` from the watch set. Removing it twice is an error.
    pub fn unregister(&self, fd: RawFd) -> Result<()> {
        self.control(EPOLL_CTL_DEL, "epoll_ctl(DEL)", fd, None)?;
        debug!(epfd = self.as_raw_fd(), fd, "unregistered fd");
        Ok(())
    }

    fn control(&self, op: c_int, name: &'static str, fd: RawFd, mask: Option<u32>) -> Result<()> {
        let mut record = epoll_record(fd, mask.unwrap_or(0));
        let record_ptr = match mask {
            Some(_) => &mut record as *mut libc::epoll_event,
            None => std::ptr::null_mut(),
        };

        if unsafe { libc::epoll_ctl(self.as_raw_fd(), op, fd, record_ptr) } < 0 {
            return Err(MuxError::last_os_error(name, Some(fd)));
        }
        Ok(())
    }

    /// Block until something is ready, filling the whole buffer at most.
    ///
    /// A negative `timeout_ms` waits indefinitely, `0` polls. Returns the number
    /// of records written; `0` means the timeout elapsed.
    pub fn wait(&self, buffer: &mut EventBuffer, timeout_ms: i64) -> Result<usize> {
        let capacity = buffer.capacity();
        self.wait_up_to(buffer, capacity, timeout_ms)
    }

    /// Like [`wait`](Self::wait) but writes at most `max_events` records.
    pub fn wait_up_to(
        &self,
        buffer: &mut EventBuffer,
        max_events: usize,
        timeout_ms: i64,
    ) -> Result<usize> {
        let epfd = self.as_raw_fd();
        let timeout = clamp_timeout(timeout_ms);

        let n = buffer.fill_with(max_events, |slots, max| {
            let rc = unsafe { libc::epoll_wait(epfd, slots, max as c_int, timeout) };
            if rc < 0 {
                return Err(MuxError::last_os_error("epoll_wait", None));
            }
            Ok(rc as usize)
        })?;

        trace!(epfd, count = n, timeout, "epoll_wait returned");
        Ok(n)
    }

    /// Release the epoll instance, reporting a failed close.
    pub fn close(self) -> Result<()> {
        self.epfd.close()
    }

    pub fn as_raw_fd(&self) -> RawFd {
        self.epfd.as_raw_fd()
    }
}

impl AsRawFd for Multiplexer {
    fn as_raw_fd(&self) -> RawFd {
        self.epfd.as_raw_fd()
    }
}

fn clamp_timeout(timeout_ms: i64) -> c_int {
    if timeout_ms < 0 {
        -1
    } else {
        timeout_ms.min(c_int::MAX as i64) as c_int
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::constants::WAIT_NONE;
    use crate::core::event::event::interest;
    use std::io::Write;
    use std::os::unix::net::UnixStream;
    use std::time::{Duration, Instant};

    #[test]
    fn test_clamp_timeout() {
        assert_eq!(clamp_timeout(-1), -1);
        assert_eq!(clamp_timeout(-500), -1);
        assert_eq!(clamp_timeout(0), 0);
        assert_eq!(clamp_timeout(250), 250);
        assert_eq!(clamp_timeout(i64::MAX), c_int::MAX);
    }

    #[test]
    fn test_open_is_cloexec() {
        let mux = Multiplexer::open().unwrap();
        let flags = unsafe { libc::fcntl(mux.as_raw_fd(), libc::F_GETFD) };
        assert!(flags & libc::FD_CLOEXEC != 0);
        mux.close().unwrap();
    }

    #[test]
    fn test_zero_timeout_returns_immediately() {
        let mux = Multiplexer::open().unwrap();
        let (a, _b) = UnixStream::pair().unwrap();
        mux.register(a.as_raw_fd(), interest::READABLE).unwrap();

        let mut buffer = EventBuffer::allocate(8).unwrap();
        let start = Instant::now();
        let n = mux.wait(&mut buffer, WAIT_NONE).unwrap();
        assert_eq!(n, 0);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_wait_up_to_limits_record_count() {
        let mux = Multiplexer::open().unwrap();
        let (a, mut a_peer) = UnixStream::pair().unwrap();
        let (b, mut b_peer) = UnixStream::pair().unwrap();
        mux.register(a.as_raw_fd(), interest::READABLE).unwrap();
        mux.register(b.as_raw_fd(), interest::READABLE).unwrap();
        a_peer.write_all(b"x").unwrap();
        b_peer.write_all(b"y").unwrap();

        let mut buffer = EventBuffer::allocate(8).unwrap();
        assert_eq!(mux.wait_up_to(&mut buffer, 1, 1000).unwrap(), 1);
        assert_eq!(buffer.len(), 1);
        assert_eq!(mux.wait(&mut buffer, 1000).unwrap(), 2);
    }

    #[test]
    fn test_wait_up_to_rejects_more_than_capacity() {
        let mux = Multiplexer::open().unwrap();
        let mut buffer = EventBuffer::allocate(2).unwrap();
        let err = mux.wait_up_to(&mut buffer, 3, 0).unwrap_err();
        assert!(matches!(err, MuxError::InvalidArgument { .. }));
    }
}
