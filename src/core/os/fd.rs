use crate::common::error::{MuxError, Result};
use std::os::unix::io::{AsRawFd, RawFd};
use tracing::{debug, error};

/// Owning handle for a kernel descriptor.
///
/// The descriptor is released exactly once: either by [`FileDescriptor::close`],
/// which reports the outcome, or on drop, which can only log it.
#[derive(Debug)]
pub struct FileDescriptor {
    fd: RawFd,
    kind: &'static str,
}

impl FileDescriptor {
    /// Take ownership of the result of a descriptor-creating call.
    ///
    /// A negative `fd` is turned into an error built from the current `errno`.
    pub fn from_syscall(fd: RawFd, kind: &'static str, op: &'static str) -> Result<Self> {
        if fd < 0 {
            return Err(MuxError::last_os_error(op, None));
        }
        debug!(fd, kind, "opened descriptor");
        Ok(Self { fd, kind })
    }

    pub fn as_raw_fd(&self) -> RawFd {
        self.fd
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Release the descriptor and surface any failure.
    pub fn close(mut self) -> Result<()> {
        let fd = std::mem::replace(&mut self.fd, -1);
        close_raw(fd, self.kind)
    }
}

fn close_raw(fd: RawFd, kind: &'static str) -> Result<()> {
    let rc = unsafe { libc::close(fd) };
    if rc < 0 {
        return Err(MuxError::last_os_error("close", Some(fd)));
    }
    debug!(fd, kind, "closed descriptor");
    Ok(())
}

impl AsRawFd for FileDescriptor {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for FileDescriptor {
    fn drop(&mut self) {
        if self.fd >= 0 {
            if let Err(e) = close_raw(self.fd, self.kind) {
                error!(fd = self.fd, kind = self.kind, error = %e, "failed to release descriptor");
            }
        }
    }
}
