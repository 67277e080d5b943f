use std::io;
use std::os::unix::io::RawFd;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MuxError {
    #[error("{op}: invalid argument: {reason}")]
    InvalidArgument { op: &'static str, reason: String },

    #[error("{op}: fd {fd} is not registered")]
    NotFound { op: &'static str, fd: RawFd },

    #[error("{op}: fd {fd} does not support readiness polling")]
    NotPermitted { op: &'static str, fd: RawFd },

    #[error("{op}: resource exhausted (os error {errno})")]
    ResourceExhausted { op: &'static str, errno: i32 },

    #[error("{op}: interrupted by signal delivery")]
    Interrupted { op: &'static str },

    #[error("{op}: operation would block")]
    WouldBlock { op: &'static str },

    #[error("unable to allocate an event buffer for {capacity} events")]
    OutOfMemory { capacity: usize },

    #[error("{op}: {source}")]
    Os {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("polling thread '{name}' panicked")]
    ThreadPanicked { name: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl MuxError {
    /// Classify a failed kernel call. `fd` is the watched descriptor, if any.
    pub fn from_os(op: &'static str, fd: Option<RawFd>, source: io::Error) -> Self {
        let fd_or_unknown = fd.unwrap_or(-1);
        match source.raw_os_error() {
            Some(libc::EEXIST) => MuxError::InvalidArgument {
                op,
                reason: format!("fd {} is already registered", fd_or_unknown),
            },
            Some(libc::EINVAL) => MuxError::InvalidArgument {
                op,
                reason: source.to_string(),
            },
            Some(libc::ENOENT) => MuxError::NotFound {
                op,
                fd: fd_or_unknown,
            },
            Some(libc::EPERM) => MuxError::NotPermitted {
                op,
                fd: fd_or_unknown,
            },
            Some(errno @ (libc::EMFILE | libc::ENFILE | libc::ENOMEM | libc::ENOSPC)) => {
                MuxError::ResourceExhausted { op, errno }
            }
            Some(libc::EINTR) => MuxError::Interrupted { op },
            Some(libc::EAGAIN) => MuxError::WouldBlock { op },
            _ => MuxError::Os { op, source },
        }
    }

    /// Classify the current `errno` of the calling thread.
    pub fn last_os_error(op: &'static str, fd: Option<RawFd>) -> Self {
        Self::from_os(op, fd, io::Error::last_os_error())
    }

    pub fn invalid_argument(op: &'static str, reason: impl Into<String>) -> Self {
        MuxError::InvalidArgument {
            op,
            reason: reason.into(),
        }
    }

    /// OS error code behind this error, when there is one.
    pub fn errno(&self) -> Option<i32> {
        match self {
            MuxError::NotFound { .. } => Some(libc::ENOENT),
            MuxError::NotPermitted { .. } => Some(libc::EPERM),
            MuxError::ResourceExhausted { errno, .. } => Some(*errno),
            MuxError::Interrupted { .. } => Some(libc::EINTR),
            MuxError::WouldBlock { .. } => Some(libc::EAGAIN),
            MuxError::Os { source, .. } => source.raw_os_error(),
            MuxError::Io(e) => e.raw_os_error(),
            _ => None,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, MuxError::Interrupted { .. })
    }

    pub fn is_would_block(&self) -> bool {
        matches!(self, MuxError::WouldBlock { .. })
    }
}

pub type Result<T> = std::result::Result<T, MuxError>;
