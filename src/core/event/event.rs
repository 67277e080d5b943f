use std::os::unix::io::RawFd;

/// Interest and readiness bits, passed to and from the kernel unchanged.
pub mod interest {
    pub const READABLE: u32 = libc::EPOLLIN as u32;
    pub const WRITABLE: u32 = libc::EPOLLOUT as u32;
    pub const PRIORITY: u32 = libc::EPOLLPRI as u32;
    pub const ERROR: u32 = libc::EPOLLERR as u32;
    pub const HANGUP: u32 = libc::EPOLLHUP as u32;
    pub const READ_HANGUP: u32 = libc::EPOLLRDHUP as u32;
    pub const EDGE_TRIGGERED: u32 = libc::EPOLLET as u32;
    pub const ONESHOT: u32 = libc::EPOLLONESHOT as u32;
}

/// One (readiness mask, fd) record reported by a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadinessEvent {
    pub mask: u32,
    pub fd: RawFd,
}

impl ReadinessEvent {
    pub fn new(mask: u32, fd: RawFd) -> Self {
        Self { mask, fd }
    }

    pub fn is_readable(&self) -> bool {
        self.mask & interest::READABLE != 0
    }

    pub fn is_writable(&self) -> bool {
        self.mask & interest::WRITABLE != 0
    }

    pub fn is_error(&self) -> bool {
        self.mask & interest::ERROR != 0
    }

    pub fn is_hangup(&self) -> bool {
        self.mask & (interest::HANGUP | interest::READ_HANGUP) != 0
    }
}

impl From<&libc::epoll_event> for ReadinessEvent {
    fn from(ev: &libc::epoll_event) -> Self {
        // epoll_event is packed on some targets; copy fields out before use.
        let mask = ev.events;
        let data = ev.u64;
        Self {
            mask,
            fd: data as RawFd,
        }
    }
}

/// Build the kernel record for `fd`. The fd travels in the user-data word.
pub(crate) fn epoll_record(fd: RawFd, mask: u32) -> libc::epoll_event {
    libc::epoll_event {
        events: mask,
        u64: fd as u32 as u64,
    }
}
