pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Largest `maxevents` the kernel accepts for a single `epoll_wait`.
pub const MAX_EVENT_CAPACITY: usize = i32::MAX as usize / std::mem::size_of::<libc::epoll_event>();

/// Block until something becomes ready.
pub const WAIT_FOREVER: i64 = -1;

/// Poll and return immediately.
pub const WAIT_NONE: i64 = 0;

pub const DEFAULT_TIMEOUT_MS: i64 = WAIT_FOREVER;

pub const DEFAULT_THREAD_NAME: &str = "event-poller";

/// Size of the eventfd counter word.
pub const EVENTFD_WORD_SIZE: usize = std::mem::size_of::<u64>();
