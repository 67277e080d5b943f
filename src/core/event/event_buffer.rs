use crate::common::constants::MAX_EVENT_CAPACITY;
use crate::common::error::{MuxError, Result};
use crate::core::event::event::ReadinessEvent;
use std::fmt;

/// Fixed-capacity storage for the records filled in by one wait.
///
/// The buffer is never zeroed. Only the first [`len`](Self::len) slots, written
/// by the most recent wait, can be observed; the next wait overwrites them.
///
/// Waiting needs `&mut EventBuffer`, so one buffer can never be the target of
/// two waits at once:
///
/// ```compile_fail
/// use eventmux::{EventBuffer, Multiplexer};
///
/// let mux = Multiplexer::open().unwrap();
/// let mut buffer = EventBuffer::allocate(8).unwrap();
/// std::thread::scope(|s| {
///     s.spawn(|| mux.wait(&mut buffer, 0));
///     s.spawn(|| mux.wait(&mut buffer, 0));
/// });
/// ```
pub struct EventBuffer {
    slots: Vec<libc::epoll_event>,
    capacity: usize,
}

impl EventBuffer {
    /// Reserve room for `capacity` records.
    pub fn allocate(capacity: usize) -> Result<Self> {
        if capacity == 0 || capacity > MAX_EVENT_CAPACITY {
            return Err(MuxError::invalid_argument(
                "allocate",
                format!(
                    "capacity must be between 1 and {}, got {}",
                    MAX_EVENT_CAPACITY, capacity
                ),
            ));
        }

        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| MuxError::OutOfMemory { capacity })?;

        Ok(Self { slots, capacity })
    }

    /// Free the storage. Equivalent to dropping the buffer.
    pub fn release(self) {}

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of records written by the last wait.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<ReadinessEvent> {
        self.slots.get(index).map(ReadinessEvent::from)
    }

    pub fn events(&self) -> impl Iterator<Item = ReadinessEvent> + '_ {
        self.slots.iter().map(ReadinessEvent::from)
    }

    pub(crate) fn records(&self) -> &[libc::epoll_event] {
        &self.slots
    }

    /// Hand the raw slots to the kernel.
    ///
    /// `fill` receives a pointer to `max_events` writable slots and returns how
    /// many it initialized. Previously populated records are discarded first,
    /// also when `fill` fails.
    pub(crate) fn fill_with<F>(&mut self, max_events: usize, fill: F) -> Result<usize>
    where
        F: FnOnce(*mut libc::epoll_event, usize) -> Result<usize>,
    {
        if max_events == 0 || max_events > self.capacity {
            return Err(MuxError::invalid_argument(
                "epoll_wait",
                format!(
                    "max_events must be between 1 and {}, got {}",
                    self.capacity, max_events
                ),
            ));
        }

        self.slots.clear();
        let n = fill(self.slots.as_mut_ptr(), max_events)?;
        debug_assert!(n <= max_events);
        // SAFETY: the callee initialized the first `n` slots, and `n` never
        // exceeds the reserved capacity.
        unsafe { self.slots.set_len(n.min(max_events)) };
        Ok(self.slots.len())
    }

    #[cfg(test)]
    pub(crate) fn fill_for_test(&mut self, events: &[ReadinessEvent]) {
        self.slots.clear();
        self.slots.extend(
            events
                .iter()
                .map(|e| crate::core::event::event::epoll_record(e.fd, e.mask)),
        );
    }
}

impl fmt::Debug for EventBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBuffer")
            .field("capacity", &self.capacity)
            .field("len", &self.slots.len())
            .finish()
    }
}
