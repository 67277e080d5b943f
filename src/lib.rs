//! Readiness multiplexing over Linux `epoll`, with `eventfd` wake signals.
//!
//! A [`Multiplexer`] owns one epoll watch set, an [`EventBuffer`] receives the
//! records of a wait, and a [`BatchExtractor`] copies them out as parallel
//! (mask, fd) arrays. A [`WakeSignal`] registered with the multiplexer lets
//! another thread interrupt a blocked wait. [`EventLoop`] and
//! [`PollingThread`] tie these together into a cancellable consumer loop.
//!
//! ```no_run
//! use eventmux::{extract_batch, interest, EventBuffer, Multiplexer, WakeSignal};
//!
//! # fn main() -> eventmux::Result<()> {
//! let mux = Multiplexer::open()?;
//! let wake = WakeSignal::create(false)?;
//! mux.register(wake.as_raw_fd(), interest::READABLE)?;
//!
//! wake.signal(1)?;
//! let mut buffer = EventBuffer::allocate(16)?;
//! let n = mux.wait(&mut buffer, 1000)?;
//!
//! let mut masks = vec![0; n];
//! let mut fds = vec![0; n];
//! extract_batch(&buffer, n, &mut masks, &mut fds)?;
//! assert_eq!(fds[0], wake.as_raw_fd());
//! assert_eq!(wake.clear()?, 1);
//! # Ok(())
//! # }
//! ```

#[cfg(not(target_os = "linux"))]
compile_error!("eventmux requires Linux epoll and eventfd support");

pub mod application;
pub mod common;
pub mod core;

pub use crate::application::config::{Config, ConfigLoader};
pub use crate::application::polling::PollingThread;
pub use crate::common::error::{MuxError, Result};
pub use crate::core::event::{
    extract_batch, interest, BatchExtractor, EventBuffer, EventLoop, LoopWaker, Multiplexer,
    PollOutcome, ReadinessEvent, WakeSignal,
};
pub use crate::core::os::FileDescriptor;
