pub mod event;
pub mod event_buffer;
pub mod event_loop;
pub mod extractor;
pub mod poller;
pub mod wake_signal;

pub use event::{interest, ReadinessEvent};
pub use event_buffer::EventBuffer;
pub use event_loop::{EventLoop, LoopWaker, PollOutcome};
pub use extractor::{extract_batch, BatchExtractor};
pub use poller::Multiplexer;
pub use wake_signal::WakeSignal;
