// Common test utilities shared by the integration tests

use std::io::Write;
use std::os::unix::net::UnixStream;
use std::sync::Once;

use eventmux::{extract_batch, ReadinessEvent};
use eventmux::EventBuffer;

static TRACING: Once = Once::new();

/// Route crate logs through the test harness output
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init();
    });
}

/// A connected socket pair; writing to `.1` makes `.0` readable
#[allow(dead_code)]
pub fn readable_pair() -> (UnixStream, UnixStream) {
    let (watched, mut peer) = UnixStream::pair().expect("Failed to create socket pair");
    peer.write_all(b"ready").unwrap();
    (watched, peer)
}

/// Copy the first `n` records of `buffer` out through `extract_batch`
#[allow(dead_code)]
pub fn extract_all(buffer: &EventBuffer, n: usize) -> Vec<ReadinessEvent> {
    let mut masks = vec![0u32; n];
    let mut fds = vec![-1; n];
    extract_batch(buffer, n, &mut masks, &mut fds).unwrap();
    masks
        .into_iter()
        .zip(fds)
        .map(|(mask, fd)| ReadinessEvent::new(mask, fd))
        .collect()
}
