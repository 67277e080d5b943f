// Error handling tests - failures surface with operation and OS code

use std::os::unix::io::AsRawFd;
use std::os::unix::net::UnixStream;

use eventmux::common::constants::WAIT_NONE;
use eventmux::{extract_batch, interest, EventBuffer, Multiplexer, MuxError};

mod common;
use common::readable_pair;

#[test]
fn test_errors_name_the_operation() {
    let mux = Multiplexer::open().unwrap();
    let (a, _peer) = UnixStream::pair().unwrap();
    let err = mux.unregister(a.as_raw_fd()).unwrap_err();
    assert!(err.to_string().starts_with("epoll_ctl(DEL)"));
    assert_eq!(err.errno(), Some(libc::ENOENT));
}

#[test]
fn test_undersized_extract_output_is_rejected() {
    let mux = Multiplexer::open().unwrap();
    let (first, _p1) = readable_pair();
    let (second, _p2) = readable_pair();
    mux.register(first.as_raw_fd(), interest::READABLE).unwrap();
    mux.register(second.as_raw_fd(), interest::READABLE).unwrap();

    let mut buffer = EventBuffer::allocate(4).unwrap();
    let n = mux.wait(&mut buffer, 1000).unwrap();
    assert_eq!(n, 2);

    let mut masks = [0u32; 2];
    let mut fds = [-1; 1];
    let err = extract_batch(&buffer, n, &mut masks, &mut fds).unwrap_err();
    assert!(matches!(err, MuxError::InvalidArgument { op: "extract_batch", .. }));
    assert_eq!(masks, [0, 0]);
    assert_eq!(fds, [-1]);
}

#[test]
fn test_zero_capacity_buffer_is_rejected() {
    assert!(matches!(
        EventBuffer::allocate(0),
        Err(MuxError::InvalidArgument { op: "allocate", .. })
    ));
}

#[test]
fn test_timeout_is_not_an_error() {
    let mux = Multiplexer::open().unwrap();
    let mut buffer = EventBuffer::allocate(1).unwrap();
    assert_eq!(mux.wait(&mut buffer, WAIT_NONE).unwrap(), 0);
}
