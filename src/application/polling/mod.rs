pub mod polling_thread;

pub use polling_thread::PollingThread;
