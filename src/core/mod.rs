pub mod event;
pub mod os;
