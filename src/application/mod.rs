pub mod config;
pub mod polling;
