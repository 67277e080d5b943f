pub mod models;
pub mod parser;
pub mod validator;
pub mod loader;

pub use models::Config;
pub use loader::ConfigLoader;
