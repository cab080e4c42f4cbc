pub mod config;
pub mod data;
pub mod error;
pub mod models;

pub use config::HyperParameters;
pub use error::ConfigError;
