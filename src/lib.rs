pub mod api;
pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod flatten;
pub mod handlers;
pub mod output;
pub mod timeouts;

pub use config::{ApiConfig, Config, OutputConfig, PaginationConfig};
pub use error::CollectorError;

pub type Result<T> = std::result::Result<T, CollectorError>;
