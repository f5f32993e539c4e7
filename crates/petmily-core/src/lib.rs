//! Shared foundation for the Petmily client.
//!
//! This crate provides:
//! - Configuration with compile-time defaults and a JSON config file
//! - File system paths under the client base directory
//! - Logging initialization on top of tracing
//! - The shared `CoreError` type

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, DEFAULT_API_URL, DEFAULT_KAKAO_APP_KEY, DEFAULT_LOG_LEVEL};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
