//! olmoci Core - Foundational Types
//!
//! Error type, configuration and logging options shared by the runtime
//! and the CLI.

pub mod config;
pub mod error;
pub mod log;

pub use config::{OlmConfig, DEFAULT_REGISTRY, DEFAULT_TAG};
pub use error::{OlmError, Result};
pub use log::{LogConfig, LogFormat};

/// olmoci version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
