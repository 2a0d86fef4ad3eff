//! Configuration management for umbra characters
//!
//! This module owns the layered composition of persistable configuration
//! into the parameter sets characters are constructed from: payload
//! composition, lazy ledger provisioning, runtime file path resolution and
//! the production entry points.

pub mod characters;
pub mod filepaths;
pub mod node;

// Re-exports for convenience
pub use characters::*;
pub use filepaths::*;
pub use node::*;

use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation error: {field} - {reason}")]
    ValidationError { field: String, reason: String },

    #[error("Configuration IO error: {reason}")]
    IoError { reason: String },
}

/// Configuration validation trait
pub trait Validate {
    fn validate(&self) -> Result<(), ConfigError>;
}
