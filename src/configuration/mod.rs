//! Parameter configuration consumed by steps and runners
//!
//! Keys are hierarchical strings of the form `SECTION:key`. A key without a
//! section resolves at the top level of the source.

pub mod map;
pub mod yaml;

pub use map::MapConfiguration;
pub use yaml::YamlConfiguration;

use std::path::PathBuf;
use thiserror::Error;

/// Error types for parameter lookup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing parameter - {0}")]
    Missing(String),

    #[error("Parameter {0} is not a scalar value")]
    NotScalar(String),

    #[error("Circular reference while resolving {0}")]
    Cycle(String),

    #[error("Failed to read configuration {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Trait for parameter sources - allows for different implementations
pub trait ConfigurationProvider {
    /// Resolve a named parameter to its string value
    fn resolve(&self, key: &str) -> Result<String, ConfigError>;

    /// Short description of where values come from, used in logs
    fn describe(&self) -> String {
        "configuration".to_string()
    }
}

/// Split `SECTION:key` into its section and key parts
pub fn split_key(key: &str) -> (Option<&str>, &str) {
    match key.split_once(':') {
        Some((section, name)) => (Some(section), name),
        None => (None, key),
    }
}
