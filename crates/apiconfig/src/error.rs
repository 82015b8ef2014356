//! Error types for configuration assembly

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while declaring endpoints or assembling config.json
#[derive(Debug, Error)]
pub enum Error {
    /// An endpoint declaration is missing a parameter its variant needs
    #[error("{kind} endpoint is missing required field `{field}`")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    /// An auto-discovered chef server endpoint was declared without client settings
    #[error("auto-discovered chef server endpoint requires [chef] client settings")]
    MissingChefClient,

    /// The assembled document could not be serialized
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),

    /// File metadata could not be read during a staleness check
    #[error("failed to read metadata for {}: {source}", .path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, Error>;
