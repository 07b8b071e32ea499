//! Configuration error types.

use std::path::PathBuf;

use terra_streaming::StreamingError;
use terra_terrain::TerrainError;

/// Errors from loading, saving, or validating the terrain configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that was read.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config directory or file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// File or directory that was written.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid RON for [`crate::Config`].
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// File that was parsed.
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    /// Serializing to RON failed.
    #[error("failed to serialize config: {0}")]
    Serialize(#[source] ron::Error),

    /// The region list is empty or out of order.
    #[error("invalid regions: {0}")]
    Regions(#[from] TerrainError),

    /// The LOD table is empty or out of order.
    #[error("invalid detail levels: {0}")]
    DetailLevels(#[from] StreamingError),

    /// The viewer move threshold is negative or not finite.
    #[error("viewer_move_threshold must be non-negative, got {0}")]
    MoveThreshold(f32),
}
