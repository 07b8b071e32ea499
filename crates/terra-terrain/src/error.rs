//! Terrain data error types.

/// Errors raised when terrain inputs violate their structural invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TerrainError {
    /// A region list must contain at least one region.
    #[error("region list is empty")]
    EmptyRegions,

    /// Region cutoffs must be ascending; the list is never sorted for the caller.
    #[error("region {index} ({name}) has cutoff {height} below the previous cutoff {previous}")]
    UnsortedRegions {
        /// Index of the first out-of-order region.
        index: usize,
        /// Name of the out-of-order region.
        name: String,
        /// Its cutoff.
        height: f32,
        /// Cutoff of the region before it.
        previous: f32,
    },

    /// A grid was built from a value buffer of the wrong length.
    #[error("grid buffer holds {actual} cells, expected {expected}")]
    GridSizeMismatch {
        /// `width * height`.
        expected: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },

    /// The grid is too small to leave any interior after removing the border.
    #[error("grid {width}x{height} has no interior inside a border of {border}")]
    GridTooSmall {
        /// Grid width.
        width: usize,
        /// Grid height.
        height: usize,
        /// Border margin in cells.
        border: usize,
    },
}
