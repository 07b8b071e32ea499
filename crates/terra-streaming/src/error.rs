/// Errors from streaming setup and job submission.
#[derive(Debug, thiserror::Error)]
pub enum StreamingError {
    /// The LOD table is empty.
    #[error("at least one detail level is required")]
    NoDetailLevels,
    /// LOD distance thresholds are not strictly ascending.
    #[error("detail level {index} threshold {threshold} does not exceed the previous {previous}")]
    UnsortedDetailLevels {
        /// Offending entry.
        index: usize,
        /// Its threshold.
        threshold: f32,
        /// Threshold of the entry before it.
        previous: f32,
    },
    /// A LOD threshold is not a positive finite distance.
    #[error("detail level {index} threshold must be positive and finite, got {threshold}")]
    InvalidDetailDistance {
        /// Offending entry.
        index: usize,
        /// Its threshold.
        threshold: f32,
    },
    /// The view distance spans more chunks than a window may hold.
    #[error("view distance covers {radius} chunks each way, more than the maximum {max}")]
    ViewWindowTooLarge {
        /// Requested radius in chunks.
        radius: f32,
        /// Largest accepted radius.
        max: i32,
    },
    /// Chunk world size must be positive and finite.
    #[error("chunk size must be positive, got {0}")]
    InvalidChunkSize(f32),
    /// The scheduler was shut down and accepts no more jobs.
    #[error("generation scheduler is shut down")]
    SchedulerClosed,
    /// A worker thread could not be started.
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}
