//! Chunk streaming around a moving viewer: background map and mesh
//! generation, per-chunk LOD selection, lazily requested per-LOD mesh
//! caches, and pluggable eviction.

mod chunk;
mod error;
mod eviction;
mod lod;
mod manager;
mod scheduler;
mod viewer;

pub use chunk::{Chunk, ChunkBounds, ChunkCoord, ChunkHandle, ChunkState, LodCacheEntry};
pub use error::StreamingError;
pub use eviction::{EvictionPolicy, LruEviction, ResidentChunk, RetainAll};
pub use lod::{DetailLevel, DetailLevels};
pub use manager::{
    ChunkEvent, ChunkStreamingManager, DEFAULT_VIEWER_MOVE_THRESHOLD, MAX_VIEW_RADIUS, StreamingConfig,
    StreamingStats,
};
pub use scheduler::{
    Completion, GenerationContext, GenerationScheduler, JobKind, JobScheduler, default_worker_threads,
};
pub use viewer::{ViewerHandle, ViewerSource};
