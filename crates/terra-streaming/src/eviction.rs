//! Policies deciding which resident chunks to drop.

use crate::chunk::ChunkCoord;

/// What an eviction policy sees of a resident chunk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResidentChunk {
    /// Chunk coordinate.
    pub coord: ChunkCoord,
    /// In the visible set. Visible chunks are never evicted.
    pub visible: bool,
    /// Inside the view window of the latest recompute.
    pub in_window: bool,
    /// Recompute pass in which the chunk was last inside the view window.
    pub last_seen_pass: u64,
    /// Number of cached LOD meshes. Breaks ties in [`LruEviction`].
    pub cached_meshes: usize,
}

/// Chooses chunks to evict after each recompute.
pub trait EvictionPolicy {
    /// Coordinates to evict. Visible chunks in the result are ignored.
    fn select_evictions(&mut self, resident: &[ResidentChunk]) -> Vec<ChunkCoord>;
}

/// Keep every chunk forever.
#[derive(Clone, Copy, Debug, Default)]
pub struct RetainAll;

impl EvictionPolicy for RetainAll {
    fn select_evictions(&mut self, _resident: &[ResidentChunk]) -> Vec<ChunkCoord> {
        Vec::new()
    }
}

/// Bound the resident count, dropping the chunks that have gone longest
/// outside the view window. Among chunks last seen in the same pass, the one
/// with fewer cached meshes goes first. Chunks in the current window are kept
/// even when that exceeds the bound.
#[derive(Clone, Copy, Debug)]
pub struct LruEviction {
    /// Resident chunks allowed before eviction starts.
    pub max_resident: usize,
}

impl LruEviction {
    /// Create a policy keeping at most `max_resident` chunks when possible.
    pub fn new(max_resident: usize) -> Self {
        Self { max_resident }
    }
}

impl EvictionPolicy for LruEviction {
    fn select_evictions(&mut self, resident: &[ResidentChunk]) -> Vec<ChunkCoord> {
        let excess = resident.len().saturating_sub(self.max_resident);
        if excess == 0 {
            return Vec::new();
        }
        let mut candidates: Vec<&ResidentChunk> = resident
            .iter()
            .filter(|c| !c.visible && !c.in_window)
            .collect();
        candidates.sort_by_key(|c| (c.last_seen_pass, c.cached_meshes, c.coord));
        candidates.into_iter().take(excess).map(|c| c.coord).collect()
    }
}
