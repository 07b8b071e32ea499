//! Resident terrain chunks and their per-LOD mesh caches.

use std::sync::Arc;

use glam::Vec2;
use terra_mesh::MeshPayload;
use terra_terrain::MapData;

/// Integer cell of the infinite chunk grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// Grid column.
    pub x: i32,
    /// Grid row.
    pub y: i32,
}

impl ChunkCoord {
    /// Create a coordinate.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell whose center is nearest to `position`.
    pub fn from_world(position: Vec2, chunk_size: f32) -> Self {
        Self::new(
            (position.x / chunk_size).round() as i32,
            (position.y / chunk_size).round() as i32,
        )
    }

    /// World position of the cell center.
    pub fn world_center(self, chunk_size: f32) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32) * chunk_size
    }
}

/// Identifies one incarnation of a chunk in job completions.
///
/// A chunk created after an eviction always carries a later `generation`
/// than any chunk evicted before it, so results for an evicted chunk never
/// land on its replacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkHandle {
    /// Chunk coordinate.
    pub coord: ChunkCoord,
    /// Incarnation counter for the coordinate.
    pub generation: u64,
}

/// Axis-aligned square footprint of a chunk on the ground plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkBounds {
    /// Minimum corner.
    pub min: Vec2,
    /// Maximum corner.
    pub max: Vec2,
}

impl ChunkBounds {
    /// Square of side `size` centered on `center`.
    pub fn from_center(center: Vec2, size: f32) -> Self {
        let half = Vec2::splat(size * 0.5);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Distance from `point` to the nearest point of the bounds; 0 inside.
    pub fn distance_to(&self, point: Vec2) -> f32 {
        point.distance(point.clamp(self.min, self.max))
    }
}

/// Mesh cache slot for one LOD tier.
#[derive(Clone, Debug, Default)]
pub struct LodCacheEntry {
    /// A mesh job was submitted. Never reset.
    pub requested: bool,
    /// The finished mesh, retained for the chunk's lifetime.
    pub mesh: Option<Arc<MeshPayload>>,
}

impl LodCacheEntry {
    /// Whether the mesh has arrived.
    pub fn is_ready(&self) -> bool {
        self.mesh.is_some()
    }
}

/// Where a chunk is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    /// Map data requested, not yet delivered.
    AwaitingMapData,
    /// Map data present, no mesh requested or shown.
    HaveMapData,
    /// The wanted tier's mesh is being generated.
    RequestingMesh {
        /// Wanted tier.
        lod_index: usize,
    },
    /// A mesh is shown.
    Displaying {
        /// Shown tier.
        lod_index: usize,
    },
}

/// A resident chunk.
#[derive(Debug)]
pub struct Chunk {
    handle: ChunkHandle,
    bounds: ChunkBounds,
    center: Vec2,
    pub(crate) map_data: Option<Arc<MapData>>,
    pub(crate) lods: Vec<LodCacheEntry>,
    pub(crate) desired_lod: Option<usize>,
    pub(crate) displayed_lod: Option<usize>,
    pub(crate) visible: bool,
    pub(crate) last_seen_pass: u64,
}

impl Chunk {
    pub(crate) fn new(handle: ChunkHandle, chunk_size: f32, lod_count: usize, pass: u64) -> Self {
        let center = handle.coord.world_center(chunk_size);
        Self {
            handle,
            bounds: ChunkBounds::from_center(center, chunk_size),
            center,
            map_data: None,
            lods: vec![LodCacheEntry::default(); lod_count],
            desired_lod: None,
            displayed_lod: None,
            visible: false,
            last_seen_pass: pass,
        }
    }

    /// Grid coordinate.
    pub fn coord(&self) -> ChunkCoord {
        self.handle.coord
    }

    /// Correlation handle used for this chunk's jobs.
    pub fn handle(&self) -> ChunkHandle {
        self.handle
    }

    /// World-space center.
    pub fn center(&self) -> Vec2 {
        self.center
    }

    /// World-space footprint.
    pub fn bounds(&self) -> ChunkBounds {
        self.bounds
    }

    /// Map data, once delivered.
    pub fn map_data(&self) -> Option<&Arc<MapData>> {
        self.map_data.as_ref()
    }

    /// Per-tier mesh caches, indexed like the LOD table.
    pub fn lod_caches(&self) -> &[LodCacheEntry] {
        &self.lods
    }

    /// Tier the viewer distance asked for on the last update.
    pub fn desired_lod(&self) -> Option<usize> {
        self.desired_lod
    }

    /// Tier currently shown, if any.
    pub fn displayed_lod(&self) -> Option<usize> {
        self.displayed_lod
    }

    /// The mesh currently shown.
    pub fn displayed_mesh(&self) -> Option<&Arc<MeshPayload>> {
        self.displayed_lod
            .and_then(|i| self.lods.get(i))
            .and_then(|entry| entry.mesh.as_ref())
    }

    /// Whether the chunk is in the visible set.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Recompute pass in which the chunk was last inside the view window.
    pub fn last_seen_pass(&self) -> u64 {
        self.last_seen_pass
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ChunkState {
        if self.map_data.is_none() {
            return ChunkState::AwaitingMapData;
        }
        if let Some(wanted) = self.desired_lod
            && self.displayed_lod != Some(wanted)
            && self.lods[wanted].requested
            && !self.lods[wanted].is_ready()
        {
            return ChunkState::RequestingMesh { lod_index: wanted };
        }
        match self.displayed_lod {
            Some(lod_index) => ChunkState::Displaying { lod_index },
            None => ChunkState::HaveMapData,
        }
    }
}
