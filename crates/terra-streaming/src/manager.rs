//! Viewer-driven chunk streaming.
//!
//! The manager owns every resident chunk and runs entirely on the consumer
//! thread. Each [`tick`](ChunkStreamingManager::tick) applies finished jobs
//! from the scheduler and, once the viewer has moved far enough, recomputes
//! the visible window: creating chunks that entered it, picking a LOD tier
//! for every visible chunk, requesting each tier's mesh at most once, and
//! hiding chunks that left it. Scene-side effects are reported as
//! [`ChunkEvent`]s.

use glam::Vec2;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, trace, warn};

use crate::chunk::{Chunk, ChunkCoord, ChunkHandle};
use crate::error::StreamingError;
use crate::eviction::{EvictionPolicy, ResidentChunk, RetainAll};
use crate::lod::DetailLevels;
use crate::scheduler::{Completion, JobKind, JobScheduler};
use crate::viewer::ViewerSource;

/// Default viewer displacement that triggers a recompute, in world units.
pub const DEFAULT_VIEWER_MOVE_THRESHOLD: f32 = 25.0;

/// Largest view window radius, in chunks, a manager accepts.
pub const MAX_VIEW_RADIUS: i32 = 64;

/// Streaming parameters.
#[derive(Clone, Debug)]
pub struct StreamingConfig {
    /// World-space edge length of a chunk.
    pub chunk_size: f32,
    /// LOD table; its last threshold is the view distance.
    pub detail_levels: DetailLevels,
    /// Viewer displacement since the last recompute that triggers the next.
    pub viewer_move_threshold: f32,
}

impl StreamingConfig {
    /// Config with the default move threshold.
    pub fn new(chunk_size: f32, detail_levels: DetailLevels) -> Self {
        Self {
            chunk_size,
            detail_levels,
            viewer_move_threshold: DEFAULT_VIEWER_MOVE_THRESHOLD,
        }
    }

    /// Chunks each way from the viewer's cell that the window covers.
    pub fn view_radius(&self) -> Result<i32, StreamingError> {
        if !(self.chunk_size.is_finite() && self.chunk_size > 0.0) {
            return Err(StreamingError::InvalidChunkSize(self.chunk_size));
        }
        let radius = (self.detail_levels.max_view_distance() / self.chunk_size).round();
        if radius > MAX_VIEW_RADIUS as f32 {
            return Err(StreamingError::ViewWindowTooLarge {
                radius,
                max: MAX_VIEW_RADIUS,
            });
        }
        Ok(radius as i32)
    }
}

/// A change the embedding scene should mirror.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChunkEvent {
    /// A chunk entered the view window for the first time.
    Created {
        /// Chunk coordinate.
        coord: ChunkCoord,
    },
    /// Map data arrived; the color grid can become the chunk's material.
    MaterialReady {
        /// Chunk coordinate.
        coord: ChunkCoord,
    },
    /// The chunk now shows the mesh of tier `lod_index`.
    MeshApplied {
        /// Chunk coordinate.
        coord: ChunkCoord,
        /// Tier index in the LOD table.
        lod_index: usize,
    },
    /// The chunk was shown or hidden.
    VisibilityChanged {
        /// Chunk coordinate.
        coord: ChunkCoord,
        /// New visibility.
        visible: bool,
    },
    /// The chunk and its caches were dropped.
    Evicted {
        /// Chunk coordinate.
        coord: ChunkCoord,
    },
}

/// Counters for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamingStats {
    /// Chunks currently resident.
    pub resident: usize,
    /// Chunks in the visible set.
    pub visible: usize,
    /// Resident chunks still waiting for map data.
    pub awaiting_map_data: usize,
    /// LOD meshes cached across all chunks.
    pub meshes_cached: usize,
    /// Recomputes run since construction.
    pub recomputes: u64,
    /// Chunks evicted since construction.
    pub evicted: u64,
    /// Jobs queued or running in the scheduler.
    pub in_flight: usize,
}

/// Owns resident chunks and keeps them in step with the viewer.
pub struct ChunkStreamingManager<S, V> {
    config: StreamingConfig,
    scheduler: S,
    viewer: V,
    eviction: Box<dyn EvictionPolicy>,
    chunks: FxHashMap<ChunkCoord, Chunk>,
    visible: FxHashSet<ChunkCoord>,
    /// Stamped on chunks created from now on; bumped by every eviction so a
    /// recreated chunk never shares a generation with the one it replaces.
    next_generation: u64,
    radius: i32,
    events: Vec<ChunkEvent>,
    last_recompute_position: Vec2,
    pass: u64,
    evicted: u64,
}

impl<S: JobScheduler, V: ViewerSource> ChunkStreamingManager<S, V> {
    /// Create the manager and run the first recompute at the viewer's
    /// current position. Chunks are retained forever.
    pub fn new(config: StreamingConfig, scheduler: S, viewer: V) -> Result<Self, StreamingError> {
        Self::with_eviction(config, scheduler, viewer, Box::new(RetainAll))
    }

    /// Like [`new`](Self::new) with an explicit eviction policy.
    pub fn with_eviction(
        config: StreamingConfig,
        scheduler: S,
        viewer: V,
        eviction: Box<dyn EvictionPolicy>,
    ) -> Result<Self, StreamingError> {
        let radius = config.view_radius()?;
        let position = viewer.position();
        let mut manager = Self {
            config,
            scheduler,
            viewer,
            eviction,
            chunks: FxHashMap::default(),
            visible: FxHashSet::default(),
            next_generation: 0,
            radius,
            events: Vec::new(),
            last_recompute_position: position,
            pass: 0,
            evicted: 0,
        };
        info!(
            chunk_size = manager.config.chunk_size,
            view_distance = manager.config.detail_levels.max_view_distance(),
            radius,
            "Chunk streaming started"
        );
        manager.recompute()?;
        Ok(manager)
    }

    /// Apply finished jobs, then recompute if the viewer moved past the
    /// threshold since the last recompute.
    ///
    /// Every drained completion is handled even if an earlier one fails to
    /// submit follow-up work; the first such error is returned.
    pub fn tick(&mut self) -> Result<(), StreamingError> {
        let mut first_error = None;
        for completion in self.scheduler.drain() {
            if let Err(err) = self.apply_completion(completion) {
                warn!("Failed to handle completion: {err}");
                first_error = first_error.or(Some(err));
            }
        }

        let position = self.viewer.position();
        let threshold = self.config.viewer_move_threshold;
        if position.distance_squared(self.last_recompute_position) > threshold * threshold {
            if let Err(err) = self.recompute() {
                first_error = first_error.or(Some(err));
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Recompute visibility and LOD for the window around the viewer.
    pub fn recompute(&mut self) -> Result<(), StreamingError> {
        self.pass += 1;
        let viewer = self.viewer.position();
        self.last_recompute_position = viewer;
        let chunk_size = self.config.chunk_size;
        let radius = self.radius;
        let center = ChunkCoord::from_world(viewer, chunk_size);
        trace!(pass = self.pass, ?center, radius, "Recomputing visible chunks");

        // Last pass's visible chunks first, so any that left the window get hidden.
        let mut updated: FxHashSet<ChunkCoord> = self.visible.iter().copied().collect();
        let previously_visible: Vec<ChunkCoord> = updated.iter().copied().collect();
        for coord in previously_visible {
            self.update_chunk(coord, viewer)?;
        }

        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let coord = ChunkCoord::new(center.x + dx, center.y + dy);
                if !updated.insert(coord) {
                    if let Some(chunk) = self.chunks.get_mut(&coord) {
                        chunk.last_seen_pass = self.pass;
                    }
                    continue;
                }
                if let Some(chunk) = self.chunks.get_mut(&coord) {
                    chunk.last_seen_pass = self.pass;
                    self.update_chunk(coord, viewer)?;
                } else {
                    self.create_chunk(coord)?;
                }
            }
        }

        self.evict();
        Ok(())
    }

    fn create_chunk(&mut self, coord: ChunkCoord) -> Result<(), StreamingError> {
        let handle = ChunkHandle {
            coord,
            generation: self.next_generation,
        };
        let chunk = Chunk::new(
            handle,
            self.config.chunk_size,
            self.config.detail_levels.len(),
            self.pass,
        );
        self.scheduler.submit_map_request(handle, chunk.center())?;
        debug!(?coord, generation = handle.generation, "Chunk created");
        self.chunks.insert(coord, chunk);
        self.events.push(ChunkEvent::Created { coord });
        Ok(())
    }

    /// Re-evaluate one chunk against the viewer position.
    fn update_chunk(&mut self, coord: ChunkCoord, viewer: Vec2) -> Result<(), StreamingError> {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return Ok(());
        };
        let Some(data) = chunk.map_data.clone() else {
            return Ok(());
        };

        let distance = chunk.bounds().distance_to(viewer);
        let levels = &self.config.detail_levels;
        let visible = distance <= levels.max_view_distance();

        if visible {
            chunk.last_seen_pass = self.pass;
            let lod_index = levels.select(distance);
            chunk.desired_lod = Some(lod_index);
            if chunk.displayed_lod != Some(lod_index) {
                if chunk.lods[lod_index].is_ready() {
                    chunk.displayed_lod = Some(lod_index);
                    debug!(?coord, lod_index, "Mesh applied");
                    self.events.push(ChunkEvent::MeshApplied { coord, lod_index });
                } else if !chunk.lods[lod_index].requested {
                    let lod = levels.as_slice()[lod_index].lod;
                    self.scheduler
                        .submit_mesh_request(chunk.handle(), lod_index, lod, data)?;
                    chunk.lods[lod_index].requested = true;
                    debug!(?coord, lod_index, lod, "Mesh requested");
                }
            }
        }

        if chunk.visible != visible {
            chunk.visible = visible;
            if visible {
                self.visible.insert(coord);
            } else {
                self.visible.remove(&coord);
            }
            self.events
                .push(ChunkEvent::VisibilityChanged { coord, visible });
        }
        Ok(())
    }

    fn apply_completion(&mut self, completion: Completion) -> Result<(), StreamingError> {
        let handle = completion.handle();
        let current = self.chunks.get(&handle.coord).map(|c| c.handle().generation);
        if current != Some(handle.generation) {
            warn!(
                coord = ?handle.coord,
                generation = handle.generation,
                "Dropping completion for an evicted chunk"
            );
            return Ok(());
        }
        let viewer = self.viewer.position();
        let coord = handle.coord;

        match completion {
            Completion::MapReady { data, .. } => {
                let Some(chunk) = self.chunks.get_mut(&coord) else {
                    return Ok(());
                };
                if chunk.map_data.is_some() {
                    warn!(?coord, "Ignoring duplicate map data");
                    return Ok(());
                }
                chunk.map_data = Some(data);
                debug!(?coord, "Map data received");
                self.events.push(ChunkEvent::MaterialReady { coord });
                self.update_chunk(coord, viewer)
            }
            Completion::MeshReady {
                lod_index, mesh, ..
            } => {
                let Some(entry) = self
                    .chunks
                    .get_mut(&coord)
                    .and_then(|chunk| chunk.lods.get_mut(lod_index))
                else {
                    warn!(?coord, lod_index, "Mesh for an unknown LOD tier");
                    return Ok(());
                };
                entry.mesh = Some(mesh);
                trace!(?coord, lod_index, "Mesh cached");
                // Applied only if this tier is still the one wanted.
                self.update_chunk(coord, viewer)
            }
            Completion::Failed { kind, reason, .. } => {
                match kind {
                    JobKind::Map => warn!(?coord, "Map generation failed: {reason}"),
                    JobKind::Mesh { lod_index } => {
                        warn!(?coord, lod_index, "Mesh generation failed: {reason}")
                    }
                }
                Ok(())
            }
        }
    }

    fn evict(&mut self) {
        let resident: Vec<ResidentChunk> = self
            .chunks
            .values()
            .map(|chunk| ResidentChunk {
                coord: chunk.coord(),
                visible: chunk.visible,
                in_window: chunk.last_seen_pass == self.pass,
                last_seen_pass: chunk.last_seen_pass,
                cached_meshes: chunk.lods.iter().filter(|e| e.is_ready()).count(),
            })
            .collect();
        let evicted_before = self.evicted;
        for coord in self.eviction.select_evictions(&resident) {
            if self.visible.contains(&coord) {
                warn!(?coord, "Eviction policy selected a visible chunk; keeping it");
                continue;
            }
            if self.chunks.remove(&coord).is_some() {
                self.evicted += 1;
                debug!(?coord, "Chunk evicted");
                self.events.push(ChunkEvent::Evicted { coord });
            }
        }
        if self.evicted > evicted_before {
            self.next_generation += 1;
        }
    }

    /// Resident chunk at `coord`.
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// All resident chunks, in no particular order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    /// Coordinates of the visible set.
    pub fn visible_chunks(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.visible.iter().copied()
    }

    /// Whether `coord` is in the visible set.
    pub fn is_visible(&self, coord: ChunkCoord) -> bool {
        self.visible.contains(&coord)
    }

    /// Take the events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<ChunkEvent> {
        std::mem::take(&mut self.events)
    }

    /// Viewer position at the last recompute.
    pub fn last_recompute_position(&self) -> Vec2 {
        self.last_recompute_position
    }

    /// Streaming parameters.
    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    /// The injected scheduler.
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// The injected viewer source.
    pub fn viewer(&self) -> &V {
        &self.viewer
    }

    /// Current counters.
    pub fn stats(&self) -> StreamingStats {
        StreamingStats {
            resident: self.chunks.len(),
            visible: self.visible.len(),
            awaiting_map_data: self
                .chunks
                .values()
                .filter(|c| c.map_data.is_none())
                .count(),
            meshes_cached: self
                .chunks
                .values()
                .map(|c| c.lods.iter().filter(|e| e.is_ready()).count())
                .sum(),
            recomputes: self.pass,
            evicted: self.evicted,
            in_flight: self.scheduler.in_flight(),
        }
    }
}
