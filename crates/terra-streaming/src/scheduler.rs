//! Background map and mesh generation on a bounded pool of named threads.
//!
//! Jobs go in through unbounded queues, so submission never blocks. Results
//! come back as tagged [`Completion`]s on one channel per job kind, drained
//! by the consumer once per tick. A panicking job turns into
//! [`Completion::Failed`] instead of killing its worker.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, unbounded};
use glam::Vec2;
use terra_mesh::{MeshBuilder, MeshPayload, MeshSettings};
use terra_terrain::{MapData, MapGenSettings, NoiseField};
use tracing::{debug, info, trace};

use crate::chunk::ChunkHandle;
use crate::error::StreamingError;

/// Which kind of job a completion belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobKind {
    /// Height and color grid generation.
    Map,
    /// Mesh generation for one LOD tier.
    Mesh {
        /// Tier index in the LOD table.
        lod_index: usize,
    },
}

/// A finished job, tagged with the handle it was submitted under.
#[derive(Debug)]
pub enum Completion {
    /// Map data for a chunk.
    MapReady {
        /// Correlation handle.
        handle: ChunkHandle,
        /// Generated grids.
        data: Arc<MapData>,
    },
    /// Mesh for one tier of a chunk.
    MeshReady {
        /// Correlation handle.
        handle: ChunkHandle,
        /// Tier index in the LOD table.
        lod_index: usize,
        /// Generated mesh.
        mesh: Arc<MeshPayload>,
    },
    /// The job returned an error or panicked.
    Failed {
        /// Correlation handle.
        handle: ChunkHandle,
        /// What was being generated.
        kind: JobKind,
        /// Error or panic message.
        reason: String,
    },
}

impl Completion {
    /// Handle the job was submitted under.
    pub fn handle(&self) -> ChunkHandle {
        match self {
            Self::MapReady { handle, .. }
            | Self::MeshReady { handle, .. }
            | Self::Failed { handle, .. } => *handle,
        }
    }
}

/// Where chunk jobs are submitted and their results collected.
///
/// [`GenerationScheduler`] is the threaded implementation; the streaming
/// manager only depends on this trait.
pub trait JobScheduler {
    /// Queue map generation for the chunk centered at `center`.
    fn submit_map_request(&self, handle: ChunkHandle, center: Vec2) -> Result<(), StreamingError>;

    /// Queue mesh generation for tier `lod_index` (builder level `lod`).
    fn submit_mesh_request(
        &self,
        handle: ChunkHandle,
        lod_index: usize,
        lod: u32,
        data: Arc<MapData>,
    ) -> Result<(), StreamingError>;

    /// Take every completion available right now, map results first.
    fn drain(&self) -> Vec<Completion>;

    /// Jobs submitted but not yet completed.
    fn in_flight(&self) -> usize;
}

/// Shared, read-only inputs for every job.
pub struct GenerationContext {
    field: NoiseField,
    map_settings: MapGenSettings,
    mesh_settings: MeshSettings,
    mesh_builder: Arc<dyn MeshBuilder>,
}

impl GenerationContext {
    /// Bundle job inputs. The map border is taken from the mesh builder so
    /// generated grids always match what it reads.
    pub fn new(
        field: NoiseField,
        mut map_settings: MapGenSettings,
        mesh_settings: MeshSettings,
        mesh_builder: Arc<dyn MeshBuilder>,
    ) -> Self {
        let border = mesh_builder.border();
        if map_settings.border != border {
            debug!(
                requested = map_settings.border,
                border,
                "Using mesh builder border for map generation"
            );
            map_settings.border = border;
        }
        Self {
            field,
            map_settings,
            mesh_settings,
            mesh_builder,
        }
    }

    /// Map generation settings with the builder's border applied.
    pub fn map_settings(&self) -> &MapGenSettings {
        &self.map_settings
    }

    /// Settings passed through to the mesh builder.
    pub fn mesh_settings(&self) -> &MeshSettings {
        &self.mesh_settings
    }

    fn run(&self, job: Job) -> Completion {
        match job {
            Job::Map { handle, center } => match self.map_settings.generate(&self.field, center) {
                Ok(data) => Completion::MapReady {
                    handle,
                    data: Arc::new(data),
                },
                Err(err) => Completion::Failed {
                    handle,
                    kind: JobKind::Map,
                    reason: err.to_string(),
                },
            },
            Job::Mesh {
                handle,
                lod_index,
                lod,
                data,
            } => match self
                .mesh_builder
                .build(data.heights(), &self.mesh_settings, lod)
            {
                Ok(mesh) => Completion::MeshReady {
                    handle,
                    lod_index,
                    mesh: Arc::new(mesh),
                },
                Err(err) => Completion::Failed {
                    handle,
                    kind: JobKind::Mesh { lod_index },
                    reason: err.to_string(),
                },
            },
        }
    }
}

enum Job {
    Map {
        handle: ChunkHandle,
        center: Vec2,
    },
    Mesh {
        handle: ChunkHandle,
        lod_index: usize,
        lod: u32,
        data: Arc<MapData>,
    },
}

impl Job {
    fn handle(&self) -> ChunkHandle {
        match self {
            Self::Map { handle, .. } | Self::Mesh { handle, .. } => *handle,
        }
    }

    fn kind(&self) -> JobKind {
        match self {
            Self::Map { .. } => JobKind::Map,
            Self::Mesh { lod_index, .. } => JobKind::Mesh {
                lod_index: *lod_index,
            },
        }
    }
}

/// Worker count used when the configuration asks for automatic sizing:
/// all cores but two, at least one.
pub fn default_worker_threads() -> usize {
    num_cpus::get().saturating_sub(2).max(1)
}

/// Threaded [`JobScheduler`] with one worker pool per job kind.
pub struct GenerationScheduler {
    map_sender: Option<Sender<Job>>,
    mesh_sender: Option<Sender<Job>>,
    map_results: Receiver<Completion>,
    mesh_results: Receiver<Completion>,
    workers: Vec<JoinHandle<()>>,
    in_flight: Arc<AtomicUsize>,
    context: Arc<GenerationContext>,
}

impl GenerationScheduler {
    /// Start `worker_threads` map workers and as many mesh workers.
    /// Zero picks [`default_worker_threads`].
    pub fn new(context: GenerationContext, worker_threads: usize) -> Result<Self, StreamingError> {
        let threads = if worker_threads == 0 {
            default_worker_threads()
        } else {
            worker_threads
        };
        let context = Arc::new(context);
        let in_flight = Arc::new(AtomicUsize::new(0));

        let (map_sender, map_jobs) = unbounded();
        let (mesh_sender, mesh_jobs) = unbounded();
        let (map_done, map_results) = unbounded();
        let (mesh_done, mesh_results) = unbounded();

        let mut scheduler = Self {
            map_sender: Some(map_sender),
            mesh_sender: Some(mesh_sender),
            map_results,
            mesh_results,
            workers: Vec::with_capacity(threads * 2),
            in_flight,
            context,
        };
        // On a spawn failure, dropping `scheduler` joins whatever already started.
        for _ in 0..threads {
            scheduler.spawn_worker("terra-map-worker", map_jobs.clone(), map_done.clone())?;
            scheduler.spawn_worker("terra-mesh-worker", mesh_jobs.clone(), mesh_done.clone())?;
        }
        info!(threads, "Generation scheduler started");
        Ok(scheduler)
    }

    fn spawn_worker(
        &mut self,
        name: &str,
        jobs: Receiver<Job>,
        done: Sender<Completion>,
    ) -> Result<(), StreamingError> {
        let context = Arc::clone(&self.context);
        let in_flight = Arc::clone(&self.in_flight);
        let handle = std::thread::Builder::new()
            .name(name.into())
            .spawn(move || {
                while let Ok(job) = jobs.recv() {
                    let (handle, kind) = (job.handle(), job.kind());
                    let completion = panic::catch_unwind(AssertUnwindSafe(|| context.run(job)))
                        .unwrap_or_else(|payload| Completion::Failed {
                            handle,
                            kind,
                            reason: panic_message(payload.as_ref()),
                        });
                    // Decrement first so a drained result is never still counted.
                    in_flight.fetch_sub(1, Ordering::Relaxed);
                    if done.send(completion).is_err() {
                        break;
                    }
                }
            })?;
        self.workers.push(handle);
        Ok(())
    }

    fn submit(&self, sender: Option<&Sender<Job>>, job: Job) -> Result<(), StreamingError> {
        let sender = sender.ok_or(StreamingError::SchedulerClosed)?;
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        sender.send(job).map_err(|_| {
            self.in_flight.fetch_sub(1, Ordering::Relaxed);
            StreamingError::SchedulerClosed
        })
    }

    /// Shared job inputs.
    pub fn context(&self) -> &GenerationContext {
        &self.context
    }

    /// Number of worker threads across both pools.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop accepting jobs, let workers finish their queues, and join them.
    pub fn shutdown(&mut self) {
        self.map_sender.take();
        self.mesh_sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl JobScheduler for GenerationScheduler {
    fn submit_map_request(&self, handle: ChunkHandle, center: Vec2) -> Result<(), StreamingError> {
        self.submit(self.map_sender.as_ref(), Job::Map { handle, center })
    }

    fn submit_mesh_request(
        &self,
        handle: ChunkHandle,
        lod_index: usize,
        lod: u32,
        data: Arc<MapData>,
    ) -> Result<(), StreamingError> {
        self.submit(
            self.mesh_sender.as_ref(),
            Job::Mesh {
                handle,
                lod_index,
                lod,
                data,
            },
        )
    }

    fn drain(&self) -> Vec<Completion> {
        let mut completions: Vec<Completion> = self.map_results.try_iter().collect();
        completions.extend(self.mesh_results.try_iter());
        if !completions.is_empty() {
            trace!(count = completions.len(), "Drained completions");
        }
        completions
    }

    fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }
}

impl Drop for GenerationScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use terra_mesh::{MeshError, TerrainMeshBuilder};
    use terra_terrain::{HeightGrid, NoiseParameters, Regions};

    use super::*;
    use crate::chunk::ChunkCoord;

    fn context_with(builder: Arc<dyn MeshBuilder>) -> GenerationContext {
        GenerationContext::new(
            NoiseField::new(),
            MapGenSettings {
                noise: NoiseParameters::default(),
                regions: Regions::default_palette(),
                chunk_vertices: 17,
                border: 0,
            },
            MeshSettings::default(),
            builder,
        )
    }

    fn handle(x: i32, y: i32) -> ChunkHandle {
        ChunkHandle {
            coord: ChunkCoord::new(x, y),
            generation: 0,
        }
    }

    fn drain_until(scheduler: &GenerationScheduler, count: usize) -> Vec<Completion> {
        let mut results = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(30);
        while results.len() < count && Instant::now() < deadline {
            results.extend(scheduler.drain());
            if results.len() < count {
                std::thread::sleep(Duration::from_millis(5));
            }
        }
        results
    }

    struct PanickingBuilder;

    impl MeshBuilder for PanickingBuilder {
        fn border(&self) -> usize {
            1
        }

        fn build(&self, _: &HeightGrid, _: &MeshSettings, lod: u32) -> Result<MeshPayload, MeshError> {
            panic!("cannot mesh lod {lod}");
        }
    }

    #[test]
    fn test_border_comes_from_mesh_builder() {
        let context = context_with(Arc::new(TerrainMeshBuilder));
        assert_eq!(context.map_settings().border, 1);
        assert_eq!(context.map_settings().grid_size(), 19);
    }

    #[test]
    fn test_zero_threads_uses_default() {
        let scheduler = GenerationScheduler::new(context_with(Arc::new(TerrainMeshBuilder)), 0).unwrap();
        assert_eq!(scheduler.worker_count(), default_worker_threads() * 2);
        assert!(default_worker_threads() >= 1);
    }

    #[test]
    fn test_each_map_request_completes_once_with_its_own_data() {
        let scheduler = GenerationScheduler::new(context_with(Arc::new(TerrainMeshBuilder)), 3).unwrap();
        let chunk_size = 16.0;
        let mut expected = Vec::new();
        for x in -2..=2 {
            for y in -2..=2 {
                let h = handle(x, y);
                scheduler
                    .submit_map_request(h, h.coord.world_center(chunk_size))
                    .unwrap();
                expected.push(h);
            }
        }

        let results = drain_until(&scheduler, expected.len());
        assert_eq!(results.len(), expected.len());

        let settings = scheduler.context().map_settings().clone();
        let field = NoiseField::new();
        let mut seen = Vec::new();
        for completion in results {
            let (handle, data) = match completion {
                Completion::MapReady { handle, data } => (handle, data),
                other => panic!("unexpected completion {other:?}"),
            };
            let reference = settings
                .generate(&field, handle.coord.world_center(chunk_size))
                .unwrap();
            assert_eq!(*data, reference, "data for {:?} leaked from another request", handle);
            seen.push(handle);
        }
        for h in &expected {
            assert_eq!(seen.iter().filter(|s| *s == h).count(), 1);
        }
        assert_eq!(scheduler.in_flight(), 0);
        assert!(scheduler.drain().is_empty());
    }

    #[test]
    fn test_mesh_request_carries_lod_index() {
        let scheduler = GenerationScheduler::new(context_with(Arc::new(TerrainMeshBuilder)), 1).unwrap();
        let settings = scheduler.context().map_settings().clone();
        let data = Arc::new(settings.generate(&NoiseField::new(), Vec2::ZERO).unwrap());

        scheduler.submit_mesh_request(handle(0, 0), 2, 4, Arc::clone(&data)).unwrap();
        scheduler.submit_mesh_request(handle(0, 0), 0, 0, data).unwrap();

        let results = drain_until(&scheduler, 2);
        let mut lods: Vec<(usize, usize)> = results
            .iter()
            .map(|c| match c {
                Completion::MeshReady { lod_index, mesh, .. } => (*lod_index, mesh.vertex_count()),
                other => panic!("unexpected completion {other:?}"),
            })
            .collect();
        lods.sort();
        assert_eq!(lods[0], (0, 17 * 17));
        assert_eq!(lods[1].0, 2);
        assert!(lods[1].1 < lods[0].1);
    }

    #[test]
    fn test_worker_panic_becomes_failed_completion() {
        let scheduler = GenerationScheduler::new(context_with(Arc::new(PanickingBuilder)), 1).unwrap();
        let settings = scheduler.context().map_settings().clone();
        let data = Arc::new(settings.generate(&NoiseField::new(), Vec2::ZERO).unwrap());

        scheduler.submit_mesh_request(handle(1, 1), 1, 2, Arc::clone(&data)).unwrap();
        let results = drain_until(&scheduler, 1);
        match &results[..] {
            [Completion::Failed { handle: h, kind, reason }] => {
                assert_eq!(*h, handle(1, 1));
                assert_eq!(*kind, JobKind::Mesh { lod_index: 1 });
                assert!(reason.contains("cannot mesh lod 2"));
            }
            other => panic!("unexpected completions {other:?}"),
        }

        // The worker survives and keeps serving.
        scheduler.submit_mesh_request(handle(2, 2), 0, 0, data).unwrap();
        assert_eq!(drain_until(&scheduler, 1).len(), 1);
    }

    #[test]
    fn test_submit_after_shutdown_is_rejected() {
        let mut scheduler = GenerationScheduler::new(context_with(Arc::new(TerrainMeshBuilder)), 1).unwrap();
        scheduler.shutdown();
        assert!(matches!(
            scheduler.submit_map_request(handle(0, 0), Vec2::ZERO),
            Err(StreamingError::SchedulerClosed)
        ));
        assert_eq!(scheduler.in_flight(), 0);
        assert_eq!(scheduler.worker_count(), 0);
    }
}
