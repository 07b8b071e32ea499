//! Headless streaming run: drive a viewer along a path and report what the
//! manager kept resident.

use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::Vec2;
use terra_config::Config;
use terra_mesh::TerrainMeshBuilder;
use terra_streaming::{
    ChunkEvent, ChunkStreamingManager, EvictionPolicy, GenerationContext, GenerationScheduler,
    JobScheduler, LruEviction, RetainAll, StreamingStats, ViewerHandle, ViewerSource,
};
use terra_terrain::NoiseField;
use tracing::{debug, info};

use crate::error::DemoError;

/// How the viewer moves.
#[derive(Clone, Copy, Debug)]
pub struct WalkPlan {
    /// Ticks to simulate.
    pub ticks: u32,
    /// World units moved per tick along +x.
    pub speed: f32,
    /// Amplitude of the sideways sway along y.
    pub sway: f32,
    /// Sleep between ticks.
    pub tick_interval: Duration,
    /// After the walk, keep draining until the scheduler is idle or this elapses.
    pub settle_timeout: Duration,
}

impl Default for WalkPlan {
    fn default() -> Self {
        Self {
            ticks: 240,
            speed: 12.0,
            sway: 150.0,
            tick_interval: Duration::from_millis(4),
            settle_timeout: Duration::from_secs(20),
        }
    }
}

impl WalkPlan {
    /// Viewer position at `tick`.
    pub fn position(&self, tick: u32) -> Vec2 {
        let t = tick as f32;
        Vec2::new(t * self.speed, (t * 0.02).sin() * self.sway)
    }
}

/// Outcome of a walk.
#[derive(Clone, Copy, Debug, Default)]
pub struct WalkReport {
    /// Final manager counters.
    pub stats: StreamingStats,
    /// Mesh swaps seen across the walk.
    pub meshes_applied: usize,
    /// Visibility toggles seen across the walk.
    pub visibility_changes: usize,
}

/// Run the streaming pipeline described by `config` along `plan`.
pub fn run_walk(config: &Config, plan: &WalkPlan) -> Result<WalkReport, DemoError> {
    let context = GenerationContext::new(
        NoiseField::new(),
        config.map_gen_settings()?,
        config.mesh.settings(),
        Arc::new(TerrainMeshBuilder),
    );
    let scheduler = GenerationScheduler::new(context, config.streaming.worker_threads)?;
    let eviction: Box<dyn EvictionPolicy> = match config.streaming.max_resident_chunks {
        0 => Box::new(RetainAll),
        max => Box::new(LruEviction::new(max)),
    };

    let viewer = ViewerHandle::new(plan.position(0));
    let mut manager = ChunkStreamingManager::with_eviction(
        config.streaming_config()?,
        scheduler,
        viewer.clone(),
        eviction,
    )?;

    let mut report = WalkReport::default();
    for tick in 0..plan.ticks {
        viewer.set(plan.position(tick));
        manager.tick()?;
        tally(&mut report, manager.take_events());
        if tick % 60 == 0 {
            let stats = manager.stats();
            info!(
                tick,
                x = viewer.position().x,
                resident = stats.resident,
                visible = stats.visible,
                in_flight = stats.in_flight,
                "Streaming"
            );
        }
        std::thread::sleep(plan.tick_interval);
    }

    let deadline = Instant::now() + plan.settle_timeout;
    while manager.scheduler().in_flight() > 0 && Instant::now() < deadline {
        manager.tick()?;
        tally(&mut report, manager.take_events());
        std::thread::sleep(plan.tick_interval);
    }
    manager.tick()?;
    tally(&mut report, manager.take_events());

    report.stats = manager.stats();
    Ok(report)
}

fn tally(report: &mut WalkReport, events: Vec<ChunkEvent>) {
    for event in events {
        match event {
            ChunkEvent::MeshApplied { .. } => report.meshes_applied += 1,
            ChunkEvent::VisibilityChanged { .. } => report.visibility_changes += 1,
            ChunkEvent::Evicted { coord } => debug!(?coord, "Evicted"),
            ChunkEvent::Created { .. } | ChunkEvent::MaterialReady { .. } => {}
        }
    }
}
