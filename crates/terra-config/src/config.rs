//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use terra_mesh::{HeightCurve, MeshSettings, TerrainMeshBuilder};
use terra_streaming::{DetailLevel, DetailLevels, StreamingConfig};
use terra_terrain::{MapGenSettings, NoiseParameters, NormalizeMode, Region, Regions, map_chunk_size};

use crate::error::ConfigError;

/// File name inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

/// Highest simplification level accepted for the editor preview mesh.
pub const MAX_EDITOR_LOD: u32 = 6;

const APP_NAME: &str = "terra";

/// Platform config directory for this application, if the OS exposes one.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join(APP_NAME))
}

/// Top-level terrain configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Noise field settings.
    pub noise: NoiseConfig,
    /// Classification bands in ascending cutoff order.
    pub regions: RegionList,
    /// Mesh settings passed through to the mesh builder.
    pub mesh: MeshConfig,
    /// Chunk streaming settings.
    pub streaming: StreamConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Region list kept unvalidated so a bad file still loads and
/// [`Config::validate`] can report what is wrong with it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RegionList(pub Vec<Region>);

impl Default for RegionList {
    fn default() -> Self {
        Self(Regions::default_palette().as_slice().to_vec())
    }
}

/// Noise field configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoiseConfig {
    /// Horizontal scale; non-positive values are floored at generation time.
    pub scale: f32,
    /// Octave count; negative values are treated as zero.
    pub octaves: i32,
    /// Amplitude decay per octave.
    pub persistence: f32,
    /// Frequency growth per octave; values below one are raised to one.
    pub lacunarity: f32,
    /// World seed.
    pub seed: i32,
    /// World offset `[x, y]`.
    pub offset: [f32; 2],
    /// `Local` or `Global`.
    pub normalize_mode: NormalizeMode,
}

/// Mesh configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MeshConfig {
    /// World height of a fully raised cell.
    pub height_multiplier: f32,
    /// Height remapping keyframes.
    pub height_curve: HeightCurve,
    /// Flat shading; also selects the smaller chunk size.
    pub flat_shading: bool,
    /// Simplification level of the editor preview mesh, `0..=6`.
    pub editor_lod: u32,
}

/// Streaming configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamConfig {
    /// LOD tiers in ascending distance order.
    pub detail_levels: Vec<DetailLevel>,
    /// Viewer displacement that triggers a visibility recompute.
    pub viewer_move_threshold: f32,
    /// Workers per job pool (0 = derive from CPU count).
    pub worker_threads: usize,
    /// Resident chunk bound for LRU eviction (0 = keep every chunk).
    pub max_resident_chunks: usize,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for NoiseConfig {
    fn default() -> Self {
        let params = NoiseParameters::default();
        Self {
            scale: params.scale,
            octaves: params.octaves as i32,
            persistence: params.persistence,
            lacunarity: params.lacunarity,
            seed: params.seed,
            offset: params.offset.to_array(),
            normalize_mode: params.normalize_mode,
        }
    }
}

impl Default for MeshConfig {
    fn default() -> Self {
        let settings = MeshSettings::default();
        Self {
            height_multiplier: settings.height_multiplier,
            height_curve: settings.height_curve,
            flat_shading: settings.flat_shading,
            editor_lod: 0,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            detail_levels: DetailLevels::default().as_slice().to_vec(),
            viewer_move_threshold: terra_streaming::DEFAULT_VIEWER_MOVE_THRESHOLD,
            worker_threads: 0,
            max_resident_chunks: 0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Conversions into pipeline types ---

impl NoiseConfig {
    /// Noise parameters with the octave count clamped at zero.
    pub fn parameters(&self) -> NoiseParameters {
        NoiseParameters {
            scale: self.scale,
            octaves: self.octaves.max(0) as u32,
            persistence: self.persistence,
            lacunarity: self.lacunarity,
            seed: self.seed,
            offset: Vec2::from_array(self.offset),
            normalize_mode: self.normalize_mode,
        }
    }
}

impl MeshConfig {
    /// Settings handed to the mesh builder.
    pub fn settings(&self) -> MeshSettings {
        MeshSettings {
            height_multiplier: self.height_multiplier,
            height_curve: self.height_curve.clone(),
            flat_shading: self.flat_shading,
        }
    }

    /// Vertices per chunk edge for the configured shading.
    pub fn chunk_vertices(&self) -> usize {
        map_chunk_size(self.flat_shading)
    }

    /// World-space chunk edge length.
    pub fn chunk_size(&self) -> f32 {
        (self.chunk_vertices() - 1) as f32
    }

    /// Editor LOD clamped to the supported range.
    pub fn editor_lod(&self) -> u32 {
        self.editor_lod.min(MAX_EDITOR_LOD)
    }
}

impl Config {
    /// Validated region list.
    pub fn regions(&self) -> Result<Regions, ConfigError> {
        Ok(Regions::new(self.regions.0.clone())?)
    }

    /// Validated LOD table.
    pub fn detail_levels(&self) -> Result<DetailLevels, ConfigError> {
        Ok(DetailLevels::new(self.streaming.detail_levels.clone())?)
    }

    /// Map generation settings for one chunk.
    pub fn map_gen_settings(&self) -> Result<MapGenSettings, ConfigError> {
        Ok(MapGenSettings {
            noise: self.noise.parameters(),
            regions: self.regions()?,
            chunk_vertices: self.mesh.chunk_vertices(),
            border: TerrainMeshBuilder::BORDER,
        })
    }

    /// Streaming manager settings.
    pub fn streaming_config(&self) -> Result<StreamingConfig, ConfigError> {
        Ok(StreamingConfig {
            chunk_size: self.mesh.chunk_size(),
            detail_levels: self.detail_levels()?,
            viewer_move_threshold: self.streaming.viewer_move_threshold,
        })
    }

    /// Check everything the pipeline assumes of its inputs.
    ///
    /// Out-of-range noise tuning is not an error; it is clamped at use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.regions()?;
        self.streaming_config()?.view_radius()?;
        let threshold = self.streaming.viewer_move_threshold;
        if !(threshold.is_finite() && threshold >= 0.0) {
            return Err(ConfigError::MoveThreshold(threshold));
        }
        Ok(())
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let config = read_config(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        let path = config_dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, serialized).map_err(|source| ConfigError::Write { path, source })
    }

    /// Returns `Some(new_config)` if the file on disk differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = read_config(&config_dir.join(CONFIG_FILE_NAME))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
