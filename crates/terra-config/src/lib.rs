//! Terrain configuration persisted to disk as RON, with CLI overrides.
//!
//! Sections deserialize with defaults, so old or partial files still load.
//! [`Config::validate`] checks everything the generation pipeline assumes.

mod cli;
mod config;
mod error;

pub use cli::{CliArgs, parse_normalize_mode};
pub use config::{
    CONFIG_FILE_NAME, Config, DebugConfig, MAX_EDITOR_LOD, MeshConfig, NoiseConfig, RegionList,
    StreamConfig, default_config_dir,
};
pub use error::ConfigError;
