//! Procedural terrain data: fractal value-noise height grids, threshold-based
//! region classification, and per-chunk map data generation.

mod error;
mod grid;
mod map_data;
mod noise_field;
mod region;

pub mod preview;

pub use error::TerrainError;
pub use grid::{Color, ColorGrid, HeightGrid};
pub use map_data::{
    FLAT_SHADED_CHUNK_VERTICES, MapData, MapGenSettings, STANDARD_CHUNK_VERTICES, map_chunk_size,
};
pub use noise_field::{
    GLOBAL_HEIGHT_COMPENSATION, MIN_NOISE_SCALE, NoiseField, NoiseParameters, NormalizeMode,
    OCTAVE_OFFSET_RANGE, RawNoise, octave_offsets,
};
pub use preview::{DrawMode, PreviewImage, texture_from_color_grid, texture_from_height_grid};
pub use region::{Region, Regions, classify, classify_height, classify_interior};
