//! Per-chunk map data: a height grid plus the color grid classified from it.

use glam::Vec2;

use crate::error::TerrainError;
use crate::grid::{ColorGrid, HeightGrid};
use crate::noise_field::{NoiseField, NoiseParameters};
use crate::region::{Regions, classify_interior};

/// Vertices per chunk edge for smooth-shaded meshes.
pub const STANDARD_CHUNK_VERTICES: usize = 239;

/// Vertices per chunk edge for flat-shaded meshes. Flat shading duplicates
/// vertices per triangle, so the chunk is shrunk to stay within index limits.
pub const FLAT_SHADED_CHUNK_VERTICES: usize = 95;

/// Vertices per chunk edge for the given shading mode.
pub fn map_chunk_size(flat_shading: bool) -> usize {
    if flat_shading {
        FLAT_SHADED_CHUNK_VERTICES
    } else {
        STANDARD_CHUNK_VERTICES
    }
}

/// Immutable terrain data for one chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct MapData {
    heights: HeightGrid,
    colors: ColorGrid,
    border: usize,
}

impl MapData {
    /// Pair a height grid with its classified colors.
    pub fn new(heights: HeightGrid, colors: ColorGrid, border: usize) -> Self {
        Self {
            heights,
            colors,
            border,
        }
    }

    /// Heights, including the border margin.
    pub fn heights(&self) -> &HeightGrid {
        &self.heights
    }

    /// Colors of the interior cells.
    pub fn colors(&self) -> &ColorGrid {
        &self.colors
    }

    /// Border margin in cells on each side of the height grid.
    pub fn border(&self) -> usize {
        self.border
    }
}

/// Everything needed to turn a chunk center into [`MapData`].
#[derive(Clone, Debug)]
pub struct MapGenSettings {
    /// Noise parameters shared by every chunk.
    pub noise: NoiseParameters,
    /// Classification bands.
    pub regions: Regions,
    /// Interior vertices per chunk edge.
    pub chunk_vertices: usize,
    /// Extra cells sampled on each side for seam-correct normals.
    pub border: usize,
}

impl MapGenSettings {
    /// Height grid edge length including the border on both sides.
    pub fn grid_size(&self) -> usize {
        self.chunk_vertices + 2 * self.border
    }

    /// Generate map data for the chunk centered at `center` (world units).
    pub fn generate(&self, field: &NoiseField, center: Vec2) -> Result<MapData, TerrainError> {
        let size = self.grid_size();
        let params = NoiseParameters {
            offset: center + self.noise.offset,
            ..self.noise.clone()
        };
        let heights = field.generate(size, size, &params);
        let colors = classify_interior(&heights, self.border, &self.regions)?;
        Ok(MapData::new(heights, colors, self.border))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(border: usize) -> MapGenSettings {
        MapGenSettings {
            noise: NoiseParameters::default(),
            regions: Regions::default_palette(),
            chunk_vertices: 17,
            border,
        }
    }

    #[test]
    fn test_chunk_sizes_by_shading() {
        assert_eq!(map_chunk_size(false), 239);
        assert_eq!(map_chunk_size(true), 95);
    }

    #[test]
    fn test_bordered_grid_dimensions() {
        let data = settings(1).generate(&NoiseField::new(), Vec2::ZERO).unwrap();
        assert_eq!(data.heights().width(), 19);
        assert_eq!(data.heights().height(), 19);
        assert_eq!(data.colors().width(), 17);
        assert_eq!(data.border(), 1);
    }

    #[test]
    fn test_borderless_grid_dimensions() {
        let data = settings(0).generate(&NoiseField::new(), Vec2::ZERO).unwrap();
        assert_eq!(data.heights().width(), 17);
        assert_eq!(data.colors().width(), 17);
    }

    #[test]
    fn test_chunk_center_moves_sampling_window() {
        let field = NoiseField::new();
        let s = settings(1);
        let a = s.generate(&field, Vec2::ZERO).unwrap();
        let b = s.generate(&field, Vec2::new(240.0, 0.0)).unwrap();
        assert_ne!(a.heights(), b.heights());

        let again = s.generate(&field, Vec2::new(240.0, 0.0)).unwrap();
        assert_eq!(b, again);
    }

    #[test]
    fn test_colors_classify_interior_heights() {
        let s = settings(1);
        let data = s.generate(&NoiseField::new(), Vec2::new(-50.0, 75.0)).unwrap();
        for y in 0..17 {
            for x in 0..17 {
                let h = data.heights().get(x + 1, y + 1);
                let expected = crate::region::classify_height(h, &s.regions).color;
                assert_eq!(data.colors().get(x, y), expected);
            }
        }
    }
}
