//! Row-major 2D grids of heights and colors.

use serde::{Deserialize, Serialize};

use crate::error::TerrainError;

/// A linear RGBA color with components in `[0.0, 1.0]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    /// An opaque color from its red, green and blue components.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Linear interpolation between `self` and `other`, `t` clamped to `[0, 1]`.
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Quantize to 8-bit RGBA.
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

/// A `width x height` grid of normalized heights, stored row-major.
///
/// Values are ideally in `[0, 1]` once normalized; global normalization may
/// exceed 1.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightGrid {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl HeightGrid {
    /// A grid with every cell set to zero.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            values: vec![0.0; width * height],
        }
    }

    /// Wrap an existing row-major buffer.
    pub fn from_values(width: usize, height: usize, values: Vec<f32>) -> Result<Self, TerrainError> {
        if values.len() != width * height {
            return Err(TerrainError::GridSizeMismatch {
                expected: width * height,
                actual: values.len(),
            });
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    /// Grid width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Height at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        debug_assert!(x < self.width && y < self.height);
        self.values[y * self.width + x]
    }

    /// Overwrite the height at `(x, y)`.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        debug_assert!(x < self.width && y < self.height);
        self.values[y * self.width + x] = value;
    }

    /// All cells, row-major.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    /// Smallest and largest cell value, or `None` for an empty grid.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().fold((f32::MAX, f32::MIN), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        }))
    }
}

/// A `width x height` grid with one color per cell, stored row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorGrid {
    width: usize,
    height: usize,
    colors: Vec<Color>,
}

impl ColorGrid {
    pub(crate) fn from_colors(width: usize, height: usize, colors: Vec<Color>) -> Self {
        debug_assert_eq!(colors.len(), width * height);
        Self {
            width,
            height,
            colors,
        }
    }

    /// Grid width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Color at `(x, y)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Color {
        debug_assert!(x < self.width && y < self.height);
        self.colors[y * self.width + x]
    }

    /// All cells, row-major.
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_grid_row_major_indexing() {
        let mut grid = HeightGrid::new(4, 3);
        grid.set(3, 2, 0.75);
        assert_eq!(grid.values()[2 * 4 + 3], 0.75);
        assert_eq!(grid.get(3, 2), 0.75);
        assert_eq!(grid.get(0, 0), 0.0);
    }

    #[test]
    fn test_from_values_rejects_wrong_length() {
        let err = HeightGrid::from_values(3, 3, vec![0.0; 8]).unwrap_err();
        assert_eq!(
            err,
            TerrainError::GridSizeMismatch {
                expected: 9,
                actual: 8
            }
        );
    }

    #[test]
    fn test_min_max() {
        let grid = HeightGrid::from_values(2, 2, vec![0.5, -1.0, 2.0, 0.0]).unwrap();
        assert_eq!(grid.min_max(), Some((-1.0, 2.0)));
        assert_eq!(HeightGrid::new(0, 0).min_max(), None);
    }

    #[test]
    fn test_color_quantization_clamps() {
        assert_eq!(Color::WHITE.to_rgba8(), [255, 255, 255, 255]);
        assert_eq!(Color::rgb(2.0, -1.0, 0.5).to_rgba8(), [255, 0, 128, 255]);
    }

    #[test]
    fn test_color_lerp_midpoint() {
        let mid = Color::BLACK.lerp(Color::WHITE, 0.5);
        assert!((mid.r - 0.5).abs() < 1e-6);
        assert_eq!(mid.a, 1.0);
    }
}
