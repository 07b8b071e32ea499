//! Editor preview images built from height and color grids.

use serde::{Deserialize, Serialize};

use crate::grid::{Color, ColorGrid, HeightGrid};

/// What the editor preview shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawMode {
    /// Grayscale height grid.
    NoiseMap,
    /// Region colors.
    #[default]
    ColorMap,
    /// A mesh at the editor LOD, textured with the color map.
    Mesh,
}

/// A 2D image stored as row-major RGBA8 pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Pixel data, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

impl PreviewImage {
    /// Create a transparent black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
        }
    }

    /// Set one pixel.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let idx = ((y * self.width + x) * 4) as usize;
        self.pixels[idx..idx + 4].copy_from_slice(&rgba);
    }

    /// Read one pixel.
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }
}

/// Grayscale image: black at height 0, white at height 1.
pub fn texture_from_height_grid(heights: &HeightGrid) -> PreviewImage {
    let mut image = PreviewImage::new(heights.width() as u32, heights.height() as u32);
    for y in 0..heights.height() {
        for x in 0..heights.width() {
            let color = Color::BLACK.lerp(Color::WHITE, heights.get(x, y));
            image.set_pixel(x as u32, y as u32, color.to_rgba8());
        }
    }
    image
}

/// One pixel per color cell.
pub fn texture_from_color_grid(colors: &ColorGrid, width: usize, height: usize) -> PreviewImage {
    let mut image = PreviewImage::new(width as u32, height as u32);
    for y in 0..height.min(colors.height()) {
        for x in 0..width.min(colors.width()) {
            image.set_pixel(x as u32, y as u32, colors.get(x, y).to_rgba8());
        }
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{Region, Regions, classify};

    #[test]
    fn test_height_texture_is_grayscale() {
        let heights = HeightGrid::from_values(2, 1, vec![0.0, 1.0]).unwrap();
        let image = texture_from_height_grid(&heights);
        assert_eq!((image.width, image.height), (2, 1));
        assert_eq!(image.get_pixel(0, 0), [0, 0, 0, 255]);
        assert_eq!(image.get_pixel(1, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn test_color_texture_copies_cells() {
        let heights = HeightGrid::from_values(2, 2, vec![0.1, 0.9, 0.9, 0.1]).unwrap();
        let regions = Regions::new(vec![
            Region::new("low", 0.5, Color::rgb(0.0, 0.0, 1.0)),
            Region::new("high", 1.0, Color::rgb(1.0, 0.0, 0.0)),
        ])
        .unwrap();
        let image = texture_from_color_grid(&classify(&heights, &regions), 2, 2);
        assert_eq!(image.get_pixel(0, 0), [0, 0, 255, 255]);
        assert_eq!(image.get_pixel(1, 0), [255, 0, 0, 255]);
        assert_eq!(image.pixels.len(), 16);
    }
}
