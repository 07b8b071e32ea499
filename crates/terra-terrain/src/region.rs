//! Threshold-based classification of heights into named, colored regions.
//!
//! A height belongs to the first region (in ascending cutoff order) whose
//! cutoff is greater than or equal to it. Heights above every cutoff belong to
//! the last region, so classification is total.

use serde::{Deserialize, Serialize};

use crate::error::TerrainError;
use crate::grid::{Color, ColorGrid, HeightGrid};

/// A named height band.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Display name, e.g. `"water"`.
    pub name: String,
    /// Upper cutoff of the band (inclusive).
    pub height: f32,
    /// Color assigned to cells in the band.
    pub color: Color,
}

impl Region {
    /// Create a region.
    pub fn new(name: impl Into<String>, height: f32, color: Color) -> Self {
        Self {
            name: name.into(),
            height,
            color,
        }
    }
}

/// A non-empty region list with ascending cutoffs.
///
/// The list is validated, never sorted: an out-of-order list is a caller bug.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Regions(Vec<Region>);

impl Regions {
    /// Validate and wrap a region list.
    pub fn new(regions: Vec<Region>) -> Result<Self, TerrainError> {
        if regions.is_empty() {
            return Err(TerrainError::EmptyRegions);
        }
        for (index, pair) in regions.windows(2).enumerate() {
            if pair[1].height < pair[0].height {
                return Err(TerrainError::UnsortedRegions {
                    index: index + 1,
                    name: pair[1].name.clone(),
                    height: pair[1].height,
                    previous: pair[0].height,
                });
            }
        }
        Ok(Self(regions))
    }

    /// Regions in ascending cutoff order.
    pub fn as_slice(&self) -> &[Region] {
        &self.0
    }

    /// Number of regions (always at least one).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A small land/sea palette.
    pub fn default_palette() -> Self {
        Self(vec![
            Region::new("deep water", 0.3, Color::rgb(0.20, 0.38, 0.78)),
            Region::new("shallow water", 0.4, Color::rgb(0.24, 0.45, 0.82)),
            Region::new("sand", 0.45, Color::rgb(0.84, 0.82, 0.50)),
            Region::new("grass", 0.55, Color::rgb(0.34, 0.60, 0.10)),
            Region::new("forest", 0.6, Color::rgb(0.24, 0.42, 0.08)),
            Region::new("rock", 0.7, Color::rgb(0.36, 0.27, 0.24)),
            Region::new("high rock", 0.9, Color::rgb(0.29, 0.24, 0.23)),
            Region::new("snow", 1.0, Color::WHITE),
        ])
    }
}

impl<'de> Deserialize<'de> for Regions {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let regions = Vec::<Region>::deserialize(deserializer)?;
        Regions::new(regions).map_err(serde::de::Error::custom)
    }
}

/// The region a single height falls into.
pub fn classify_height(height: f32, regions: &Regions) -> &Region {
    let list = regions.as_slice();
    let Some(top) = list.last() else {
        unreachable!("region lists are validated non-empty");
    };
    list.iter().find(|r| height <= r.height).unwrap_or(top)
}

/// Classify every cell of `heights`.
pub fn classify(heights: &HeightGrid, regions: &Regions) -> ColorGrid {
    let colors = heights
        .values()
        .iter()
        .map(|&h| classify_height(h, regions).color)
        .collect();
    ColorGrid::from_colors(heights.width(), heights.height(), colors)
}

/// Classify the cells inside a `border`-cell margin.
///
/// The result is `(width - 2*border) x (height - 2*border)`, cell `(x, y)`
/// taken from height cell `(x + border, y + border)`.
pub fn classify_interior(
    heights: &HeightGrid,
    border: usize,
    regions: &Regions,
) -> Result<ColorGrid, TerrainError> {
    let too_small = TerrainError::GridTooSmall {
        width: heights.width(),
        height: heights.height(),
        border,
    };
    let width = heights
        .width()
        .checked_sub(2 * border)
        .filter(|&w| w > 0)
        .ok_or_else(|| too_small.clone())?;
    let height = heights
        .height()
        .checked_sub(2 * border)
        .filter(|&h| h > 0)
        .ok_or(too_small)?;

    let mut colors = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let h = heights.get(x + border, y + border);
            colors.push(classify_height(h, regions).color);
        }
    }
    Ok(ColorGrid::from_colors(width, height, colors))
}
