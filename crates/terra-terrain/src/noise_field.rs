//! Deterministic fractal value-noise over a 2D grid.
//!
//! Layers `octaves` samples of smooth 2D noise per cell. Each layer is shifted
//! by a per-octave offset drawn from a PRNG seeded with the caller's seed, so a
//! given `(seed, scale, octaves, persistence, lacunarity, offset)` always
//! reproduces the same grid.

use glam::Vec2;
use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::grid::HeightGrid;

/// Scales at or below zero are floored to this value.
pub const MIN_NOISE_SCALE: f32 = 0.0001;

/// Octave offsets are drawn from `-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE`.
pub const OCTAVE_OFFSET_RANGE: i32 = 100_000;

/// Divisor applied to the theoretical amplitude sum in global normalization.
///
/// Octave sums rarely approach their theoretical maximum, so the range is
/// halved to keep typical terrain spread over `[0, 1]`.
pub const GLOBAL_HEIGHT_COMPENSATION: f32 = 2.0;

/// Seed of the underlying smooth-noise permutation table. Fixed so the field
/// only varies through the octave offsets.
const SAMPLE_TABLE_SEED: u32 = 0;

/// How raw octave sums are mapped into the output range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalizeMode {
    /// Remap each grid from its own observed `[min, max]` to `[0, 1]`.
    ///
    /// Neighboring chunks are not comparable and seams may appear.
    #[default]
    Local,
    /// Remap using the theoretical amplitude sum, giving heights that agree
    /// across chunks. Output is floored at zero but may exceed one.
    Global,
}

/// Parameters for one noise generation call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoiseParameters {
    /// Horizontal scale; larger values give smoother terrain.
    pub scale: f32,
    /// Number of noise layers.
    pub octaves: u32,
    /// Amplitude multiplier applied after each octave, typically `[0, 1]`.
    pub persistence: f32,
    /// Frequency multiplier applied after each octave, at least 1.
    pub lacunarity: f32,
    /// Seed of the octave-offset sequence.
    pub seed: i32,
    /// World-space offset added to every octave offset.
    pub offset: Vec2,
    /// Normalization policy.
    pub normalize_mode: NormalizeMode,
}

impl Default for NoiseParameters {
    fn default() -> Self {
        Self {
            scale: 50.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            seed: 1,
            offset: Vec2::ZERO,
            normalize_mode: NormalizeMode::Local,
        }
    }
}

impl NoiseParameters {
    /// Clamp out-of-range tuning values to the nearest valid value.
    ///
    /// Non-positive (or NaN) scale becomes [`MIN_NOISE_SCALE`] and lacunarity
    /// below one becomes one. Never fails.
    pub fn sanitized(&self) -> Self {
        let mut params = self.clone();
        if params.scale.is_nan() || params.scale <= 0.0 {
            params.scale = MIN_NOISE_SCALE;
        }
        if params.lacunarity.is_nan() || params.lacunarity < 1.0 {
            params.lacunarity = 1.0;
        }
        params
    }

    /// Sum of every octave's amplitude: `sum(persistence^i)` for `i < octaves`.
    pub fn max_possible_height(&self) -> f32 {
        let mut sum = 0.0;
        let mut amplitude = 1.0;
        for _ in 0..self.octaves {
            sum += amplitude;
            amplitude *= self.persistence;
        }
        sum
    }
}

/// Derive one offset per octave from `params.seed`.
///
/// The caller's X offset is added and its Y offset is subtracted. That
/// asymmetry is part of the field's identity: changing it changes every
/// previously generated world.
pub fn octave_offsets(params: &NoiseParameters) -> Vec<Vec2> {
    let mut rng = ChaCha8Rng::seed_from_u64(i64::from(params.seed) as u64);
    (0..params.octaves)
        .map(|_| {
            let x = rng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f32;
            let y = rng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f32;
            Vec2::new(x + params.offset.x, y - params.offset.y)
        })
        .collect()
}

/// Un-normalized octave sums plus the statistics normalization needs.
#[derive(Clone, Debug)]
pub struct RawNoise {
    /// Raw octave sums per cell.
    pub grid: HeightGrid,
    /// Smallest raw sum observed in this call.
    pub min: f32,
    /// Largest raw sum observed in this call.
    pub max: f32,
    /// Theoretical amplitude sum for the parameters.
    pub max_possible: f32,
}

/// Fractal noise generator.
///
/// Holds the smooth-noise permutation table; generation itself is a pure
/// function of the arguments, so one instance can be shared across threads.
#[derive(Clone)]
pub struct NoiseField {
    sampler: Perlin,
}

impl NoiseField {
    /// Create a generator.
    pub fn new() -> Self {
        Self {
            sampler: Perlin::new(SAMPLE_TABLE_SEED),
        }
    }

    /// Smooth noise at `(x, y)`, in `[0, 1]`.
    #[inline]
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let v = self.sampler.get([f64::from(x), f64::from(y)]) as f32;
        ((v + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    /// Generate a normalized `width x height` grid.
    pub fn generate(&self, width: usize, height: usize, params: &NoiseParameters) -> HeightGrid {
        let raw = self.generate_raw(width, height, params);
        normalize(raw, params.normalize_mode)
    }

    /// Generate octave sums without normalizing them.
    pub fn generate_raw(&self, width: usize, height: usize, params: &NoiseParameters) -> RawNoise {
        let params = params.sanitized();
        let offsets = octave_offsets(&params);
        let max_possible = params.max_possible_height();

        let mut grid = HeightGrid::new(width, height);
        let mut min = f32::MAX;
        let mut max = f32::MIN;

        let half_width = width as f32 / 2.0;
        let half_height = height as f32 / 2.0;

        for y in 0..height {
            for x in 0..width {
                let mut amplitude = 1.0;
                let mut frequency = 1.0;
                let mut value = 0.0;

                for offset in &offsets {
                    let sx = (x as f32 - half_width + offset.x) / params.scale * frequency;
                    let sy = (y as f32 - half_height + offset.y) / params.scale * frequency;
                    let layer = self.sample(sx, sy) * 2.0 - 1.0;

                    value += layer * amplitude;
                    amplitude *= params.persistence;
                    frequency *= params.lacunarity;
                }

                min = min.min(value);
                max = max.max(value);
                grid.set(x, y, value);
            }
        }

        RawNoise {
            grid,
            min,
            max,
            max_possible,
        }
    }
}

impl Default for NoiseField {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(raw: RawNoise, mode: NormalizeMode) -> HeightGrid {
    let RawNoise {
        mut grid,
        min,
        max,
        max_possible,
    } = raw;

    match mode {
        NormalizeMode::Local => {
            let range = max - min;
            for v in grid.values_mut() {
                *v = if range > 0.0 { (*v - min) / range } else { 0.0 };
            }
        }
        NormalizeMode::Global => {
            let denom = 2.0 * max_possible / GLOBAL_HEIGHT_COMPENSATION;
            for v in grid.values_mut() {
                let h = if denom > 0.0 { (*v + 1.0) / denom } else { 0.0 };
                *v = h.max(0.0);
            }
        }
    }
    grid
}
