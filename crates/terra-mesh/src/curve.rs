//! Piecewise-linear remapping of normalized heights.

use serde::{Deserialize, Serialize};

/// One keyframe of a [`HeightCurve`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    /// Input height.
    pub time: f32,
    /// Output height.
    pub value: f32,
}

/// Maps a normalized height to a mesh height factor.
///
/// Inputs before the first key or after the last key take that key's value.
/// Keys are kept sorted by `time`, whether built with [`HeightCurve::new`]
/// or deserialized.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HeightCurve {
    keys: Vec<CurveKey>,
}

#[derive(Deserialize)]
struct UnsortedCurve {
    keys: Vec<CurveKey>,
}

impl<'de> Deserialize<'de> for HeightCurve {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let curve = UnsortedCurve::deserialize(deserializer)?;
        Ok(HeightCurve::new(curve.keys))
    }
}

impl HeightCurve {
    /// Build a curve from unordered keys.
    pub fn new(mut keys: Vec<CurveKey>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    /// The identity curve on `[0, 1]`.
    pub fn linear() -> Self {
        Self::new(vec![
            CurveKey {
                time: 0.0,
                value: 0.0,
            },
            CurveKey {
                time: 1.0,
                value: 1.0,
            },
        ])
    }

    /// Keyframes in ascending time order.
    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    /// Evaluate the curve at `t`.
    pub fn evaluate(&self, t: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return t;
        };
        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }
        // Keys are sorted and t lies strictly inside, so a segment exists.
        let i = self.keys.partition_point(|k| k.time <= t);
        let (a, b) = (self.keys[i - 1], self.keys[i]);
        let span = b.time - a.time;
        if span <= 0.0 {
            return b.value;
        }
        a.value + (b.value - a.value) * ((t - a.time) / span)
    }
}

impl Default for HeightCurve {
    fn default() -> Self {
        Self::linear()
    }
}
