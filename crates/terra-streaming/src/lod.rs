//! Distance-based level-of-detail table.

use serde::{Deserialize, Serialize};

use crate::error::StreamingError;

/// One LOD tier: the mesh simplification level used while the viewer is
/// within `visible_distance_threshold` of a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetailLevel {
    /// Simplification level handed to the mesh builder. 0 is full detail.
    pub lod: u32,
    /// Upper distance bound of this tier, in world units.
    pub visible_distance_threshold: f32,
}

impl DetailLevel {
    /// Create a tier.
    pub const fn new(lod: u32, visible_distance_threshold: f32) -> Self {
        Self {
            lod,
            visible_distance_threshold,
        }
    }
}

/// A non-empty LOD table with positive, finite, strictly ascending distance
/// thresholds.
///
/// Index 0 is the highest detail. The last threshold is the maximum view
/// distance.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DetailLevels(Vec<DetailLevel>);

impl DetailLevels {
    /// Validate and wrap a LOD table.
    pub fn new(levels: Vec<DetailLevel>) -> Result<Self, StreamingError> {
        if levels.is_empty() {
            return Err(StreamingError::NoDetailLevels);
        }
        for (index, level) in levels.iter().enumerate() {
            let threshold = level.visible_distance_threshold;
            if !(threshold.is_finite() && threshold > 0.0) {
                return Err(StreamingError::InvalidDetailDistance { index, threshold });
            }
        }
        for (i, pair) in levels.windows(2).enumerate() {
            let (previous, threshold) = (
                pair[0].visible_distance_threshold,
                pair[1].visible_distance_threshold,
            );
            if !(threshold > previous) {
                return Err(StreamingError::UnsortedDetailLevels {
                    index: i + 1,
                    threshold,
                    previous,
                });
            }
        }
        Ok(Self(levels))
    }

    /// Tiers in ascending distance order.
    pub fn as_slice(&self) -> &[DetailLevel] {
        &self.0
    }

    /// Number of tiers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Farthest distance at which a chunk is visible.
    pub fn max_view_distance(&self) -> f32 {
        self.0
            .last()
            .map_or(0.0, |level| level.visible_distance_threshold)
    }

    /// Index of the tier for a chunk `distance` away.
    ///
    /// Picks the most detailed tier whose threshold is not exceeded, and the
    /// coarsest tier when every threshold is exceeded.
    pub fn select(&self, distance: f32) -> usize {
        let coarsest = self.0.len().saturating_sub(1);
        self.0[..coarsest]
            .iter()
            .position(|level| distance <= level.visible_distance_threshold)
            .unwrap_or(coarsest)
    }
}

impl Default for DetailLevels {
    fn default() -> Self {
        Self(vec![
            DetailLevel::new(0, 200.0),
            DetailLevel::new(1, 400.0),
            DetailLevel::new(4, 600.0),
        ])
    }
}

impl<'de> Deserialize<'de> for DetailLevels {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let levels = Vec::<DetailLevel>::deserialize(deserializer)?;
        DetailLevels::new(levels).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DetailLevels {
        DetailLevels::new(vec![DetailLevel::new(0, 300.0), DetailLevel::new(2, 600.0)]).unwrap()
    }

    #[test]
    fn test_max_view_distance_is_last_threshold() {
        assert_eq!(table().max_view_distance(), 600.0);
    }

    #[test]
    fn test_select_bands() {
        let levels = table();
        assert_eq!(levels.select(0.0), 0);
        assert_eq!(levels.select(300.0), 0);
        assert_eq!(levels.select(300.5), 1);
        assert_eq!(levels.select(600.0), 1);
        // Beyond every threshold falls back to the coarsest tier.
        assert_eq!(levels.select(10_000.0), 1);
    }

    #[test]
    fn test_single_level_always_selected() {
        let levels = DetailLevels::new(vec![DetailLevel::new(3, 100.0)]).unwrap();
        assert_eq!(levels.select(5.0), 0);
        assert_eq!(levels.select(500.0), 0);
    }

    #[test]
    fn test_selection_is_monotonic_in_distance() {
        let levels = DetailLevels::default();
        let mut last = 0;
        for step in 0..700 {
            let idx = levels.select(step as f32);
            assert!(idx >= last);
            last = idx;
        }
    }

    #[test]
    fn test_rejects_empty_table() {
        assert!(matches!(
            DetailLevels::new(Vec::new()),
            Err(StreamingError::NoDetailLevels)
        ));
    }

    #[test]
    fn test_rejects_unsorted_table() {
        let err = DetailLevels::new(vec![
            DetailLevel::new(0, 300.0),
            DetailLevel::new(1, 300.0),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            StreamingError::UnsortedDetailLevels { index: 1, .. }
        ));
    }

    #[test]
    fn test_rejects_non_finite_and_non_positive_thresholds() {
        for threshold in [f32::INFINITY, f32::NAN, 0.0, -50.0] {
            let err = DetailLevels::new(vec![
                DetailLevel::new(0, 100.0),
                DetailLevel::new(1, threshold),
            ])
            .unwrap_err();
            assert!(matches!(
                err,
                StreamingError::InvalidDetailDistance { index: 1, .. }
            ));
        }
        assert!(ron::from_str::<DetailLevels>("[(lod: 0, visible_distance_threshold: -1.0)]").is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: DetailLevels = ron::from_str(
            "[(lod: 0, visible_distance_threshold: 100.0), (lod: 1, visible_distance_threshold: 250.0)]",
        )
        .unwrap();
        assert_eq!(ok.len(), 2);
        let bad = ron::from_str::<DetailLevels>(
            "[(lod: 0, visible_distance_threshold: 250.0), (lod: 1, visible_distance_threshold: 100.0)]",
        );
        assert!(bad.is_err());
    }
}
