//! Terrain meshing contract: the [`MeshBuilder`] trait consumed by the
//! streaming pipeline, height remapping curves, and a reference
//! height-grid triangulator.

mod curve;
mod mesh;
mod terrain_mesh;

pub use curve::{CurveKey, HeightCurve};
pub use mesh::{MeshBuilder, MeshError, MeshPayload, MeshSettings, MeshVertex};
pub use terrain_mesh::{TerrainMeshBuilder, lod_increment, sample_positions};
