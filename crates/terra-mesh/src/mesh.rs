//! Mesh payloads and the builder contract used by the generation pipeline.

use terra_terrain::HeightGrid;

use crate::curve::HeightCurve;

/// A single terrain vertex, laid out for direct GPU upload.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// Chunk-local position; the chunk is centered on its origin.
    pub position: [f32; 3],
    /// Unit surface normal.
    pub normal: [f32; 3],
    /// Texture coordinates across the chunk's color map, in `[0, 1]`.
    pub uv: [f32; 2],
}

static_assertions::assert_eq_size!(MeshVertex, [u8; 32]);

/// Triangle mesh for one chunk at one LOD.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshPayload {
    /// Vertex buffer.
    pub vertices: Vec<MeshVertex>,
    /// Triangle list, three indices per triangle.
    pub indices: Vec<u32>,
}

impl MeshPayload {
    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex buffer as raw bytes.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// Settings passed through to the mesh builder unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshSettings {
    /// World-space height of a fully raised cell.
    pub height_multiplier: f32,
    /// Remapping applied to normalized heights before scaling.
    pub height_curve: HeightCurve,
    /// Emit one normal per triangle instead of per vertex.
    pub flat_shading: bool,
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            height_multiplier: 30.0,
            height_curve: HeightCurve::linear(),
            flat_shading: false,
        }
    }
}

/// Errors from mesh construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    /// The height grid leaves no interior to triangulate.
    #[error("height grid {width}x{height} is too small for a border of {border}")]
    GridTooSmall {
        /// Grid width.
        width: usize,
        /// Grid height.
        height: usize,
        /// Border the builder expects.
        border: usize,
    },
}

/// Turns a height grid into a mesh. Must be deterministic.
///
/// Implementations run on worker threads and must not share mutable state.
pub trait MeshBuilder: Send + Sync {
    /// Cells of margin the builder expects around the chunk interior.
    ///
    /// Map data is generated with this border so the grid dimensions always
    /// match what the builder reads.
    fn border(&self) -> usize;

    /// Build the mesh for `heights` at level of detail `lod`.
    fn build(
        &self,
        heights: &HeightGrid,
        settings: &MeshSettings,
        lod: u32,
    ) -> Result<MeshPayload, MeshError>;
}
