//! Reference triangulator for bordered height grids.
//!
//! The grid carries one extra cell on every side. Border cells are read for
//! normals only, so adjacent chunks produce matching normals along shared
//! edges. The interior is sampled every `lod_increment(lod)` cells, and the
//! last row and column are always kept so chunk edges line up across LODs.

use glam::{Vec2, Vec3};
use terra_terrain::HeightGrid;

use crate::mesh::{MeshBuilder, MeshError, MeshPayload, MeshSettings, MeshVertex};

/// Sampling step for a level of detail. LOD 0 keeps every vertex.
pub fn lod_increment(lod: u32) -> usize {
    if lod == 0 { 1 } else { lod as usize * 2 }
}

/// Interior indices sampled along one edge of `size` vertices.
pub fn sample_positions(size: usize, increment: usize) -> Vec<usize> {
    if size == 0 {
        return Vec::new();
    }
    let mut positions: Vec<usize> = (0..size).step_by(increment.max(1)).collect();
    if positions.last() != Some(&(size - 1)) {
        positions.push(size - 1);
    }
    positions
}

/// Height grid triangulator with a one-cell border.
#[derive(Clone, Copy, Debug, Default)]
pub struct TerrainMeshBuilder;

impl TerrainMeshBuilder {
    /// Border cells this builder reads around the interior.
    pub const BORDER: usize = 1;
}

struct Surface<'a> {
    heights: &'a HeightGrid,
    settings: &'a MeshSettings,
    top_left: Vec2,
    extent: f32,
}

impl Surface<'_> {
    /// Displaced height at grid cell `(gx, gy)`, clamped to the grid.
    fn height_at(&self, gx: isize, gy: isize) -> f32 {
        let x = gx.clamp(0, self.heights.width() as isize - 1) as usize;
        let y = gy.clamp(0, self.heights.height() as isize - 1) as usize;
        self.settings.height_curve.evaluate(self.heights.get(x, y)) * self.settings.height_multiplier
    }

    /// Position of interior vertex `(px, py)`.
    fn position(&self, px: usize, py: usize) -> Vec3 {
        let b = TerrainMeshBuilder::BORDER as isize;
        let h = self.height_at(px as isize + b, py as isize + b);
        Vec3::new(self.top_left.x + px as f32, h, self.top_left.y - py as f32)
    }

    fn uv(&self, px: usize, py: usize) -> [f32; 2] {
        [px as f32 / self.extent, py as f32 / self.extent]
    }

    /// Central-difference normal; grid `+y` runs toward world `-z`.
    fn smooth_normal(&self, px: usize, py: usize) -> Vec3 {
        let b = TerrainMeshBuilder::BORDER as isize;
        let (gx, gy) = (px as isize + b, py as isize + b);
        let dx = (self.height_at(gx + 1, gy) - self.height_at(gx - 1, gy)) * 0.5;
        let dz = (self.height_at(gx, gy - 1) - self.height_at(gx, gy + 1)) * 0.5;
        Vec3::new(-dx, 1.0, -dz).normalize_or(Vec3::Y)
    }
}

fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let n = (b - a).cross(c - a).normalize_or(Vec3::Y);
    if n.y < 0.0 { -n } else { n }
}

impl MeshBuilder for TerrainMeshBuilder {
    fn border(&self) -> usize {
        Self::BORDER
    }

    fn build(
        &self,
        heights: &HeightGrid,
        settings: &MeshSettings,
        lod: u32,
    ) -> Result<MeshPayload, MeshError> {
        let (w, h) = (heights.width(), heights.height());
        if w < 2 * Self::BORDER + 2 || h < 2 * Self::BORDER + 2 {
            return Err(MeshError::GridTooSmall {
                width: w,
                height: h,
                border: Self::BORDER,
            });
        }
        let size_x = w - 2 * Self::BORDER;
        let size_y = h - 2 * Self::BORDER;
        let increment = lod_increment(lod);
        let xs = sample_positions(size_x, increment);
        let ys = sample_positions(size_y, increment);

        let surface = Surface {
            heights,
            settings,
            top_left: Vec2::new((size_x - 1) as f32 / -2.0, (size_y - 1) as f32 / 2.0),
            extent: (size_x.max(size_y) - 1) as f32,
        };

        let row = xs.len() as u32;
        let mut quads = Vec::with_capacity((xs.len() - 1) * (ys.len() - 1) * 6);
        for j in 0..ys.len() as u32 - 1 {
            for i in 0..row - 1 {
                let a = j * row + i;
                let (b, c, d) = (a + 1, a + row, a + row + 1);
                quads.extend_from_slice(&[a, d, c, d, a, b]);
            }
        }

        if settings.flat_shading {
            let corners: Vec<(usize, usize)> = ys
                .iter()
                .flat_map(|&py| xs.iter().map(move |&px| (px, py)))
                .collect();
            let mut vertices = Vec::with_capacity(quads.len());
            for tri in quads.chunks_exact(3) {
                let p = [tri[0], tri[1], tri[2]].map(|i| {
                    let (px, py) = corners[i as usize];
                    (surface.position(px, py), surface.uv(px, py))
                });
                let normal = face_normal(p[0].0, p[1].0, p[2].0).to_array();
                vertices.extend(p.iter().map(|(pos, uv)| MeshVertex {
                    position: pos.to_array(),
                    normal,
                    uv: *uv,
                }));
            }
            let indices = (0..vertices.len() as u32).collect();
            return Ok(MeshPayload { vertices, indices });
        }

        let mut vertices = Vec::with_capacity(xs.len() * ys.len());
        for &py in &ys {
            for &px in &xs {
                vertices.push(MeshVertex {
                    position: surface.position(px, py).to_array(),
                    normal: surface.smooth_normal(px, py).to_array(),
                    uv: surface.uv(px, py),
                });
            }
        }
        Ok(MeshPayload {
            vertices,
            indices: quads,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{CurveKey, HeightCurve};

    fn flat_grid(size: usize, value: f32) -> HeightGrid {
        HeightGrid::from_values(size, size, vec![value; size * size]).unwrap()
    }

    fn ramp_grid(size: usize) -> HeightGrid {
        let mut grid = HeightGrid::new(size, size);
        for y in 0..size {
            for x in 0..size {
                grid.set(x, y, x as f32 / (size - 1) as f32);
            }
        }
        grid
    }

    #[test]
    fn test_lod_increments() {
        assert_eq!(lod_increment(0), 1);
        assert_eq!(lod_increment(1), 2);
        assert_eq!(lod_increment(3), 6);
    }

    #[test]
    fn test_sample_positions_keep_last_edge() {
        assert_eq!(sample_positions(5, 1), vec![0, 1, 2, 3, 4]);
        assert_eq!(sample_positions(5, 2), vec![0, 2, 4]);
        assert_eq!(sample_positions(6, 4), vec![0, 4, 5]);
        assert!(sample_positions(0, 2).is_empty());
    }

    #[test]
    fn test_full_detail_counts() {
        let mesh = TerrainMeshBuilder
            .build(&flat_grid(11, 0.5), &MeshSettings::default(), 0)
            .unwrap();
        assert_eq!(mesh.vertex_count(), 81);
        assert_eq!(mesh.triangle_count(), 8 * 8 * 2);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
    }

    #[test]
    fn test_lower_detail_has_fewer_vertices() {
        let grid = ramp_grid(241);
        let settings = MeshSettings::default();
        let lod0 = TerrainMeshBuilder.build(&grid, &settings, 0).unwrap();
        let lod1 = TerrainMeshBuilder.build(&grid, &settings, 1).unwrap();
        let lod4 = TerrainMeshBuilder.build(&grid, &settings, 4).unwrap();
        assert!(lod1.vertex_count() < lod0.vertex_count());
        assert!(lod4.vertex_count() < lod1.vertex_count());
    }

    #[test]
    fn test_mesh_is_centered() {
        let mesh = TerrainMeshBuilder
            .build(&flat_grid(11, 0.0), &MeshSettings::default(), 0)
            .unwrap();
        let first = mesh.vertices[0].position;
        let last = mesh.vertices[mesh.vertex_count() - 1].position;
        assert_eq!(first, [-4.0, 0.0, 4.0]);
        assert_eq!(last, [4.0, 0.0, -4.0]);
    }

    #[test]
    fn test_height_curve_and_multiplier_apply() {
        let settings = MeshSettings {
            height_multiplier: 10.0,
            height_curve: HeightCurve::new(vec![
                CurveKey {
                    time: 0.0,
                    value: 0.0,
                },
                CurveKey {
                    time: 1.0,
                    value: 0.5,
                },
            ]),
            flat_shading: false,
        };
        let mesh = TerrainMeshBuilder.build(&flat_grid(6, 1.0), &settings, 0).unwrap();
        assert!(mesh.vertices.iter().all(|v| (v.position[1] - 5.0).abs() < 1e-5));
    }

    #[test]
    fn test_flat_grid_normals_point_up() {
        let mesh = TerrainMeshBuilder
            .build(&flat_grid(8, 0.3), &MeshSettings::default(), 0)
            .unwrap();
        for v in &mesh.vertices {
            assert_eq!(v.normal, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn test_border_shapes_edge_normals() {
        // Same interior, different border column: edge normals must differ.
        let mut a = flat_grid(8, 0.5);
        let b = a.clone();
        for y in 0..8 {
            a.set(0, y, 0.0);
        }
        let settings = MeshSettings::default();
        let ma = TerrainMeshBuilder.build(&a, &settings, 0).unwrap();
        let mb = TerrainMeshBuilder.build(&b, &settings, 0).unwrap();
        assert_eq!(ma.vertices[0].position, mb.vertices[0].position);
        assert_ne!(ma.vertices[0].normal, mb.vertices[0].normal);
    }

    #[test]
    fn test_flat_shading_duplicates_vertices() {
        let settings = MeshSettings {
            flat_shading: true,
            ..Default::default()
        };
        let mesh = TerrainMeshBuilder.build(&ramp_grid(7), &settings, 0).unwrap();
        assert_eq!(mesh.vertex_count(), mesh.indices.len());
        assert_eq!(mesh.triangle_count(), 4 * 4 * 2);
        for tri in mesh.vertices.chunks_exact(3) {
            assert_eq!(tri[0].normal, tri[1].normal);
            assert!(tri[0].normal[1] > 0.0);
        }
    }

    #[test]
    fn test_too_small_grid_is_rejected() {
        let err = TerrainMeshBuilder
            .build(&flat_grid(3, 0.0), &MeshSettings::default(), 0)
            .unwrap_err();
        assert_eq!(
            err,
            MeshError::GridTooSmall {
                width: 3,
                height: 3,
                border: 1
            }
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        let grid = ramp_grid(20);
        let settings = MeshSettings::default();
        assert_eq!(
            TerrainMeshBuilder.build(&grid, &settings, 1).unwrap(),
            TerrainMeshBuilder.build(&grid, &settings, 1).unwrap()
        );
    }

    #[test]
    fn test_vertex_bytes_cover_buffer() {
        let mesh = TerrainMeshBuilder
            .build(&flat_grid(5, 0.0), &MeshSettings::default(), 0)
            .unwrap();
        assert_eq!(mesh.vertex_bytes().len(), mesh.vertex_count() * 32);
    }
}
