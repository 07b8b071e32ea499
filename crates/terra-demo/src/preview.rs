//! Editor preview: one chunk at the origin drawn as a height map, a color
//! map, or a textured mesh, written out as PNG.

use std::io::Write;
use std::path::Path;

use glam::Vec2;
use terra_config::Config;
use terra_mesh::{MeshBuilder, MeshPayload, TerrainMeshBuilder};
use terra_terrain::{
    DrawMode, NoiseField, PreviewImage, texture_from_color_grid, texture_from_height_grid,
};
use tracing::info;

use crate::error::DemoError;

/// What the preview produced.
pub struct Preview {
    /// Image to write.
    pub image: PreviewImage,
    /// Mesh built in [`DrawMode::Mesh`].
    pub mesh: Option<MeshPayload>,
}

/// Parse a draw mode name, case-insensitively.
pub fn parse_draw_mode(value: &str) -> Result<DrawMode, String> {
    match value.to_ascii_lowercase().as_str() {
        "noise" | "noisemap" => Ok(DrawMode::NoiseMap),
        "color" | "colormap" => Ok(DrawMode::ColorMap),
        "mesh" => Ok(DrawMode::Mesh),
        other => Err(format!("unknown draw mode `{other}` (expected noise, color or mesh)")),
    }
}

/// Generate the origin chunk and draw it in `mode`.
pub fn render_preview(config: &Config, mode: DrawMode) -> Result<Preview, DemoError> {
    let settings = config.map_gen_settings()?;
    let data = settings.generate(&NoiseField::new(), Vec2::ZERO)?;
    let size = settings.chunk_vertices;

    let preview = match mode {
        DrawMode::NoiseMap => Preview {
            image: texture_from_height_grid(data.heights()),
            mesh: None,
        },
        DrawMode::ColorMap => Preview {
            image: texture_from_color_grid(data.colors(), size, size),
            mesh: None,
        },
        DrawMode::Mesh => {
            let lod = config.mesh.editor_lod();
            let mesh = TerrainMeshBuilder.build(data.heights(), &config.mesh.settings(), lod)?;
            info!(
                lod,
                vertices = mesh.vertex_count(),
                triangles = mesh.triangle_count(),
                "Built preview mesh"
            );
            Preview {
                image: texture_from_color_grid(data.colors(), size, size),
                mesh: Some(mesh),
            }
        }
    };
    Ok(preview)
}

/// Encode `image` as an 8-bit RGBA PNG.
pub fn encode_png<W: Write>(image: &PreviewImage, out: W) -> Result<(), DemoError> {
    let mut encoder = png::Encoder::new(out, image.width, image.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&image.pixels)?;
    Ok(())
}

/// Write `image` to `path` as PNG.
pub fn write_png(image: &PreviewImage, path: &Path) -> Result<(), DemoError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::io::BufWriter::new(std::fs::File::create(path)?);
    encode_png(image, file)?;
    info!("Wrote preview to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> Config {
        let mut config = Config::default();
        config.mesh.flat_shading = true;
        config
    }

    #[test]
    fn test_parse_draw_mode() {
        assert_eq!(parse_draw_mode("Noise").unwrap(), DrawMode::NoiseMap);
        assert_eq!(parse_draw_mode("colormap").unwrap(), DrawMode::ColorMap);
        assert_eq!(parse_draw_mode("MESH").unwrap(), DrawMode::Mesh);
        assert!(parse_draw_mode("wire").is_err());
    }

    #[test]
    fn test_noise_preview_includes_border() {
        let preview = render_preview(&small_config(), DrawMode::NoiseMap).unwrap();
        assert_eq!((preview.image.width, preview.image.height), (97, 97));
        assert!(preview.mesh.is_none());
    }

    #[test]
    fn test_color_preview_covers_chunk() {
        let preview = render_preview(&small_config(), DrawMode::ColorMap).unwrap();
        assert_eq!((preview.image.width, preview.image.height), (95, 95));
    }

    #[test]
    fn test_mesh_preview_builds_mesh() {
        let preview = render_preview(&small_config(), DrawMode::Mesh).unwrap();
        let mesh = preview.mesh.unwrap();
        assert!(mesh.triangle_count() > 0);
    }

    #[test]
    fn test_png_has_signature() {
        let preview = render_preview(&small_config(), DrawMode::ColorMap).unwrap();
        let mut bytes = Vec::new();
        encode_png(&preview.image, &mut bytes).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_write_png_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("preview.png");
        let preview = render_preview(&small_config(), DrawMode::NoiseMap).unwrap();
        write_png(&preview.image, &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 8);
    }
}
