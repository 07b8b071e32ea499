/// Errors surfaced by the demo binary.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    /// No `--config` given and the OS exposes no config directory.
    #[error("could not resolve a config directory; pass --config")]
    NoConfigDir,
    /// Loading or validating configuration failed.
    #[error(transparent)]
    Config(#[from] terra_config::ConfigError),
    /// Terrain data could not be generated.
    #[error(transparent)]
    Terrain(#[from] terra_terrain::TerrainError),
    /// Mesh construction failed.
    #[error(transparent)]
    Mesh(#[from] terra_mesh::MeshError),
    /// Streaming setup or job submission failed.
    #[error(transparent)]
    Streaming(#[from] terra_streaming::StreamingError),
    /// PNG encoding failed.
    #[error("failed to encode preview: {0}")]
    Png(#[from] png::EncodingError),
    /// Writing the preview failed.
    #[error("failed to write preview: {0}")]
    Io(#[from] std::io::Error),
}
