//! Command-line overrides for the terrain configuration.

use std::path::PathBuf;

use clap::Parser;
use terra_terrain::NormalizeMode;

use crate::Config;

/// Parse a normalization mode name, case-insensitively.
pub fn parse_normalize_mode(value: &str) -> Result<NormalizeMode, String> {
    match value.to_ascii_lowercase().as_str() {
        "local" => Ok(NormalizeMode::Local),
        "global" => Ok(NormalizeMode::Global),
        other => Err(format!("unknown normalize mode `{other}` (expected local or global)")),
    }
}

/// Terrain command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "terra", about = "Procedural infinite terrain")]
pub struct CliArgs {
    /// World seed.
    #[arg(long)]
    pub seed: Option<i32>,

    /// Noise scale.
    #[arg(long)]
    pub scale: Option<f32>,

    /// Noise octave count.
    #[arg(long, allow_negative_numbers = true)]
    pub octaves: Option<i32>,

    /// Height normalization (local, global).
    #[arg(long, value_parser = parse_normalize_mode)]
    pub normalize: Option<NormalizeMode>,

    /// Flat-shaded meshes with the smaller chunk size.
    #[arg(long)]
    pub flat_shading: Option<bool>,

    /// Workers per generation pool (0 = auto).
    #[arg(long)]
    pub worker_threads: Option<usize>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.noise.seed = seed;
        }
        if let Some(scale) = args.scale {
            self.noise.scale = scale;
        }
        if let Some(octaves) = args.octaves {
            self.noise.octaves = octaves;
        }
        if let Some(mode) = args.normalize {
            self.noise.normalize_mode = mode;
        }
        if let Some(flat) = args.flat_shading {
            self.mesh.flat_shading = flat;
        }
        if let Some(threads) = args.worker_threads {
            self.streaming.worker_threads = threads;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            seed: Some(42),
            normalize: Some(NormalizeMode::Global),
            flat_shading: Some(true),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.noise.seed, 42);
        assert_eq!(config.noise.normalize_mode, NormalizeMode::Global);
        assert!(config.mesh.flat_shading);
        // Non-overridden fields retain defaults
        assert_eq!(config.noise.scale, 50.0);
        assert_eq!(config.debug.log_level, "info");
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_parse_from_args() {
        let args = CliArgs::try_parse_from([
            "terra",
            "--seed",
            "7",
            "--octaves",
            "-2",
            "--normalize",
            "Global",
        ])
        .unwrap();
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.octaves, Some(-2));
        assert_eq!(args.normalize, Some(NormalizeMode::Global));
    }

    #[test]
    fn test_unknown_normalize_mode_is_rejected() {
        assert!(CliArgs::try_parse_from(["terra", "--normalize", "planetary"]).is_err());
        assert!(parse_normalize_mode("LOCAL").is_ok());
    }
}
