//! Headless terrain demo: streams chunks around a moving viewer and writes an
//! editor preview of the origin chunk.

mod error;
mod preview;
mod walk;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use terra_config::{CliArgs, Config, default_config_dir};
use terra_terrain::DrawMode;
use tracing::{error, info};

use crate::error::DemoError;
use crate::preview::{parse_draw_mode, render_preview, write_png};
use crate::walk::{WalkPlan, run_walk};

#[derive(Parser, Debug)]
#[command(name = "terra-demo", about = "Procedural terrain streaming demo")]
struct DemoArgs {
    #[command(flatten)]
    common: CliArgs,

    /// Ticks to simulate.
    #[arg(long, default_value_t = 240)]
    ticks: u32,

    /// Viewer speed in world units per tick.
    #[arg(long, default_value_t = 12.0)]
    speed: f32,

    /// Preview draw mode (noise, color, mesh).
    #[arg(long, value_parser = parse_draw_mode, default_value = "color")]
    draw_mode: DrawMode,

    /// Write the preview PNG here.
    #[arg(long)]
    preview: Option<PathBuf>,
}

fn run(args: DemoArgs) -> Result<(), DemoError> {
    let config_dir = match args.common.config.clone() {
        Some(dir) => dir,
        None => default_config_dir().ok_or(DemoError::NoConfigDir)?,
    };

    let mut config = Config::load_or_create(&config_dir)?;
    config.apply_cli_overrides(&args.common);

    let log_dir = config_dir.join("logs");
    terra_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));
    config.validate()?;

    if let Some(path) = &args.preview {
        let preview = render_preview(&config, args.draw_mode)?;
        write_png(&preview.image, path)?;
    }

    let plan = WalkPlan {
        ticks: args.ticks,
        speed: args.speed,
        ..WalkPlan::default()
    };
    let report = run_walk(&config, &plan)?;
    info!(
        resident = report.stats.resident,
        visible = report.stats.visible,
        meshes_cached = report.stats.meshes_cached,
        meshes_applied = report.meshes_applied,
        visibility_changes = report.visibility_changes,
        recomputes = report.stats.recomputes,
        evicted = report.stats.evicted,
        "Walk finished"
    );
    Ok(())
}

fn main() -> ExitCode {
    match run(DemoArgs::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("terra-demo: {e}");
            ExitCode::FAILURE
        }
    }
}
