//! Command-line entry point: view one color/depth portrait.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use depthcloud::layout::DEFAULT_GRID_SIZE;
use depthcloud::sprite::DEFAULT_SPRITE_SIZE;
use depthcloud::{FrameParams, PresetLibrary, Viewer};

#[derive(Parser, Debug)]
#[command(name = "depthcloud", version, about = "Render a portrait and its depth map as an animated point cloud")]
struct Cli {
    /// Color image (PNG or JPEG)
    color: PathBuf,

    /// Depth image of the same size; brighter is nearer unless reversed
    depth: PathBuf,

    /// Start from parameters saved as JSON
    #[arg(long, value_name = "FILE")]
    params: Option<PathBuf>,

    /// Apply a named preset on top of the starting parameters
    #[arg(long, value_name = "NAME")]
    preset: Option<String>,

    /// Extra presets to load (JSON library)
    #[arg(long, value_name = "FILE")]
    presets: Option<PathBuf>,

    /// Particle grid edge length
    #[arg(long, default_value_t = DEFAULT_GRID_SIZE)]
    grid: u32,

    /// Sprite mask resolution
    #[arg(long, default_value_t = DEFAULT_SPRITE_SIZE)]
    sprite: u32,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let mut params = match &cli.params {
        Some(path) => FrameParams::load(path)
            .with_context(|| format!("failed to load parameters from {}", path.display()))?,
        None => FrameParams::default(),
    };

    let extra = match &cli.presets {
        Some(path) => PresetLibrary::load(path)
            .with_context(|| format!("failed to load presets from {}", path.display()))?,
        None => PresetLibrary::default(),
    };

    if let Some(name) = &cli.preset {
        let mut library = PresetLibrary::builtin();
        library.extend(extra.clone());
        library.apply(name, &mut params)?;
        log::info!("starting with preset '{}'", name);
    }

    Viewer::new()
        .with_map_files(cli.color, cli.depth)
        .with_grid_size(cli.grid)
        .with_sprite_size(cli.sprite)
        .with_params(params)
        .with_presets(extra)
        .run()?;

    Ok(())
}
