//! # Synthetic Portrait
//!
//! Builds a color map and a depth map in memory (no image files needed) and
//! opens the viewer on them.
//!
//! ## What This Demonstrates
//!
//! - `TextureConfig::from_rgba` - procedural source maps
//! - `SourceMaps::new` - pairing color and depth of the same size
//! - `Viewer::with_maps` - skipping the file loader
//! - Starting from a built-in preset
//!
//! The "face" is an ellipsoid bump lit from the upper left over a dark
//! background. The background sits at depth zero, so the default depth cut
//! removes it and only the head floats in the cloud.
//!
//! Run with: `cargo run --example synthetic_portrait --release`

use depthcloud::prelude::*;

const SIZE: u32 = 256;

fn synthetic_maps(size: u32) -> Result<SourceMaps, TextureError> {
    let mut color = Vec::with_capacity((size * size * 4) as usize);
    let mut depth = Vec::with_capacity((size * size * 4) as usize);
    let light = Vec3::new(-0.4, 0.5, 0.75).normalize();

    for y in 0..size {
        for x in 0..size {
            // Centered coordinates, y up, with the head slightly taller than wide
            let px = (x as f32 + 0.5) / size as f32 * 2.0 - 1.0;
            let py = 1.0 - (y as f32 + 0.5) / size as f32 * 2.0;
            let ex = px / 0.62;
            let ey = (py - 0.05) / 0.8;
            let r2 = ex * ex + ey * ey;

            if r2 < 1.0 {
                let h = (1.0 - r2).sqrt();
                let normal = Vec3::new(ex, ey, h).normalize();
                let shade = normal.dot(light).max(0.0) * 0.8 + 0.2;
                let skin = Vec3::new(0.93, 0.72, 0.6) * shade;
                color.extend_from_slice(&[
                    (skin.x * 255.0) as u8,
                    (skin.y * 255.0) as u8,
                    (skin.z * 255.0) as u8,
                    255,
                ]);
                let d = (0.35 + 0.65 * h).min(1.0);
                let b = (d * 255.0) as u8;
                depth.extend_from_slice(&[b, b, b, 255]);
            } else {
                let glow = (0.12 - 0.04 * py).max(0.0);
                let g = (glow * 255.0) as u8;
                color.extend_from_slice(&[g / 2, g / 2, g, 255]);
                depth.extend_from_slice(&[0, 0, 0, 255]);
            }
        }
    }

    let color = TextureConfig::from_rgba(color, size, size)?.with_encoding(ColorEncoding::Srgb);
    let depth = TextureConfig::from_rgba(depth, size, size)?;
    SourceMaps::new(color, depth)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let maps = synthetic_maps(SIZE)?;

    let mut params = FrameParams::default();
    PresetLibrary::builtin().apply("Sphere reveal", &mut params)?;

    Viewer::new()
        .with_maps(maps)
        .with_grid_size(200)
        .with_params(params)
        .with_title("depthcloud - synthetic portrait")
        .run()?;
    Ok(())
}
