//! End-to-end tests of the CPU particle program: layout, source maps,
//! frame snapshot and per-particle evaluation together.

use std::collections::HashSet;

use depthcloud::layout::{self, ParticleAttributes};
use depthcloud::program::{evaluate_frame, shade_fragment, FrameStats};
use depthcloud::{
    ColorEncoding, FrameParams, FrameSnapshot, LayoutError, OrbitCamera, PresetLibrary, SourceMaps, SpriteMask,
    TextureConfig, Vec2,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

// ============================================================================
// Helpers
// ============================================================================

/// Uniform maps: gray 128 color (luminance about 0.5), depth byte as given.
fn flat_maps(size: u32, depth_byte: u8) -> SourceMaps {
    let color = TextureConfig::solid(size, size, [128, 128, 128, 255]).unwrap();
    let depth = TextureConfig::solid(size, size, [depth_byte, depth_byte, depth_byte, 255]).unwrap();
    SourceMaps::new(color, depth).unwrap()
}

fn particles(grid: u32) -> Vec<ParticleAttributes> {
    layout::generate_with_rng(grid, &mut StdRng::seed_from_u64(7)).unwrap()
}

/// Face-only parameters: fully morphed, no turbulence.
fn still_face() -> FrameParams {
    FrameParams {
        morph: 1.0,
        curl_strength: 0.0,
        ..Default::default()
    }
}

fn snapshot(params: FrameParams, elapsed: f32) -> FrameSnapshot {
    let camera = OrbitCamera::new();
    FrameSnapshot::new(
        params,
        elapsed,
        camera.view_matrix(),
        camera.projection(1.0),
        Vec2::new(800.0, 800.0),
    )
}

// ============================================================================
// Grid
// ============================================================================

#[test]
fn test_small_grid_uv_centers() {
    let particles = particles(4);
    assert_eq!(particles.len(), 16);

    let centers: [f32; 4] = [0.125, 0.375, 0.625, 0.875];
    let expected: HashSet<(u32, u32)> = centers
        .iter()
        .flat_map(|&u| centers.iter().map(move |&v| (u.to_bits(), v.to_bits())))
        .collect();
    let actual: HashSet<(u32, u32)> = particles
        .iter()
        .map(|p| (p.uv[0].to_bits(), p.uv[1].to_bits()))
        .collect();
    assert_eq!(actual, expected);
}

#[test]
fn test_grid_randoms_and_sphere_anchors() {
    for p in particles(16) {
        assert!(p.random.iter().all(|r| (0.0..1.0).contains(r)));
        assert!((p.sphere().length() - 1.0).abs() < 1e-4);
    }
}

#[test]
fn test_zero_grid_rejected() {
    assert!(matches!(layout::generate(0), Err(LayoutError::EmptyGrid)));
}

// ============================================================================
// Frame evaluation
// ============================================================================

#[test]
fn test_flat_portrait_all_particles_survive() {
    let particles = particles(4);
    let maps = flat_maps(8, 153);
    let params = still_face();
    let points = evaluate_frame(&particles, &maps, &snapshot(params, 0.0));

    assert_eq!(FrameStats::from_points(&points).visible, 16);
    for (attr, point) in particles.iter().zip(&points) {
        assert!(point.is_visible());
        assert!((point.depth - 0.6).abs() < 1e-6);
        assert!((point.density - 128.0 / 255.0).abs() < 1e-3);

        let uv = attr.uv();
        assert!((point.position.x - (2.0 * uv.x - 1.0)).abs() < 1e-5);
        assert!((point.position.y + (2.0 * uv.y - 1.0)).abs() < 1e-5);
        assert!((point.position.z - 0.6 * params.depth_scale).abs() < 1e-5);
    }
}

#[test]
fn test_depth_cut_discards_everything() {
    let particles = particles(4);
    let maps = flat_maps(8, 153);
    let params = FrameParams {
        depth_cut: 0.9,
        ..still_face()
    };
    let points = evaluate_frame(&particles, &maps, &snapshot(params, 0.0));

    let stats = FrameStats::from_points(&points);
    assert_eq!(stats.visible, 0);
    assert_eq!(stats.culled, 16);
    assert_eq!(stats.visible_ratio(), 0.0);
}

#[test]
fn test_density_cut_discards_dark_pixels() {
    let particles = particles(4);
    let color = TextureConfig::solid(4, 4, [10, 10, 10, 255]).unwrap();
    let depth = TextureConfig::solid(4, 4, [200, 200, 200, 255]).unwrap();
    let maps = SourceMaps::new(color, depth).unwrap();

    let points = evaluate_frame(&particles, &maps, &snapshot(still_face(), 0.0));
    assert!(points.iter().all(|p| !p.is_visible()));
}

#[test]
fn test_depth_reverse_flips_the_cut() {
    let particles = particles(4);
    // 0.784 raw, 0.216 reversed: below the default 0.28 cut
    let maps = flat_maps(4, 200);

    let forward = evaluate_frame(&particles, &maps, &snapshot(still_face(), 0.0));
    assert_eq!(FrameStats::from_points(&forward).visible, 16);

    let reversed = FrameParams {
        depth_reverse: true,
        ..still_face()
    };
    let points = evaluate_frame(&particles, &maps, &snapshot(reversed, 0.0));
    assert_eq!(FrameStats::from_points(&points).visible, 0);
}

#[test]
fn test_morph_zero_places_particles_on_sphere() {
    let particles = particles(4);
    let maps = flat_maps(4, 153);
    let params = FrameParams {
        morph: 0.0,
        ..Default::default()
    };
    let points = evaluate_frame(&particles, &maps, &snapshot(params, 3.0));

    for (attr, point) in particles.iter().zip(&points) {
        assert!(point.is_visible());
        assert!((point.position - attr.sphere()).length() < 1e-5);
    }
}

#[test]
fn test_turbulence_moves_points_over_time() {
    let particles = particles(4);
    let maps = flat_maps(4, 153);
    let params = FrameParams::default();

    let a = evaluate_frame(&particles, &maps, &snapshot(params, 0.0));
    let b = evaluate_frame(&particles, &maps, &snapshot(params, 5.0));

    let moved = a
        .iter()
        .zip(&b)
        .filter(|(p, q)| (p.position - q.position).length() > 1e-4)
        .count();
    assert!(moved > 0);
    for (p, q) in a.iter().zip(&b) {
        // Each offset is a unit curl vector scaled by the strength
        assert!((p.position - q.position).length() <= 2.0 * params.curl_strength + 1e-4);
    }
}

#[test]
fn test_in_focus_points_are_opaque() {
    let particles = particles(4);
    let maps = flat_maps(4, 153);
    let params = FrameParams {
        focus: 0.6,
        ..still_face()
    };
    let points = evaluate_frame(&particles, &maps, &snapshot(params, 0.0));
    for p in &points {
        assert!((p.alpha - 1.0).abs() < 1e-5);
    }

    let blurred = FrameParams {
        focus: 0.0,
        aperture: 1.0,
        ..still_face()
    };
    let points = evaluate_frame(&particles, &maps, &snapshot(blurred, 0.0));
    for p in &points {
        assert!(p.alpha < 0.01);
    }
}

#[test]
fn test_blurred_points_produce_no_fragments() {
    let particles = particles(4);
    let maps = flat_maps(4, 153);
    let sprite = SpriteMask::generate(64);
    let params = FrameParams {
        focus: 0.0,
        aperture: 1.0,
        ..still_face()
    };
    let points = evaluate_frame(&particles, &maps, &snapshot(params, 0.0));
    for p in &points {
        assert_eq!(shade_fragment(p, Vec2::splat(0.5), &sprite, true), None);
    }
}

#[test]
fn test_fragment_center_keeps_color() {
    let particles = particles(4);
    let maps = flat_maps(4, 153);
    let sprite = SpriteMask::generate(64);
    let params = FrameParams {
        focus: 0.6,
        ..still_face()
    };
    let points = evaluate_frame(&particles, &maps, &snapshot(params, 0.0));

    let out = shade_fragment(&points[0], Vec2::splat(0.5), &sprite, false).unwrap();
    assert!((out.x - 128.0 / 255.0).abs() < 1e-3);
    assert!((out.w - 1.0).abs() < 1e-5);
    assert_eq!(shade_fragment(&points[0], Vec2::new(0.0, 0.0), &sprite, false), None);
}

#[test]
fn test_srgb_color_map_is_decoded_before_luminance() {
    let particles = particles(4);
    let color = TextureConfig::solid(4, 4, [128, 128, 128, 255])
        .unwrap()
        .with_encoding(ColorEncoding::Srgb);
    let depth = TextureConfig::solid(4, 4, [153, 153, 153, 255]).unwrap();
    let maps = SourceMaps::new(color, depth).unwrap();

    let points = evaluate_frame(&particles, &maps, &snapshot(still_face(), 0.0));
    // sRGB 128 decodes to about 0.216
    assert!((points[0].density - 0.216).abs() < 0.01);
    assert!(points[0].is_visible());
}

#[test]
fn test_preset_drives_evaluation() {
    let particles = particles(4);
    let maps = flat_maps(4, 153);
    let mut params = still_face();
    PresetLibrary::builtin().apply("Sphere reveal", &mut params).unwrap();
    assert_eq!(params.morph, 0.2);
    assert!(!params.use_sprite);

    let points = evaluate_frame(&particles, &maps, &snapshot(params, 0.0));
    for (attr, point) in particles.iter().zip(&points) {
        assert!(point.is_visible());
        // 80% sphere anchor plus 20% of a turbulent face target
        let uv = attr.uv();
        let face = depthcloud::Vec3::new(2.0 * uv.x - 1.0, 1.0 - 2.0 * uv.y, 0.6 * params.depth_scale);
        let blend = attr.sphere() * 0.8 + face * 0.2;
        assert!((point.position - blend).length() <= 0.2 * params.curl_strength + 1e-4);
    }
}

#[test]
fn test_projected_points_land_on_screen() {
    let particles = particles(8);
    let maps = flat_maps(8, 153);
    let points = evaluate_frame(&particles, &maps, &snapshot(still_face(), 0.0));

    for p in points.iter().filter(|p| p.is_visible()) {
        assert!(p.view_depth > 0.0);
        assert!(p.size > 0.0);
        assert!((0.0..=800.0).contains(&p.screen.x));
        assert!((0.0..=800.0).contains(&p.screen.y));
    }
}
