//! The per-particle program.
//!
//! Each particle is evaluated independently from its immutable attributes,
//! the two source maps and one [`FrameSnapshot`]. The GPU runs this as the
//! vertex/fragment pair in `shaders/particle.wgsl`; the functions here are the
//! same steps on the CPU, used by [`evaluate_frame`], by tests and by the
//! frame statistics the viewer logs.
//!
//! Vertex stage, in order:
//!
//! 1. `density` - perceptual luminance of the sampled color
//! 2. `depth` - raw depth, optionally reversed
//! 3. cull when `depth < depthCut` or `density < densityCut`
//! 4. face position on the `[-1, 1]` plane, z extruded by `depthScale`
//! 5. noise sample point from `(uv, depth)`, the random phase and time
//! 6. curl turbulence scaled by `curlStrength`
//! 7. linear morph between the sphere anchor and the turbulent face
//! 8. view transform, `viewDepth = -z`
//! 9. focus delta in normalized source depth
//! 10. perspective point size grown by defocus
//! 11. exponential depth-of-field alpha
//!
//! The fragment stage ([`shade_fragment`]) clips the footprint to a circle,
//! multiplies in the sprite mask and drops near-invisible pixels.

use glam::{Vec2, Vec3, Vec4};
use rayon::prelude::*;

use crate::layout::ParticleAttributes;
use crate::noise::{self, CURL_EPSILON, NOISE_WGSL};
use crate::params::FrameParams;
use crate::sprite::SpriteMask;
use crate::textures::SourceMaps;
use crate::uniforms::FrameSnapshot;

/// Rec. 601 luma weights.
pub const LUMINANCE_WEIGHTS: Vec3 = Vec3::new(0.299, 0.587, 0.114);
/// Scale applied to the random phase before it offsets the noise lookup.
pub const NOISE_PHASE_SCALE: f32 = 2.5;
/// Lower bound on view depth when sizing points.
pub const MIN_VIEW_DEPTH: f32 = 1e-4;
/// Squared footprint radius; fragments beyond it are clipped.
pub const FOOTPRINT_RADIUS_SQ: f32 = 0.25;
/// Fragments with a final alpha below this are dropped instead of blended.
pub const MIN_FRAGMENT_ALPHA: f32 = 0.01;

const PARTICLE_WGSL: &str = include_str!("shaders/particle.wgsl");

/// Full WGSL module for the particle pipeline (noise field + program).
pub fn shader_source() -> String {
    format!("{NOISE_WGSL}\n{PARTICLE_WGSL}")
}

#[inline]
pub fn luminance(color: Vec3) -> f32 {
    color.dot(LUMINANCE_WEIGHTS)
}

/// Apply the near/far convention to a raw depth sample.
#[inline]
pub fn resolve_depth(raw: f32, reverse: bool) -> f32 {
    if reverse {
        1.0 - raw
    } else {
        raw
    }
}

/// Threshold cull on resolved depth and luminance.
#[inline]
pub fn is_culled(depth: f32, density: f32, params: &FrameParams) -> bool {
    depth < params.depth_cut || density < params.density_cut
}

/// Map `uv` to the centered face plane (y up) with depth extruded along z.
#[inline]
pub fn face_position(uv: Vec2, depth: f32, depth_scale: f32) -> Vec3 {
    Vec3::new(uv.x * 2.0 - 1.0, -(uv.y * 2.0 - 1.0), depth * depth_scale)
}

/// Where a particle samples the curl field this frame.
#[inline]
pub fn noise_sample_point(uv: Vec2, depth: f32, random: Vec4, elapsed: f32, params: &FrameParams) -> Vec3 {
    uv.extend(depth) * params.curl_frequency
        + random.truncate() * NOISE_PHASE_SCALE
        + Vec3::splat(elapsed * params.curl_speed)
}

#[inline]
pub fn turbulence(sample_point: Vec3, strength: f32) -> Vec3 {
    noise::curl3(sample_point, CURL_EPSILON) * strength
}

/// Per-component linear blend: `morph = 0` gives `sphere`, `morph = 1`
/// gives `face`. Values outside [0, 1] extrapolate.
#[inline]
pub fn morph_position(sphere: Vec3, face: Vec3, morph: f32) -> Vec3 {
    sphere * (1.0 - morph) + face * morph
}

#[inline]
pub fn focus_delta(depth: f32, focus: f32) -> f32 {
    (depth - focus).abs()
}

/// Footprint edge length in pixels.
#[inline]
pub fn point_size(point_scale: f32, focus_delta: f32, aperture: f32, view_depth: f32) -> f32 {
    let boost = 1.0 + focus_delta * (1.5 + aperture * 6.0);
    point_scale * boost / view_depth.max(MIN_VIEW_DEPTH)
}

/// Depth-of-field fade: 1 at the focus plane, decaying with distance from it.
#[inline]
pub fn dof_alpha(focus_delta: f32, aperture: f32) -> f32 {
    (-focus_delta * (2.0 + aperture * 8.0)).exp()
}

/// Vertex-stage result for one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointPrimitive {
    /// World-space position after morphing.
    pub position: Vec3,
    pub clip: Vec4,
    /// Pixel coordinates, origin top-left.
    pub screen: Vec2,
    pub view_depth: f32,
    pub size: f32,
    pub color: Vec3,
    pub alpha: f32,
    pub depth: f32,
    pub density: f32,
    /// Contributes nothing this frame.
    pub discarded: bool,
}

impl PointPrimitive {
    fn culled(depth: f32, density: f32, color: Vec3) -> Self {
        Self {
            position: Vec3::ZERO,
            clip: Vec4::new(2.0, 2.0, 2.0, 1.0),
            screen: Vec2::ZERO,
            view_depth: 0.0,
            size: 0.0,
            color,
            alpha: 0.0,
            depth,
            density,
            discarded: true,
        }
    }

    pub fn is_visible(&self) -> bool {
        !self.discarded
    }
}

/// Run the vertex stage for one particle.
///
/// Non-finite samples are culled rather than propagated. A point behind the
/// camera is also marked discarded since nothing of it reaches the screen.
pub fn shade_vertex(attr: &ParticleAttributes, color: Vec3, raw_depth: f32, frame: &FrameSnapshot) -> PointPrimitive {
    let params = &frame.params;
    let uv = attr.uv();

    let density = luminance(color);
    let depth = resolve_depth(raw_depth, params.depth_reverse);
    if !density.is_finite() || !depth.is_finite() || is_culled(depth, density, params) {
        return PointPrimitive::culled(depth, density, color);
    }

    let face = face_position(uv, depth, params.depth_scale);
    let sample = noise_sample_point(uv, depth, attr.random(), frame.elapsed, params);
    let target = face + turbulence(sample, params.curl_strength);
    let position = morph_position(attr.sphere(), target, params.morph);

    let view_pos = frame.view * position.extend(1.0);
    let view_depth = -view_pos.z;
    let delta = focus_delta(depth, params.focus);
    let size = point_size(params.point_scale, delta, params.aperture, view_depth);
    let alpha = dof_alpha(delta, params.aperture);

    let clip = frame.proj * view_pos;
    let (screen, behind) = if clip.w > 0.0 {
        let ndc = clip.truncate() / clip.w;
        let screen = Vec2::new((ndc.x * 0.5 + 0.5) * frame.viewport.x, (0.5 - ndc.y * 0.5) * frame.viewport.y);
        (screen, false)
    } else {
        (Vec2::ZERO, true)
    };

    PointPrimitive {
        position,
        clip,
        screen,
        view_depth,
        size,
        color,
        alpha,
        depth,
        density,
        discarded: behind || !position.is_finite(),
    }
}

/// Run the fragment stage at footprint coordinate `coord` in [0, 1]².
///
/// Returns the straight-alpha output color, or `None` when the fragment is
/// discarded.
pub fn shade_fragment(point: &PointPrimitive, coord: Vec2, sprite: &SpriteMask, use_sprite: bool) -> Option<Vec4> {
    if point.discarded {
        return None;
    }
    let c = coord - Vec2::splat(0.5);
    if c.length_squared() > FOOTPRINT_RADIUS_SQ {
        return None;
    }
    let sprite_alpha = if use_sprite { sprite.sample(coord) } else { 1.0 };
    let alpha = point.alpha * sprite_alpha;
    if alpha < MIN_FRAGMENT_ALPHA {
        return None;
    }
    Some(point.color.extend(alpha))
}

/// Evaluate the vertex stage for every particle in parallel.
///
/// All particles read the same snapshot. Output order matches `particles`.
pub fn evaluate_frame(particles: &[ParticleAttributes], maps: &SourceMaps, frame: &FrameSnapshot) -> Vec<PointPrimitive> {
    particles
        .par_iter()
        .map(|attr| {
            let uv = attr.uv();
            shade_vertex(attr, maps.sample_color(uv), maps.sample_depth(uv), frame)
        })
        .collect()
}

/// Visible/culled counts for one evaluated frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub total: usize,
    pub visible: usize,
    pub culled: usize,
}

impl FrameStats {
    pub fn from_points(points: &[PointPrimitive]) -> Self {
        let visible = points.par_iter().filter(|p| p.is_visible()).count();
        Self {
            total: points.len(),
            visible,
            culled: points.len() - visible,
        }
    }

    /// Fraction of particles drawn, 0 for an empty frame.
    pub fn visible_ratio(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.visible as f32 / self.total as f32
        }
    }
}

impl std::fmt::Display for FrameStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} visible ({} culled)", self.visible, self.total, self.culled)
    }
}
