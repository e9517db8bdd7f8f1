//! Per-frame uniform block shared by both shader stages.
//!
//! The host publishes one [`FrameSnapshot`] per frame and converts it into a
//! [`FrameUniforms`] before recording the draw. Every particle in the frame
//! reads the same block, so no particle can see a half-updated parameter set.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2};

use crate::params::FrameParams;

/// Immutable view of everything the particle program reads in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSnapshot {
    pub params: FrameParams,
    /// Seconds since the session started. Never decreases.
    pub elapsed: f32,
    pub view: Mat4,
    pub proj: Mat4,
    /// Render target size in physical pixels.
    pub viewport: Vec2,
}

impl FrameSnapshot {
    pub fn new(params: FrameParams, elapsed: f32, view: Mat4, proj: Mat4, viewport: Vec2) -> Self {
        Self {
            params,
            elapsed,
            view,
            proj,
            viewport,
        }
    }

    pub fn uniforms(&self) -> FrameUniforms {
        FrameUniforms::new(&self.params, self.elapsed, self.view, self.proj, self.viewport)
    }
}

/// GPU layout of the frame uniforms (matches `struct Uniforms` in
/// `particle.wgsl`).
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub viewport: [f32; 2],
    pub time: f32,
    pub depth_scale: f32,
    pub focus: f32,
    pub aperture: f32,
    pub point_scale: f32,
    pub depth_cut: f32,
    pub density_cut: f32,
    pub curl_strength: f32,
    pub curl_frequency: f32,
    pub curl_speed: f32,
    pub morph: f32,
    // bools travel as 0.0 / 1.0
    pub depth_reverse: f32,
    pub use_sprite: f32,
    pub _pad: f32,
}

impl FrameUniforms {
    pub fn new(params: &FrameParams, elapsed: f32, view: Mat4, proj: Mat4, viewport: Vec2) -> Self {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        Self {
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            viewport: viewport.to_array(),
            time: elapsed,
            depth_scale: params.depth_scale,
            focus: params.focus,
            aperture: params.aperture,
            point_scale: params.point_scale,
            depth_cut: params.depth_cut,
            density_cut: params.density_cut,
            curl_strength: params.curl_strength,
            curl_frequency: params.curl_frequency,
            curl_speed: params.curl_speed,
            morph: params.morph,
            depth_reverse: flag(params.depth_reverse),
            use_sprite: flag(params.use_sprite),
            _pad: 0.0,
        }
    }
}
