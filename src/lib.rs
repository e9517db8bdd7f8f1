//! # depthcloud - depth-map portrait point clouds
//!
//! Renders a color photograph and its aligned depth map as an animated 3D
//! point cloud: one GPU particle per grid cell, pushed out along the view axis
//! by its depth, swirled by curl noise, faded by a depth-of-field
//! approximation and morphable into a sphere.
//!
//! ## Quick Start
//!
//! ```ignore
//! use depthcloud::prelude::*;
//!
//! fn main() -> Result<(), ViewerError> {
//!     Viewer::new()
//!         .with_map_files("portrait.png", "portrait_depth.png")
//!         .with_params(FrameParams {
//!             aperture: 0.3,
//!             ..Default::default()
//!         })
//!         .run()
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Particles
//!
//! [`layout::generate`] builds `S²` immutable particles once per session.
//! Each carries a cell-center `uv`, four random phase values and an anchor
//! on the unit sphere. Nothing about a particle changes afterwards; every
//! frame recomputes its position, size, color and alpha from scratch.
//!
//! ### Frame parameters
//!
//! [`FrameParams`] holds the tunable thresholds, scales, animation rates and
//! toggles. The host copies it into a [`FrameSnapshot`] once per frame, so
//! every particle in a frame sees the same values. [`PresetLibrary`] applies
//! named partial overlays.
//!
//! ### The particle program
//!
//! The WGSL program in `shaders/particle.wgsl` runs per particle on the GPU.
//! [`program`] mirrors it step by step on the CPU (in parallel with rayon)
//! for tests and frame statistics:
//!
//! | Stage | Effect |
//! |-------|--------|
//! | Cull | drop particles below `depthCut` or `densityCut` |
//! | Face | map `uv` to `[-1, 1]²`, extrude by `depth · depthScale` |
//! | Turbulence | add `curl3(...) · curlStrength` |
//! | Morph | blend sphere anchor → face by `morph` |
//! | Depth of field | size grows and alpha fades away from `focus` |
//! | Footprint | circular clip, optional soft sprite, drop alpha < 0.01 |

pub mod error;
pub mod gpu;
pub mod input;
pub mod layout;
pub mod noise;
pub mod params;
pub mod presets;
pub mod program;
pub mod sprite;
pub mod textures;
pub mod time;
pub mod uniforms;
pub mod viewer;

pub use bytemuck;
pub use error::{GpuError, LayoutError, ParamsError, TextureError, ViewerError};
pub use glam::{Mat4, Vec2, Vec3, Vec4};
pub use gpu::camera::OrbitCamera;
pub use layout::ParticleAttributes;
pub use params::{BlendMode, FrameParams, ParamKey, ParamSpec, ParamValue, RenderState, PARAM_SPECS};
pub use presets::{Preset, PresetLibrary, PresetOverlay};
pub use program::{evaluate_frame, FrameStats, PointPrimitive};
pub use sprite::SpriteMask;
pub use textures::{ColorEncoding, FilterMode, SourceMaps, TextureConfig};
pub use uniforms::{FrameSnapshot, FrameUniforms};
pub use viewer::Viewer;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use depthcloud::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{GpuError, LayoutError, ParamsError, TextureError, ViewerError};
    pub use crate::gpu::camera::OrbitCamera;
    pub use crate::input::{Input, KeyCode, MouseButton};
    pub use crate::layout::ParticleAttributes;
    pub use crate::params::{BlendMode, FrameParams, ParamKey, ParamValue, RenderState};
    pub use crate::presets::{Preset, PresetLibrary, PresetOverlay};
    pub use crate::program::{evaluate_frame, FrameStats, PointPrimitive};
    pub use crate::sprite::SpriteMask;
    pub use crate::textures::{ColorEncoding, FilterMode, SourceMaps, TextureConfig};
    pub use crate::time::Clock;
    pub use crate::uniforms::FrameSnapshot;
    pub use crate::viewer::Viewer;
    pub use crate::{Mat4, Vec2, Vec3, Vec4};
    #[cfg(feature = "egui")]
    pub use egui;
}
