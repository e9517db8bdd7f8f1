//! Particle grid generation.
//!
//! Every particle is created once per session from a square grid of edge
//! length `S`. It carries three immutable attributes:
//!
//! - `uv` - the center of its grid cell, which picks the color/depth texel
//! - `random` - four independent uniform draws in [0, 1) used to offset
//!   its animation phase
//! - `sphere` - a point on the unit sphere (the alternate layout)
//!
//! Sphere anchors follow a Fibonacci (golden angle) spiral so the points are
//! evenly spread for any particle count, with no clustering at the poles.
//!
//! ```ignore
//! use depthcloud::layout;
//!
//! let particles = layout::generate(280)?;
//! assert_eq!(particles.len(), 78_400);
//! ```

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4};
use rand::Rng;

use crate::error::LayoutError;

/// Default grid edge length (78,400 particles).
pub const DEFAULT_GRID_SIZE: u32 = 280;

/// Largest particle buffer the viewer will build, in bytes. Matches wgpu's
/// default `max_buffer_size` (256 MiB), which is what the device is
/// created with.
pub const MAX_PARTICLE_BUFFER_BYTES: u64 = 256 << 20;

/// Immutable per-particle vertex attributes.
///
/// Laid out for direct upload as an instance-rate vertex buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleAttributes {
    /// Cell-center texture coordinate in (0, 1).
    pub uv: [f32; 2],
    /// Four independent uniform randoms in [0, 1).
    pub random: [f32; 4],
    /// Position on the unit sphere.
    pub sphere: [f32; 3],
}

impl ParticleAttributes {
    /// Vertex attributes as seen by `vs_main` (locations 0, 1, 2).
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4, 2 => Float32x3];

    /// Instance-rate buffer layout for the particle pipeline.
    pub fn buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }

    #[inline]
    pub fn uv(&self) -> Vec2 {
        Vec2::from_array(self.uv)
    }

    #[inline]
    pub fn random(&self) -> Vec4 {
        Vec4::from_array(self.random)
    }

    #[inline]
    pub fn sphere(&self) -> Vec3 {
        Vec3::from_array(self.sphere)
    }
}

/// Number of particles produced for a grid of edge length `grid_size`.
///
/// Rejects grids whose particle buffer would exceed
/// [`MAX_PARTICLE_BUFFER_BYTES`], before anything is allocated.
pub fn particle_count(grid_size: u32) -> Result<u32, LayoutError> {
    if grid_size == 0 {
        return Err(LayoutError::EmptyGrid);
    }
    let count = grid_size as u64 * grid_size as u64;
    let count = u32::try_from(count).map_err(|_| LayoutError::TooManyParticles(grid_size))?;

    let bytes = count as u64 * std::mem::size_of::<ParticleAttributes>() as u64;
    if bytes > MAX_PARTICLE_BUFFER_BYTES {
        return Err(LayoutError::BufferTooLarge {
            grid_size,
            bytes,
            max: MAX_PARTICLE_BUFFER_BYTES,
        });
    }
    Ok(count)
}

/// Point `index` of a `count`-point Fibonacci spiral on the unit sphere.
///
/// `y` runs from +1 (index 0) to -1 (index `count - 1`). A single point sits
/// at the +Y pole.
pub fn fibonacci_sphere_point(index: u32, count: u32) -> Vec3 {
    if count <= 1 {
        return Vec3::Y;
    }
    // f64 keeps z and the azimuth accurate for large counts.
    let golden = (5.0_f64.sqrt() - 1.0) / 2.0;
    let i = index as f64;
    let z = 1.0 - 2.0 * i / (count as f64 - 1.0);
    let radius = (1.0 - z * z).max(0.0).sqrt();
    let phi = std::f64::consts::TAU * i * golden;
    Vec3::new(
        (radius * phi.cos()) as f32,
        z as f32,
        (radius * phi.sin()) as f32,
    )
}

/// Build the particle grid using the thread-local RNG.
pub fn generate(grid_size: u32) -> Result<Vec<ParticleAttributes>, LayoutError> {
    generate_with_rng(grid_size, &mut rand::thread_rng())
}

/// Build the particle grid drawing per-particle randoms from `rng`.
///
/// Particles are emitted row-major: index `y * S + x`.
pub fn generate_with_rng<R: Rng + ?Sized>(
    grid_size: u32,
    rng: &mut R,
) -> Result<Vec<ParticleAttributes>, LayoutError> {
    let total = particle_count(grid_size)?;
    let edge = grid_size as f32;

    let mut particles = Vec::with_capacity(total as usize);
    for y in 0..grid_size {
        for x in 0..grid_size {
            let index = y * grid_size + x;
            let uv = [(x as f32 + 0.5) / edge, (y as f32 + 0.5) / edge];
            let random = [rng.gen::<f32>(), rng.gen::<f32>(), rng.gen::<f32>(), rng.gen::<f32>()];
            let sphere = fibonacci_sphere_point(index, total).to_array();
            particles.push(ParticleAttributes { uv, random, sphere });
        }
    }

    log::debug!("generated {} particles ({}x{} grid)", total, grid_size, grid_size);
    Ok(particles)
}
