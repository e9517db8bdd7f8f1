//! Procedural soft-circle sprite mask.
//!
//! The mask is an optional particle footprint: a radial Gaussian-like falloff
//! `exp(-8 d²)` inside a circle of radius 0.5, zero outside. It is generated
//! once and uploaded as a single-channel texture, so channel 0 carries the
//! alpha the fragment stage multiplies in.

use glam::Vec2;

/// Default mask edge length in pixels.
pub const DEFAULT_SPRITE_SIZE: u32 = 64;

/// Largest mask edge length. Within the 2D texture limit of every wgpu
/// device, including downlevel ones.
pub const MAX_SPRITE_SIZE: u32 = 2048;

/// Square single-channel alpha mask.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteMask {
    size: u32,
    alpha: Vec<f32>,
}

/// Mask falloff for a normalized distance `d` from the center.
#[inline]
pub fn falloff(d: f32) -> f32 {
    if d < 0.5 {
        (-8.0 * d * d).exp()
    } else {
        0.0
    }
}

impl SpriteMask {
    /// Generate a `size x size` mask. Offsets are measured from pixel centers.
    ///
    /// A zero size yields a 1x1 mask; sizes above [`MAX_SPRITE_SIZE`] are
    /// clamped to it.
    pub fn generate(size: u32) -> Self {
        if size > MAX_SPRITE_SIZE {
            log::warn!("sprite size {} clamped to {}", size, MAX_SPRITE_SIZE);
        }
        let size = size.clamp(1, MAX_SPRITE_SIZE);
        let inv = 1.0 / size as f32;
        let mut alpha = Vec::with_capacity(size as usize * size as usize);
        for y in 0..size {
            for x in 0..size {
                let dx = (x as f32 + 0.5) * inv - 0.5;
                let dy = (y as f32 + 0.5) * inv - 0.5;
                alpha.push(falloff((dx * dx + dy * dy).sqrt()));
            }
        }
        Self { size, alpha }
    }

    /// Edge length in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Alpha of pixel `(x, y)`.
    pub fn texel(&self, x: u32, y: u32) -> f32 {
        self.alpha[y as usize * self.size as usize + x as usize]
    }

    /// Nearest-texel lookup at footprint coordinate `coord` in [0, 1]²,
    /// clamped at the edges.
    pub fn sample(&self, coord: Vec2) -> f32 {
        let max = (self.size - 1) as f32;
        let x = (coord.x * self.size as f32).floor().clamp(0.0, max) as u32;
        let y = (coord.y * self.size as f32).floor().clamp(0.0, max) as u32;
        self.texel(x, y)
    }

    /// Mask quantized to one byte per pixel for an `R8Unorm` texture.
    pub fn to_r8(&self) -> Vec<u8> {
        self.alpha
            .iter()
            .map(|a| (a.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect()
    }
}

impl Default for SpriteMask {
    fn default() -> Self {
        Self::generate(DEFAULT_SPRITE_SIZE)
    }
}
