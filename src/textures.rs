//! Color and depth source maps.
//!
//! A portrait is rendered from two aligned images of the same size:
//!
//! - a **color map**, stored in a display (sRGB) encoding
//! - a **depth map**, a linear grayscale value in [0, 1] read from channel 0
//!
//! [`SourceMaps`] holds such a pair and refuses mismatched dimensions. Each
//! map is a [`TextureConfig`] that can be uploaded to the GPU or sampled on
//! the CPU with the same clamped addressing the shader uses.
//!
//! # Quick Start
//!
//! ```ignore
//! use depthcloud::textures::SourceMaps;
//!
//! let maps = SourceMaps::load("face_color.png", "face_depth.png")?;
//! println!("{}x{}", maps.width(), maps.height());
//! ```
//!
//! # Supported Formats
//!
//! - PNG (recommended, especially for depth)
//! - JPEG

use std::path::Path;

use glam::{Vec2, Vec3, Vec4};

use crate::error::TextureError;

/// Filter mode for texture sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Smooth linear filtering (default).
    #[default]
    Linear,
    /// Sharp nearest-neighbor filtering.
    Nearest,
}

impl FilterMode {
    pub(crate) fn to_wgpu(self) -> wgpu::FilterMode {
        match self {
            FilterMode::Linear => wgpu::FilterMode::Linear,
            FilterMode::Nearest => wgpu::FilterMode::Nearest,
        }
    }
}

/// How the stored bytes map to shader values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorEncoding {
    /// Bytes are linear values (default). Used for depth.
    #[default]
    Linear,
    /// Bytes are sRGB encoded and decoded to linear when sampled.
    Srgb,
}

/// A single RGBA8 texture.
#[derive(Debug, Clone)]
pub struct TextureConfig {
    /// Raw RGBA pixel data (width * height * 4 bytes).
    pub data: Vec<u8>,
    /// Texture width in pixels.
    pub width: u32,
    /// Texture height in pixels.
    pub height: u32,
    /// Filter mode for magnification/minification.
    pub filter: FilterMode,
    /// Encoding of the stored bytes.
    pub encoding: ColorEncoding,
}

impl TextureConfig {
    /// Create a texture configuration from raw RGBA data.
    ///
    /// # Example
    ///
    /// ```ignore
    /// // 2x1 texture: white, black
    /// let tex = TextureConfig::from_rgba(vec![255, 255, 255, 255, 0, 0, 0, 255], 2, 1)?;
    /// ```
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::Empty);
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(TextureError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            filter: FilterMode::Linear,
            encoding: ColorEncoding::Linear,
        })
    }

    /// Load a texture from an image file.
    ///
    /// Any channel layout is converted to RGBA8; grayscale depth maps end up
    /// with the gray value in R, G and B.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let img = image::open(path)?.into_rgba8();
        let (width, height) = img.dimensions();
        log::debug!("decoded '{}' ({}x{})", path.display(), width, height);
        Self::from_rgba(img.into_raw(), width, height)
    }

    /// Create a texture filled with one color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, TextureError> {
        let data = rgba.repeat(width as usize * height as usize);
        Self::from_rgba(data, width, height)
    }

    /// Set the filter mode.
    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }

    /// Set the byte encoding.
    pub fn with_encoding(mut self, encoding: ColorEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// GPU format matching [`Self::encoding`].
    pub(crate) fn wgpu_format(&self) -> wgpu::TextureFormat {
        match self.encoding {
            ColorEncoding::Linear => wgpu::TextureFormat::Rgba8Unorm,
            ColorEncoding::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        }
    }

    /// Decoded value of pixel `(x, y)`.
    pub fn texel(&self, x: u32, y: u32) -> Vec4 {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.data[i..i + 4];
        let decode = |b: u8| match self.encoding {
            ColorEncoding::Linear => b as f32 / 255.0,
            ColorEncoding::Srgb => srgb_to_linear(b),
        };
        Vec4::new(decode(px[0]), decode(px[1]), decode(px[2]), px[3] as f32 / 255.0)
    }

    /// Sample at `uv` with clamp-to-edge addressing and no mipmaps,
    /// matching the GPU sampler.
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        let size = Vec2::new(self.width as f32, self.height as f32);
        let max_x = self.width - 1;
        let max_y = self.height - 1;
        let clamp_x = |v: f32| (v.max(0.0) as u32).min(max_x);
        let clamp_y = |v: f32| (v.max(0.0) as u32).min(max_y);

        match self.filter {
            FilterMode::Nearest => {
                let p = (uv * size).floor();
                self.texel(clamp_x(p.x), clamp_y(p.y))
            }
            FilterMode::Linear => {
                let p = uv * size - 0.5;
                let base = p.floor();
                let t = p - base;
                let x0 = clamp_x(base.x);
                let y0 = clamp_y(base.y);
                let x1 = clamp_x(base.x + 1.0);
                let y1 = clamp_y(base.y + 1.0);
                let top = self.texel(x0, y0).lerp(self.texel(x1, y0), t.x);
                let bottom = self.texel(x0, y1).lerp(self.texel(x1, y1), t.x);
                top.lerp(bottom, t.y)
            }
        }
    }
}

/// Decode one sRGB byte to a linear value.
pub fn srgb_to_linear(byte: u8) -> f32 {
    let c = byte as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// An aligned color/depth map pair of identical dimensions.
#[derive(Debug, Clone)]
pub struct SourceMaps {
    color: TextureConfig,
    depth: TextureConfig,
}

impl SourceMaps {
    /// Pair two maps, rejecting mismatched sizes.
    pub fn new(color: TextureConfig, depth: TextureConfig) -> Result<Self, TextureError> {
        if color.dimensions() != depth.dimensions() {
            return Err(TextureError::DimensionMismatch {
                color: color.dimensions(),
                depth: depth.dimensions(),
            });
        }
        Ok(Self { color, depth })
    }

    /// Load and validate an image pair. The color map is treated as sRGB,
    /// the depth map as linear.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(color: P, depth: Q) -> Result<Self, TextureError> {
        let color = TextureConfig::from_file(color)?.with_encoding(ColorEncoding::Srgb);
        let depth = TextureConfig::from_file(depth)?.with_encoding(ColorEncoding::Linear);
        let maps = Self::new(color, depth)?;
        log::info!("loaded source maps ({}x{})", maps.width(), maps.height());
        Ok(maps)
    }

    pub fn color(&self) -> &TextureConfig {
        &self.color
    }

    pub fn depth(&self) -> &TextureConfig {
        &self.depth
    }

    pub fn width(&self) -> u32 {
        self.color.width
    }

    pub fn height(&self) -> u32 {
        self.color.height
    }

    /// Linear RGB color at `uv`.
    pub fn sample_color(&self, uv: Vec2) -> Vec3 {
        self.color.sample(uv).truncate()
    }

    /// Raw depth (channel 0) at `uv`.
    pub fn sample_depth(&self, uv: Vec2) -> f32 {
        self.depth.sample(uv).x
    }
}
