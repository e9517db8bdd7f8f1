//! Error types for depthcloud.
//!
//! Per-particle evaluation never fails; these cover the host side: grid
//! construction, image loading, parameter files, GPU setup and the viewer.

use thiserror::Error;

/// Errors raised while building the particle grid.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The grid edge length was zero.
    #[error("grid size must be at least 1")]
    EmptyGrid,
    /// `grid_size²` does not fit in a `u32` particle index.
    #[error("grid size {0} produces more particles than a u32 index can address")]
    TooManyParticles(u32),
    /// The particle buffer would exceed the GPU buffer size limit.
    #[error("grid size {grid_size} needs a {bytes} byte particle buffer, limit is {max} bytes")]
    BufferTooLarge {
        grid_size: u32,
        bytes: u64,
        max: u64,
    },
}

/// Errors that can occur during texture loading.
#[derive(Debug, Error)]
pub enum TextureError {
    /// Failed to decode an image file.
    #[error("failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),
    /// Failed to read a file from disk.
    #[error("failed to read texture file: {0}")]
    Io(#[from] std::io::Error),
    /// Color and depth maps differ in size.
    #[error("color map is {}x{} but depth map is {}x{}; both maps must share the same dimensions", .color.0, .color.1, .depth.0, .depth.1)]
    DimensionMismatch {
        /// Color map `(width, height)`.
        color: (u32, u32),
        /// Depth map `(width, height)`.
        depth: (u32, u32),
    },
    /// Raw pixel buffer length does not match `width * height * 4`.
    #[error("RGBA buffer holds {actual} bytes, expected {expected}")]
    SizeMismatch {
        /// Expected byte length.
        expected: usize,
        /// Provided byte length.
        actual: usize,
    },
    /// The image has zero width or height.
    #[error("image has no pixels")]
    Empty,
}

/// Errors from parameter edits, presets and parameter files.
#[derive(Debug, Error)]
pub enum ParamsError {
    /// No parameter is registered under this name.
    #[error("unknown parameter '{0}'")]
    UnknownKey(String),
    /// A float was written to a toggle or a bool to a slider.
    #[error("parameter '{key}' does not accept a {given} value")]
    TypeMismatch {
        /// Parameter name.
        key: &'static str,
        /// Kind of value that was supplied.
        given: &'static str,
    },
    /// No preset with this name exists.
    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
    /// Malformed JSON.
    #[error("invalid parameter file: {0}")]
    Json(#[from] serde_json::Error),
    /// Failed to read or write the file.
    #[error("failed to access parameter file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; a WebGPU/Vulkan/Metal/DX12 capable device is required")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// A texture is larger than the device allows.
    #[error("{label} is {width}x{height}, larger than the GPU limit of {max} pixels per side")]
    TextureTooLarge {
        label: &'static str,
        width: u32,
        height: u32,
        max: u32,
    },
    /// A buffer is larger than the device allows.
    #[error("{label} needs {bytes} bytes, larger than the GPU limit of {max} bytes")]
    BufferTooLarge {
        label: &'static str,
        bytes: u64,
        max: u64,
    },
}

/// Errors that can occur when running the viewer.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Failed to create event loop.
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// Source maps could not be loaded.
    #[error("texture error: {0}")]
    Texture(#[from] TextureError),
    /// Particle grid could not be built.
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
    /// `run` was called before color and depth maps were supplied.
    #[error("no color/depth maps provided; use .with_maps() or .with_map_files()")]
    MissingMaps,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_message() {
        let err = TextureError::DimensionMismatch {
            color: (280, 280),
            depth: (256, 280),
        };
        let msg = err.to_string();
        assert!(msg.contains("280x280"));
        assert!(msg.contains("256x280"));
    }

    #[test]
    fn test_viewer_error_wraps_layout() {
        let err: ViewerError = LayoutError::EmptyGrid.into();
        assert!(matches!(err, ViewerError::Layout(LayoutError::EmptyGrid)));
        assert!(err.to_string().contains("grid size"));
    }
}
