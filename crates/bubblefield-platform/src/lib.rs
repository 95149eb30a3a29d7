//! Platform abstraction traits so `bubblefield-core` stays backend-agnostic.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of slots in the shader's uniform arrays. Particle capacity can be
/// configured lower, never higher.
pub const FIELD_SLOTS: usize = 25;

pub type Result<T> = std::result::Result<T, PlatformError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Link,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Link => "link",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("no usable GPU context: {0}")]
    ContextUnavailable(String),
    #[error("{stage} shader failed: {message}")]
    ShaderCompile { stage: ShaderStage, message: String },
    #[error("drawing surface was lost")]
    SurfaceLost,
    #[error("surface error: {0}")]
    Surface(String),
    #[error("renderer used before init")]
    NotInitialized,
}

/// Backing-buffer size in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// `logical × device_pixel_ratio`, rounded, never below 1×1.
    pub fn from_logical(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        let dpr = if device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        Self::new(
            (width.max(0.0) * dpr).round() as u32,
            (height.max(0.0) * dpr).round() as u32,
        )
    }
}

/// Uniform block consumed by the metaball fragment shader. Arrays use a
/// 16-byte stride so the struct uploads as-is.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FieldUniforms {
    pub resolution: [f32; 2],
    pub threshold: f32,
    pub band: f32,
    /// x, y, radius (device pixels), unused.
    pub bubbles: [[f32; 4]; FIELD_SLOTS],
    /// r, g, b in [0, 1], unused.
    pub colors: [[f32; 4]; FIELD_SLOTS],
}

impl Default for FieldUniforms {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Everything a backend needs to draw one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FieldFrame {
    pub uniforms: FieldUniforms,
    /// Background tint in [0, 1]; backends that draw opaque clear to it.
    pub backdrop: [f32; 3],
}

/// GPU renderer abstraction, backed by wgpu in `bubblefield-gpu`.
pub trait GpuRenderer {
    /// Acquire a context and build the pipeline. Called again to restore
    /// after a loss.
    fn init(&mut self, size: SurfaceSize) -> Result<()>;
    fn render_frame(&mut self, frame: &FieldFrame) -> Result<()>;
    fn resize(&mut self, _size: SurfaceSize) -> Result<()> {
        Ok(())
    }
    /// Drop program, buffers and surface. Must tolerate repeated calls.
    fn release(&mut self);
}

/// Wall clock and window metrics of the embedding host.
pub trait Host {
    /// Monotonic milliseconds.
    fn now_ms(&self) -> f64;
    fn device_pixel_ratio(&self) -> f64;
    /// Logical (CSS-like) viewport width and height.
    fn viewport(&self) -> (f64, f64);
}
