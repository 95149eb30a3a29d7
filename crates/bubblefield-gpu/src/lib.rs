//! wgpu backend for the bubble field: one full-screen metaball pass per frame.
use bubblefield_platform::{FieldFrame, GpuRenderer, PlatformError, Result, SurfaceSize};
use tracing::{info, warn};

mod context;
pub mod shaders;

use crate::context::GpuContext;

/// What the field is drawn over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackdropMode {
    /// Clear to fully transparent and let the host show through.
    #[default]
    Transparent,
    /// Clear to the frame's background tint. For windows with nothing behind
    /// them.
    Opaque,
}

pub fn clear_color(mode: BackdropMode, backdrop: [f32; 3]) -> wgpu::Color {
    match mode {
        BackdropMode::Transparent => wgpu::Color::TRANSPARENT,
        BackdropMode::Opaque => wgpu::Color {
            r: backdrop[0] as f64,
            g: backdrop[1] as f64,
            b: backdrop[2] as f64,
            a: 1.0,
        },
    }
}

/// Draws into a window surface. `W` is cloned whenever the surface has to be
/// rebuilt, so it is usually an `Arc` around the window.
pub struct WgpuRenderer<W> {
    context: Option<GpuContext>,
    window: W,
    backdrop: BackdropMode,
}

impl<W> WgpuRenderer<W>
where
    W: wgpu::WindowHandle + Clone + 'static,
{
    pub fn new(window: W, backdrop: BackdropMode) -> Self {
        Self {
            context: None,
            window,
            backdrop,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.context.is_some()
    }
}

impl<W> GpuRenderer for WgpuRenderer<W>
where
    W: wgpu::WindowHandle + Clone + 'static,
{
    fn init(&mut self, size: SurfaceSize) -> Result<()> {
        // Drop any previous surface before asking for a new one.
        self.context = None;
        let context = GpuContext::new(self.window.clone(), size, self.backdrop)?;
        info!("wgpu field pipeline ready: {context:?}");
        self.context = Some(context);
        Ok(())
    }

    fn render_frame(&mut self, frame: &FieldFrame) -> Result<()> {
        let context = self.context.as_mut().ok_or(PlatformError::NotInitialized)?;
        let clear = clear_color(self.backdrop, frame.backdrop);
        let result = context.draw(&frame.uniforms, clear);
        if let Err(err) = &result {
            warn!("field frame dropped: {err}");
            if matches!(err, PlatformError::SurfaceLost) {
                self.context = None;
            }
        }
        result
    }

    fn resize(&mut self, size: SurfaceSize) -> Result<()> {
        match self.context.as_mut() {
            Some(context) => {
                context.resize(size);
                Ok(())
            }
            None => Err(PlatformError::NotInitialized),
        }
    }

    fn release(&mut self) {
        if self.context.take().is_some() {
            info!("wgpu field pipeline released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparent_backdrop_clears_to_zero_alpha() {
        let color = clear_color(BackdropMode::Transparent, [0.2, 0.3, 0.4]);
        assert_eq!(color, wgpu::Color::TRANSPARENT);
    }

    #[test]
    fn opaque_backdrop_clears_to_tint() {
        let color = clear_color(BackdropMode::Opaque, [0.25, 0.5, 0.75]);
        assert_eq!(
            color,
            wgpu::Color {
                r: 0.25,
                g: 0.5,
                b: 0.75,
                a: 1.0
            }
        );
    }

    #[test]
    fn default_backdrop_is_transparent() {
        assert_eq!(BackdropMode::default(), BackdropMode::Transparent);
    }
}
