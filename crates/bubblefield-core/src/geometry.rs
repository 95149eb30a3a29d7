use bubblefield_platform::SurfaceSize;

use crate::config::FieldConfig;

/// Device-space layout of the field, rebuilt on every resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldGeometry {
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f32,
    /// Device pixels per logical unit.
    pub scale_x: f32,
    pub scale_y: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    /// Distance beyond the top/bottom edge where bubbles park and recycle.
    pub exit_margin: f32,
    pub wall_left: f32,
    pub wall_right: f32,
}

impl FieldGeometry {
    pub fn new(viewport: (f64, f64), device_pixel_ratio: f64, config: &FieldConfig) -> Self {
        let dpr = if device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        let size = SurfaceSize::from_logical(viewport.0, viewport.1, dpr);
        let width = size.width as f32;
        let height = size.height as f32;
        // Radius bounds follow the shorter viewport side, in logical units.
        let short_side = (viewport.0.min(viewport.1).max(0.0) * dpr).floor();
        let max_radius = ((short_side / 2.0 / dpr) as f32).max(1.0);
        let min_radius = max_radius / 5.0;
        Self {
            width,
            height,
            device_pixel_ratio: dpr as f32,
            scale_x: width / config.logical_width,
            scale_y: height / config.logical_height,
            min_radius,
            max_radius,
            exit_margin: max_radius * 2.0,
            wall_left: config.side_margin,
            wall_right: width - config.side_margin,
        }
    }

    pub fn surface_size(&self) -> SurfaceSize {
        SurfaceSize::new(self.width as u32, self.height as u32)
    }
}
