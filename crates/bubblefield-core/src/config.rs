use std::path::Path;

use bubblefield_platform::FIELD_SLOTS;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Upward acceleration per reference frame for a bubble of
    /// `buoyancy_reference_radius`; scales inversely with radius.
    pub buoyancy: f32,
    pub buoyancy_reference_radius: f32,
    /// Horizontal velocity noise amplitude per reference frame.
    pub jitter: f32,
    pub damping: f32,
    /// Per-component speed limit in device pixels per reference frame.
    pub max_speed: f32,
    pub bounce_restitution: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            buoyancy: 0.0015,
            buoyancy_reference_radius: 80.0,
            jitter: 0.0015,
            damping: 0.999,
            max_speed: 1.5,
            bounce_restitution: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldShape {
    /// Sum-of-influence cutoff where bubbles become visible.
    pub threshold: f32,
    /// Width of the smoothstep edge above the threshold.
    pub band: f32,
}

impl Default for FieldShape {
    fn default() -> Self {
        Self {
            threshold: 0.4,
            band: 0.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub capacity: usize,
    pub spawn_interval_ms: f64,
    /// Per-call delta cap for spawn accounting.
    pub spawn_delta_cap_ms: f64,
    pub palette_transition_ms: f64,
    pub live_transition_ms: f64,
    pub background_fade_ms: f64,
    /// Logical band that spawn positions and radii are laid out in.
    pub logical_width: f32,
    pub logical_height: f32,
    /// Distance of the bounce walls from the left/right device edges.
    pub side_margin: f32,
    pub radius_scale: f32,
    pub physics: PhysicsConfig,
    pub field: FieldShape,
    pub fallback_gray: u32,
    pub default_palette: Vec<u32>,
    /// Swatches applied when a subject has fewer than two colors of its own.
    pub subject_fallback: Vec<u32>,
    pub subject_fallback_background: u32,
    pub seed: Option<u64>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            capacity: FIELD_SLOTS,
            spawn_interval_ms: 3000.0,
            spawn_delta_cap_ms: 50.0,
            palette_transition_ms: 2000.0,
            live_transition_ms: 50.0,
            background_fade_ms: 600.0,
            logical_width: 432.0,
            logical_height: 874.0,
            side_margin: 50.0,
            radius_scale: 0.3,
            physics: PhysicsConfig::default(),
            field: FieldShape::default(),
            fallback_gray: 0x444444,
            default_palette: vec![0xFF0000, 0x00FF00, 0x0000FF, 0xFFFF00],
            subject_fallback: vec![0x111111, 0x444444, 0x666666, 0x888888],
            subject_fallback_background: 0x111111,
            seed: None,
        }
    }
}

impl FieldConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: FieldConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 || self.capacity > FIELD_SLOTS {
            return Err(ConfigError::Capacity {
                requested: self.capacity,
                max: FIELD_SLOTS,
            });
        }
        let positive = [
            ("spawn_interval_ms", self.spawn_interval_ms),
            ("spawn_delta_cap_ms", self.spawn_delta_cap_ms),
            ("logical_width", self.logical_width as f64),
            ("logical_height", self.logical_height as f64),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { name, value });
            }
        }
        if self.default_palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        Ok(())
    }
}
