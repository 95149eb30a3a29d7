//! Bubblefield core engine: platform-agnostic bubble pool, physics, spawn
//! cadence, color transitions, and the renderer facade that ties them to a
//! [`GpuRenderer`](bubblefield_platform::GpuRenderer).

pub mod background;
pub mod color;
pub mod config;
pub mod easing;
pub mod error;
pub mod geometry;
pub mod particles;
pub mod physics;
pub mod renderer;
pub mod spawn;
pub mod transition;

pub use bubblefield_platform::FIELD_SLOTS as MAX_BUBBLES;
pub use color::{pack_rgb, unpack_rgb, ColorTable};
pub use config::{FieldConfig, FieldShape, PhysicsConfig};
pub use error::ConfigError;
pub use geometry::FieldGeometry;
pub use particles::ParticleStore;
pub use renderer::{BubbleRenderer, Lifecycle};
pub use transition::ColorTransitionEngine;
