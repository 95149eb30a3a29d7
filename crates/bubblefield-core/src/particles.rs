//! Fixed-capacity bubble pool stored as parallel per-slot arrays.
//!
//! Slots `[0, active)` are alive; the rest are parked off-screen with a zero
//! radius so they add nothing to the field. A slot keeps its index (and with
//! it its color) for the lifetime of the store.

use bubblefield_platform::FIELD_SLOTS;
use glam::Vec2;
use rand::Rng;

use crate::config::FieldConfig;
use crate::geometry::FieldGeometry;

/// Vertical offset below the viewport where unused slots are parked.
const PARK_OFFSET: f32 = 5000.0;

#[derive(Debug, Clone)]
pub struct ParticleStore {
    positions: [Vec2; FIELD_SLOTS],
    velocities: [Vec2; FIELD_SLOTS],
    radii: [f32; FIELD_SLOTS],
    active: usize,
    capacity: usize,
}

impl ParticleStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            positions: [Vec2::ZERO; FIELD_SLOTS],
            velocities: [Vec2::ZERO; FIELD_SLOTS],
            radii: [0.0; FIELD_SLOTS],
            active: 0,
            capacity: capacity.min(FIELD_SLOTS),
        }
    }

    /// Parks every slot and drops the population back to zero.
    pub fn reset(&mut self, geometry: &FieldGeometry) {
        let parked = Vec2::new(geometry.width / 2.0, geometry.height + PARK_OFFSET);
        self.positions = [parked; FIELD_SLOTS];
        self.velocities = [Vec2::ZERO; FIELD_SLOTS];
        self.radii = [0.0; FIELD_SLOTS];
        self.active = 0;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn is_full(&self) -> bool {
        self.active >= self.capacity
    }

    pub fn position(&self, slot: usize) -> Vec2 {
        self.positions[slot]
    }

    pub fn velocity(&self, slot: usize) -> Vec2 {
        self.velocities[slot]
    }

    pub fn radius(&self, slot: usize) -> f32 {
        self.radii[slot]
    }

    /// Releases the next dormant slot from below the bottom edge. Returns the
    /// slot index, or `None` once the pool is full.
    pub fn activate_next<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        geometry: &FieldGeometry,
        config: &FieldConfig,
    ) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        let slot = self.active;
        self.active += 1;

        let logical_x = (rng.random::<f32>() - 0.5) * config.logical_width;
        let logical_radius = rng.random::<f32>() * (geometry.max_radius - geometry.min_radius)
            + geometry.min_radius;
        let scale = geometry.scale_x.min(geometry.scale_y);

        self.positions[slot] = Vec2::new(
            logical_x * geometry.scale_x + geometry.width / 2.0,
            geometry.height + geometry.exit_margin,
        );
        self.radii[slot] = (logical_radius * scale * config.radius_scale).max(1.0);
        self.velocities[slot] = Vec2::new(
            (rng.random::<f32>() - 0.5) * 0.8 * geometry.scale_x,
            -(rng.random::<f32>() * 0.5 + 0.2) * geometry.scale_y / geometry.device_pixel_ratio,
        );
        Some(slot)
    }

    /// Overrides the motion of an already active slot.
    pub fn set_motion(&mut self, slot: usize, position: Vec2, velocity: Vec2) {
        if slot < self.active {
            self.positions[slot] = position;
            self.velocities[slot] = velocity;
        }
    }

    /// Mutable views over the live slots for the physics stepper.
    pub(crate) fn live_mut(&mut self) -> (&mut [Vec2], &mut [Vec2], &[f32]) {
        let n = self.active;
        (
            &mut self.positions[..n],
            &mut self.velocities[..n],
            &self.radii[..n],
        )
    }

    /// Writes `(x, y, radius)` per slot; inert slots get a zero radius.
    pub fn write_uniforms(&self, bubbles: &mut [[f32; 4]; FIELD_SLOTS]) {
        for (slot, out) in bubbles.iter_mut().enumerate() {
            let position = self.positions[slot];
            let radius = if slot < self.active { self.radii[slot] } else { 0.0 };
            *out = [position.x, position.y, radius, 0.0];
        }
    }
}
