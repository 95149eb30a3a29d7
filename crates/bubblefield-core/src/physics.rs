//! Per-frame bubble motion: buoyancy, jitter, damping, walls and recycling.

use glam::Vec2;
use rand::Rng;

use crate::config::PhysicsConfig;
use crate::geometry::FieldGeometry;
use crate::particles::ParticleStore;

/// Duration of the frame the velocity units are expressed in.
pub const REFERENCE_FRAME_MS: f64 = 16.67;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub recycled: usize,
    pub bounced: usize,
}

/// Advances every live slot by `delta_ms` (already clamped by the caller).
/// Inert slots are not touched.
pub fn step<R: Rng + ?Sized>(
    store: &mut ParticleStore,
    delta_ms: f64,
    geometry: &FieldGeometry,
    physics: &PhysicsConfig,
    rng: &mut R,
) -> StepReport {
    let dt = (delta_ms.max(0.0) / REFERENCE_FRAME_MS) as f32;
    let mut report = StepReport::default();
    let (positions, velocities, radii) = store.live_mut();

    for ((position, velocity), &radius) in positions.iter_mut().zip(velocities).zip(radii) {
        velocity.y -= physics.buoyancy * (physics.buoyancy_reference_radius / radius) * dt;
        velocity.x += (rng.random::<f32>() - 0.5) * 2.0 * physics.jitter * dt;
        *velocity *= physics.damping;
        *velocity = velocity.clamp(
            Vec2::splat(-physics.max_speed),
            Vec2::splat(physics.max_speed),
        );

        *position += *velocity * dt;

        if position.y + radius < -geometry.exit_margin {
            *position = Vec2::new(
                geometry.wall_left + rng.random::<f32>() * (geometry.wall_right - geometry.wall_left),
                geometry.height + geometry.exit_margin,
            );
            *velocity = Vec2::new(
                (rng.random::<f32>() - 0.5) * 0.3,
                -(rng.random::<f32>() * 0.5 + 0.2),
            );
            report.recycled += 1;
        }

        if position.x - radius < geometry.wall_left {
            position.x = geometry.wall_left + radius;
            velocity.x *= -physics.bounce_restitution;
            report.bounced += 1;
        } else if position.x + radius > geometry.wall_right {
            position.x = geometry.wall_right - radius;
            velocity.x *= -physics.bounce_restitution;
            report.bounced += 1;
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Rig {
        config: FieldConfig,
        geometry: FieldGeometry,
        store: ParticleStore,
        rng: StdRng,
    }

    fn rig(bubbles: usize) -> Rig {
        let config = FieldConfig::default();
        let geometry = FieldGeometry::new((400.0, 800.0), 1.0, &config);
        let mut store = ParticleStore::new(config.capacity);
        store.reset(&geometry);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..bubbles {
            store.activate_next(&mut rng, &geometry, &config);
        }
        Rig {
            config,
            geometry,
            store,
            rng,
        }
    }

    impl Rig {
        fn step(&mut self, delta_ms: f64) -> StepReport {
            step(
                &mut self.store,
                delta_ms,
                &self.geometry,
                &self.config.physics,
                &mut self.rng,
            )
        }
    }

    #[test]
    fn buoyancy_lifts_small_bubbles_faster() {
        let mut rig = rig(2);
        let centre = Vec2::new(200.0, 400.0);
        rig.store.set_motion(0, centre, Vec2::ZERO);
        rig.store.set_motion(1, centre, Vec2::ZERO);
        let small = rig.store.radius(0).min(rig.store.radius(1));
        let small_slot = if rig.store.radius(0) == small { 0 } else { 1 };
        rig.step(REFERENCE_FRAME_MS);
        let vy_small = rig.store.velocity(small_slot).y;
        let vy_large = rig.store.velocity(1 - small_slot).y;
        assert!(vy_small < 0.0 && vy_large < 0.0);
        assert!(vy_small <= vy_large);
    }

    #[test]
    fn one_reference_frame_applies_buoyancy_then_damping() {
        let mut rig = rig(1);
        rig.store.set_motion(0, Vec2::new(200.0, 400.0), Vec2::ZERO);
        let radius = rig.store.radius(0);
        rig.step(REFERENCE_FRAME_MS);
        let expected = -0.0015 * (80.0 / radius) * 0.999;
        assert!((rig.store.velocity(0).y - expected).abs() < 1e-6);
        assert!(rig.store.velocity(0).x.abs() <= 0.0015);
    }

    #[test]
    fn speed_is_clamped_per_component() {
        let mut rig = rig(1);
        rig.store
            .set_motion(0, Vec2::new(200.0, 400.0), Vec2::new(0.2, -40.0));
        rig.step(REFERENCE_FRAME_MS);
        assert_eq!(rig.store.velocity(0).y, -1.5);
    }

    #[test]
    fn exiting_the_top_recycles_in_place() {
        let mut rig = rig(3);
        let radius = rig.store.radius(1);
        let above = -rig.geometry.exit_margin - radius - 1.0;
        rig.store.set_motion(1, Vec2::new(200.0, above), Vec2::new(0.0, -1.0));
        let report = rig.step(REFERENCE_FRAME_MS);
        assert_eq!(report.recycled, 1);
        assert_eq!(rig.store.active_count(), 3);
        let position = rig.store.position(1);
        assert_eq!(position.y, rig.geometry.height + rig.geometry.exit_margin);
        assert!(position.x >= rig.geometry.wall_left - radius);
        assert!(position.x <= rig.geometry.wall_right + radius);
        assert_eq!(rig.store.radius(1), radius);
        assert!(rig.store.velocity(1).y < 0.0);
    }

    #[test]
    fn left_wall_reflects_with_half_energy() {
        let mut rig = rig(1);
        let radius = rig.store.radius(0);
        let x = rig.geometry.wall_left + radius;
        rig.store.set_motion(0, Vec2::new(x, 400.0), Vec2::new(-1.0, 0.0));
        let mut probe = rig.store.clone();
        let mut probe_rng = rig.rng.clone();
        let geometry = FieldGeometry {
            wall_left: f32::NEG_INFINITY,
            wall_right: f32::INFINITY,
            ..rig.geometry
        };
        step(&mut probe, REFERENCE_FRAME_MS, &geometry, &rig.config.physics, &mut probe_rng);
        let pre_bounce = probe.velocity(0).x;

        let report = rig.step(REFERENCE_FRAME_MS);
        assert_eq!(report.bounced, 1);
        assert_eq!(rig.store.position(0).x, rig.geometry.wall_left + radius);
        let after = rig.store.velocity(0).x;
        assert!(pre_bounce < 0.0);
        assert!((after - (-0.5 * pre_bounce)).abs() < 1e-6);
    }

    #[test]
    fn right_wall_clamps_position() {
        let mut rig = rig(1);
        let radius = rig.store.radius(0);
        rig.store.set_motion(
            0,
            Vec2::new(rig.geometry.wall_right + 30.0, 400.0),
            Vec2::new(1.2, 0.0),
        );
        rig.step(REFERENCE_FRAME_MS);
        assert_eq!(rig.store.position(0).x, rig.geometry.wall_right - radius);
        assert!(rig.store.velocity(0).x < 0.0);
    }

    #[test]
    fn inert_slots_are_left_alone() {
        let mut rig = rig(2);
        let parked = rig.store.position(5);
        for _ in 0..100 {
            rig.step(REFERENCE_FRAME_MS);
        }
        assert_eq!(rig.store.position(5), parked);
        assert_eq!(rig.store.velocity(5), Vec2::ZERO);
    }
}
