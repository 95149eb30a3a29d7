//! Eased re-coloring of the whole bubble field.
//!
//! One transition runs at a time. Starting another samples the in-flight
//! colors at that instant and uses them as the new starting point, so a
//! restart never jumps. Live palette edits go through the same path with a
//! very short duration.

use bubblefield_platform::FIELD_SLOTS;
use tracing::debug;

use crate::color::{palette_table, ColorTable, NEUTRAL_GRAY};
use crate::easing::{ease_in_out_quad, progress};

/// Swatches editable through the live palette; higher indices belong to the
/// background and icon channels.
pub const LIVE_SWATCHES: usize = 4;

/// Seed for a live session on a subject without colors.
const LIVE_SEED: u32 = 0x888888;

#[derive(Debug, Clone, Copy, PartialEq)]
struct TransitionClock {
    start_ms: f64,
    duration_ms: f64,
}

#[derive(Debug, Clone)]
pub struct ColorTransitionEngine {
    current: ColorTable,
    old: ColorTable,
    target: ColorTable,
    clock: Option<TransitionClock>,
    grayscale_snapshot: Option<ColorTable>,
    live_palette: [u32; LIVE_SWATCHES],
    fallback_gray: u32,
    default_palette: Vec<u32>,
}

impl ColorTransitionEngine {
    pub fn new(fallback_gray: u32, default_palette: Vec<u32>) -> Self {
        let initial = palette_table(&default_palette, fallback_gray, &default_palette);
        Self {
            current: initial,
            old: initial,
            target: initial,
            clock: None,
            grayscale_snapshot: None,
            // Untouched swatches stay zero and render as the fallback gray.
            live_palette: [0; LIVE_SWATCHES],
            fallback_gray,
            default_palette,
        }
    }

    pub fn current(&self) -> &ColorTable {
        &self.current
    }

    pub fn target(&self) -> &ColorTable {
        &self.target
    }

    pub fn is_transitioning(&self) -> bool {
        self.clock.is_some()
    }

    pub fn is_grayscale(&self) -> bool {
        self.grayscale_snapshot.is_some()
    }

    pub fn live_palette(&self) -> &[u32; LIVE_SWATCHES] {
        &self.live_palette
    }

    /// Normalizes a packed palette into a full table.
    pub fn table_for(&self, colors: &[u32]) -> ColorTable {
        palette_table(colors, self.fallback_gray, &self.default_palette)
    }

    pub fn start_transition(&mut self, target: ColorTable, duration_ms: f64, now_ms: f64) {
        self.update(now_ms);
        self.old = self.current;
        self.target = target;
        self.clock = Some(TransitionClock {
            start_ms: now_ms,
            duration_ms,
        });
        debug!(duration_ms, "color transition started");
    }

    pub fn transition_to_palette(&mut self, colors: &[u32], duration_ms: f64, now_ms: f64) {
        let table = self.table_for(colors);
        self.start_transition(table, duration_ms, now_ms);
    }

    /// Recomputes `current` for `now_ms`. Returns whether a transition is
    /// still running afterwards.
    pub fn update(&mut self, now_ms: f64) -> bool {
        let Some(clock) = self.clock else {
            return false;
        };
        let t = progress(now_ms - clock.start_ms, clock.duration_ms);
        if t >= 1.0 {
            self.current = self.target;
            self.clock = None;
            return false;
        }
        let eased = ease_in_out_quad(t);
        for ((current, old), target) in self
            .current
            .iter_mut()
            .zip(&self.old)
            .zip(&self.target)
        {
            *current = *old + (*target - *old) * eased;
        }
        true
    }

    /// Fades to uniform gray, remembering the current target for
    /// [`exit_grayscale`](Self::exit_grayscale). Re-entry while already gray
    /// is refused so the remembered palette is never overwritten.
    pub fn enter_grayscale(&mut self, duration_ms: f64, now_ms: f64) -> bool {
        if self.grayscale_snapshot.is_some() {
            debug!("grayscale already active; keeping saved palette");
            return false;
        }
        self.grayscale_snapshot = Some(self.target);
        self.start_transition([NEUTRAL_GRAY; FIELD_SLOTS], duration_ms, now_ms);
        true
    }

    pub fn exit_grayscale(&mut self, duration_ms: f64, now_ms: f64) -> bool {
        match self.grayscale_snapshot.take() {
            Some(saved) => {
                self.start_transition(saved, duration_ms, now_ms);
                true
            }
            None => false,
        }
    }

    /// Seeds the live palette from the subject's bubble colors.
    pub fn begin_live_edit(&mut self, palette: &[u32]) {
        if palette.is_empty() {
            self.live_palette = [LIVE_SEED; LIVE_SWATCHES];
            return;
        }
        for (slot, swatch) in self.live_palette.iter_mut().enumerate() {
            *swatch = palette.get(slot).copied().unwrap_or(LIVE_SEED);
        }
    }

    /// Replaces one live swatch and pushes the live palette out. Indices
    /// outside the live palette are ignored.
    pub fn set_live_swatch(
        &mut self,
        index: usize,
        color: u32,
        duration_ms: f64,
        now_ms: f64,
    ) -> bool {
        let Some(swatch) = self.live_palette.get_mut(index) else {
            return false;
        };
        *swatch = color;
        let palette = self.live_palette;
        self.transition_to_palette(&palette, duration_ms, now_ms);
        true
    }

    /// Writes `current` as `(r, g, b, 0)` per slot.
    pub fn write_uniforms(&self, colors: &mut [[f32; 4]; FIELD_SLOTS]) {
        for (out, color) in colors.iter_mut().zip(&self.current) {
            *out = color.extend(0.0).to_array();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::unpack_rgb;
    use glam::Vec3;

    const DEFAULTS: [u32; 4] = [0xFF0000, 0x00FF00, 0x0000FF, 0xFFFF00];

    fn mix_tables(a: &ColorTable, b: &ColorTable, t: f32) -> ColorTable {
        let mut out = *a;
        for (slot, color) in out.iter_mut().enumerate() {
            *color = a[slot].lerp(b[slot], t);
        }
        out
    }

    fn max_channel_delta(a: &ColorTable, b: &ColorTable) -> f32 {
        a.iter()
            .zip(b)
            .map(|(x, y)| (*x - *y).abs().max_element())
            .fold(0.0, f32::max)
    }

    fn engine() -> ColorTransitionEngine {
        ColorTransitionEngine::new(0x444444, DEFAULTS.to_vec())
    }

    #[test]
    fn converges_exactly_at_duration() {
        let mut engine = engine();
        engine.transition_to_palette(&[0x112233], 2000.0, 0.0);
        assert!(engine.update(1000.0));
        assert!(!engine.update(2000.0));
        assert!(engine.current().iter().all(|c| *c == unpack_rgb(0x112233)));
        assert!(!engine.is_transitioning());
    }

    #[test]
    fn late_sample_snaps_to_target() {
        let mut engine = engine();
        engine.transition_to_palette(&[0xAABBCC, 0x010203], 50.0, 10.0);
        engine.update(10_000.0);
        assert_eq!(engine.current(), engine.target());
    }

    #[test]
    fn midpoint_is_halfway_under_ease() {
        let mut engine = engine();
        let start = *engine.current();
        engine.transition_to_palette(&[0xFFFFFF], 1000.0, 0.0);
        engine.update(500.0);
        let expected = mix_tables(&start, &[Vec3::ONE; FIELD_SLOTS], 0.5);
        assert!(max_channel_delta(engine.current(), &expected) < 1e-6);
    }

    #[test]
    fn restart_mid_flight_has_no_jump() {
        let mut engine = engine();
        engine.transition_to_palette(&[0x000080], 1000.0, 0.0);

        let mut reference = engine.clone();
        reference.update(300.0);
        let at_restart = *reference.current();

        engine.transition_to_palette(&[0xFFFFFF], 1000.0, 300.0);
        engine.update(300.0);
        assert!(max_channel_delta(engine.current(), &at_restart) < 1e-6);
        assert_eq!(engine.target()[0], Vec3::ONE);
    }

    #[test]
    fn grayscale_round_trip_restores_target_exactly() {
        let mut engine = engine();
        engine.transition_to_palette(&[0x123456, 0x654321, 0xABCDEF], 2000.0, 0.0);
        engine.update(2000.0);
        let before = *engine.target();

        assert!(engine.enter_grayscale(2000.0, 2500.0));
        engine.update(4500.0);
        assert!(engine.current().iter().all(|c| *c == NEUTRAL_GRAY));

        assert!(engine.exit_grayscale(2000.0, 5000.0));
        engine.update(7000.0);
        assert_eq!(*engine.current(), before);
        assert!(!engine.is_grayscale());
    }

    #[test]
    fn grayscale_reentry_is_refused() {
        let mut engine = engine();
        engine.transition_to_palette(&[0x123456], 10.0, 0.0);
        engine.update(10.0);
        let saved = *engine.target();
        assert!(engine.enter_grayscale(100.0, 20.0));
        assert!(!engine.enter_grayscale(100.0, 30.0));
        engine.exit_grayscale(100.0, 40.0);
        engine.update(1000.0);
        assert_eq!(*engine.current(), saved);
    }

    #[test]
    fn exit_without_enter_is_a_no_op() {
        let mut engine = engine();
        assert!(!engine.exit_grayscale(100.0, 0.0));
        assert!(!engine.is_transitioning());
    }

    #[test]
    fn live_swatch_edits_only_their_slot_cycle() {
        let mut engine = engine();
        engine.begin_live_edit(&[0x111111, 0x222222, 0x333333, 0x444444]);
        assert!(engine.set_live_swatch(2, 0xABCDEF, 50.0, 0.0));
        engine.update(50.0);
        assert_eq!(engine.current()[2], unpack_rgb(0xABCDEF));
        assert_eq!(engine.current()[6], unpack_rgb(0xABCDEF));
        assert_eq!(engine.current()[1], unpack_rgb(0x222222));
        assert_eq!(engine.live_palette()[2], 0xABCDEF);
    }

    #[test]
    fn live_swatch_outside_palette_is_ignored() {
        let mut engine = engine();
        assert!(!engine.set_live_swatch(4, 0xFFFFFF, 50.0, 0.0));
        assert!(!engine.is_transitioning());
    }

    #[test]
    fn live_swatch_before_session_leaves_others_gray() {
        let mut engine = engine();
        assert!(engine.set_live_swatch(1, 0x00FF00, 50.0, 0.0));
        engine.update(50.0);
        assert_eq!(engine.live_palette(), &[0, 0x00FF00, 0, 0]);
        assert_eq!(engine.current()[0], unpack_rgb(0x444444));
        assert_eq!(engine.current()[1], unpack_rgb(0x00FF00));
        assert_eq!(engine.current()[3], unpack_rgb(0x444444));
    }

    #[test]
    fn short_seed_palette_pads_with_neutral_swatches() {
        let mut engine = engine();
        engine.begin_live_edit(&[0x010101]);
        assert_eq!(engine.live_palette(), &[0x010101, 0x888888, 0x888888, 0x888888]);
    }

    #[test]
    fn uniforms_mirror_current_colors() {
        let engine = engine();
        let mut colors = [[9.0; 4]; FIELD_SLOTS];
        engine.write_uniforms(&mut colors);
        assert_eq!(colors[0], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(colors[1], [0.0, 1.0, 0.0, 0.0]);
    }
}
