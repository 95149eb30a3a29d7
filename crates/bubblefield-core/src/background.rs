use glam::Vec3;

use crate::color::unpack_rgb;
use crate::easing::{ease_out_cubic, progress};

/// Fade state for the background tint that sits behind the bubble field.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundTint {
    current: Vec3,
    from: Vec3,
    to: Vec3,
    start_ms: f64,
    duration_ms: f64,
    fading: bool,
}

impl BackgroundTint {
    pub fn new(initial: u32) -> Self {
        let color = unpack_rgb(initial);
        Self {
            current: color,
            from: color,
            to: color,
            start_ms: 0.0,
            duration_ms: 0.0,
            fading: false,
        }
    }

    pub fn current(&self) -> Vec3 {
        self.current
    }

    pub fn is_fading(&self) -> bool {
        self.fading
    }

    /// Starts a fade from wherever the tint is at `now_ms`.
    pub fn fade_to(&mut self, color: u32, duration_ms: f64, now_ms: f64) {
        self.update(now_ms);
        self.from = self.current;
        self.to = unpack_rgb(color);
        self.start_ms = now_ms;
        self.duration_ms = duration_ms;
        self.fading = true;
    }

    /// Jumps straight to `color`, cancelling any fade.
    pub fn set(&mut self, color: u32) {
        self.current = unpack_rgb(color);
        self.from = self.current;
        self.to = self.current;
        self.fading = false;
    }

    pub fn update(&mut self, now_ms: f64) {
        if !self.fading {
            return;
        }
        let t = progress(now_ms - self.start_ms, self.duration_ms);
        if t >= 1.0 {
            self.current = self.to;
            self.fading = false;
        } else {
            self.current = self.from.lerp(self.to, ease_out_cubic(t));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_lands_on_target() {
        let mut tint = BackgroundTint::new(0x111111);
        tint.fade_to(0x336699, 600.0, 100.0);
        tint.update(400.0);
        assert!(tint.is_fading());
        tint.update(700.0);
        assert_eq!(tint.current(), unpack_rgb(0x336699));
        assert!(!tint.is_fading());
    }

    #[test]
    fn ease_out_is_past_halfway_at_midpoint() {
        let mut tint = BackgroundTint::new(0x000000);
        tint.fade_to(0xFFFFFF, 600.0, 0.0);
        tint.update(300.0);
        assert!(tint.current().x > 0.8);
    }

    #[test]
    fn refade_starts_from_interpolated_tint() {
        let mut tint = BackgroundTint::new(0x000000);
        tint.fade_to(0xFFFFFF, 600.0, 0.0);
        tint.update(300.0);
        let mid = tint.current();
        tint.fade_to(0x000000, 600.0, 300.0);
        tint.update(300.0);
        assert!((tint.current() - mid).abs().max_element() < 1e-6);
    }

    #[test]
    fn set_cancels_fade() {
        let mut tint = BackgroundTint::new(0x000000);
        tint.fade_to(0xFFFFFF, 600.0, 0.0);
        tint.set(0x102030);
        tint.update(10_000.0);
        assert_eq!(tint.current(), unpack_rgb(0x102030));
    }
}
