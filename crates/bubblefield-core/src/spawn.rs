/// Time accumulator that releases at most one bubble per interval.
#[derive(Debug, Clone)]
pub struct SpawnScheduler {
    accumulated_ms: f64,
    interval_ms: f64,
    delta_cap_ms: f64,
}

impl SpawnScheduler {
    pub fn new(interval_ms: f64, delta_cap_ms: f64) -> Self {
        Self {
            accumulated_ms: 0.0,
            interval_ms,
            delta_cap_ms,
        }
    }

    pub fn reset(&mut self) {
        self.accumulated_ms = 0.0;
    }

    pub fn accumulated_ms(&self) -> f64 {
        self.accumulated_ms
    }

    /// Adds one frame of (capped) time. Returns `true` when a bubble should
    /// be released; the accumulator only restarts when that happens, so a
    /// full pool keeps it saturated.
    pub fn tick(&mut self, delta_ms: f64, has_room: bool) -> bool {
        self.accumulated_ms += delta_ms.clamp(0.0, self.delta_cap_ms);
        if self.accumulated_ms > self.interval_ms && has_room {
            self.accumulated_ms = 0.0;
            return true;
        }
        false
    }
}
