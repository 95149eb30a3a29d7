use std::sync::Arc;
use std::time::Instant;

use bubblefield_platform::Host;
use winit::window::Window;

/// Wall clock plus live metrics of the window the field is drawn into.
pub struct SystemHost {
    window: Arc<Window>,
    epoch: Instant,
}

impl SystemHost {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            epoch: Instant::now(),
        }
    }
}

impl Host for SystemHost {
    fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.window.scale_factor()
    }

    fn viewport(&self) -> (f64, f64) {
        let logical = self
            .window
            .inner_size()
            .to_logical::<f64>(self.window.scale_factor());
        (logical.width, logical.height)
    }
}
