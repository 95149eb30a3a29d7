//! The public facade the background display drives once per frame.

use bubblefield_platform::{FieldFrame, GpuRenderer, Host, PlatformError};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::background::BackgroundTint;
use crate::color::ColorTable;
use crate::config::FieldConfig;
use crate::geometry::FieldGeometry;
use crate::particles::ParticleStore;
use crate::physics;
use crate::spawn::SpawnScheduler;
use crate::transition::{ColorTransitionEngine, LIVE_SWATCHES};

/// Initial background tint behind the field.
const BASE_BACKGROUND: u32 = 0x111111;
/// Live-edit index of the background swatch; the one after it is the icon.
const BACKGROUND_SWATCH: usize = LIVE_SWATCHES;
const ACCENT_SWATCH: usize = LIVE_SWATCHES + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Created,
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GpuStatus {
    Ready,
    /// No context, a failed pipeline, or a lost surface. Simulation keeps
    /// running; drawing is skipped until a successful restore.
    Inert,
}

pub struct BubbleRenderer<G: GpuRenderer, H: Host> {
    gpu: G,
    host: H,
    config: FieldConfig,
    lifecycle: Lifecycle,
    gpu_status: GpuStatus,
    geometry: FieldGeometry,
    particles: ParticleStore,
    spawner: SpawnScheduler,
    colors: ColorTransitionEngine,
    background: BackgroundTint,
    accent: u32,
    frame: FieldFrame,
    rng: StdRng,
}

impl<G: GpuRenderer, H: Host> BubbleRenderer<G, H> {
    pub fn new(gpu: G, host: H, config: FieldConfig) -> Self {
        let geometry = FieldGeometry::new(host.viewport(), host.device_pixel_ratio(), &config);
        let mut particles = ParticleStore::new(config.capacity);
        particles.reset(&geometry);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            gpu,
            host,
            lifecycle: Lifecycle::Uninitialized,
            gpu_status: GpuStatus::Inert,
            geometry,
            particles,
            spawner: SpawnScheduler::new(config.spawn_interval_ms, config.spawn_delta_cap_ms),
            colors: ColorTransitionEngine::new(config.fallback_gray, config.default_palette.clone()),
            background: BackgroundTint::new(BASE_BACKGROUND),
            accent: 0xFFFFFF,
            frame: FieldFrame::default(),
            rng,
            config,
        }
    }

    /// Builds the surface and pipeline and parks the particle pool. Repeat
    /// calls, and calls after [`destroy`](Self::destroy), do nothing.
    pub fn create(&mut self) {
        if self.lifecycle != Lifecycle::Uninitialized {
            return;
        }
        self.geometry = FieldGeometry::new(
            self.host.viewport(),
            self.host.device_pixel_ratio(),
            &self.config,
        );
        self.gpu_status = match self.gpu.init(self.geometry.surface_size()) {
            Ok(()) => GpuStatus::Ready,
            Err(err) => {
                warn!("bubble field running without GPU output: {err}");
                GpuStatus::Inert
            }
        };
        self.particles.reset(&self.geometry);
        self.spawner.reset();
        self.lifecycle = Lifecycle::Created;
        info!(
            "bubble field created at {}x{} (capacity {}, gpu {:?})",
            self.geometry.width,
            self.geometry.height,
            self.particles.capacity(),
            self.gpu_status
        );
    }

    /// Releases GPU resources. Safe to call any number of times.
    pub fn destroy(&mut self) {
        match self.lifecycle {
            Lifecycle::Destroyed => return,
            Lifecycle::Created => self.gpu.release(),
            Lifecycle::Uninitialized => {}
        }
        self.gpu_status = GpuStatus::Inert;
        self.lifecycle = Lifecycle::Destroyed;
        info!("bubble field destroyed");
    }

    /// Advances one frame: spawn, physics, colors, draw.
    pub fn update(&mut self, delta_ms: f64) {
        if self.lifecycle != Lifecycle::Created {
            return;
        }
        let delta_ms = delta_ms.clamp(0.0, self.config.spawn_delta_cap_ms);
        if self.spawner.tick(delta_ms, !self.particles.is_full()) {
            if let Some(slot) =
                self.particles
                    .activate_next(&mut self.rng, &self.geometry, &self.config)
            {
                debug!(slot, "bubble released");
            }
        }

        let report = physics::step(
            &mut self.particles,
            delta_ms,
            &self.geometry,
            &self.config.physics,
            &mut self.rng,
        );
        if report.recycled > 0 {
            debug!(recycled = report.recycled, "bubbles recycled");
        }

        let now = self.host.now_ms();
        self.colors.update(now);
        self.background.update(now);
        self.render();
    }

    fn render(&mut self) {
        if self.gpu_status != GpuStatus::Ready {
            return;
        }
        let uniforms = &mut self.frame.uniforms;
        uniforms.resolution = [self.geometry.width, self.geometry.height];
        uniforms.threshold = self.config.field.threshold;
        uniforms.band = self.config.field.band;
        self.particles.write_uniforms(&mut uniforms.bubbles);
        self.colors.write_uniforms(&mut uniforms.colors);
        self.frame.backdrop = self.background.current().to_array();

        if let Err(err) = self.gpu.render_frame(&self.frame) {
            self.degrade("render", err);
        }
    }

    fn degrade(&mut self, during: &str, err: PlatformError) {
        warn!("bubble field {during} failed, drawing suspended: {err}");
        self.gpu_status = GpuStatus::Inert;
    }

    /// Host viewport changed. The backing buffer follows; bubble positions
    /// keep their old coordinates until they recycle.
    pub fn on_resize(&mut self, width: f64, height: f64) {
        if self.lifecycle != Lifecycle::Created {
            return;
        }
        let dpr = self.host.device_pixel_ratio();
        self.geometry = FieldGeometry::new((width, height), dpr, &self.config);
        if self.gpu_status == GpuStatus::Ready {
            if let Err(err) = self.gpu.resize(self.geometry.surface_size()) {
                self.degrade("resize", err);
            }
        }
    }

    /// Re-runs GPU init after a loss. Accumulated simulation state is drawn
    /// from the next frame on.
    pub fn restore_context(&mut self) -> bool {
        if self.lifecycle != Lifecycle::Created {
            return false;
        }
        if self.gpu_status == GpuStatus::Ready {
            return true;
        }
        match self.gpu.init(self.geometry.surface_size()) {
            Ok(()) => {
                info!("bubble field GPU context restored");
                self.gpu_status = GpuStatus::Ready;
                true
            }
            Err(err) => {
                warn!("bubble field GPU restore failed: {err}");
                false
            }
        }
    }

    fn accepts_commands(&self) -> bool {
        self.lifecycle != Lifecycle::Destroyed
    }

    /// Eased full-palette transition.
    pub fn transition_to_colors(&mut self, colors: &[u32]) {
        if !self.accepts_commands() {
            return;
        }
        let now = self.host.now_ms();
        self.colors
            .transition_to_palette(colors, self.config.palette_transition_ms, now);
    }

    /// Near-immediate full-palette push used for live previews.
    pub fn set_colors(&mut self, colors: &[u32]) {
        if !self.accepts_commands() {
            return;
        }
        let now = self.host.now_ms();
        self.colors
            .transition_to_palette(colors, self.config.live_transition_ms, now);
    }

    /// Desaturates the field while connectivity is degraded.
    pub fn transition_to_grayscale(&mut self) {
        if !self.accepts_commands() {
            return;
        }
        let now = self.host.now_ms();
        self.colors
            .enter_grayscale(self.config.palette_transition_ms, now);
    }

    pub fn restore_colors(&mut self) {
        if !self.accepts_commands() {
            return;
        }
        let now = self.host.now_ms();
        self.colors
            .exit_grayscale(self.config.palette_transition_ms, now);
    }

    /// Applies a subject's palette: bubbles ease over, the background tint
    /// fades when one is given. A subject with fewer than two swatches gets
    /// the neutral subject fallback, background included.
    pub fn apply_palette(&mut self, bubbles: &[u32], background: Option<u32>) {
        if !self.accepts_commands() {
            return;
        }
        if bubbles.len() < 2 {
            debug!(swatches = bubbles.len(), "subject palette too short, using fallback");
            let fallback = self.config.subject_fallback.clone();
            let fallback_background = self.config.subject_fallback_background;
            self.transition_to_colors(&fallback);
            self.transition_background(fallback_background);
            return;
        }
        self.transition_to_colors(bubbles);
        if let Some(color) = background {
            self.transition_background(color);
        }
    }

    pub fn transition_background(&mut self, color: u32) {
        if !self.accepts_commands() {
            return;
        }
        let now = self.host.now_ms();
        self.background
            .fade_to(color, self.config.background_fade_ms, now);
    }

    /// Starts a palette-editing session seeded from the subject's bubbles.
    pub fn begin_live_edit(&mut self, palette: &[u32]) {
        if !self.accepts_commands() {
            return;
        }
        self.colors.begin_live_edit(palette);
    }

    /// Live edit of one swatch: 0-3 recolor the bubbles, 4 sets the
    /// background, 5 the icon accent. Other indices are ignored.
    pub fn set_live_swatch(&mut self, index: usize, color: u32) {
        if !self.accepts_commands() {
            return;
        }
        match index {
            BACKGROUND_SWATCH => self.background.set(color),
            ACCENT_SWATCH => self.accent = color & 0xFF_FFFF,
            _ => {
                let now = self.host.now_ms();
                if !self
                    .colors
                    .set_live_swatch(index, color, self.config.live_transition_ms, now)
                {
                    debug!(index, "live swatch index out of range");
                }
            }
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Whether frames currently reach the GPU.
    pub fn is_rendering(&self) -> bool {
        self.lifecycle == Lifecycle::Created && self.gpu_status == GpuStatus::Ready
    }

    pub fn active_count(&self) -> usize {
        self.particles.active_count()
    }

    pub fn particles(&self) -> &ParticleStore {
        &self.particles
    }

    pub fn current_colors(&self) -> &ColorTable {
        self.colors.current()
    }

    pub fn color_engine(&self) -> &ColorTransitionEngine {
        &self.colors
    }

    pub fn background(&self) -> Vec3 {
        self.background.current()
    }

    pub fn accent(&self) -> u32 {
        self.accent
    }

    pub fn geometry(&self) -> &FieldGeometry {
        &self.geometry
    }
}

impl<G: GpuRenderer, H: Host> Drop for BubbleRenderer<G, H> {
    fn drop(&mut self) {
        self.destroy();
    }
}
