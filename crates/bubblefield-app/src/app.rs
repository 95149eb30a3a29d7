use std::sync::Arc;
use std::time::{Duration, Instant};

use bubblefield_core::{BubbleRenderer, FieldConfig};
use bubblefield_gpu::{BackdropMode, WgpuRenderer};
use crossbeam_channel::Receiver;
use tracing::{debug, error, info};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

use crate::driver::{spawn_demo_driver, BackdropCommand, PRESETS};
use crate::host::SystemHost;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

type FieldRenderer = BubbleRenderer<WgpuRenderer<Arc<Window>>, SystemHost>;

/// Longest frame the host forwards; anything longer is a suspend.
const MAX_FRAME_MS: f64 = 100.0;
const DRIVER_INTERVAL: Duration = Duration::from_secs(6);
const TRANSPARENT_ENV: &str = "BUBBLEFIELD_TRANSPARENT";
/// Minimum gap between GPU restore attempts while the field is inert.
const RESTORE_BACKOFF: Duration = Duration::from_secs(2);

struct Running {
    window: Arc<Window>,
    renderer: FieldRenderer,
    last_frame: Instant,
    last_restore: Instant,
}

pub struct BubblefieldApp {
    config: FieldConfig,
    commands: Receiver<BackdropCommand>,
    backdrop: BackdropMode,
    running: Option<Running>,
    preset: usize,
    network_issue: bool,
    live_editing: bool,
}

/// Open the window and run the frame loop until it is closed.
pub fn run_app(config: FieldConfig) -> Result<()> {
    let event_loop = EventLoop::new()?;
    let driver = spawn_demo_driver(DRIVER_INTERVAL);
    let backdrop = if std::env::var_os(TRANSPARENT_ENV).is_some() {
        BackdropMode::Transparent
    } else {
        BackdropMode::Opaque
    };
    let mut app = BubblefieldApp {
        config,
        commands: driver.commands,
        backdrop,
        running: None,
        preset: 0,
        network_issue: false,
        live_editing: false,
    };
    event_loop.run_app(&mut app)?;
    drop(app);
    debug!(
        finished = driver.thread.is_finished(),
        "demo driver detached"
    );
    Ok(())
}

impl BubblefieldApp {
    fn open(&mut self, event_loop: &ActiveEventLoop) -> Result<Running> {
        let attributes = Window::default_attributes()
            .with_title("Bubblefield")
            .with_transparent(self.backdrop == BackdropMode::Transparent)
            .with_inner_size(LogicalSize::new(
                self.config.logical_width as f64,
                self.config.logical_height as f64,
            ));
        let window = Arc::new(event_loop.create_window(attributes)?);
        let gpu = WgpuRenderer::new(window.clone(), self.backdrop);
        let host = SystemHost::new(window.clone());
        let mut renderer = BubbleRenderer::new(gpu, host, self.config.clone());
        renderer.create();
        let preset = &PRESETS[self.preset];
        renderer.apply_palette(preset.bubbles, Some(preset.background));
        Ok(Running {
            window,
            renderer,
            last_frame: Instant::now(),
            last_restore: Instant::now(),
        })
    }

    fn drain_commands(&mut self) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        while let Ok(command) = self.commands.try_recv() {
            match command {
                BackdropCommand::ApplyPalette {
                    bubbles,
                    background,
                } => {
                    self.live_editing = false;
                    running.renderer.apply_palette(&bubbles, background);
                }
                BackdropCommand::NetworkIssue(true) => {
                    self.network_issue = true;
                    running.renderer.transition_to_grayscale();
                }
                BackdropCommand::NetworkIssue(false) => {
                    self.network_issue = false;
                    running.renderer.restore_colors();
                }
            }
        }
    }

    fn frame(&mut self) {
        self.drain_commands();
        let Some(running) = self.running.as_mut() else {
            return;
        };
        let now = Instant::now();
        let delta_ms = (now - running.last_frame).as_secs_f64() * 1000.0;
        running.last_frame = now;
        if !running.renderer.is_rendering() && now - running.last_restore >= RESTORE_BACKOFF {
            running.last_restore = now;
            running.renderer.restore_context();
        }
        running.renderer.update(delta_ms.min(MAX_FRAME_MS));
        running.window.request_redraw();
    }

    fn resized(&mut self) {
        if let Some(running) = self.running.as_mut() {
            let scale = running.window.scale_factor();
            let logical = running.window.inner_size().to_logical::<f64>(scale);
            running.renderer.on_resize(logical.width, logical.height);
        }
    }

    fn key_pressed(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        match event.logical_key.as_ref() {
            Key::Named(NamedKey::Escape) => self.close(event_loop),
            Key::Named(NamedKey::Space) => {
                self.preset = (self.preset + 1) % PRESETS.len();
                self.live_editing = false;
                let preset = &PRESETS[self.preset];
                info!("palette: {}", preset.name);
                running
                    .renderer
                    .apply_palette(preset.bubbles, Some(preset.background));
            }
            Key::Character("g") | Key::Character("G") => {
                self.network_issue = !self.network_issue;
                if self.network_issue {
                    running.renderer.transition_to_grayscale();
                } else {
                    running.renderer.restore_colors();
                }
            }
            Key::Character(digit @ ("1" | "2" | "3" | "4")) => {
                let index = digit.parse::<usize>().unwrap_or(1) - 1;
                if !self.live_editing {
                    running.renderer.begin_live_edit(PRESETS[self.preset].bubbles);
                    self.live_editing = true;
                }
                let swatch = running.renderer.color_engine().live_palette()[index];
                let nudged = rotate_channels(swatch);
                debug!("live swatch {index}: {swatch:06x} -> {nudged:06x}");
                running.renderer.set_live_swatch(index, nudged);
            }
            _ => {}
        }
    }

    fn close(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut running) = self.running.take() {
            running.renderer.destroy();
        }
        event_loop.exit();
    }
}

/// `0xRRGGBB` -> `0xBBRRGG`: an obvious but palette-preserving edit.
fn rotate_channels(color: u32) -> u32 {
    ((color & 0xFF) << 16) | ((color >> 8) & 0xFFFF)
}

impl ApplicationHandler for BubblefieldApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match self.open(event_loop) {
            Ok(running) => {
                running.window.request_redraw();
                self.running = Some(running);
            }
            Err(err) => {
                error!("failed to open bubblefield window: {err}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("close requested");
                self.close(event_loop);
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => self.resized(),
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && !event.repeat =>
            {
                self.key_pressed(event_loop, &event);
            }
            WindowEvent::RedrawRequested => self.frame(),
            _ => {}
        }
    }
}
