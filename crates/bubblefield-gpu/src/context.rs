use bubblefield_platform::{FieldUniforms, PlatformError, Result, ShaderStage, SurfaceSize};
use pollster::block_on;
use tracing::{info, warn};
use wgpu::util::DeviceExt;

use crate::shaders::{
    FIELD_FRAGMENT_WGSL, FIELD_VERTEX_WGSL, FRAGMENT_ENTRY, FULL_SCREEN_QUAD, VERTEX_ENTRY,
};
use crate::BackdropMode;

const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

/// Adapter requests in order of preference: the capable discrete path
/// first, then whatever baseline adapter the platform offers.
const ADAPTER_PREFERENCES: [(wgpu::PowerPreference, bool); 3] = [
    (wgpu::PowerPreference::HighPerformance, false),
    (wgpu::PowerPreference::LowPower, false),
    (wgpu::PowerPreference::None, true),
];

pub(crate) struct GpuContext {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    quad_buffer: wgpu::Buffer,
}

impl std::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext")
            .field("width", &self.config.width)
            .field("height", &self.config.height)
            .field("format", &self.config.format)
            .finish_non_exhaustive()
    }
}

impl GpuContext {
    pub(crate) fn new<W>(window: W, size: SurfaceSize, backdrop: BackdropMode) -> Result<Self>
    where
        W: wgpu::WindowHandle + 'static,
    {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
            .map_err(|err| PlatformError::ContextUnavailable(err.to_string()))?;
        let adapter = request_adapter(&instance, &surface)?;
        let (device, queue) = request_device(&adapter)?;

        let caps = surface.get_capabilities(&adapter);
        let mut config = surface
            .get_default_config(&adapter, size.width, size.height)
            .ok_or_else(|| {
                PlatformError::ContextUnavailable("surface not supported by adapter".into())
            })?;
        // Packed colors are display values; write them without sRGB encoding.
        if let Some(format) = caps.formats.iter().copied().find(|f| !f.is_srgb()) {
            config.format = format;
        }
        config.alpha_mode = pick_alpha_mode(&caps.alpha_modes, backdrop);
        surface.configure(&device, &config);

        let vertex = compile(&device, ShaderStage::Vertex, FIELD_VERTEX_WGSL)?;
        let fragment = compile(&device, ShaderStage::Fragment, FIELD_FRAGMENT_WGSL)?;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bubblefield-field-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("bubblefield-field-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("bubblefield-field-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex,
                entry_point: Some(VERTEX_ENTRY),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &QUAD_ATTRIBUTES,
                }],
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &fragment,
                entry_point: Some(FRAGMENT_ENTRY),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
            cache: None,
        });
        if let Some(err) = block_on(device.pop_error_scope()) {
            return Err(PlatformError::ShaderCompile {
                stage: ShaderStage::Link,
                message: err.to_string(),
            });
        }

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("bubblefield-field-uniforms"),
            size: std::mem::size_of::<FieldUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bubblefield-field-bind-group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("bubblefield-quad"),
            contents: bytemuck::cast_slice(&FULL_SCREEN_QUAD[..]),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            uniform_buffer,
            bind_group,
            quad_buffer,
        })
    }

    pub(crate) fn resize(&mut self, size: SurfaceSize) {
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
    }

    pub(crate) fn draw(&mut self, uniforms: &FieldUniforms, clear: wgpu::Color) -> Result<()> {
        let Some(frame) = self.acquire()? else {
            return Ok(());
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("bubblefield-frame"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("bubblefield-field-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
            pass.draw(0..FULL_SCREEN_QUAD.len() as u32, 0..1);
        }
        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    /// Next swapchain image. `None` means skip this frame; an outdated or
    /// lost surface gets one reconfigure before it counts as lost.
    fn acquire(&mut self) -> Result<Option<wgpu::SurfaceTexture>> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(Some(frame)),
            Err(wgpu::SurfaceError::Timeout) => Ok(None),
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                self.surface.configure(&self.device, &self.config);
                match self.surface.get_current_texture() {
                    Ok(frame) => Ok(Some(frame)),
                    Err(err) => {
                        warn!("surface still unavailable after reconfigure: {err}");
                        Err(PlatformError::SurfaceLost)
                    }
                }
            }
            Err(err) => Err(PlatformError::Surface(err.to_string())),
        }
    }
}

fn request_adapter(instance: &wgpu::Instance, surface: &wgpu::Surface<'_>) -> Result<wgpu::Adapter> {
    let mut last_error = String::from("no adapter requested");
    for (power_preference, force_fallback_adapter) in ADAPTER_PREFERENCES {
        match block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            force_fallback_adapter,
            compatible_surface: Some(surface),
        })) {
            Ok(adapter) => {
                let info = adapter.get_info();
                info!(
                    "GPU adapter: {} ({:?}, {:?})",
                    info.name, info.backend, power_preference
                );
                return Ok(adapter);
            }
            Err(err) => {
                warn!("no {power_preference:?} adapter (fallback={force_fallback_adapter}): {err}");
                last_error = err.to_string();
            }
        }
    }
    Err(PlatformError::ContextUnavailable(last_error))
}

/// Default limits first; downlevel limits cover GLES-class hardware.
fn request_device(adapter: &wgpu::Adapter) -> Result<(wgpu::Device, wgpu::Queue)> {
    let attempts = [
        wgpu::Limits::default(),
        wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits()),
    ];
    let mut last_error = String::new();
    for required_limits in attempts {
        match block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("bubblefield-device"),
            required_features: wgpu::Features::empty(),
            required_limits,
            memory_hints: wgpu::MemoryHints::default(),
            ..Default::default()
        })) {
            Ok(pair) => return Ok(pair),
            Err(err) => {
                warn!("device request failed, trying baseline limits: {err}");
                last_error = err.to_string();
            }
        }
    }
    Err(PlatformError::ContextUnavailable(last_error))
}

fn compile(device: &wgpu::Device, stage: ShaderStage, source: &str) -> Result<wgpu::ShaderModule> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(shader_label(stage)),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    match block_on(device.pop_error_scope()) {
        Some(err) => Err(PlatformError::ShaderCompile {
            stage,
            message: err.to_string(),
        }),
        None => Ok(module),
    }
}

fn shader_label(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "bubblefield-field-vertex",
        ShaderStage::Fragment => "bubblefield-field-fragment",
        ShaderStage::Link => "bubblefield-field-link",
    }
}

/// Alpha blending onto a transparent clear leaves premultiplied color in the
/// target, so the compositor is asked to treat it that way.
pub(crate) fn pick_alpha_mode(
    supported: &[wgpu::CompositeAlphaMode],
    backdrop: BackdropMode,
) -> wgpu::CompositeAlphaMode {
    let preferred: &[wgpu::CompositeAlphaMode] = match backdrop {
        BackdropMode::Transparent => &[
            wgpu::CompositeAlphaMode::PreMultiplied,
            wgpu::CompositeAlphaMode::Inherit,
            wgpu::CompositeAlphaMode::PostMultiplied,
        ],
        BackdropMode::Opaque => &[wgpu::CompositeAlphaMode::Opaque],
    };
    preferred
        .iter()
        .copied()
        .find(|mode| supported.contains(mode))
        .or_else(|| supported.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::CompositeAlphaMode as Mode;

    #[test]
    fn transparent_prefers_premultiplied_alpha() {
        let supported = [Mode::Opaque, Mode::PostMultiplied, Mode::PreMultiplied];
        assert_eq!(
            pick_alpha_mode(&supported, BackdropMode::Transparent),
            Mode::PreMultiplied
        );
        assert_eq!(
            pick_alpha_mode(&[Mode::Opaque, Mode::PostMultiplied], BackdropMode::Transparent),
            Mode::PostMultiplied
        );
    }

    #[test]
    fn every_shader_stage_has_its_own_label() {
        let labels = [
            shader_label(ShaderStage::Vertex),
            shader_label(ShaderStage::Fragment),
            shader_label(ShaderStage::Link),
        ];
        assert_eq!(labels[2], "bubblefield-field-link");
        assert!(labels[0] != labels[1] && labels[1] != labels[2]);
    }

    #[test]
    fn falls_back_to_first_supported_mode() {
        assert_eq!(
            pick_alpha_mode(&[Mode::Opaque], BackdropMode::Transparent),
            Mode::Opaque
        );
        assert_eq!(pick_alpha_mode(&[], BackdropMode::Opaque), Mode::Auto);
    }

    #[test]
    fn opaque_backdrop_picks_opaque() {
        let supported = [Mode::PreMultiplied, Mode::Opaque];
        assert_eq!(pick_alpha_mode(&supported, BackdropMode::Opaque), Mode::Opaque);
    }
}
