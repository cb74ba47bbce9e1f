use crate::canvas::CanvasTransform;
use crate::editor::Editor;
use crate::state::{AutosaveTimer, CaretBlink, FrameTexture, GpuContext, InputState};
use crate::ui::{TOOLBAR_HEIGHT, UiRenderer};
use anyhow::Context;
use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use winit::dpi::PhysicalSize;
use winit::window::Window;

pub const WORKSPACE_MARGIN: f32 = 20.0;

pub struct HostLink {
    pub autosave_due: Rc<Cell<bool>>,
    pub autosave_path: Option<PathBuf>,
    pub padding: f32,
}

pub struct State {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,

    pub gpu: GpuContext,
    pub frame: FrameTexture,
    pub canvas: CanvasTransform,
    pub input: InputState,
    pub caret: CaretBlink,
    pub autosave: AutosaveTimer,
    pub host: HostLink,

    pub editor: Editor,
    pub ui: UiRenderer,
    pub needs_compose: bool,
}

impl State {
    pub async fn new(window: Arc<Window>, editor: Editor, host: HostLink) -> anyhow::Result<State> {
        let mut size = window.inner_size();

        #[cfg(target_arch = "wasm32")]
        {
            if size.width == 0 || size.height == 0 {
                let surface = editor.surface();
                size = PhysicalSize::new(surface.width + 40, surface.height + TOOLBAR_HEIGHT as u32 + 40);
            }
        }
        size.width = size.width.max(1);
        size.height = size.height.max(1);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("creating window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("requesting GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps.present_modes.first().copied().unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("frame sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Frame Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../data/shaders/frame_shader.wgsl").into()),
        });

        let frame_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Frame Pipeline Layout"),
            bind_group_layouts: &[&frame_layout],
            push_constant_ranges: &[],
        });

        let frame_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Frame Pipeline"),
            layout: Some(&frame_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let frame = FrameTexture::new(&device, &frame_layout, &sampler, (size.width, size.height));

        let gpu = GpuContext {
            surface,
            device,
            queue,
            config,
            frame_pipeline,
            frame_layout,
            sampler,
        };

        let surface = editor.surface();
        let canvas = fit_canvas((surface.width, surface.height), size, host.padding);
        log::info!(
            "Window {}x{}, canvas {}x{} at scale {:.2}",
            size.width,
            size.height,
            surface.width,
            surface.height,
            canvas.scale
        );

        Ok(Self {
            window,
            size,
            gpu,
            frame,
            canvas,
            input: InputState::new(),
            caret: CaretBlink::new(),
            autosave: AutosaveTimer { last_write: None },
            host,
            editor,
            ui: UiRenderer::new(),
            needs_compose: true,
        })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }
}

pub fn fit_canvas(canvas: (u32, u32), window: PhysicalSize<u32>, padding: f32) -> CanvasTransform {
    CanvasTransform::fit(
        canvas,
        [0.0, TOOLBAR_HEIGHT],
        [window.width as f32, (window.height as f32 - TOOLBAR_HEIGHT).max(1.0)],
        WORKSPACE_MARGIN + padding,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_shrinks_a_tight_fit() {
        let window = PhysicalSize::new(840, 496);
        assert_eq!(fit_canvas((800, 400), window, 0.0).scale, 1.0);

        let padded = fit_canvas((800, 400), window, 30.0);
        assert_eq!(padded.scale, 0.85);
        assert_eq!(padded.canvas_to_screen([0.0, 0.0]), [80.0, 106.0]);
    }
}
