use wgpu::{BindGroup, BindGroupLayout, Device, Queue, RenderPipeline, Sampler, Surface, SurfaceConfiguration, Texture};
use winit::keyboard::ModifiersState;

cfg_if::cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        use web_time::{Duration, Instant};
    } else {
        use std::time::{Duration, Instant};
    }
}

pub const CARET_BLINK: Duration = Duration::from_millis(500);
pub const DOUBLE_CLICK: Duration = Duration::from_millis(400);
const DOUBLE_CLICK_SLOP: f32 = 4.0;

pub struct GpuContext {
    pub surface: Surface<'static>,
    pub device: Device,
    pub queue: Queue,
    pub config: SurfaceConfiguration,
    pub frame_pipeline: RenderPipeline,
    pub frame_layout: BindGroupLayout,
    pub sampler: Sampler,
}

pub struct FrameTexture {
    pub texture: Texture,
    pub bind_group: BindGroup,
    pub size: (u32, u32),
}

impl FrameTexture {
    pub fn new(gpu_device: &Device, layout: &BindGroupLayout, sampler: &Sampler, size: (u32, u32)) -> Self {
        let texture = gpu_device.create_texture(&wgpu::TextureDescriptor {
            label: Some("frame texture"),
            size: wgpu::Extent3d {
                width: size.0.max(1),
                height: size.1.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = gpu_device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            label: Some("frame bind group"),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });
        Self {
            texture,
            bind_group,
            size: (size.0.max(1), size.1.max(1)),
        }
    }

    pub fn upload(&self, queue: &Queue, rgba: &[u8]) {
        let (width, height) = self.size;
        if rgba.len() != (width * height * 4) as usize {
            log::warn!("Frame of {} bytes does not match a {width}x{height} texture", rgba.len());
            return;
        }
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }
}

pub struct InputState {
    pub mouse_pos: [f32; 2],
    pub modifiers: ModifiersState,
    pub left_down: bool,
    pub over_canvas: bool,
    pub last_click: Option<(Instant, [f32; 2])>,
    // Set on the second press of a double click, consumed on release.
    pub pending_double_click: Option<[f32; 2]>,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            mouse_pos: [0.0; 2],
            modifiers: ModifiersState::empty(),
            left_down: false,
            over_canvas: false,
            last_click: None,
            pending_double_click: None,
        }
    }

    pub fn register_click(&mut self, pos: [f32; 2]) -> bool {
        let now = Instant::now();
        let double = self.last_click.is_some_and(|(at, p)| {
            now.duration_since(at) <= DOUBLE_CLICK
                && (pos[0] - p[0]).abs() <= DOUBLE_CLICK_SLOP
                && (pos[1] - p[1]).abs() <= DOUBLE_CLICK_SLOP
        });
        self.last_click = if double { None } else { Some((now, pos)) };
        double
    }
}

pub struct CaretBlink {
    pub blink_timer: Instant,
}

impl CaretBlink {
    pub fn new() -> Self {
        Self {
            blink_timer: Instant::now(),
        }
    }

    pub fn restart(&mut self) {
        self.blink_timer = Instant::now();
    }

    pub fn due(&mut self) -> bool {
        if self.blink_timer.elapsed() > CARET_BLINK {
            self.blink_timer = Instant::now();
            return true;
        }
        false
    }
}

pub struct AutosaveTimer {
    pub last_write: Option<Instant>,
}

impl AutosaveTimer {
    pub const INTERVAL: Duration = Duration::from_secs(1);

    pub fn ready(&self) -> bool {
        self.last_write.is_none_or(|at| at.elapsed() >= Self::INTERVAL)
    }

    pub fn mark(&mut self) {
        self.last_write = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_nearby_press_is_a_double_click() {
        let mut input = InputState::new();
        assert!(!input.register_click([10.0, 10.0]));
        assert!(input.register_click([12.0, 11.0]));
        // A third press starts over.
        assert!(!input.register_click([12.0, 11.0]));
    }

    #[test]
    fn distant_presses_are_separate_clicks() {
        let mut input = InputState::new();
        assert!(!input.register_click([10.0, 10.0]));
        assert!(!input.register_click([40.0, 10.0]));
    }
}
