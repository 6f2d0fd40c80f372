//! GPU raster backend powered by `vello` on `wgpu` (crate feature `gpu`).
//!
//! Produces the same geometry as the CPU backend from the same
//! [`RenderPlan`]; anti-aliasing differences between the two pipelines are
//! expected and tolerated.

use crate::{
    foundation::error::{KinemaError, KinemaResult},
    render::backend::{Frame, RenderBackend, RenderPlan},
    scene::style::FillRule,
};

pub struct GpuBackend {
    device: Option<vello::wgpu::Device>,
    queue: Option<vello::wgpu::Queue>,
    renderer: Option<vello::Renderer>,
    scene: vello::Scene,

    target: Option<vello::wgpu::Texture>,
    target_view: Option<vello::wgpu::TextureView>,
    readback: Option<vello::wgpu::Buffer>,
    readback_bytes_per_row: u32,
    width: u32,
    height: u32,
}

impl GpuBackend {
    pub fn new() -> KinemaResult<Self> {
        Ok(Self {
            device: None,
            queue: None,
            renderer: None,
            scene: vello::Scene::new(),
            target: None,
            target_view: None,
            readback: None,
            readback_bytes_per_row: 0,
            width: 0,
            height: 0,
        })
    }

    fn ensure_init(&mut self, width: u32, height: u32) -> KinemaResult<()> {
        if self.device.is_some() && self.width == width && self.height == height {
            return Ok(());
        }

        let instance = vello::wgpu::Instance::new(&vello::wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(
            &vello::wgpu::RequestAdapterOptions {
                power_preference: vello::wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            },
        ))
        .map_err(|e| match e {
            vello::wgpu::RequestAdapterError::NotFound { .. } => {
                KinemaError::render("no gpu adapter available")
            }
            other => KinemaError::render(format!("wgpu request_adapter failed: {other:?}")),
        })?;

        let (device, queue) =
            pollster::block_on(adapter.request_device(&vello::wgpu::DeviceDescriptor {
                label: None,
                required_features: vello::wgpu::Features::empty(),
                required_limits: vello::wgpu::Limits::default(),
                experimental_features: vello::wgpu::ExperimentalFeatures::default(),
                memory_hints: vello::wgpu::MemoryHints::Performance,
                trace: vello::wgpu::Trace::Off,
            }))
            .map_err(|e| KinemaError::render(format!("wgpu request_device failed: {e:?}")))?;

        let renderer = vello::Renderer::new(&device, vello::RendererOptions::default())
            .map_err(|e| KinemaError::render(format!("vello renderer init failed: {e:?}")))?;

        let texture = device.create_texture(&vello::wgpu::TextureDescriptor {
            label: Some("kinema_target"),
            size: vello::wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: vello::wgpu::TextureDimension::D2,
            format: vello::wgpu::TextureFormat::Rgba8Unorm,
            usage: vello::wgpu::TextureUsages::STORAGE_BINDING
                | vello::wgpu::TextureUsages::TEXTURE_BINDING
                | vello::wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&vello::wgpu::TextureViewDescriptor::default());

        let bytes_per_row_unpadded = width
            .checked_mul(4)
            .ok_or_else(|| KinemaError::render("render target width overflow"))?;
        let bytes_per_row = align_to(
            bytes_per_row_unpadded,
            vello::wgpu::COPY_BYTES_PER_ROW_ALIGNMENT,
        );
        let buffer_size = (bytes_per_row as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| KinemaError::render("readback buffer size overflow"))?;

        let readback = device.create_buffer(&vello::wgpu::BufferDescriptor {
            label: Some("kinema_readback"),
            size: buffer_size,
            usage: vello::wgpu::BufferUsages::MAP_READ | vello::wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        self.device = Some(device);
        self.queue = Some(queue);
        self.renderer = Some(renderer);
        self.target = Some(texture);
        self.target_view = Some(view);
        self.readback = Some(readback);
        self.readback_bytes_per_row = bytes_per_row;
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn encode_plan(&mut self, plan: &RenderPlan) {
        self.scene.reset();
        for op in &plan.ops {
            if let Some((color, rule)) = op.fill {
                self.scene.fill(
                    fill_rule_to_gpu(rule),
                    op.transform,
                    color_to_gpu(color),
                    None,
                    &op.path,
                );
            }
            if let Some((color, width_px)) = op.stroke {
                self.scene.stroke(
                    &kurbo::Stroke::new(width_px),
                    op.transform,
                    color_to_gpu(color),
                    None,
                    &op.path,
                );
            }
        }
    }
}

impl RenderBackend for GpuBackend {
    fn render_plan(&mut self, plan: &RenderPlan) -> KinemaResult<Frame> {
        self.ensure_init(plan.canvas.width, plan.canvas.height)?;
        self.encode_plan(plan);

        let device = self
            .device
            .as_ref()
            .ok_or_else(|| KinemaError::render("gpu backend not initialized"))?;
        let queue = self
            .queue
            .as_ref()
            .ok_or_else(|| KinemaError::render("gpu backend not initialized"))?;
        let view = self
            .target_view
            .as_ref()
            .ok_or_else(|| KinemaError::render("gpu backend not initialized"))?;

        let [r, g, b, a] = plan.clear_rgba;
        let base_color = vello::peniko::Color::from_rgba8(r, g, b, a);

        let renderer = self
            .renderer
            .as_mut()
            .ok_or_else(|| KinemaError::render("gpu backend not initialized"))?;
        renderer
            .render_to_texture(
                device,
                queue,
                &self.scene,
                view,
                &vello::RenderParams {
                    base_color,
                    width: plan.canvas.width,
                    height: plan.canvas.height,
                    antialiasing_method: vello::AaConfig::Area,
                },
            )
            .map_err(|e| KinemaError::render(format!("vello render failed: {e:?}")))?;

        let texture = self
            .target
            .as_ref()
            .ok_or_else(|| KinemaError::render("gpu backend not initialized"))?;
        let readback = self
            .readback
            .as_ref()
            .ok_or_else(|| KinemaError::render("gpu backend not initialized"))?;

        let mut encoder = device.create_command_encoder(&vello::wgpu::CommandEncoderDescriptor {
            label: Some("kinema_readback_encoder"),
        });
        encoder.copy_texture_to_buffer(
            vello::wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: vello::wgpu::Origin3d::ZERO,
                aspect: vello::wgpu::TextureAspect::All,
            },
            vello::wgpu::TexelCopyBufferInfo {
                buffer: readback,
                layout: vello::wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(self.readback_bytes_per_row),
                    rows_per_image: Some(plan.canvas.height),
                },
            },
            vello::wgpu::Extent3d {
                width: plan.canvas.width,
                height: plan.canvas.height,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(Some(encoder.finish()));

        let buffer_slice = readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(vello::wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        device
            .poll(vello::wgpu::PollType::wait_indefinitely())
            .map_err(|e| KinemaError::render(format!("wgpu poll failed: {e:?}")))?;
        rx.recv()
            .map_err(|_| KinemaError::render("readback channel closed"))?
            .map_err(|e| KinemaError::render(format!("readback map failed: {e:?}")))?;

        let mapped = buffer_slice.get_mapped_range();
        let row_bytes = (plan.canvas.width as usize) * 4;
        let padded_row_bytes = self.readback_bytes_per_row as usize;
        let mut out = Vec::with_capacity(row_bytes * plan.canvas.height as usize);
        for row in 0..plan.canvas.height as usize {
            let start = row * padded_row_bytes;
            out.extend_from_slice(&mapped[start..start + row_bytes]);
        }
        drop(mapped);
        readback.unmap();

        let frame = Frame {
            width: plan.canvas.width,
            height: plan.canvas.height,
            data: out,
            premultiplied: true,
            index: plan.index,
            timestamp_secs: plan.timestamp_secs,
        };
        frame.validate()?;
        Ok(frame)
    }
}

fn align_to(value: u32, alignment: u32) -> u32 {
    let mask = alignment - 1;
    (value + mask) & !mask
}

fn color_to_gpu(rgba: [u8; 4]) -> vello::peniko::Color {
    vello::peniko::Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3])
}

fn fill_rule_to_gpu(rule: FillRule) -> vello::peniko::Fill {
    match rule {
        FillRule::NonZero => vello::peniko::Fill::NonZero,
        FillRule::EvenOdd => vello::peniko::Fill::EvenOdd,
    }
}
