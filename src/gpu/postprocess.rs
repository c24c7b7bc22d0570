//! Scanline post-processing pass.
//!
//! A single full-screen fragment pass that reads the uploaded canvas and
//! writes the final image:
//! 1. Sample the canvas unchanged
//! 2. Pulse every tenth row toward yellow
//! 3. Draw the diagnostic grid when the overlay is on

use wgpu::{
    BindGroup, BindGroupLayout, Buffer, Device, Queue, RenderPipeline, Sampler, TextureFormat,
    TextureView,
};

use super::layouts::{create_scanline_layout, FrameBinding, FRAME_GROUP};
use super::shader::{validate_wgsl, ShaderError, FRAGMENT_ENTRY, VERTEX_ENTRY};

/// Uniform data for the scanline pass.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct ScanlineUniforms {
    time: f32,
    overlay: u32,
    grid_spacing: f32,
    _padding: f32,
}

/// Compiled scanline pipeline plus its uniforms and sampler.
pub struct ScanlinePass {
    pipeline: RenderPipeline,
    bind_group_layout: BindGroupLayout,
    uniform_buffer: Buffer,
    sampler: Sampler,
    grid_spacing: f32,
}

impl ScanlinePass {
    /// Validate `source` and build the pipeline for `target_format`.
    pub fn new(
        device: &Device,
        source: &str,
        target_format: TextureFormat,
        grid_spacing: f32,
    ) -> Result<Self, ShaderError> {
        validate_wgsl(source)?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scanline_shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let bind_group_layout = create_scanline_layout(device);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scanline_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scanline_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(VERTEX_ENTRY),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(FRAGMENT_ENTRY),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scanline_uniforms"),
            size: std::mem::size_of::<ScanlineUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Nearest so canvas pixels land unfiltered on same-sized outputs
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("scanline_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Ok(Self {
            pipeline,
            bind_group_layout,
            uniform_buffer,
            sampler,
            grid_spacing,
        })
    }

    /// Bind group reading from `frame_view`. Rebuild when the frame texture
    /// is recreated.
    pub fn bind_frame(&self, device: &Device, frame_view: &TextureView) -> BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scanline_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: FrameBinding::Uniforms.index(),
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: FrameBinding::Frame.index(),
                    resource: wgpu::BindingResource::TextureView(frame_view),
                },
                wgpu::BindGroupEntry {
                    binding: FrameBinding::Sampler.index(),
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    /// Record the pass from the bound frame into `output_view`.
    pub fn apply(
        &self,
        queue: &Queue,
        encoder: &mut wgpu::CommandEncoder,
        frame: &BindGroup,
        output_view: &TextureView,
        time: f32,
        overlay: bool,
    ) {
        let uniforms = ScanlineUniforms {
            time,
            overlay: overlay as u32,
            grid_spacing: self.grid_spacing,
            _padding: 0.0,
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scanline_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output_view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(FRAME_GROUP, frame, &[]);
        pass.draw(0..3, 0..1);
    }

    pub fn grid_spacing(&self) -> f32 {
        self.grid_spacing
    }
}
