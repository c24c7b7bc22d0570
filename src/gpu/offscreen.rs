//! Headless post-processing: upload a canvas, run the scanline pass into a
//! texture and read the result back.

use std::sync::Arc;

use wgpu::{BindGroup, Device, Queue};

use super::postprocess::ScanlinePass;
use super::shader::ShaderError;
use super::textures::{ReadbackBuffer, RenderTarget, FRAME_FORMAT};
use super::{GpuContext, GpuError};
use crate::visualizations::Canvas;

pub struct OffscreenRenderer {
    device: Arc<Device>,
    queue: Arc<Queue>,
    frame: RenderTarget,
    output: RenderTarget,
    readback: ReadbackBuffer,
    pass: ScanlinePass,
    bind_group: BindGroup,
}

impl OffscreenRenderer {
    pub fn new(
        ctx: &GpuContext,
        width: u32,
        height: u32,
        shader_source: &str,
        grid_spacing: f32,
    ) -> Result<Self, ShaderError> {
        let device = Arc::clone(&ctx.device);
        let queue = Arc::clone(&ctx.queue);

        let frame = RenderTarget::for_frame(&device, width, height);
        let output = RenderTarget::for_output(&device, "offscreen_output", width, height);
        let readback = ReadbackBuffer::new(&device, width, height);
        let pass = ScanlinePass::new(&device, shader_source, FRAME_FORMAT, grid_spacing)?;
        let bind_group = pass.bind_frame(&device, frame.view());

        Ok(Self {
            device,
            queue,
            frame,
            output,
            readback,
            pass,
            bind_group,
        })
    }

    /// Post-process `canvas` and return RGBA8 rows. The canvas must match
    /// the renderer's size.
    pub fn render(&self, canvas: &Canvas, time: f32, overlay: bool) -> Result<Vec<u8>, GpuError> {
        debug_assert_eq!((canvas.width(), canvas.height()), self.frame.size());
        self.frame.upload(&self.queue, canvas.as_raw());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("offscreen_encoder"),
            });
        self.pass.apply(
            &self.queue,
            &mut encoder,
            &self.bind_group,
            self.output.view(),
            time,
            overlay,
        );
        self.readback.copy_from(&mut encoder, &self.output);
        self.queue.submit(std::iter::once(encoder.finish()));

        self.readback.read_pixels(&self.device)
    }
}
