//! Window presentation: canvas upload, scanline pass, present.

use std::sync::Arc;

use thiserror::Error;
use wgpu::{BindGroup, Surface, SurfaceConfiguration, TextureFormat};
use winit::window::Window;

use super::postprocess::ScanlinePass;
use super::shader::ShaderError;
use super::textures::RenderTarget;
use super::{GpuContext, GpuError};
use crate::visualizations::Canvas;

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error("Surface reports no supported formats")]
    NoSurfaceFormat,

    #[error("Surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

/// Prefer a linear (non-sRGB) format so shader output bytes equal the
/// canvas bytes outside the scanlines.
fn choose_format(formats: &[TextureFormat]) -> Option<TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|f| !f.is_srgb())
        .or_else(|| formats.first().copied())
}

pub struct Display {
    ctx: GpuContext,
    surface: Surface<'static>,
    config: SurfaceConfiguration,
    frame: RenderTarget,
    pass: ScanlinePass,
    bind_group: BindGroup,
}

impl Display {
    /// Set up the surface for `window` and a frame texture of
    /// `canvas_width` x `canvas_height`.
    pub fn new(
        window: Arc<Window>,
        canvas_width: u32,
        canvas_height: u32,
        shader_source: &str,
        grid_spacing: f32,
    ) -> Result<Self, DisplayError> {
        let size = window.inner_size();
        let (ctx, surface) = pollster::block_on(GpuContext::for_window(window))?;

        let caps = surface.get_capabilities(&ctx.adapter);
        let format = choose_format(&caps.formats).ok_or(DisplayError::NoSurfaceFormat)?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&ctx.device, &config);

        let frame = RenderTarget::for_frame(&ctx.device, canvas_width, canvas_height);
        let pass = ScanlinePass::new(&ctx.device, shader_source, format, grid_spacing)?;
        let bind_group = pass.bind_frame(&ctx.device, frame.view());

        log::info!(
            "Display surface {}x{} {:?}, canvas {}x{}",
            config.width,
            config.height,
            format,
            canvas_width,
            canvas_height
        );

        Ok(Self {
            ctx,
            surface,
            config,
            frame,
            pass,
            bind_group,
        })
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.ctx.adapter_info()
    }

    /// Reconfigure for a new window size. Zero sizes (minimized) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.ctx.device, &self.config);
    }

    fn reconfigure(&self) {
        self.surface.configure(&self.ctx.device, &self.config);
    }

    /// Upload `canvas`, run the scanline pass onto the surface and present.
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn present(&mut self, canvas: &Canvas, time: f32, overlay: bool) -> Result<(), DisplayError> {
        self.frame.upload(&self.ctx.queue, canvas.as_raw());

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                self.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::debug!("Surface timeout, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("present_encoder"),
            });
        self.pass.apply(
            &self.ctx.queue,
            &mut encoder,
            &self.bind_group,
            &view,
            time,
            overlay,
        );
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
