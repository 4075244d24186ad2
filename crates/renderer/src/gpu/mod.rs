//! wgpu implementation of [`RenderBackend`].
//!
//! - `context` owns instance/device/surface wiring and reconfigures the
//!   swapchain when the backing store changes size.
//! - `pipeline` builds the program, bind group and uniform buffer once.
//! - `shader` holds the GLSL sources; the fragment stage mirrors
//!   [`crate::field`].

mod context;
mod pipeline;
mod shader;

use anyhow::Result;
use winit::dpi::PhysicalSize;

use crate::session::{FrameError, RenderBackend, SessionError};
use crate::uniforms::WaveUniforms;

use self::context::GpuContext;
use self::pipeline::WavePipeline;

pub struct WgpuBackend {
    // Field order matters: the pipeline must drop before its device.
    pipeline: WavePipeline,
    context: GpuContext,
}

impl WgpuBackend {
    pub fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        size: PhysicalSize<u32>,
    ) -> Result<Self> {
        let context = GpuContext::new(target, size)?;
        let pipeline = WavePipeline::new(&context.device, context.surface_format);
        tracing::debug!(
            width = context.config.width,
            height = context.config.height,
            "wave pipeline ready"
        );
        Ok(Self { pipeline, context })
    }

    /// Like [`WgpuBackend::new`], with failures mapped to [`SessionError`].
    pub fn create(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        size: PhysicalSize<u32>,
    ) -> Result<Self, SessionError> {
        Self::new(target, size).map_err(|err| SessionError::resource(format!("{err:#}")))
    }
}

impl RenderBackend for WgpuBackend {
    fn configure(&mut self, size: PhysicalSize<u32>) {
        self.context.resize(size);
    }

    fn draw(&mut self, uniforms: &WaveUniforms) -> Result<(), FrameError> {
        let frame = match self.context.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.context.reconfigure();
                return Err(FrameError::SurfaceLost);
            }
            Err(wgpu::SurfaceError::Timeout) => return Err(FrameError::Timeout),
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(FrameError::OutOfMemory),
            Err(other) => return Err(FrameError::Other(other.to_string())),
        };

        self.context.queue.write_buffer(
            &self.pipeline.uniform_buffer,
            0,
            bytemuck::bytes_of(uniforms),
        );

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("wave encoder"),
                });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("wave pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline.pipeline);
            pass.set_bind_group(0, &self.pipeline.bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
