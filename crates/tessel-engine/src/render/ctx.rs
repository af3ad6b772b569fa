use std::rc::Rc;

use crate::coords::Viewport;
use crate::render::{QuadRenderer, RenderError, RendererCell};

/// Renderer-facing context: device/queue, target format, viewport and the
/// shared renderer latch.
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
    pub viewport: Viewport, // points
    pub pixels_per_pt: f32,
    pub renderer: &'a RendererCell,
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        viewport: Viewport,
        pixels_per_pt: f32,
        renderer: &'a RendererCell,
    ) -> Self {
        Self {
            device,
            queue,
            surface_format,
            viewport,
            pixels_per_pt,
            renderer,
        }
    }

    /// Shared quad renderer, built on first use for `surface_format`.
    #[inline]
    pub fn quad_renderer(&self) -> Result<Rc<QuadRenderer>, RenderError> {
        self.renderer.get_or_init(self.device, self.surface_format)
    }
}

/// Target for drawing (encoder + color view).
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(encoder: &'a mut wgpu::CommandEncoder, color_view: &'a wgpu::TextureView) -> Self {
        Self { encoder, color_view }
    }
}
