use crate::coords::{Geometry, Viewport};
use crate::paint::Color;
use crate::render::{RenderCtx, RenderTarget};
use crate::time::FrameTime;

/// Per-frame context passed to `App::start` and `App::draw`.
///
/// `target` is already cleared; images draw into it with `Image::draw`.
pub struct FrameCtx<'a> {
    pub render: RenderCtx<'a>,
    pub target: RenderTarget<'a>,
    pub geometry: Geometry,
    pub time: FrameTime,
}

impl<'a> FrameCtx<'a> {
    pub fn new(
        render: RenderCtx<'a>,
        target: RenderTarget<'a>,
        geometry: Geometry,
        time: FrameTime,
    ) -> Self {
        Self {
            render,
            target,
            geometry,
            time,
        }
    }

    /// Drawable extent in points.
    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.render.viewport
    }

    /// Sets the global tint of the shared quad renderer, initializing it if
    /// needed. Initialization failures are logged, not returned.
    pub fn set_tint(&self, tint: Color) {
        match self.render.quad_renderer() {
            Ok(renderer) => renderer.set_tint(tint),
            Err(err) => log::error!("cannot set tint: {err}"),
        }
    }
}
