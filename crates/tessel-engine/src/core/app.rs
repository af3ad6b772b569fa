use crate::input::TouchEvent;

use super::ctx::FrameCtx;
use super::frame_loop::FrameHandler;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract.
///
/// Every hook is optional; an app that leaves one out gets a no-op.
pub trait App {
    /// Called once, on the first frame, before any touch or draw.
    fn start(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        let _ = ctx;
        AppControl::Continue
    }

    /// Called for each queued touch, in arrival order, before `draw`.
    fn touch(&mut self, event: TouchEvent) {
        let _ = event;
    }

    /// Called once per frame after touches.
    fn draw(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        let _ = ctx;
        AppControl::Continue
    }
}

type StartFn = Box<dyn FnMut(&mut FrameCtx<'_>) -> AppControl>;
type TouchFn = Box<dyn FnMut(TouchEvent)>;
type DrawFn = Box<dyn FnMut(&mut FrameCtx<'_>) -> AppControl>;

/// `App` assembled from optional closures.
///
/// ```no_run
/// use tessel_engine::core::{AppControl, Callbacks};
///
/// let app = Callbacks::new()
///     .on_touch(|ev| log::info!("{} at {:?}", ev.kind, ev.location))
///     .on_draw(|_ctx| AppControl::Continue);
/// ```
#[derive(Default)]
pub struct Callbacks {
    start: Option<StartFn>,
    touch: Option<TouchFn>,
    draw: Option<DrawFn>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start(mut self, f: impl FnMut(&mut FrameCtx<'_>) -> AppControl + 'static) -> Self {
        self.start = Some(Box::new(f));
        self
    }

    pub fn on_touch(mut self, f: impl FnMut(TouchEvent) + 'static) -> Self {
        self.touch = Some(Box::new(f));
        self
    }

    pub fn on_draw(mut self, f: impl FnMut(&mut FrameCtx<'_>) -> AppControl + 'static) -> Self {
        self.draw = Some(Box::new(f));
        self
    }
}

impl App for Callbacks {
    fn start(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        self.start.as_mut().map_or(AppControl::Continue, |f| f(ctx))
    }

    fn touch(&mut self, event: TouchEvent) {
        if let Some(f) = self.touch.as_mut() {
            f(event);
        }
    }

    fn draw(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        self.draw.as_mut().map_or(AppControl::Continue, |f| f(ctx))
    }
}

/// Adapts an `App` to the frame loop for one frame.
///
/// Remembers whether any hook asked to exit.
pub struct AppFrame<'f, 'c, A: App + ?Sized> {
    app: &'f mut A,
    ctx: &'f mut FrameCtx<'c>,
    control: AppControl,
}

impl<'f, 'c, A: App + ?Sized> AppFrame<'f, 'c, A> {
    pub fn new(app: &'f mut A, ctx: &'f mut FrameCtx<'c>) -> Self {
        Self {
            app,
            ctx,
            control: AppControl::Continue,
        }
    }

    pub fn control(&self) -> AppControl {
        self.control
    }

    fn record(&mut self, control: AppControl) {
        if control == AppControl::Exit {
            self.control = AppControl::Exit;
        }
    }
}

impl<A: App + ?Sized> FrameHandler for AppFrame<'_, '_, A> {
    fn start(&mut self) {
        let control = self.app.start(self.ctx);
        self.record(control);
    }

    fn touch(&mut self, event: TouchEvent) {
        self.app.touch(event);
    }

    fn draw(&mut self) {
        let control = self.app.draw(self.ctx);
        self.record(control);
    }
}
