use std::time::Instant;

use anyhow::{Context, Result};
use ouroboros::self_referencing;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::coords::DEFAULT_PIXELS_PER_PT;
use crate::core::{App, AppControl, AppFrame, FrameCtx, FrameLoop};
use crate::device::{Gpu, GpuInit, SurfaceErrorAction};
use crate::input::platform::winit::{translate_window_event, PointerTracker};
use crate::input::InputSender;
use crate::paint::Color;
use crate::render::{RenderCtx, RenderTarget, RendererCell};
use crate::time::{FpsCounter, FrameClock, FramePacer};

/// Where the pixels-per-point scale comes from.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PointScale {
    /// Constant scale, independent of the display.
    Fixed(f32),
    /// The window's scale factor as reported by the platform.
    Window,
}

impl Default for PointScale {
    fn default() -> Self {
        PointScale::Fixed(DEFAULT_PIXELS_PER_PT)
    }
}

impl PointScale {
    pub fn pixels_per_pt(self, window_scale_factor: f64) -> f32 {
        match self {
            PointScale::Fixed(scale) => scale,
            PointScale::Window => window_scale_factor as f32,
        }
    }
}

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    /// Initial drawable size in physical pixels.
    pub initial_size: PhysicalSize<u32>,
    pub point_scale: PointScale,
    /// Redraw cap. `None` redraws as fast as presentation allows.
    pub max_fps: Option<u32>,
    pub clear_color: Color,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "tessel".to_string(),
            initial_size: PhysicalSize::new(480, 800),
            point_scale: PointScale::default(),
            max_fps: Some(80),
            clear_color: Color::BLACK,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window and drives `app` until the window closes or the app
    /// returns `AppControl::Exit`.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = Host::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    renderer: RendererCell,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct Host<A: App> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    frame_loop: FrameLoop,
    sender: InputSender,
    pointer: PointerTracker,
    clock: FrameClock,
    fps: FpsCounter,
    pacer: FramePacer,

    entry: Option<WindowEntry>,
    exit_requested: bool,
    failure: Option<anyhow::Error>,
}

impl<A: App> Host<A> {
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        let frame_loop = FrameLoop::new(config.point_scale.pixels_per_pt(1.0));
        let sender = frame_loop.sender();
        let pacer = FramePacer::new(config.max_fps);
        Self {
            config,
            gpu_init,
            app,
            frame_loop,
            sender,
            pointer: PointerTracker::new(),
            clock: FrameClock::new(),
            fps: FpsCounter::new(),
            pacer,
            entry: None,
            exit_requested: false,
            failure: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failure = Some(err);
        self.exit_requested = true;
        event_loop.exit();
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let size = window.inner_size();
        let scale = self.config.point_scale.pixels_per_pt(window.scale_factor());
        log::info!(
            "window {:?} created at {}x{} px, {scale} px/pt",
            window.id(),
            size.width,
            size.height
        );

        let gpu_init = self.gpu_init.clone();
        let entry = WindowEntryTryBuilder {
            renderer: RendererCell::new(),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed for window")?;

        self.frame_loop.on_resize(size.width, size.height, scale);
        self.clock.reset();
        self.entry = Some(entry);
        Ok(())
    }

    fn resize(&mut self, size: PhysicalSize<u32>, scale_factor: f64) {
        let scale = self.config.point_scale.pixels_per_pt(scale_factor);
        self.frame_loop.on_resize(size.width, size.height, scale);
        if let Some(entry) = self.entry.as_mut() {
            entry.with_gpu_mut(|gpu| gpu.resize(size));
            entry.with_window(|w| w.request_redraw());
        }
    }

    /// Clears the surface, runs one loop iteration and presents.
    fn draw_frame(&mut self) -> AppControl {
        let Some(entry) = self.entry.as_mut() else {
            return AppControl::Continue;
        };

        let geometry = self.frame_loop.geometry();
        if !geometry.viewport().is_valid() {
            return AppControl::Continue;
        }

        let (app, frame_loop, clock, fps) =
            (&mut self.app, &mut self.frame_loop, &mut self.clock, &mut self.fps);
        let clear = self.config.clear_color;

        entry.with_mut(|fields| {
            let mut frame = match fields.gpu.begin_frame() {
                Ok(frame) => frame,
                Err(err) => {
                    log::debug!("surface error: {err}");
                    return match fields.gpu.handle_surface_error(err) {
                        SurfaceErrorAction::Fatal => {
                            log::error!("unrecoverable surface error; exiting");
                            AppControl::Exit
                        }
                        _ => AppControl::Continue,
                    };
                }
            };

            let time = clock.tick();
            if let Some(avg) = fps.record(time.dt) {
                log::debug!("{avg:.1} fps");
            }

            frame.clear(clear);

            let control = {
                let gpu = &*fields.gpu;
                let render = RenderCtx::new(
                    gpu.device(),
                    gpu.queue(),
                    gpu.surface_format(),
                    geometry.viewport(),
                    geometry.pixels_per_pt,
                    &*fields.renderer,
                );
                let target = RenderTarget::new(&mut frame.encoder, &frame.view);
                let mut ctx = FrameCtx::new(render, target, geometry, time);

                let mut handler = AppFrame::new(app, &mut ctx);
                frame_loop.on_draw(&mut handler);
                handler.control()
            };

            fields.window.pre_present_notify();
            fields.gpu.submit(frame);
            control
        })
    }
}

impl<A: App> ApplicationHandler for Host<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        if let Err(err) = self.create_window_entry(event_loop) {
            self.fail(event_loop, err);
            return;
        }

        if let Some(entry) = self.entry.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }
        let Some(entry) = self.entry.as_ref() else {
            return;
        };

        let now = Instant::now();
        if self.pacer.is_due(now) {
            event_loop.set_control_flow(ControlFlow::Wait);
            entry.with_window(|w| w.request_redraw());
        } else if let Some(next) = self.pacer.next_due() {
            event_loop.set_control_flow(ControlFlow::WaitUntil(next));
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if let Some(pointer) = translate_window_event(&mut self.pointer, &event) {
            pointer.send(&self.sender);
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("close requested");
                self.entry = None;
                self.exit_requested = true;
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                let scale_factor = self
                    .entry
                    .as_ref()
                    .map_or(1.0, |e| e.with_window(|w| w.scale_factor()));
                self.resize(size, scale_factor);
            }

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(size) = self.entry.as_ref().map(|e| e.with_window(|w| w.inner_size())) {
                    self.resize(size, scale_factor);
                }
            }

            WindowEvent::RedrawRequested => {
                let control = self.draw_frame();
                self.pacer.frame_drawn(Instant::now());
                if control == AppControl::Exit {
                    log::info!("app requested exit");
                    self.exit_requested = true;
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_desktop_shim() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.initial_size, PhysicalSize::new(480, 800));
        assert_eq!(cfg.point_scale, PointScale::Fixed(72.0));
        assert_eq!(cfg.max_fps, Some(80));
    }

    #[test]
    fn point_scale_source() {
        assert_eq!(PointScale::Fixed(72.0).pixels_per_pt(2.0), 72.0);
        assert_eq!(PointScale::Window.pixels_per_pt(2.0), 2.0);
    }
}
