use std::sync::Arc;

use crate::coords::Geometry;
use crate::input::{EventQueue, InputSender, TouchEvent, TouchKind};

/// Whether the application's start hook has run.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopState {
    NotStarted,
    Running,
}

/// Receiver of one frame's worth of dispatch.
///
/// Every method defaults to doing nothing.
pub trait FrameHandler {
    /// Runs once, before the first frame's touches and draw.
    fn start(&mut self) {}

    fn touch(&mut self, event: TouchEvent) {
        let _ = event;
    }

    fn draw(&mut self) {}
}

/// Double-buffered touch/draw loop.
///
/// Touch entry points only append to the pending queue and never wait on
/// rendering. `on_draw` swaps the pending events out under the lock and
/// dispatches them with the lock released, so touches arriving during
/// dispatch are seen on the next frame.
#[derive(Debug)]
pub struct FrameLoop {
    queue: Arc<EventQueue>,
    geometry: Geometry,
    state: LoopState,
}

impl FrameLoop {
    pub fn new(pixels_per_pt: f32) -> Self {
        let mut geometry = Geometry::default();
        if Geometry::is_valid_scale(pixels_per_pt) {
            geometry.pixels_per_pt = pixels_per_pt;
        } else {
            log::warn!(
                "invalid pixels-per-point {pixels_per_pt}; using {}",
                geometry.pixels_per_pt
            );
        }

        Self {
            queue: Arc::new(EventQueue::new(geometry.pixels_per_pt)),
            geometry,
            state: LoopState::NotStarted,
        }
    }

    /// Producer handle for input on other threads.
    pub fn sender(&self) -> InputSender {
        InputSender::new(Arc::clone(&self.queue))
    }

    #[inline]
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    #[inline]
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Sets the drawable size and the pixels-per-point scale together.
    ///
    /// A non-positive or non-finite scale is rejected: the size is still
    /// applied, the previous scale is kept, and `false` is returned.
    pub fn on_resize(&mut self, width_px: u32, height_px: u32, pixels_per_pt: f32) -> bool {
        self.geometry.width_px = width_px;
        self.geometry.height_px = height_px;

        let accepted = Geometry::is_valid_scale(pixels_per_pt);
        if accepted {
            self.geometry.pixels_per_pt = pixels_per_pt;
            self.queue.set_pixels_per_pt(pixels_per_pt);
        } else {
            log::warn!(
                "rejected pixels-per-point {pixels_per_pt}; keeping {}",
                self.geometry.pixels_per_pt
            );
        }

        log::debug!(
            "resize to {width_px}x{height_px} px ({:?} pt)",
            self.geometry.viewport()
        );
        accepted
    }

    pub fn on_touch_start(&self, x_px: f32, y_px: f32) {
        self.queue.push(TouchKind::Start, x_px, y_px);
    }

    pub fn on_touch_move(&self, x_px: f32, y_px: f32) {
        self.queue.push(TouchKind::Move, x_px, y_px);
    }

    pub fn on_touch_end(&self, x_px: f32, y_px: f32) {
        self.queue.push(TouchKind::End, x_px, y_px);
    }

    /// Runs one frame: start (first frame only), pending touches, draw.
    pub fn on_draw<H: FrameHandler + ?Sized>(&mut self, handler: &mut H) {
        if self.state == LoopState::NotStarted {
            log::debug!("frame loop starting");
            handler.start();
            self.state = LoopState::Running;
        }

        for event in self.queue.drain_all() {
            log::trace!("touch {} at {:?}", event.kind, event.location);
            handler.touch(event);
        }

        handler.draw();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Point;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Start,
        Touch(TouchKind, Point),
        Draw,
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        echo: Option<InputSender>,
    }

    impl FrameHandler for Recorder {
        fn start(&mut self) {
            self.calls.push(Call::Start);
        }

        fn touch(&mut self, event: TouchEvent) {
            self.calls.push(Call::Touch(event.kind, event.location));
            if let Some(sender) = &self.echo {
                sender.touch_move(0.0, 0.0);
            }
        }

        fn draw(&mut self) {
            self.calls.push(Call::Draw);
        }
    }

    fn touches(calls: &[Call]) -> Vec<TouchKind> {
        calls
            .iter()
            .filter_map(|c| match c {
                Call::Touch(k, _) => Some(*k),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn events_dispatch_in_order_then_queue_is_empty() {
        let mut lp = FrameLoop::new(1.0);
        let mut rec = Recorder::default();
        lp.on_touch_start(10.0, 10.0);
        lp.on_touch_move(20.0, 10.0);
        lp.on_touch_end(20.0, 20.0);

        lp.on_draw(&mut rec);
        assert_eq!(
            rec.calls,
            [
                Call::Start,
                Call::Touch(TouchKind::Start, Point::new(10.0, 10.0)),
                Call::Touch(TouchKind::Move, Point::new(20.0, 10.0)),
                Call::Touch(TouchKind::End, Point::new(20.0, 20.0)),
                Call::Draw,
            ]
        );

        rec.calls.clear();
        lp.on_draw(&mut rec);
        assert_eq!(rec.calls, [Call::Draw]);
    }

    #[test]
    fn start_runs_exactly_once() {
        let mut lp = FrameLoop::new(1.0);
        let mut rec = Recorder::default();
        assert_eq!(lp.state(), LoopState::NotStarted);

        for _ in 0..3 {
            lp.on_draw(&mut rec);
        }
        assert_eq!(lp.state(), LoopState::Running);
        assert_eq!(rec.calls.iter().filter(|c| **c == Call::Start).count(), 1);
        assert_eq!(rec.calls[0], Call::Start);
    }

    #[test]
    fn touches_before_first_draw_follow_start() {
        let mut lp = FrameLoop::new(1.0);
        let mut rec = Recorder::default();
        lp.on_touch_start(0.0, 0.0);
        lp.on_draw(&mut rec);
        assert_eq!(rec.calls[0], Call::Start);
        assert!(matches!(rec.calls[1], Call::Touch(TouchKind::Start, _)));
    }

    #[test]
    fn events_pushed_during_dispatch_wait_for_next_frame() {
        let mut lp = FrameLoop::new(1.0);
        let mut rec = Recorder {
            echo: Some(lp.sender()),
            ..Default::default()
        };
        lp.on_touch_start(0.0, 0.0);

        lp.on_draw(&mut rec);
        assert_eq!(touches(&rec.calls), [TouchKind::Start]);

        rec.echo = None;
        rec.calls.clear();
        lp.on_draw(&mut rec);
        assert_eq!(touches(&rec.calls), [TouchKind::Move]);
    }

    #[test]
    fn producer_threads_lose_nothing() {
        const THREADS: usize = 4;
        const PER_THREAD: usize = 250;

        let mut lp = FrameLoop::new(1.0);
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let sender = lp.sender();
                std::thread::spawn(move || {
                    for i in 0..PER_THREAD {
                        sender.touch_move(t as f32, i as f32);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mut rec = Recorder::default();
        lp.on_draw(&mut rec);

        let points: Vec<Point> = rec
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Touch(_, p) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(points.len(), THREADS * PER_THREAD);

        // Each producer's own events keep their relative order.
        for t in 0..THREADS {
            let seq: Vec<f32> = points.iter().filter(|p| p.x == t as f32).map(|p| p.y).collect();
            let expected: Vec<f32> = (0..PER_THREAD).map(|i| i as f32).collect();
            assert_eq!(seq, expected);
        }
    }

    #[test]
    fn handler_without_overrides_is_a_no_op() {
        struct Silent;
        impl FrameHandler for Silent {}

        let mut lp = FrameLoop::new(1.0);
        lp.on_touch_start(1.0, 1.0);
        lp.on_draw(&mut Silent);
        assert_eq!(lp.state(), LoopState::Running);
    }

    #[test]
    fn touches_are_converted_to_points() {
        let mut lp = FrameLoop::new(72.0);
        let mut rec = Recorder::default();
        lp.on_touch_start(144.0, 36.0);
        lp.on_draw(&mut rec);
        assert_eq!(rec.calls[1], Call::Touch(TouchKind::Start, Point::new(2.0, 0.5)));
    }

    #[test]
    fn invalid_scale_is_rejected() {
        let mut lp = FrameLoop::new(2.0);
        assert!(!lp.on_resize(10, 10, 0.0));
        assert!(!lp.on_resize(20, 10, f32::INFINITY));
        assert_eq!(lp.geometry().pixels_per_pt, 2.0);
        // The size is applied even when the scale is not.
        assert_eq!(lp.geometry().width_px, 20);

        assert!(lp.on_resize(20, 10, 4.0));
        let mut rec = Recorder::default();
        lp.on_touch_start(8.0, 8.0);
        lp.on_draw(&mut rec);
        assert_eq!(rec.calls[1], Call::Touch(TouchKind::Start, Point::new(2.0, 2.0)));
    }

    #[test]
    fn invalid_initial_scale_falls_back_to_default() {
        let lp = FrameLoop::new(-1.0);
        assert_eq!(lp.geometry().pixels_per_pt, crate::coords::DEFAULT_PIXELS_PER_PT);
    }

    #[test]
    fn resize_updates_viewport() {
        let mut lp = FrameLoop::new(2.0);
        assert!(lp.on_resize(100, 40, 2.0));
        let vp = lp.geometry().viewport();
        assert_eq!((vp.width, vp.height), (50.0, 20.0));
    }

    #[test]
    fn resize_sets_scale_for_viewport_and_queued_touches() {
        let mut lp = FrameLoop::new(2.0);
        lp.on_touch_start(72.0, 72.0);
        assert!(lp.on_resize(144, 72, 72.0));
        lp.on_touch_move(144.0, 72.0);

        let vp = lp.geometry().viewport();
        assert_eq!((vp.width, vp.height), (2.0, 1.0));

        // Touches are scaled at push time: the first one predates the resize.
        let mut rec = Recorder::default();
        lp.on_draw(&mut rec);
        assert_eq!(rec.calls[1], Call::Touch(TouchKind::Start, Point::new(36.0, 36.0)));
        assert_eq!(rec.calls[2], Call::Touch(TouchKind::Move, Point::new(2.0, 1.0)));
    }
}
