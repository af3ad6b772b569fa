use std::mem;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::coords::Geometry;

use super::types::{TouchEvent, TouchKind};

#[derive(Debug)]
struct Pending {
    events: Vec<TouchEvent>,
    pixels_per_pt: f32,
}

/// Pending touch events, shared between input producers and the draw loop.
///
/// One mutex guards both the event list and the pixels-per-point scale, so
/// every event is converted with the scale that was current when it arrived.
/// Critical sections are a push or a swap, never a callback.
#[derive(Debug)]
pub struct EventQueue {
    pending: Mutex<Pending>,
}

impl EventQueue {
    pub fn new(pixels_per_pt: f32) -> Self {
        Self {
            pending: Mutex::new(Pending {
                events: Vec::new(),
                pixels_per_pt,
            }),
        }
    }

    // Pending holds plain data, so a panic elsewhere cannot leave it torn.
    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends one event, converting device pixels to points.
    pub fn push(&self, kind: TouchKind, x_px: f32, y_px: f32) {
        let mut pending = self.lock();
        let scale = pending.pixels_per_pt;
        let location = Geometry::new(0, 0, scale).px_to_pt(x_px, y_px);
        pending.events.push(TouchEvent::new(kind, location));
    }

    /// Takes every pending event in arrival order, leaving the queue empty.
    pub fn drain_all(&self) -> Vec<TouchEvent> {
        mem::take(&mut self.lock().events)
    }

    pub fn set_pixels_per_pt(&self, pixels_per_pt: f32) {
        self.lock().pixels_per_pt = pixels_per_pt;
    }

    pub fn pixels_per_pt(&self) -> f32 {
        self.lock().pixels_per_pt
    }
}

/// Cloneable producer handle for host input threads.
#[derive(Debug, Clone)]
pub struct InputSender {
    queue: Arc<EventQueue>,
}

impl InputSender {
    pub(crate) fn new(queue: Arc<EventQueue>) -> Self {
        Self { queue }
    }

    pub fn touch_start(&self, x_px: f32, y_px: f32) {
        self.queue.push(TouchKind::Start, x_px, y_px);
    }

    pub fn touch_move(&self, x_px: f32, y_px: f32) {
        self.queue.push(TouchKind::Move, x_px, y_px);
    }

    pub fn touch_end(&self, x_px: f32, y_px: f32) {
        self.queue.push(TouchKind::End, x_px, y_px);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Point;

    #[test]
    fn drain_preserves_order_and_empties() {
        let q = EventQueue::new(1.0);
        q.push(TouchKind::Start, 1.0, 1.0);
        q.push(TouchKind::Move, 2.0, 2.0);
        q.push(TouchKind::End, 3.0, 3.0);

        let kinds: Vec<_> = q.drain_all().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, [TouchKind::Start, TouchKind::Move, TouchKind::End]);
        assert!(q.drain_all().is_empty());
    }

    #[test]
    fn converts_with_scale_current_at_push() {
        let q = EventQueue::new(2.0);
        q.push(TouchKind::Start, 10.0, 20.0);
        q.set_pixels_per_pt(4.0);
        q.push(TouchKind::End, 10.0, 20.0);

        let events = q.drain_all();
        assert_eq!(events[0].location, Point::new(5.0, 10.0));
        assert_eq!(events[1].location, Point::new(2.5, 5.0));
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let q = Arc::new(EventQueue::new(1.0));
        let q2 = Arc::clone(&q);
        let _ = std::thread::spawn(move || {
            let _guard = q2.pending.lock().unwrap();
            panic!("poison the queue");
        })
        .join();

        q.push(TouchKind::Start, 0.0, 0.0);
        assert_eq!(q.drain_all().len(), 1);
    }

    #[test]
    fn sender_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InputSender>();
    }
}
