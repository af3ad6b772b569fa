use winit::event::{ElementState, MouseButton, Touch, TouchPhase, WindowEvent};

use crate::input::{InputSender, TouchKind};

/// Touch phase with its location in device pixels, ready for the queue.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerEvent {
    pub kind: TouchKind,
    pub x_px: f32,
    pub y_px: f32,
}

impl PointerEvent {
    fn new(kind: TouchKind, (x_px, y_px): (f32, f32)) -> Self {
        Self { kind, x_px, y_px }
    }

    pub fn send(self, sender: &InputSender) {
        match self.kind {
            TouchKind::Start => sender.touch_start(self.x_px, self.y_px),
            TouchKind::Move => sender.touch_move(self.x_px, self.y_px),
            TouchKind::End => sender.touch_end(self.x_px, self.y_px),
        }
    }
}

/// Folds mouse and multi-touch input into one primary touch stream.
///
/// - mouse: left press starts, cursor motion moves only while pressed,
///   release or leaving the window ends
/// - touch: the first finger down becomes primary until it lifts or is
///   cancelled; other fingers are ignored
#[derive(Debug, Default)]
pub struct PointerTracker {
    cursor: (f32, f32),
    mouse_down: bool,
    finger: Option<u64>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a mouse button or primary finger is down.
    pub fn is_pressed(&self) -> bool {
        self.mouse_down || self.finger.is_some()
    }

    pub fn cursor_moved(&mut self, x_px: f32, y_px: f32) -> Option<PointerEvent> {
        self.cursor = (x_px, y_px);
        self.mouse_down
            .then(|| PointerEvent::new(TouchKind::Move, self.cursor))
    }

    pub fn left_button(&mut self, pressed: bool) -> Option<PointerEvent> {
        if self.finger.is_some() || pressed == self.mouse_down {
            return None;
        }
        self.mouse_down = pressed;
        let kind = if pressed { TouchKind::Start } else { TouchKind::End };
        Some(PointerEvent::new(kind, self.cursor))
    }

    pub fn cursor_left(&mut self) -> Option<PointerEvent> {
        self.left_button(false)
    }

    pub fn finger_down(&mut self, id: u64, x_px: f32, y_px: f32) -> Option<PointerEvent> {
        if self.finger.is_some() || self.mouse_down {
            return None;
        }
        self.finger = Some(id);
        Some(PointerEvent::new(TouchKind::Start, (x_px, y_px)))
    }

    pub fn finger_moved(&mut self, id: u64, x_px: f32, y_px: f32) -> Option<PointerEvent> {
        (self.finger == Some(id)).then(|| PointerEvent::new(TouchKind::Move, (x_px, y_px)))
    }

    /// Lift or cancel of finger `id`.
    pub fn finger_up(&mut self, id: u64, x_px: f32, y_px: f32) -> Option<PointerEvent> {
        if self.finger != Some(id) {
            return None;
        }
        self.finger = None;
        Some(PointerEvent::new(TouchKind::End, (x_px, y_px)))
    }

    fn touch(&mut self, touch: &Touch) -> Option<PointerEvent> {
        let (x, y) = (touch.location.x as f32, touch.location.y as f32);
        match touch.phase {
            TouchPhase::Started => self.finger_down(touch.id, x, y),
            TouchPhase::Moved => self.finger_moved(touch.id, x, y),
            TouchPhase::Ended | TouchPhase::Cancelled => self.finger_up(touch.id, x, y),
        }
    }
}

/// Translates a winit `WindowEvent` into a primary touch event.
///
/// Positions stay in physical pixels; the event queue converts to points.
/// Returns `None` for events that do not affect the touch stream.
pub fn translate_window_event(
    tracker: &mut PointerTracker,
    event: &WindowEvent,
) -> Option<PointerEvent> {
    match event {
        WindowEvent::CursorMoved { position, .. } => {
            tracker.cursor_moved(position.x as f32, position.y as f32)
        }
        WindowEvent::MouseInput {
            state,
            button: MouseButton::Left,
            ..
        } => tracker.left_button(*state == ElementState::Pressed),
        WindowEvent::CursorLeft { .. } => tracker.cursor_left(),
        WindowEvent::Touch(touch) => tracker.touch(touch),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(ev: Option<PointerEvent>) -> Option<TouchKind> {
        ev.map(|e| e.kind)
    }

    #[test]
    fn move_only_while_pressed() {
        let mut t = PointerTracker::new();
        assert_eq!(t.cursor_moved(1.0, 1.0), None);

        assert_eq!(kind(t.left_button(true)), Some(TouchKind::Start));
        assert_eq!(
            t.cursor_moved(5.0, 6.0),
            Some(PointerEvent { kind: TouchKind::Move, x_px: 5.0, y_px: 6.0 })
        );

        assert_eq!(kind(t.left_button(false)), Some(TouchKind::End));
        assert_eq!(t.cursor_moved(7.0, 7.0), None);
    }

    #[test]
    fn press_uses_last_cursor_position() {
        let mut t = PointerTracker::new();
        t.cursor_moved(12.0, 34.0);
        assert_eq!(
            t.left_button(true),
            Some(PointerEvent { kind: TouchKind::Start, x_px: 12.0, y_px: 34.0 })
        );
    }

    #[test]
    fn repeated_press_or_release_is_ignored() {
        let mut t = PointerTracker::new();
        assert_eq!(t.left_button(false), None);
        assert!(t.left_button(true).is_some());
        assert_eq!(t.left_button(true), None);
    }

    #[test]
    fn leaving_window_ends_press() {
        let mut t = PointerTracker::new();
        t.left_button(true);
        assert_eq!(kind(t.cursor_left()), Some(TouchKind::End));
        assert!(!t.is_pressed());
        assert_eq!(t.cursor_left(), None);
    }

    #[test]
    fn first_finger_is_primary() {
        let mut t = PointerTracker::new();
        assert_eq!(kind(t.finger_down(1, 0.0, 0.0)), Some(TouchKind::Start));
        assert_eq!(t.finger_down(2, 9.0, 9.0), None);
        assert_eq!(t.finger_moved(2, 9.0, 9.0), None);
        assert_eq!(kind(t.finger_moved(1, 1.0, 1.0)), Some(TouchKind::Move));
        assert_eq!(t.finger_up(2, 9.0, 9.0), None);
        assert_eq!(kind(t.finger_up(1, 1.0, 1.0)), Some(TouchKind::End));

        // Primary slot is free again.
        assert_eq!(kind(t.finger_down(2, 3.0, 3.0)), Some(TouchKind::Start));
    }

    #[test]
    fn mouse_ignored_while_finger_down() {
        let mut t = PointerTracker::new();
        t.finger_down(7, 0.0, 0.0);
        assert_eq!(t.left_button(true), None);
        assert_eq!(t.cursor_moved(3.0, 3.0), None);
    }
}
