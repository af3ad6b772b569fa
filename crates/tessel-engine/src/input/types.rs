use std::fmt;

use crate::coords::Point;

/// Phase of a single-pointer touch.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TouchKind {
    Start,
    Move,
    End,
}

impl fmt::Display for TouchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TouchKind::Start => "start",
            TouchKind::Move => "move",
            TouchKind::End => "end",
        };
        f.write_str(s)
    }
}

/// Touch event delivered to the application.
///
/// `location` is in points, top-left origin, converted from device pixels at
/// the moment the event was queued.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TouchEvent {
    pub kind: TouchKind,
    pub location: Point,
}

impl TouchEvent {
    #[inline]
    pub const fn new(kind: TouchKind, location: Point) -> Self {
        Self { kind, location }
    }
}
