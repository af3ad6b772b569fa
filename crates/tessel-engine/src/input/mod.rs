//! Input subsystem.
//!
//! The app sees a single-pointer touch stream (`TouchEvent`) in points.
//! Producers on any thread append through `InputSender`; the draw loop drains
//! the `EventQueue` once per frame. `platform` adapts host events to that
//! stream and is the only place that sees winit types.

pub mod platform;
mod queue;
mod types;

pub use queue::{EventQueue, InputSender};
pub use types::{TouchEvent, TouchKind};
