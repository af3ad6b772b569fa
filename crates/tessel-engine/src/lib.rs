//! Tessel engine crate.
//!
//! Owns the textured-quad renderer, the touch/draw event loop and the
//! platform + GPU runtime pieces that host them.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod bitmap;
pub mod render;
pub mod paint;
