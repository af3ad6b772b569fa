//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the single app window, and wires them to
//! the GPU layer and the frame loop.

mod runtime;

pub use runtime::{PointScale, Runtime, RuntimeConfig};
