//! Color values consumed by the renderer.

mod color;

pub use color::Color;
