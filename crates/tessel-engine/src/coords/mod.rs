//! Coordinate and geometry types shared by the renderer and the event loop.
//!
//! Two CPU spaces exist:
//! - device pixels, as reported by the windowing host
//! - logical points, resolution independent (`pixels_per_pt` apart)
//!
//! Both use a top-left origin with +X right and +Y down. Conversion to
//! normalized device space happens in `render::affine`.

mod point;
mod rect;
mod viewport;

pub use point::Point;
pub use rect::PixelRect;
pub use viewport::{Geometry, Viewport, DEFAULT_PIXELS_PER_PT};
