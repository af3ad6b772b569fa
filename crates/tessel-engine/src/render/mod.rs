//! GPU rendering subsystem.
//!
//! One renderer exists: textured quads. An `Image` pairs a host bitmap with a
//! texture and draws any sub-rectangle of it onto an arbitrary parallelogram
//! through the shared `QuadRenderer`.
//!
//! Convention:
//! - CPU geometry is in logical points (top-left origin, +Y down).
//! - `affine` solves the point → device and pixel → UV transforms on the CPU;
//!   the vertex shader only applies them.

pub mod affine;
mod ctx;
mod error;
mod quad;
mod readback;
mod textured;

pub use affine::Affine;
pub use ctx::{RenderCtx, RenderTarget};
pub use error::RenderError;
pub use quad::{QuadRenderer, RendererCell};
pub use readback::read_texture_rgba8;
pub use textured::{Image, IMAGE_FORMAT};
