//! GPU device management.
//!
//! - `Gpu` owns the window surface plus Instance/Adapter/Device/Queue and
//!   hands out per-frame encoders and views
//! - `HeadlessGpu` owns a device/queue with no surface, for offscreen
//!   rendering and texture readback

mod gpu;
mod headless;

pub use gpu::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction};
pub use headless::HeadlessGpu;
