//! Frame timing.
//!
//! - `FrameClock`: one per render loop; `tick()` once per presented frame
//! - `FpsCounter`: averages frame rate over a reporting interval
//! - `FramePacer`: deadline for the next redraw under a frame-rate cap

mod fps;
mod frame_clock;

pub use fps::{FpsCounter, FramePacer};
pub use frame_clock::{FrameClock, FrameTime};
