//! Application contract and the frame loop that drives it.
//!
//! The host feeds `FrameLoop` with resizes, touches and draw requests. Each
//! draw runs the app's `start` once, then queued touches, then `draw`,
//! through the `FrameHandler` seam.

mod app;
mod ctx;
mod frame_loop;

pub use app::{App, AppControl, AppFrame, Callbacks};
pub use ctx::FrameCtx;
pub use frame_loop::{FrameHandler, FrameLoop, LoopState};
