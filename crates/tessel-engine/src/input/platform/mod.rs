//! Host adapters feeding platform input into the touch queue.

pub mod winit;
