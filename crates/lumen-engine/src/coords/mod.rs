//! Window-space coordinate types.
//!
//! Logical pixels are DPI-independent; multiplying by a pixel ratio yields the
//! physical size of a drawing buffer.

mod viewport;

pub use viewport::{Viewport, MAX_PIXEL_RATIO};
