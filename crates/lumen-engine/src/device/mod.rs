//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain)
//! - acquiring frames and mapping surface errors to runtime actions

mod frame;
mod gpu;
mod surface;

pub use frame::{GpuFrame, SurfaceErrorAction};
pub use gpu::{Gpu, GpuInit};
