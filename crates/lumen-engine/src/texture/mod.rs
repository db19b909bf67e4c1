//! Procedural textures.
//!
//! CPU-side generators producing deterministic texel data; uploading is the
//! renderer's job.

pub mod noise;
mod concrete;

pub use concrete::{generate_concrete_sized, ConcreteParams, NormalMap, DEFAULT_CONCRETE_SIZE};
