//! The Lumen logo stage.
//!
//! Glue between configuration and the engine: builds the one scene, keeps its
//! material consistent with its parameters, wires the post chain and drives
//! the per-frame loop.

pub mod cli;
pub mod config;
pub mod material;
pub mod assembler;
pub mod post;
pub mod render_loop;

pub use assembler::{build_scene, request_assets, SceneContext};
pub use config::{Capabilities, Profile, SceneConfig};
pub use material::{MaterialBuilder, MaterialParams};
pub use post::{build_post_processing, BloomParams};
pub use render_loop::{LoopDriver, LoopState, RenderLoop};
