//! Lumen engine crate.
//!
//! Owns the platform + GPU runtime, the scene graph types, asset loaders and the
//! forward PBR renderer used by the logo stage.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod color;
pub mod scene;
pub mod controls;
pub mod assets;
pub mod texture;
pub mod render;
