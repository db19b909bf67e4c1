//! Asset loading.
//!
//! Sources resolve to files or URLs, bytes are fetched on background threads,
//! and decoded results come back as [`AssetEvent`]s polled by the main thread.

mod error;
mod gltf;
mod hdr;
mod loader;
mod source;

pub use error::AssetError;
pub use gltf::{decode_glb, MeshData, ModelData, ModelNode};
pub use hdr::decode_hdr;
pub use loader::{AssetEvent, AssetKind, AssetLoader};
pub use source::{fetch, AssetBase, AssetLocation, LoadProgress};
