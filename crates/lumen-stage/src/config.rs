//! Run configuration: profile, capabilities and asset locations.

use lumen_engine::assets::AssetBase;

use crate::material::MaterialParams;
use crate::post::BloomParams;

/// Absolute base the embed profile fetches assets from.
pub const EMBED_ASSET_BASE: &str = "https://www.tighterthreads.us/";
pub const BUNDLED_ASSET_BASE: &str = "assets";

pub const DEFAULT_ENVIRONMENT: &str = "aerodynamics_workshop_1k.hdr";
pub const DEFAULT_MODEL: &str = "models/logo.glb";

/// Hosting flavour of the scene.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Profile {
    /// Bloom post chain, procedural concrete normals, local assets.
    #[default]
    Bundled,
    /// Direct output, constant material, remote assets.
    Embed,
}

/// What a profile is allowed to use.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub post_processing: bool,
    pub procedural_texture: bool,
    /// Edge of the directional light's shadow map.
    pub shadow_map_size: u32,
}

impl Profile {
    pub fn capabilities(self) -> Capabilities {
        match self {
            Profile::Bundled => Capabilities {
                post_processing: true,
                procedural_texture: true,
                shadow_map_size: 2048,
            },
            Profile::Embed => Capabilities {
                post_processing: false,
                procedural_texture: false,
                shadow_map_size: 2048,
            },
        }
    }

    pub fn default_asset_base(self) -> AssetBase {
        match self {
            Profile::Bundled => AssetBase::parse(BUNDLED_ASSET_BASE),
            Profile::Embed => AssetBase::parse(EMBED_ASSET_BASE),
        }
    }
}

/// Everything [`build_scene`](crate::assembler::build_scene) needs.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub profile: Profile,
    pub capabilities: Capabilities,
    pub asset_base: AssetBase,
    pub environment: String,
    pub model: String,
    pub material: MaterialParams,
    pub bloom: BloomParams,
    /// Whether loaded meshes cast and receive shadows. Off in both profiles;
    /// the light still renders its map.
    pub model_shadows: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::for_profile(Profile::default())
    }
}

impl SceneConfig {
    pub fn for_profile(profile: Profile) -> Self {
        Self {
            profile,
            capabilities: profile.capabilities(),
            asset_base: profile.default_asset_base(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            material: MaterialParams::default(),
            bloom: BloomParams::default(),
            model_shadows: false,
        }
    }
}
