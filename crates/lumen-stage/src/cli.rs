//! Command line surface of the `lumen` binary.

use clap::Parser;
use winit::dpi::LogicalSize;

use lumen_engine::assets::AssetBase;
use lumen_engine::window::RuntimeConfig;

use crate::config::{Profile, SceneConfig};

#[derive(Parser, Debug)]
#[command(name = "lumen")]
#[command(about = "Renders the branded concrete logo scene")]
pub struct Cli {
    /// Scene profile.
    #[arg(long, value_enum, default_value_t = Profile::Bundled)]
    pub profile: Profile,

    /// Directory or http(s) URL assets are resolved against. Defaults to the
    /// profile's base.
    #[arg(long)]
    pub asset_base: Option<String>,

    /// Model path relative to the asset base.
    #[arg(long)]
    pub model: Option<String>,

    /// Equirectangular HDR path relative to the asset base.
    #[arg(long)]
    pub environment: Option<String>,

    /// Seed of the concrete texture.
    #[arg(long)]
    pub seed: Option<u32>,

    /// Initial window width in logical pixels.
    #[arg(long, default_value_t = 1280.0)]
    pub width: f64,

    /// Initial window height in logical pixels.
    #[arg(long, default_value_t = 720.0)]
    pub height: f64,

    /// Log filter, `env_logger` syntax. Overrides RUST_LOG.
    #[arg(long)]
    pub log: Option<String>,
}

impl Cli {
    pub fn scene_config(&self) -> SceneConfig {
        let mut config = SceneConfig::for_profile(self.profile);
        if let Some(base) = &self.asset_base {
            config.asset_base = AssetBase::parse(base);
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(environment) = &self.environment {
            config.environment = environment.clone();
        }
        if let Some(seed) = self.seed {
            config.material.seed = seed;
        }
        config
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            title: "Lumen".to_string(),
            initial_size: LogicalSize::new(self.width, self.height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_give_the_bundled_scene() {
        let cli = Cli::try_parse_from(["lumen"]).unwrap();
        assert_eq!(cli.scene_config(), SceneConfig::for_profile(Profile::Bundled));
        let rt = cli.runtime_config();
        assert_eq!(rt.title, "Lumen");
        assert_eq!(rt.initial_size, LogicalSize::new(1280.0, 720.0));
    }

    #[test]
    fn overrides_apply_on_top_of_the_profile() {
        let cli = Cli::try_parse_from([
            "lumen",
            "--profile",
            "embed",
            "--asset-base",
            "/srv/assets",
            "--model",
            "other.glb",
            "--seed",
            "7",
        ])
        .unwrap();
        let config = cli.scene_config();
        assert_eq!(config.profile, Profile::Embed);
        assert_eq!(config.asset_base, AssetBase::Directory("/srv/assets".into()));
        assert_eq!(config.model, "other.glb");
        assert_eq!(config.environment, "aerodynamics_workshop_1k.hdr");
        assert_eq!(config.material.seed, 7);
    }

    #[test]
    fn unknown_profile_is_rejected() {
        assert!(Cli::try_parse_from(["lumen", "--profile", "cdn"]).is_err());
    }
}
