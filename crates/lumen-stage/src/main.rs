use anyhow::Context;
use clap::Parser;

use lumen_engine::assets::AssetLoader;
use lumen_engine::device::GpuInit;
use lumen_engine::logging::{init_logging, LoggingConfig};
use lumen_engine::window::Runtime;
use lumen_stage::cli::Cli;
use lumen_stage::{build_scene, request_assets, MaterialBuilder, RenderLoop};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(LoggingConfig {
        env_filter: cli.log.clone(),
        ..LoggingConfig::default()
    });

    let config = cli.scene_config();
    log::info!("profile {:?}, assets from {}", config.profile, config.asset_base);

    let material = MaterialBuilder::new(config.material.clone(), config.capabilities.procedural_texture);
    let context = build_scene(&config, material);

    let loader = AssetLoader::new();
    request_assets(&config, &loader);

    Runtime::run(cli.runtime_config(), GpuInit::default(), RenderLoop::new(context, loader))
        .context("lumen runtime failed")
}
