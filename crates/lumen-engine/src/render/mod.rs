//! Forward renderer: shadow map, HDR PBR scene pass, bloom, tone-mapped output.

mod ctx;
mod common;
mod mesh;
mod targets;
mod textures;
mod uniforms;
mod shadow;
mod pbr;
mod bloom;
mod output;
mod renderer;
mod post;
mod settings;

pub use ctx::{RenderCtx, RenderTarget};
pub use post::{
    bloom_factors, bloom_mip_sizes, gaussian_coefficients, BloomSettings, PostProcessing,
    BLOOM_FACTORS, BLOOM_KERNEL_RADII, BLOOM_MIPS, BLOOM_SMOOTH_WIDTH,
};
pub use renderer::SceneRenderer;
pub use settings::RenderSettings;
pub use targets::{DEPTH_FORMAT, HDR_FORMAT};
pub use uniforms::{DrawUniform, FrameUniform, MaterialUniform, DRAW_UNIFORM_STRIDE};

use renderer::DrawItem;
