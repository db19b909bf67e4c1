//! Post chain: scene color plus bloom, scaled by exposure.

use lumen_engine::render::{BloomSettings, PostProcessing};

/// Consumed once when the chain is built.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BloomParams {
    pub intensity: f32,
    pub threshold: f32,
    pub radius: f32,
    pub exposure: f32,
}

impl Default for BloomParams {
    fn default() -> Self {
        Self {
            intensity: 3.5,
            threshold: 0.4,
            radius: 1.2,
            exposure: 1.2,
        }
    }
}

/// `(scene + bloom(scene, intensity, threshold, radius)) * exposure`.
///
/// The description is fixed after this call; the renderer re-samples the live
/// scene through it every frame.
pub fn build_post_processing(params: &BloomParams) -> PostProcessing {
    PostProcessing::with_bloom(
        BloomSettings {
            strength: params.intensity,
            threshold: params.threshold,
            radius: params.radius,
        },
        params.exposure,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_scene_without_bloom_is_scaled_by_exposure() {
        let post = build_post_processing(&BloomParams::default());
        let c = [0.2, 0.4, 0.6];
        let out = post.composite(c, [0.0; 3]);
        for (o, c) in out.iter().zip(c) {
            assert!((o - c * 1.2).abs() < 1e-6);
        }
    }

    #[test]
    fn bloom_parameters_carry_over() {
        let post = build_post_processing(&BloomParams::default());
        assert_eq!(
            post.bloom,
            Some(BloomSettings { strength: 3.5, threshold: 0.4, radius: 1.2 })
        );
        assert_eq!(post.exposure, 1.2);
    }
}
