use glam::{Mat4, Vec3};

/// Right-handed perspective camera looking at `target`.
///
/// Projection is cached; call [`update_projection_matrix`](Self::update_projection_matrix)
/// after changing `fov_y_deg`, `aspect`, `near` or `far`.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    projection: Mat4,
}

impl PerspectiveCamera {
    pub fn new(fov_y_deg: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut cam = Self {
            fov_y_deg,
            aspect,
            near,
            far,
            position: Vec3::Z,
            target: Vec3::ZERO,
            up: Vec3::Y,
            projection: Mat4::IDENTITY,
        };
        cam.update_projection_matrix();
        cam
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn update_projection_matrix(&mut self) {
        // wgpu clip space: z in [0, 1].
        self.projection = Mat4::perspective_rh(
            self.fov_y_deg.to_radians(),
            self.aspect.max(f32::EPSILON),
            self.near,
            self.far,
        );
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn target_projects_to_screen_center() {
        let mut cam = PerspectiveCamera::new(25.0, 16.0 / 9.0, 0.1, 100.0);
        cam.position = Vec3::new(6.0, 3.0, 10.0);
        cam.look_at(Vec3::ZERO);

        let clip = cam.view_projection() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn projection_follows_aspect() {
        let mut cam = PerspectiveCamera::new(25.0, 1.0, 0.1, 100.0);
        let before = cam.projection_matrix();
        cam.aspect = 2.0;
        cam.update_projection_matrix();
        let after = cam.projection_matrix();
        assert!((before.x_axis.x / after.x_axis.x - 2.0).abs() < 1e-5);
        assert_eq!(before.y_axis.y, after.y_axis.y);
    }
}
