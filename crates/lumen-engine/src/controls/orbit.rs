//! Orbit camera controls: rotate around a target, dolly in/out, pan.
//!
//! Input accumulates into pending deltas; [`OrbitControls::update`] applies
//! them to the camera. With damping on, each update applies a fraction of the
//! pending delta and decays the rest, so motion eases out over later frames.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::input::{InputFrame, InputState, MouseButton};
use crate::scene::PerspectiveCamera;

const EPS: f32 = 1e-6;

/// Spherical coordinates around +Y: `phi` from the pole, `theta` around it.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
struct Spherical {
    radius: f32,
    phi: f32,
    theta: f32,
}

impl Spherical {
    fn from_offset(v: Vec3) -> Self {
        let radius = v.length();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let s = self.phi.sin() * self.radius;
        Vec3::new(s * self.theta.sin(), self.phi.cos() * self.radius, s * self.theta.cos())
    }
}

#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enabled: bool,

    pub enable_damping: bool,
    /// Fraction of the pending motion applied per update.
    pub damping_factor: f32,

    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,

    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,

    delta: Spherical,
    pan_offset: Vec3,
    scale: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enabled: true,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            delta: Spherical::default(),
            pan_offset: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

impl OrbitControls {
    /// Controls orbiting whatever `camera` currently looks at.
    pub fn new(camera: &PerspectiveCamera) -> Self {
        Self { target: camera.target, ..Self::default() }
    }

    /// Turns this frame's pointer input into pending motion.
    ///
    /// Left drag rotates, right drag (or left drag with a modifier) pans,
    /// middle drag and the wheel dolly. `viewport_height` is in logical pixels.
    pub fn handle_input(
        &mut self,
        camera: &PerspectiveCamera,
        input: &InputState,
        frame: &InputFrame,
        viewport_height: f32,
    ) {
        if !self.enabled {
            return;
        }

        let (dx, dy) = frame.pointer_delta;
        if dx != 0.0 || dy != 0.0 {
            let pan_modifier = input.modifiers.ctrl || input.modifiers.meta || input.modifiers.shift;
            if input.button_down(MouseButton::Left) && !pan_modifier {
                self.rotate(dx, dy, viewport_height);
            } else if input.button_down(MouseButton::Right) || input.button_down(MouseButton::Left) {
                self.pan(camera, dx, dy, viewport_height);
            } else if input.button_down(MouseButton::Middle) && dy != 0.0 {
                self.dolly(-dy.signum());
            }
        }

        if frame.wheel_notches != 0.0 {
            self.dolly(frame.wheel_notches);
        }
    }

    /// Rotation by a pointer drag of `(dx, dy)` logical pixels. A drag across
    /// the full viewport height is one full turn.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        self.delta.theta -= TAU * dx * self.rotate_speed / h;
        self.delta.phi -= TAU * dy * self.rotate_speed / h;
    }

    /// Screen-space pan by `(dx, dy)` logical pixels; the point under the
    /// cursor at target depth follows the cursor.
    pub fn pan(&mut self, camera: &PerspectiveCamera, dx: f32, dy: f32, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        let offset = camera.position - self.target;
        let target_distance = offset.length() * (camera.fov_y_deg.to_radians() * 0.5).tan();

        let forward = (self.target - camera.position).normalize_or(Vec3::NEG_Z);
        let right = forward.cross(camera.up).normalize_or(Vec3::X);
        let up = right.cross(forward);

        let k = 2.0 * target_distance * self.pan_speed / h;
        self.pan_offset += right * (-dx * k) + up * (dy * k);
    }

    /// Dolly by wheel notches; positive moves towards the target.
    pub fn dolly(&mut self, notches: f32) {
        let step = 0.95f32.powf(self.zoom_speed);
        self.scale *= step.powf(notches);
    }

    /// Applies pending motion to `camera`. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let last_position = camera.position;

        let mut s = Spherical::from_offset(camera.position - self.target);

        if self.enable_damping {
            s.theta += self.delta.theta * self.damping_factor;
            s.phi += self.delta.phi * self.damping_factor;
            self.target += self.pan_offset * self.damping_factor;
        } else {
            s.theta += self.delta.theta;
            s.phi += self.delta.phi;
            self.target += self.pan_offset;
        }

        s.phi = s.phi.clamp(self.min_polar_angle, self.max_polar_angle).clamp(EPS, PI - EPS);
        s.radius = (s.radius * self.scale).clamp(self.min_distance, self.max_distance);

        camera.position = self.target + s.to_offset();
        camera.look_at(self.target);

        if self.enable_damping {
            let keep = 1.0 - self.damping_factor;
            self.delta.theta *= keep;
            self.delta.phi *= keep;
            self.pan_offset *= keep;
        } else {
            self.delta = Spherical::default();
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        camera.position.distance_squared(last_position) > EPS
    }

    /// True when no motion is pending beyond float noise.
    pub fn is_settled(&self) -> bool {
        self.delta.theta.abs() < EPS
            && self.delta.phi.abs() < EPS
            && self.pan_offset.length_squared() < EPS * EPS
            && self.scale == 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        let mut cam = PerspectiveCamera::new(25.0, 16.0 / 9.0, 0.1, 100.0);
        cam.position = Vec3::new(6.0, 3.0, 10.0);
        cam.look_at(Vec3::ZERO);
        cam
    }

    fn damped(cam: &PerspectiveCamera) -> OrbitControls {
        OrbitControls { enable_damping: true, ..OrbitControls::new(cam) }
    }

    // ── idle ─────────────────────────────────────────────────────────────

    #[test]
    fn idle_update_keeps_camera_still() {
        let mut cam = camera();
        let before = cam.position;
        let mut controls = damped(&cam);
        assert!(!controls.update(&mut cam));
        assert!(cam.position.abs_diff_eq(before, 1e-4));
        assert_eq!(cam.target, Vec3::ZERO);
    }

    // ── rotation ─────────────────────────────────────────────────────────

    #[test]
    fn rotation_preserves_distance() {
        let mut cam = camera();
        let r = cam.position.length();
        let mut controls = OrbitControls::new(&cam);
        controls.rotate(120.0, 40.0, 720.0);
        assert!(controls.update(&mut cam));
        assert!((cam.position.length() - r).abs() < 1e-3);
    }

    #[test]
    fn damping_converges_to_the_full_rotation() {
        let mut undamped_cam = camera();
        let mut undamped = OrbitControls::new(&undamped_cam);
        undamped.rotate(90.0, 0.0, 720.0);
        undamped.update(&mut undamped_cam);

        let mut cam = camera();
        let mut controls = damped(&cam);
        controls.rotate(90.0, 0.0, 720.0);

        let mut steps = 0;
        while !controls.is_settled() {
            controls.update(&mut cam);
            steps += 1;
            assert!(steps < 2000, "damping never settled");
        }

        assert!(steps > 1, "damped motion should ease out over several frames");
        assert!(cam.position.abs_diff_eq(undamped_cam.position, 1e-2));
    }

    #[test]
    fn damped_step_is_a_fraction_of_the_delta() {
        let mut cam = camera();
        let start = Spherical::from_offset(cam.position);
        let mut controls = damped(&cam);
        controls.rotate(72.0, 0.0, 720.0);
        controls.update(&mut cam);

        let after = Spherical::from_offset(cam.position);
        let expected = -TAU * 0.1 * 0.05;
        assert!((after.theta - start.theta - expected).abs() < 1e-4);
    }

    #[test]
    fn polar_angle_is_clamped_off_the_poles() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(&cam);
        controls.rotate(0.0, 10_000.0, 720.0);
        controls.update(&mut cam);
        assert!(cam.position.is_finite());
        assert!(cam.position.y > 0.0);
        assert!(cam.view_matrix().is_finite());
    }

    // ── dolly & pan ──────────────────────────────────────────────────────

    #[test]
    fn wheel_forward_moves_closer() {
        let mut cam = camera();
        let r = cam.position.length();
        let mut controls = OrbitControls::new(&cam);
        controls.dolly(1.0);
        controls.update(&mut cam);
        assert!((cam.position.length() - r * 0.95).abs() < 1e-3);
    }

    #[test]
    fn pan_moves_target_and_camera_together() {
        let mut cam = camera();
        let offset = cam.position - cam.target;
        let mut controls = OrbitControls::new(&cam);
        controls.pan(&cam, 50.0, 0.0, 720.0);
        controls.update(&mut cam);

        assert!(controls.target.length() > 0.0);
        assert!((cam.position - controls.target).abs_diff_eq(offset, 1e-3));
    }

    #[test]
    fn left_drag_rotates_via_input_frame() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(&cam);
        let mut input = InputState::default();
        input.buttons_down.insert(MouseButton::Left);
        let frame = InputFrame { pointer_delta: (30.0, 0.0), ..InputFrame::default() };

        controls.handle_input(&cam, &input, &frame, 720.0);
        assert!(controls.update(&mut cam));
        assert_eq!(controls.target, Vec3::ZERO);
    }

    #[test]
    fn disabled_controls_ignore_input() {
        let mut cam = camera();
        let mut controls = OrbitControls { enabled: false, ..OrbitControls::new(&cam) };
        let frame = InputFrame { wheel_notches: 3.0, ..InputFrame::default() };
        controls.handle_input(&cam, &InputState::default(), &frame, 720.0);
        assert!(!controls.update(&mut cam));
    }
}
