//! Orbit camera with auto-rotation and clamped zoom.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::{Mat4, Vec2, Vec3};

use crate::particle::Formation;
use crate::scene::{CameraConfig, OrbitConfig};

/// Keeps the camera from flipping over the pole.
const POLE_EPSILON: f32 = 1e-3;

/// Orbit camera looking at a fixed target.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Elevation above the horizon in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    fov: f32,
    near: f32,
    far: f32,
    orbit: OrbitConfig,
}

impl OrbitCamera {
    /// Place the camera at `camera.position`, orbiting `camera.target`.
    pub fn new(camera: &CameraConfig, orbit: OrbitConfig) -> Self {
        let offset = camera.position - camera.target;
        let distance = offset.length();
        let mut cam = Self {
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).asin(),
            distance,
            target: camera.target,
            fov: camera.fov_degrees.to_radians(),
            near: camera.near,
            far: camera.far,
            orbit,
        };
        cam.clamp();
        cam
    }

    fn min_pitch(&self) -> f32 {
        FRAC_PI_2 - self.orbit.max_polar
    }

    fn clamp(&mut self) {
        self.pitch = self
            .pitch
            .clamp(self.min_pitch(), FRAC_PI_2 - POLE_EPSILON);
        self.distance = self
            .distance
            .clamp(self.orbit.min_distance, self.orbit.max_distance);
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect, self.near, self.far)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view_matrix()
    }

    /// Rotate by a pointer drag of `delta` pixels in a viewport `height` tall.
    /// A drag across the full height is one full turn.
    pub fn orbit(&mut self, delta: Vec2, height: f32) {
        if height <= 0.0 {
            return;
        }
        self.yaw -= TAU * delta.x / height;
        self.pitch += TAU * delta.y / height;
        self.clamp();
    }

    /// Dolly by `lines` wheel steps; positive moves closer.
    pub fn zoom(&mut self, lines: f32) {
        self.distance *= self.orbit.zoom_step.powf(lines);
        self.clamp();
    }

    /// Idle spin for one frame of `delta` seconds.
    pub fn auto_rotate(&mut self, delta: f32, formation: Formation) {
        let speed = self.orbit.auto_rotate(formation);
        self.yaw -= TAU / 60.0 * speed * delta;
        self.yaw = self.yaw.rem_euclid(TAU);
        if self.yaw > PI {
            self.yaw -= TAU;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneConfig;

    fn camera() -> OrbitCamera {
        let scene = SceneConfig::default();
        OrbitCamera::new(&scene.camera, scene.orbit)
    }

    #[test]
    fn test_starts_at_configured_position() {
        let cam = camera();
        assert!((cam.distance - 13.0).abs() < 1e-5);
        assert!((cam.position() - Vec3::new(0.0, 5.0, 12.0)).length() < 1e-4);
    }

    #[test]
    fn test_zoom_clamps() {
        let mut cam = camera();
        cam.zoom(1000.0);
        assert_eq!(cam.distance, 5.0);
        cam.zoom(-1000.0);
        assert_eq!(cam.distance, 25.0);
        cam.zoom(1.0);
        assert!((cam.distance - 25.0 * 0.95).abs() < 1e-4);
    }

    #[test]
    fn test_polar_limit() {
        let mut cam = camera();
        cam.orbit(Vec2::new(0.0, -10_000.0), 600.0);
        // Polar angle π/1.5 from straight up is 30° below the horizon.
        assert!((cam.pitch + PI / 6.0).abs() < 1e-5);
        cam.orbit(Vec2::new(0.0, 10_000.0), 600.0);
        assert!(cam.pitch < FRAC_PI_2);
        assert!(cam.position().y > 0.0);
    }

    #[test]
    fn test_auto_rotate_speed() {
        let mut a = camera();
        let mut s = camera();
        a.auto_rotate(1.0, Formation::Assembled);
        s.auto_rotate(1.0, Formation::Scattered);
        assert!((a.yaw + TAU / 60.0 * 1.5).abs() < 1e-5);
        assert!((s.yaw + TAU / 60.0 * 0.5).abs() < 1e-5);
        // Distance and height are untouched.
        assert!((a.position().y - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_view_proj_centers_target() {
        let cam = camera();
        let clip = cam.view_proj(16.0 / 9.0) * cam.target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!((0.0..1.0).contains(&ndc.z));
    }
}
