//! Damped orbit camera.
//!
//! Input moves a goal orientation; [`OrbitCamera::update`] eases the current
//! orientation toward it each frame, so rotation keeps gliding briefly after
//! the mouse is released.

use glam::{Mat4, Vec2, Vec3};

const PITCH_LIMIT: f32 = 1.5;
const MIN_DISTANCE: f32 = 0.5;
const MAX_DISTANCE: f32 = 20.0;
/// Below this the camera counts as settled.
const SETTLE_EPSILON: f32 = 1e-4;

/// Orbit camera around a fixed target (no panning).
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    /// Fraction of the remaining motion applied per update (0..1].
    pub damping: f32,
    pub rotate_speed: f32,
    /// Distance change per wheel line.
    pub dolly_speed: f32,
    goal_yaw: f32,
    goal_pitch: f32,
    goal_distance: f32,
}

impl OrbitCamera {
    /// Looking down -Z from (0, 0, 3.2).
    pub fn new() -> Self {
        Self::looking_from(3.2)
    }

    pub fn looking_from(distance: f32) -> Self {
        let distance = distance.clamp(MIN_DISTANCE, MAX_DISTANCE);
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance,
            target: Vec3::ZERO,
            fov_y: 50.0,
            damping: 0.08,
            rotate_speed: 0.45,
            dolly_speed: 0.3,
            goal_yaw: 0.0,
            goal_pitch: 0.0,
            goal_distance: distance,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), aspect.max(1e-3), 0.1, 100.0)
    }

    /// Rotate by a mouse drag. A drag across the full viewport height turns
    /// `2π · rotate_speed` radians.
    pub fn rotate_by_pixels(&mut self, delta: Vec2, viewport_height: f32) {
        let per_pixel = std::f32::consts::TAU * self.rotate_speed / viewport_height.max(1.0);
        self.goal_yaw -= delta.x * per_pixel;
        self.goal_pitch = (self.goal_pitch + delta.y * per_pixel).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Move toward (positive) or away from the target by wheel lines.
    pub fn dolly(&mut self, lines: f32) {
        self.goal_distance = (self.goal_distance - lines * self.dolly_speed).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Ease toward the goal. Returns true while still moving.
    pub fn update(&mut self) -> bool {
        let k = self.damping.clamp(0.0, 1.0);
        self.yaw += (self.goal_yaw - self.yaw) * k;
        self.pitch += (self.goal_pitch - self.pitch) * k;
        self.distance += (self.goal_distance - self.distance) * k;

        let settling = (self.goal_yaw - self.yaw).abs() > SETTLE_EPSILON
            || (self.goal_pitch - self.pitch).abs() > SETTLE_EPSILON
            || (self.goal_distance - self.distance).abs() > SETTLE_EPSILON;
        if !settling {
            self.yaw = self.goal_yaw;
            self.pitch = self.goal_pitch;
            self.distance = self.goal_distance;
        }
        settling
    }

    /// Jump back to the initial view.
    pub fn reset(&mut self) {
        *self = Self {
            fov_y: self.fov_y,
            damping: self.damping,
            rotate_speed: self.rotate_speed,
            dolly_speed: self.dolly_speed,
            ..Self::new()
        };
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_view() {
        let cam = OrbitCamera::new();
        assert!((cam.position() - Vec3::new(0.0, 0.0, 3.2)).length() < 1e-6);
        let origin = cam.view_matrix().transform_point3(Vec3::ZERO);
        assert!((origin.z + 3.2).abs() < 1e-5);
    }

    #[test]
    fn test_damped_rotation_converges() {
        let mut cam = OrbitCamera::new();
        cam.rotate_by_pixels(Vec2::new(-100.0, 0.0), 600.0);
        assert_eq!(cam.yaw, 0.0);

        assert!(cam.update());
        let first = cam.yaw;
        assert!(first > 0.0);

        let mut frames = 1;
        while cam.update() {
            frames += 1;
            assert!(frames < 1000);
        }
        let expected = 100.0 * std::f32::consts::TAU * 0.45 / 600.0;
        assert!((cam.yaw - expected).abs() < 1e-6);
        assert!(first < cam.yaw);
    }

    #[test]
    fn test_pitch_clamped() {
        let mut cam = OrbitCamera::new();
        cam.damping = 1.0;
        cam.rotate_by_pixels(Vec2::new(0.0, 10_000.0), 600.0);
        cam.update();
        assert_eq!(cam.pitch, PITCH_LIMIT);
    }

    #[test]
    fn test_dolly_clamped() {
        let mut cam = OrbitCamera::new();
        cam.damping = 1.0;
        cam.dolly(2.0);
        cam.update();
        assert!((cam.distance - 2.6).abs() < 1e-5);
        cam.dolly(1000.0);
        cam.update();
        assert_eq!(cam.distance, MIN_DISTANCE);
    }

    #[test]
    fn test_reset_keeps_settings() {
        let mut cam = OrbitCamera::new();
        cam.rotate_speed = 1.0;
        cam.rotate_by_pixels(Vec2::splat(50.0), 600.0);
        cam.update();
        cam.reset();
        assert_eq!(cam.yaw, 0.0);
        assert_eq!(cam.rotate_speed, 1.0);
        assert!(!cam.update());
    }
}
