use glam::Vec3;

use crate::controller::{InputProcessor, InputState};
use crate::model::Camera;

/// Pitch stays strictly inside ±90° so the look direction never flips.
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 1e-3;

/// Per-frame movement intent built from the six logical movement keys.
/// x: strafe right, y: ascend, z: forward.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveIntent {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl MoveIntent {
    pub fn from_flags(
        forward: bool,
        backward: bool,
        left: bool,
        right: bool,
        ascend: bool,
        descend: bool,
    ) -> Self {
        let mut intent = Self::default();
        if right {
            intent.x += 1.0;
        }
        if left {
            intent.x -= 1.0;
        }
        if forward {
            intent.z += 1.0;
        }
        if backward {
            intent.z -= 1.0;
        }
        if ascend {
            intent.y += 1.0;
        }
        if descend {
            intent.y -= 1.0;
        }
        intent
    }

    pub fn from_input(processor: &InputProcessor, input: &InputState) -> Self {
        Self::from_flags(
            processor.is_moving_forward(input),
            processor.is_moving_backward(input),
            processor.is_moving_left(input),
            processor.is_moving_right(input),
            processor.is_ascending(input),
            processor.is_descending(input),
        )
    }

    /// Unit-length intent, or zero when no keys are pressed. Diagonal
    /// movement gets the same magnitude as single-axis movement.
    pub fn normalized(self) -> Vec3 {
        let v = Vec3::new(self.x, self.y, self.z);
        if v.length_squared() > 0.0 {
            v.normalize()
        } else {
            Vec3::ZERO
        }
    }
}

/// Handles camera movement and orientation
pub struct CameraController {
    pub move_speed: f32,
    pub mouse_sensitivity: f32,
}

impl CameraController {
    pub fn new() -> Self {
        Self {
            move_speed: 50.0,
            mouse_sensitivity: 0.002,
        }
    }

    /// Apply mouse look delta to camera
    pub fn apply_look(&self, camera: &mut Camera, dx: f32, dy: f32) {
        camera.yaw += dx * self.mouse_sensitivity;
        camera.pitch =
            (camera.pitch - dy * self.mouse_sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Set orientation directly (reset and initial-direction setup).
    /// Roll is fixed at zero by construction.
    pub fn set_orientation(&self, camera: &mut Camera, pitch: f32, yaw: f32) {
        camera.yaw = yaw;
        camera.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Forward motion is confined to the horizontal plane implied by yaw;
    /// pitch never affects horizontal speed. Vertical motion is handled
    /// separately in world space.
    fn horizontal_forward(camera: &Camera) -> Vec3 {
        Vec3::new(camera.yaw.cos(), 0.0, camera.yaw.sin())
    }

    /// Translate along the yaw-only forward vector.
    pub fn move_forward(&self, camera: &mut Camera, distance: f32) {
        camera.eye += Self::horizontal_forward(camera) * distance;
    }

    /// Translate along the yaw-only right vector.
    pub fn move_right(&self, camera: &mut Camera, distance: f32) {
        let right = Self::horizontal_forward(camera).cross(camera.up).normalize();
        camera.eye += right * distance;
    }

    /// Apply one frame of keyboard movement: normalize the intent, move on
    /// the camera's horizontal basis, and ascend/descend on world Y.
    pub fn apply_movement(&self, camera: &mut Camera, intent: MoveIntent, dt: f32) {
        let direction = intent.normalized();
        if direction == Vec3::ZERO {
            return;
        }
        let step = self.move_speed * dt;
        self.move_right(camera, direction.x * step);
        self.move_forward(camera, direction.z * step);
        camera.eye.y += direction.y * step;
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        let mut cam = Camera::new(800, 600);
        cam.eye = Vec3::ZERO;
        cam
    }

    #[test]
    fn test_intent_is_unit_or_zero() {
        // forward + right: (0.707, 0, 0.707) before scaling
        let intent = MoveIntent::from_flags(true, false, false, true, false, false);
        let v = intent.normalized();
        assert!((v.length() - 1.0).abs() < 1e-6);
        assert!((v.x - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert!((v.z - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);

        // no keys: zero vector, no division by zero
        let idle = MoveIntent::from_flags(false, false, false, false, false, false);
        assert_eq!(idle.normalized(), Vec3::ZERO);

        // opposing keys cancel
        let cancel = MoveIntent::from_flags(true, true, false, false, false, false);
        assert_eq!(cancel.normalized(), Vec3::ZERO);
    }

    #[test]
    fn test_zero_distance_never_moves() {
        let controller = CameraController::new();
        let mut cam = camera();
        cam.yaw = 1.2;
        cam.pitch = 0.4;
        controller.move_forward(&mut cam, 0.0);
        controller.move_right(&mut cam, 0.0);
        assert_eq!(cam.eye, Vec3::ZERO);
    }

    #[test]
    fn test_forward_ignores_pitch() {
        let controller = CameraController::new();
        let mut cam = camera();
        cam.pitch = 1.0; // looking well above the horizon
        controller.move_forward(&mut cam, 2.0);
        // yaw 0: horizontal forward is +X, full speed despite the pitch
        assert!((cam.eye - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_right_is_perpendicular_to_forward() {
        let controller = CameraController::new();
        let mut cam = camera();
        controller.move_right(&mut cam, 3.0);
        // yaw 0 forward is +X, right is +Z for a Y-up camera
        assert!((cam.eye - Vec3::new(0.0, 0.0, 3.0)).length() < 1e-6);
    }

    #[test]
    fn test_diagonal_speed_matches_single_axis() {
        let controller = CameraController::new();
        let dt = 0.016;

        let mut straight = camera();
        controller.apply_movement(
            &mut straight,
            MoveIntent::from_flags(true, false, false, false, false, false),
            dt,
        );

        let mut diagonal = camera();
        controller.apply_movement(
            &mut diagonal,
            MoveIntent::from_flags(true, false, false, true, false, false),
            dt,
        );

        assert!((straight.eye.length() - diagonal.eye.length()).abs() < 1e-5);
    }

    #[test]
    fn test_vertical_motion_is_world_space() {
        let controller = CameraController::new();
        let mut cam = camera();
        cam.yaw = 2.1;
        cam.pitch = -0.8;
        controller.apply_movement(
            &mut cam,
            MoveIntent::from_flags(false, false, false, false, true, false),
            1.0,
        );
        assert!((cam.eye - Vec3::new(0.0, controller.move_speed, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_look_clamps_pitch() {
        let controller = CameraController::new();
        let mut cam = camera();
        controller.apply_look(&mut cam, 0.0, -1e6);
        assert!(cam.pitch < std::f32::consts::FRAC_PI_2);
        controller.apply_look(&mut cam, 0.0, 1e6);
        assert!(cam.pitch > -std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn test_set_orientation_resets_view() {
        let controller = CameraController::new();
        let mut cam = camera();
        controller.apply_look(&mut cam, 250.0, -80.0);
        controller.set_orientation(&mut cam, 0.0, 0.0);
        assert_eq!(cam.yaw, 0.0);
        assert_eq!(cam.pitch, 0.0);
    }
}
