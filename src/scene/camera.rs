use glam::{Mat4, Vec3};

use crate::scene::transform::look_at;

const MAX_PITCH_DEGREES: f32 = 89.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
}

/// Free-fly camera. `front`, `right` and `up` stay orthonormal after every
/// move or rotation; angles are kept in degrees.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    position: Vec3,
    front: Vec3,
    right: Vec3,
    up: Vec3,
    world_up: Vec3,
    yaw: f32,
    pitch: f32,
}

impl Camera {
    pub fn new(position: Vec3, target: Vec3, world_up: Vec3) -> Self {
        let front = (target - position).normalize_or(Vec3::NEG_Z);
        let pitch = front.y.clamp(-1.0, 1.0).asin().to_degrees();
        let yaw = wrap_degrees(front.z.atan2(front.x).to_degrees());

        let mut camera = Self {
            position,
            front,
            right: Vec3::X,
            up: world_up,
            world_up: world_up.normalize_or(Vec3::Y),
            yaw,
            pitch,
        };
        camera.update_basis();
        camera
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Point one unit ahead of the camera. The shadow frustum is aimed here.
    pub fn target(&self) -> Vec3 {
        self.position + self.front
    }

    pub fn view(&self) -> Mat4 {
        look_at(self.position, self.target(), self.up)
    }

    pub fn move_in(&mut self, direction: MoveDirection, speed: f32) {
        let offset = match direction {
            MoveDirection::Forward => self.front * speed,
            MoveDirection::Backward => -self.front * speed,
            MoveDirection::Right => self.right * speed,
            MoveDirection::Left => -self.right * speed,
        };
        self.position += offset;
    }

    /// Sets absolute orientation. Pitch is clamped short of the poles so
    /// the basis never degenerates.
    pub fn rotate(&mut self, pitch: f32, yaw: f32) {
        self.pitch = pitch.clamp(-MAX_PITCH_DEGREES, MAX_PITCH_DEGREES);
        self.yaw = wrap_degrees(yaw);

        let (yaw_sin, yaw_cos) = self.yaw.to_radians().sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.to_radians().sin_cos();
        self.front = Vec3::new(yaw_cos * pitch_cos, pitch_sin, yaw_sin * pitch_cos).normalize();
        self.update_basis();
    }

    /// Keyboard yaw, keeping the current pitch.
    pub fn turn(&mut self, delta_yaw: f32) {
        self.rotate(self.pitch, self.yaw + delta_yaw);
    }

    /// Mouse look: `dx`/`dy` already scaled to degrees. Screen y grows
    /// downward, so positive `dy` pitches down.
    pub fn look(&mut self, dx: f32, dy: f32) {
        self.rotate(self.pitch - dy, self.yaw + dx);
    }

    fn update_basis(&mut self) {
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

/// Wraps an angle in degrees into `[0, 360)`.
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
