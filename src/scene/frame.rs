use glam::{Mat3, Mat4, Vec3};

use crate::asset::{Handle, Model};
use crate::scene::animation::Joint;
use crate::scene::camera::Camera;
use crate::scene::lights::{DayNight, DirectionalLight, PointLight};
use crate::scene::transform::{
    directional_light_space, light_dir_matrix, normal_matrix, perspective, ShadowFrustum,
};
use crate::settings::{FogSettings, ProjectionSettings, Settings};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PolygonMode {
    #[default]
    Fill,
    Line,
    Point,
}

/// Fog density that steps up on every request and wraps to zero instead of
/// saturating.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FogLevel {
    density: f32,
    step: f32,
    max: f32,
}

impl FogLevel {
    pub fn new(step: f32, max: f32) -> Self {
        Self {
            density: 0.0,
            step,
            max,
        }
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    pub fn cycle(&mut self) -> f32 {
        self.density += self.step;
        if self.density > self.max {
            self.density = 0.0;
        }
        self.density
    }
}

impl From<&FogSettings> for FogLevel {
    fn from(settings: &FogSettings) -> Self {
        Self::new(settings.step, settings.max)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Projection {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        perspective(self.fov_y_degrees.to_radians(), aspect, self.near, self.far)
    }
}

impl From<&ProjectionSettings> for Projection {
    fn from(settings: &ProjectionSettings) -> Self {
        Self {
            fov_y_degrees: settings.fov_y_degrees,
            near: settings.near,
            far: settings.far,
        }
    }
}

/// A drawable model placed in the world, optionally hinged.
#[derive(Clone, Debug)]
pub struct SceneObject {
    pub name: String,
    pub model: Handle<Model>,
    pub placement: Mat4,
    pub joint: Option<Joint>,
}

impl SceneObject {
    pub fn fixed(name: impl Into<String>, model: Handle<Model>) -> Self {
        Self {
            name: name.into(),
            model,
            placement: Mat4::IDENTITY,
            joint: None,
        }
    }

    pub fn hinged(name: impl Into<String>, model: Handle<Model>, joint: Joint) -> Self {
        Self {
            joint: Some(joint),
            ..Self::fixed(name, model)
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        match &self.joint {
            Some(joint) => self.placement * joint.matrix(),
            None => self.placement,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ObjectTransform {
    pub model: Handle<Model>,
    pub model_matrix: Mat4,
    pub normal_matrix: Mat3,
}

/// Every matrix and parameter one frame needs, computed once. Both render
/// passes read from the same snapshot.
#[derive(Clone, Debug)]
pub struct FrameSnapshot {
    pub view: Mat4,
    pub projection: Mat4,
    pub light_space: Mat4,
    pub light_dir: Vec3,
    pub light_dir_matrix: Mat3,
    pub light_color: Vec3,
    pub point_light_position: Vec3,
    pub point_light_color: Vec3,
    pub fog_density: f32,
    pub day_night: DayNight,
    pub polygon_mode: PolygonMode,
    pub objects: Vec<ObjectTransform>,
}

/// All mutable scene state, owned by the event loop.
#[derive(Clone, Debug)]
pub struct FrameState {
    pub camera: Camera,
    pub day_night: DayNight,
    pub fog: FogLevel,
    pub polygon_mode: PolygonMode,
    pub sun: DirectionalLight,
    pub lamp: PointLight,
    pub objects: Vec<SceneObject>,
    pub projection: Projection,
    pub shadow_frustum: ShadowFrustum,
    aspect: f32,
    should_close: bool,
}

impl FrameState {
    pub fn new(camera: Camera, projection: Projection, fog: FogLevel, aspect: f32) -> Self {
        Self {
            camera,
            day_night: DayNight::Day,
            fog,
            polygon_mode: PolygonMode::Fill,
            sun: DirectionalLight::default(),
            lamp: PointLight::default(),
            objects: Vec::new(),
            projection,
            shadow_frustum: ShadowFrustum::default(),
            aspect: sanitize_aspect(aspect),
            should_close: false,
        }
    }

    pub fn from_settings(settings: &Settings, aspect: f32) -> Self {
        let camera = Camera::new(
            Vec3::new(3.0, 1.0, 3.0),
            Vec3::new(0.0, 1.0, 10.0),
            Vec3::Y,
        );
        Self::new(
            camera,
            Projection::from(&settings.projection),
            FogLevel::from(&settings.fog),
            aspect,
        )
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = sanitize_aspect(aspect);
    }

    pub fn request_close(&mut self) {
        self.should_close = true;
    }

    pub fn should_close(&self) -> bool {
        self.should_close
    }

    pub fn light_space(&self) -> Mat4 {
        directional_light_space(self.sun.position, self.camera.target(), self.shadow_frustum)
    }

    /// Freezes the current state into per-frame matrices. Call after input
    /// has been applied so view and normal matrices reflect this frame's
    /// camera.
    pub fn snapshot(&self) -> FrameSnapshot {
        let view = self.camera.view();
        let objects = self
            .objects
            .iter()
            .map(|object| {
                let model_matrix = object.model_matrix();
                ObjectTransform {
                    model: object.model,
                    model_matrix,
                    normal_matrix: normal_matrix(view, model_matrix),
                }
            })
            .collect();

        FrameSnapshot {
            view,
            projection: self.projection.matrix(self.aspect),
            light_space: self.light_space(),
            light_dir: self.sun.position,
            light_dir_matrix: light_dir_matrix(view),
            light_color: self.sun.color(self.day_night),
            point_light_position: self.lamp.position,
            point_light_color: self.lamp.color(),
            fog_density: self.fog.density(),
            day_night: self.day_night,
            polygon_mode: self.polygon_mode,
            objects,
        }
    }

    /// Steps every animated joint once. Runs after the frame is drawn so the
    /// rendered frame and its shadows share one set of angles.
    pub fn advance(&mut self) {
        for object in &mut self.objects {
            if let Some(joint) = object.joint.as_mut() {
                joint.advance();
            }
        }
    }
}

fn sanitize_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::animation::{Direction, Motion, Oscillator};

    fn bridge_joint() -> Joint {
        let osc =
            Oscillator::new("bridge", 0.0, 0.1, (-75.0, 0.0), Direction::Decreasing).unwrap();
        Joint::new(
            "bridge",
            Vec3::new(-7.989387, 0.281455, 8.464755),
            Vec3::new(-0.277844, 0.010992, -0.653046),
            Motion::Oscillate(osc),
        )
        .unwrap()
    }

    fn state() -> FrameState {
        let mut state = FrameState::from_settings(&Settings::default(), 4.0 / 3.0);
        state.objects = vec![
            SceneObject::fixed("scene", Handle::new(0)),
            SceneObject::hinged("bridge", Handle::new(1), bridge_joint()),
        ];
        state
    }

    #[test]
    fn fog_cycles_through_levels_and_wraps() {
        let mut fog = FogLevel::new(0.015, 0.046);
        assert_eq!(fog.density(), 0.0);

        let seen: Vec<f32> = (0..5).map(|_| fog.cycle()).collect();
        let expected = [0.015, 0.030, 0.045, 0.0, 0.015];
        for (got, want) in seen.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "{seen:?}");
        }
    }

    #[test]
    fn snapshot_covers_every_object_with_current_matrices() {
        let mut state = state();
        for _ in 0..100 {
            state.advance();
        }
        let snapshot = state.snapshot();

        assert_eq!(snapshot.objects.len(), 2);
        let bridge = &snapshot.objects[1];
        assert_eq!(bridge.model_matrix, state.objects[1].model_matrix());
        assert_eq!(
            bridge.normal_matrix,
            normal_matrix(snapshot.view, bridge.model_matrix)
        );
        assert!(!bridge.model_matrix.abs_diff_eq(Mat4::IDENTITY, 1e-3));
    }

    #[test]
    fn snapshot_does_not_advance_animation() {
        let state = state();
        let first = state.snapshot();
        let second = state.snapshot();
        assert_eq!(
            first.objects[1].model_matrix,
            second.objects[1].model_matrix
        );
    }

    #[test]
    fn light_space_is_identical_between_calls() {
        let state = state();
        let snapshot = state.snapshot();
        assert_eq!(snapshot.light_space, state.light_space());
    }

    #[test]
    fn day_night_switches_light_color() {
        let mut state = state();
        assert_eq!(state.snapshot().light_color, Vec3::ONE);
        state.day_night = state.day_night.toggled();
        assert_eq!(
            state.snapshot().light_color,
            Vec3::new(0.05, 0.05, 0.3)
        );
    }

    #[test]
    fn degenerate_aspect_falls_back_to_square() {
        let mut state = state();
        state.set_aspect(0.0);
        assert_eq!(state.aspect(), 1.0);
        state.set_aspect(f32::NAN);
        assert_eq!(state.aspect(), 1.0);
    }
}
