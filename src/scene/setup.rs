// scene/setup.rs
//
// The fixed scene: one static environment model, three clock hands, a
// trumpet and a drawbridge, plus the day and night skyboxes.
use std::path::{Path, PathBuf};

use glam::Vec3;

use crate::asset::{load_model, Assets, LoadError};
use crate::renderer::{face_paths, CubeImages, Renderer};
use crate::scene::animation::{ConfigError, Direction, Joint, Motion, Oscillator, Spinner};
use crate::scene::frame::SceneObject;
use crate::scene::lights::DayNight;
use crate::settings::Settings;

const CLOCK_PIVOT: Vec3 = Vec3::new(-6.528, 0.0, -5.305);
const CLOCK_SPIN_STEP: f32 = 0.3;

/// How a hinged object's angle evolves, before validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionSpec {
    Fixed(f32),
    Spin {
        start: f32,
        step: f32,
    },
    Oscillate {
        start: f32,
        step: f32,
        bounds: (f32, f32),
        direction: Direction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointSpec {
    pub pivot: Vec3,
    pub axis: Vec3,
    pub motion: MotionSpec,
}

impl JointSpec {
    pub fn build(&self, object: &str) -> Result<Joint, ConfigError> {
        let motion = match self.motion {
            MotionSpec::Fixed(angle) => Motion::Fixed(angle),
            MotionSpec::Spin { start, step } => Motion::Spin(Spinner::new(object, start, step)?),
            MotionSpec::Oscillate {
                start,
                step,
                bounds,
                direction,
            } => Motion::Oscillate(Oscillator::new(object, start, step, bounds, direction)?),
        };
        Joint::new(object, self.pivot, self.axis, motion)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSpec {
    pub name: String,
    /// Relative to the asset root.
    pub model: PathBuf,
    pub joint: Option<JointSpec>,
}

impl ObjectSpec {
    pub fn fixed(name: &str, model: &str) -> Self {
        Self {
            name: name.to_string(),
            model: PathBuf::from(model),
            joint: None,
        }
    }

    pub fn hinged(name: &str, model: &str, joint: JointSpec) -> Self {
        Self {
            joint: Some(joint),
            ..Self::fixed(name, model)
        }
    }
}

/// Cube face paths, relative to the asset root, in layer order.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyboxFaces {
    pub day: [PathBuf; 6],
    pub night: [PathBuf; 6],
}

impl Default for SkyboxFaces {
    fn default() -> Self {
        let night = PathBuf::from("textures/skybox/night/nightsky0.png");
        Self {
            day: face_paths(Path::new("textures/skybox/day"), "jpg"),
            night: std::array::from_fn(|_| night.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneDescription {
    pub objects: Vec<ObjectSpec>,
    pub skybox: SkyboxFaces,
}

impl SceneDescription {
    pub fn new(animate_clock_hands: bool) -> Self {
        let clock_motion = if animate_clock_hands {
            MotionSpec::Spin {
                start: 0.0,
                step: CLOCK_SPIN_STEP,
            }
        } else {
            MotionSpec::Fixed(0.0)
        };
        let clock_hand = JointSpec {
            pivot: CLOCK_PIVOT,
            axis: Vec3::Y,
            motion: clock_motion,
        };

        let bridge = JointSpec {
            pivot: Vec3::new(-7.989387, 0.281455, 8.464755),
            axis: Vec3::new(-0.277844, 0.010992, -0.653046),
            motion: MotionSpec::Oscillate {
                start: 0.0,
                step: 0.1,
                bounds: (-75.0, 0.0),
                direction: Direction::Decreasing,
            },
        };

        let trumpet = JointSpec {
            pivot: Vec3::new(-2.181660, -4.080528, -5.187709),
            axis: Vec3::Z,
            motion: MotionSpec::Oscillate {
                start: 0.0,
                step: 0.01,
                bounds: (-1.0, 1.0),
                direction: Direction::Decreasing,
            },
        };

        Self {
            objects: vec![
                ObjectSpec::fixed("scene", "models/scene.gltf"),
                ObjectSpec::hinged("hour", "models/hour.gltf", clock_hand),
                ObjectSpec::hinged("min", "models/min.gltf", clock_hand),
                ObjectSpec::hinged("sec", "models/sec.gltf", clock_hand),
                ObjectSpec::hinged("trumpet", "models/trumpet.gltf", trumpet),
                ObjectSpec::hinged("bridge", "models/bridge.gltf", bridge),
            ],
            skybox: SkyboxFaces::default(),
        }
    }

    /// Validates every joint. Runs before any file is read.
    pub fn joints(&self) -> Result<Vec<Option<Joint>>, ConfigError> {
        self.objects
            .iter()
            .map(|object| object.joint.map(|joint| joint.build(&object.name)).transpose())
            .collect()
    }
}

/// Loads every model and both skyboxes, uploading them through `renderer`.
pub fn load_scene(
    renderer: &mut Renderer,
    settings: &Settings,
) -> Result<(Assets, Vec<SceneObject>), LoadError> {
    let description = SceneDescription::new(settings.animate_clock_hands);
    let joints = description.joints()?;

    let mut assets = Assets::new();
    let mut objects = Vec::with_capacity(description.objects.len());

    for (object, joint) in description.objects.iter().zip(joints) {
        let data = load_model(&settings.asset_path(&object.model))?;
        let model = renderer.create_model(&data);
        log::info!(
            "Loaded {} from {:?} ({} parts, {} triangles)",
            object.name,
            object.model,
            model.parts.len(),
            model.triangle_count()
        );
        let handle = assets.models.insert(model);

        objects.push(match joint {
            Some(joint) => SceneObject::hinged(object.name.as_str(), handle, joint),
            None => SceneObject::fixed(object.name.as_str(), handle),
        });
    }

    for (time, faces) in [
        (DayNight::Day, &description.skybox.day),
        (DayNight::Night, &description.skybox.night),
    ] {
        let paths = faces.clone().map(|face| settings.asset_path(face));
        let images = CubeImages::load(&paths)?;
        renderer.set_skybox(time, &images);
    }

    Ok((assets, objects))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scene_joints_are_valid() {
        let joints = SceneDescription::new(false).joints().unwrap();
        assert_eq!(joints.len(), 6);
        assert!(joints[0].is_none());
        assert!(joints[1..].iter().all(Option::is_some));
    }

    #[test]
    fn clock_hands_are_static_unless_enabled() {
        let still = SceneDescription::new(false).joints().unwrap();
        let mut hour = still[1].unwrap();
        hour.advance();
        assert_eq!(hour.angle_degrees(), 0.0);

        let spinning = SceneDescription::new(true).joints().unwrap();
        let mut hour = spinning[1].unwrap();
        hour.advance();
        assert!((hour.angle_degrees() - CLOCK_SPIN_STEP).abs() < 1e-6);
    }

    #[test]
    fn bridge_opens_towards_lower_bound_first() {
        let joints = SceneDescription::new(false).joints().unwrap();
        let mut bridge = joints[5].unwrap();
        bridge.advance();
        assert!(bridge.angle_degrees() < 0.0);
    }

    #[test]
    fn zero_axis_fails_before_loading() {
        let mut description = SceneDescription::new(false);
        if let Some(joint) = description.objects[4].joint.as_mut() {
            joint.axis = Vec3::ZERO;
        }
        let err = description.joints().unwrap_err();
        assert_eq!(
            err,
            ConfigError::ZeroAxis {
                object: "trumpet".to_string()
            }
        );
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let hinge = JointSpec {
            pivot: Vec3::ZERO,
            axis: Vec3::X,
            motion: MotionSpec::Oscillate {
                start: 0.0,
                step: 0.1,
                bounds: (1.0, -1.0),
                direction: Direction::Increasing,
            },
        };
        assert!(matches!(hinge.build("lid"), Err(ConfigError::InvalidBounds { .. })));
    }

    #[test]
    fn night_sky_repeats_one_image() {
        let faces = SkyboxFaces::default();
        assert!(faces.night.iter().all(|p| p == &faces.night[0]));
        assert!(faces.day[0].ends_with("right.jpg"));
        assert!(faces.day[5].ends_with("front.jpg"));
    }
}
