// scene/mod.rs

pub mod animation;
pub mod camera;
pub mod frame;
pub mod lights;
pub mod setup;
pub mod transform;

pub use animation::{ConfigError, Direction, Joint, Motion, Oscillator, Spinner};
pub use camera::{Camera, MoveDirection};
pub use frame::{FogLevel, FrameSnapshot, FrameState, ObjectTransform, PolygonMode, SceneObject};
pub use lights::{DayNight, DirectionalLight, PointLight};
pub use setup::{load_scene, JointSpec, MotionSpec, ObjectSpec, SceneDescription, SkyboxFaces};
pub use transform::ShadowFrustum;
