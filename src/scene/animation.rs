use std::fmt;

use glam::{Mat4, Vec3};

use crate::scene::transform::pivot_rotate;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    ZeroAxis { object: String },
    InvalidStep { object: String, step: f32 },
    InvalidBounds { object: String, lower: f32, upper: f32 },
    StartOutOfBounds { object: String, start: f32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroAxis { object } => {
                write!(f, "{object}: rotation axis must not be the zero vector")
            }
            ConfigError::InvalidStep { object, step } => {
                write!(f, "{object}: animation step must be positive, got {step}")
            }
            ConfigError::InvalidBounds {
                object,
                lower,
                upper,
            } => write!(
                f,
                "{object}: lower bound {lower} must be below upper bound {upper}"
            ),
            ConfigError::StartOutOfBounds { object, start } => {
                write!(f, "{object}: start angle {start} lies outside its bounds")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increasing,
    Decreasing,
}

impl Direction {
    fn sign(self) -> f32 {
        match self {
            Direction::Increasing => 1.0,
            Direction::Decreasing => -1.0,
        }
    }
}

/// Ping-pong angle in degrees, reflected at `lower` and `upper`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oscillator {
    angle: f32,
    step: f32,
    lower: f32,
    upper: f32,
    direction: Direction,
}

impl Oscillator {
    pub fn new(
        object: &str,
        start: f32,
        step: f32,
        (lower, upper): (f32, f32),
        direction: Direction,
    ) -> Result<Self, ConfigError> {
        if !(step > 0.0) {
            return Err(ConfigError::InvalidStep {
                object: object.to_string(),
                step,
            });
        }
        if !(lower < upper) {
            return Err(ConfigError::InvalidBounds {
                object: object.to_string(),
                lower,
                upper,
            });
        }
        if start < lower || start > upper {
            return Err(ConfigError::StartOutOfBounds {
                object: object.to_string(),
                start,
            });
        }

        Ok(Self {
            angle: start,
            step,
            lower,
            upper,
            direction,
        })
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn advance(&mut self) {
        self.angle += self.direction.sign() * self.step;
        if self.angle >= self.upper {
            self.angle = self.upper;
            self.direction = Direction::Decreasing;
        } else if self.angle <= self.lower {
            self.angle = self.lower;
            self.direction = Direction::Increasing;
        }
    }
}

/// Continuous rotation in degrees, wrapped into `0..=360`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spinner {
    angle: f32,
    step: f32,
}

impl Spinner {
    pub fn new(object: &str, start: f32, step: f32) -> Result<Self, ConfigError> {
        if !(step > 0.0) {
            return Err(ConfigError::InvalidStep {
                object: object.to_string(),
                step,
            });
        }
        Ok(Self { angle: start, step })
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn advance(&mut self) {
        self.angle += self.step;
        if self.angle > 360.0 {
            self.angle -= 360.0;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// Rotation configured but not advanced (degrees).
    Fixed(f32),
    Spin(Spinner),
    Oscillate(Oscillator),
}

impl Motion {
    pub fn angle_degrees(&self) -> f32 {
        match self {
            Motion::Fixed(angle) => *angle,
            Motion::Spin(spinner) => spinner.angle(),
            Motion::Oscillate(oscillator) => oscillator.angle(),
        }
    }

    pub fn advance(&mut self) {
        match self {
            Motion::Fixed(_) => {}
            Motion::Spin(spinner) => spinner.advance(),
            Motion::Oscillate(oscillator) => oscillator.advance(),
        }
    }
}

/// A hinge: rotation of a whole mesh around a model-space pivot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Joint {
    pivot: Vec3,
    axis: Vec3,
    motion: Motion,
}

impl Joint {
    pub fn new(object: &str, pivot: Vec3, axis: Vec3, motion: Motion) -> Result<Self, ConfigError> {
        let length_squared = axis.length_squared();
        if !length_squared.is_finite() || length_squared <= f32::EPSILON {
            return Err(ConfigError::ZeroAxis {
                object: object.to_string(),
            });
        }

        Ok(Self {
            pivot,
            axis: axis.normalize(),
            motion,
        })
    }

    pub fn angle_degrees(&self) -> f32 {
        self.motion.angle_degrees()
    }

    pub fn advance(&mut self) {
        self.motion.advance();
    }

    pub fn matrix(&self) -> Mat4 {
        pivot_rotate(
            Mat4::IDENTITY,
            self.pivot,
            self.angle_degrees().to_radians(),
            self.axis,
        )
    }
}
