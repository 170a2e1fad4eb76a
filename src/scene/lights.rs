use glam::Vec3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DayNight {
    Day,
    Night,
}

impl DayNight {
    pub fn toggled(self) -> Self {
        match self {
            DayNight::Day => DayNight::Night,
            DayNight::Night => DayNight::Day,
        }
    }
}

/// The sun (or moon). `position` is a point far along the light direction;
/// it doubles as the eye of the shadow camera.
#[derive(Clone, Copy, Debug)]
pub struct DirectionalLight {
    pub position: Vec3,
    pub day_color: Vec3,
    pub night_color: Vec3,
}

impl DirectionalLight {
    pub fn color(&self, time: DayNight) -> Vec3 {
        match time {
            DayNight::Day => self.day_color,
            DayNight::Night => self.night_color,
        }
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 150.0, 150.0),
            day_color: Vec3::ONE,
            night_color: Vec3::new(0.05, 0.05, 0.3),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PointLight {
    pub position: Vec3,
    pub on_color: Vec3,
    pub enabled: bool,
}

impl PointLight {
    /// An off light contributes black rather than being skipped.
    pub fn color(&self) -> Vec3 {
        if self.enabled {
            self.on_color
        } else {
            Vec3::ZERO
        }
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            // Top of the lamp post.
            position: Vec3::new(6.358771, 3.479532, 3.922943),
            on_color: Vec3::new(0.2, 0.2, 0.0),
            enabled: false,
        }
    }
}
