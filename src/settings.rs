use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "Settings::default_title")]
    pub title: String,
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default)]
    pub present_mode: PresentModeSetting,
    #[serde(default)]
    pub shadow_map: ShadowMapSize,
    #[serde(default)]
    pub projection: ProjectionSettings,
    #[serde(default)]
    pub controls: ControlSettings,
    #[serde(default)]
    pub fog: FogSettings,
    #[serde(default = "Settings::default_asset_root")]
    pub asset_root: PathBuf,
    #[serde(default = "Settings::default_shader_dir")]
    pub shader_dir: PathBuf,
    #[serde(default)]
    pub animate_clock_hands: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: Self::default_title(),
            resolution: Resolution::default(),
            present_mode: PresentModeSetting::default(),
            shadow_map: ShadowMapSize::default(),
            projection: ProjectionSettings::default(),
            controls: ControlSettings::default(),
            fog: FogSettings::default(),
            asset_root: Self::default_asset_root(),
            shader_dir: Self::default_shader_dir(),
            animate_clock_hands: false,
        }
    }
}

impl Settings {
    pub fn load() -> Self {
        Self::load_from_path("settings.json")
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Settings>(&contents) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings.validate()
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default settings.",
                        path, err
                    );
                    Settings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("Settings file {:?} not found. Using default settings.", path);
                Settings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default settings.",
                    path, err
                );
                Settings::default()
            }
        }
    }

    fn validate(mut self) -> Self {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            warn!("Resolution must be greater than zero. Using default resolution.");
            self.resolution = Resolution::default();
        }

        if self.shadow_map.width == 0 || self.shadow_map.height == 0 {
            warn!("Shadow map size must be greater than zero. Using default size.");
            self.shadow_map = ShadowMapSize::default();
        }

        let projection = &self.projection;
        if !(projection.fov_y_degrees > 0.0 && projection.fov_y_degrees < 180.0)
            || !(projection.near > 0.0)
            || !(projection.far > projection.near)
        {
            warn!("Projection settings are out of range. Using default projection.");
            self.projection = ProjectionSettings::default();
        }

        let controls = &self.controls;
        if !(controls.camera_speed > 0.0)
            || !(controls.rotation_speed > 0.0)
            || !(controls.mouse_sensitivity >= 0.0)
        {
            warn!("Control speeds must be positive. Using default controls.");
            self.controls = ControlSettings::default();
        }

        if !(self.fog.step > 0.0) || !(self.fog.max >= 0.0) {
            warn!("Fog step must be positive and max non-negative. Using default fog.");
            self.fog = FogSettings::default();
        }

        self
    }

    pub fn present_mode(&self, available: &[wgpu::PresentMode]) -> wgpu::PresentMode {
        let desired = self.present_mode.to_wgpu();
        if available.contains(&desired) {
            return desired;
        }

        warn!(
            "Requested present mode {:?} is not supported. Falling back to FIFO.",
            desired
        );

        if available.contains(&wgpu::PresentMode::Fifo) {
            wgpu::PresentMode::Fifo
        } else {
            available
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo)
        }
    }

    /// Resolves a scene file against `asset_root`.
    pub fn asset_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.asset_root.join(relative)
    }

    fn default_title() -> String {
        "Day/Night Scene".to_string()
    }

    fn default_asset_root() -> PathBuf {
        PathBuf::from("assets")
    }

    fn default_shader_dir() -> PathBuf {
        PathBuf::from("shaders")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ShadowMapSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ShadowMapSize {
    fn default() -> Self {
        Self {
            width: 8192,
            height: 4096,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionSettings {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 300.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlSettings {
    /// World units per frame while a movement key is held.
    pub camera_speed: f32,
    /// Degrees of yaw per frame while Z or C is held.
    pub rotation_speed: f32,
    /// Degrees per pixel of mouse motion.
    pub mouse_sensitivity: f32,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            camera_speed: 0.1,
            rotation_speed: 1.0,
            mouse_sensitivity: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FogSettings {
    pub step: f32,
    pub max: f32,
}

impl Default for FogSettings {
    fn default() -> Self {
        Self {
            step: 0.015,
            max: 0.046,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentModeSetting {
    Fifo,
    FifoRelaxed,
    Immediate,
    Mailbox,
    AutoVsync,
    AutoNoVsync,
}

impl PresentModeSetting {
    fn to_wgpu(&self) -> wgpu::PresentMode {
        match self {
            PresentModeSetting::Fifo => wgpu::PresentMode::Fifo,
            PresentModeSetting::FifoRelaxed => wgpu::PresentMode::FifoRelaxed,
            PresentModeSetting::Immediate => wgpu::PresentMode::Immediate,
            PresentModeSetting::Mailbox => wgpu::PresentMode::Mailbox,
            PresentModeSetting::AutoVsync => wgpu::PresentMode::AutoVsync,
            PresentModeSetting::AutoNoVsync => wgpu::PresentMode::AutoNoVsync,
        }
    }
}

impl Default for PresentModeSetting {
    fn default() -> Self {
        PresentModeSetting::Fifo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_replaces_invalid_values_with_defaults() {
        let invalid = Settings {
            resolution: Resolution {
                width: 0,
                height: 768,
            },
            shadow_map: ShadowMapSize {
                width: 8192,
                height: 0,
            },
            projection: ProjectionSettings {
                fov_y_degrees: 45.0,
                near: 10.0,
                far: 1.0,
            },
            controls: ControlSettings {
                camera_speed: -1.0,
                ..ControlSettings::default()
            },
            fog: FogSettings {
                step: 0.0,
                max: 0.046,
            },
            ..Settings::default()
        };

        let validated = invalid.validate();

        assert_eq!(validated.resolution.width, Resolution::default().width);
        assert_eq!(validated.shadow_map.height, ShadowMapSize::default().height);
        assert_eq!(validated.projection.near, ProjectionSettings::default().near);
        assert_eq!(validated.projection.far, ProjectionSettings::default().far);
        assert_eq!(
            validated.controls.camera_speed,
            ControlSettings::default().camera_speed
        );
        assert_eq!(validated.fog.step, FogSettings::default().step);
    }

    #[test]
    fn validate_preserves_valid_values() {
        let valid = Settings {
            resolution: Resolution {
                width: 1920,
                height: 1080,
            },
            shadow_map: ShadowMapSize {
                width: 2048,
                height: 2048,
            },
            animate_clock_hands: true,
            ..Settings::default()
        };

        let validated = valid.clone().validate();

        assert_eq!(validated.resolution.width, 1920);
        assert_eq!(validated.shadow_map.width, 2048);
        assert!(validated.animate_clock_hands);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let json = r#"{ "animate_clock_hands": true, "fog": { "step": 0.01, "max": 0.03 } }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();

        assert!(settings.animate_clock_hands);
        assert_eq!(settings.fog.step, 0.01);
        assert_eq!(settings.shadow_map.width, 8192);
        assert_eq!(settings.shadow_map.height, 4096);
        assert_eq!(settings.asset_root, PathBuf::from("assets"));
    }

    #[test]
    fn scene_files_resolve_under_the_asset_root() {
        let settings = Settings {
            asset_root: PathBuf::from("/data/scene"),
            ..Settings::default()
        };
        assert_eq!(
            settings.asset_path("models/bridge.gltf"),
            PathBuf::from("/data/scene/models/bridge.gltf")
        );
        assert_eq!(
            settings.asset_path(PathBuf::from("textures/skybox/day/top.jpg")),
            PathBuf::from("/data/scene/textures/skybox/day/top.jpg")
        );
    }

    #[test]
    fn missing_file_yields_defaults() {
        let settings = Settings::load_from_path("definitely/not/here/settings.json");
        assert_eq!(settings.resolution.width, Resolution::default().width);
        assert!(!settings.animate_clock_hands);
    }

    #[test]
    fn present_mode_falls_back_to_fifo_when_desired_missing() {
        let settings = Settings {
            present_mode: PresentModeSetting::Mailbox,
            ..Settings::default()
        };

        let available = [wgpu::PresentMode::Fifo, wgpu::PresentMode::Immediate];

        assert_eq!(settings.present_mode(&available), wgpu::PresentMode::Fifo);
    }

    #[test]
    fn present_mode_uses_first_available_when_fifo_missing() {
        let settings = Settings {
            present_mode: PresentModeSetting::Mailbox,
            ..Settings::default()
        };

        let available = [wgpu::PresentMode::Immediate];

        assert_eq!(
            settings.present_mode(&available),
            wgpu::PresentMode::Immediate
        );
    }
}
