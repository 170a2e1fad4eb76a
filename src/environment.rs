use glam::Vec3;
use wgpu::Color;

/// Global colors that are not tied to any light: the clear color behind the
/// skybox and the color distant geometry fades into.
#[derive(Debug, Clone, Copy)]
pub struct Environment {
    clear_color: Color,
    fog_color: Vec3,
}

impl Environment {
    pub fn new(clear_color: Color, fog_color: Vec3) -> Self {
        Self {
            clear_color,
            fog_color,
        }
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn fog_color(&self) -> Vec3 {
        self.fog_color
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(
            Color {
                r: 0.7,
                g: 0.7,
                b: 0.7,
                a: 1.0,
            },
            Vec3::splat(0.5),
        )
    }
}
