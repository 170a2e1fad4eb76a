use super::Mesh;
use crate::renderer::Material;

/// One glTF primitive uploaded to the GPU with its material.
pub struct ModelPart {
    pub mesh: Mesh,
    pub material: Material,
}

/// Everything loaded from one model file. All parts share the owning scene
/// object's model matrix.
pub struct Model {
    pub name: String,
    pub parts: Vec<ModelPart>,
}

impl Model {
    pub fn draw_depth(&self, pass: &mut wgpu::RenderPass<'_>, instance: u32) {
        for part in &self.parts {
            part.mesh.draw(pass, instance);
        }
    }

    /// Draws every part with its own material bound at `material_group`.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, material_group: u32, instance: u32) {
        for part in &self.parts {
            pass.set_bind_group(material_group, part.material.bind_group(), &[]);
            part.mesh.draw(pass, instance);
        }
    }

    pub fn triangle_count(&self) -> u32 {
        self.parts.iter().map(|part| part.mesh.index_count() / 3).sum()
    }
}
