// renderer/uniforms.rs
//
// Host-side mirrors of the WGSL uniform and storage structs. Field order and
// padding follow WGSL alignment rules: vec3 and mat3 columns occupy 16 bytes.
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};

use crate::scene::{FrameSnapshot, ObjectTransform};

/// mat3x3<f32> as WGSL stores it: three columns padded to vec4.
pub fn mat3_columns(m: Mat3) -> [[f32; 4]; 3] {
    [
        m.x_axis.extend(0.0).to_array(),
        m.y_axis.extend(0.0).to_array(),
        m.z_axis.extend(0.0).to_array(),
    ]
}

/// Per-frame values for the lit pass (`basic.wgsl`, group 0).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct SceneUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub light_space: [[f32; 4]; 4],
    pub light_dir_matrix: [[f32; 4]; 3],
    pub light_dir: [f32; 3],
    pub fog_density: f32,
    pub light_color: [f32; 3],
    pub _pad0: f32,
    pub point_light_position: [f32; 3],
    pub _pad1: f32,
    pub point_light_color: [f32; 3],
    pub _pad2: f32,
    pub fog_color: [f32; 3],
    pub _pad3: f32,
}

impl SceneUniform {
    pub fn from_snapshot(frame: &FrameSnapshot, fog_color: Vec3) -> Self {
        Self {
            view: frame.view.to_cols_array_2d(),
            projection: frame.projection.to_cols_array_2d(),
            light_space: frame.light_space.to_cols_array_2d(),
            light_dir_matrix: mat3_columns(frame.light_dir_matrix),
            light_dir: frame.light_dir.to_array(),
            fog_density: frame.fog_density,
            light_color: frame.light_color.to_array(),
            _pad0: 0.0,
            point_light_position: frame.point_light_position.to_array(),
            _pad1: 0.0,
            point_light_color: frame.point_light_color.to_array(),
            _pad2: 0.0,
            fog_color: fog_color.to_array(),
            _pad3: 0.0,
        }
    }
}

/// Light transform for the shadow pass (`depth_map.wgsl`, group 0).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct DepthUniform {
    pub light_space: [[f32; 4]; 4],
}

impl DepthUniform {
    pub fn from_snapshot(frame: &FrameSnapshot) -> Self {
        Self {
            light_space: frame.light_space.to_cols_array_2d(),
        }
    }
}

/// One element of the objects storage buffer, indexed by instance index.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct ObjectData {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 3],
}

impl ObjectData {
    pub fn new(model: Mat4, normal_matrix: Mat3) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: mat3_columns(normal_matrix),
        }
    }
}

impl From<&ObjectTransform> for ObjectData {
    fn from(object: &ObjectTransform) -> Self {
        Self::new(object.model_matrix, object.normal_matrix)
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct MaterialUniform {
    pub base_color_factor: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct SkyboxUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub fog_color: [f32; 3],
    pub fog_density: f32,
}

impl SkyboxUniform {
    pub fn from_snapshot(frame: &FrameSnapshot, fog_color: Vec3) -> Self {
        Self {
            view: frame.view.to_cols_array_2d(),
            projection: frame.projection.to_cols_array_2d(),
            fog_color: fog_color.to_array(),
            fog_density: frame.fog_density,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Handle;
    use crate::scene::{FrameState, SceneObject};
    use crate::settings::Settings;
    use std::mem::size_of;

    fn snapshot() -> FrameSnapshot {
        let mut state = FrameState::from_settings(&Settings::default(), 1.5);
        state.objects.push(SceneObject::fixed("scene", Handle::new(0)));
        state.camera.turn(37.0);
        state.snapshot()
    }

    #[test]
    fn uniform_sizes_match_wgsl_layout() {
        assert_eq!(size_of::<SceneUniform>(), 320);
        assert_eq!(size_of::<DepthUniform>(), 64);
        assert_eq!(size_of::<ObjectData>(), 112);
        assert_eq!(size_of::<MaterialUniform>(), 16);
        assert_eq!(size_of::<SkyboxUniform>(), 144);
    }

    #[test]
    fn wgsl_offsets_of_scene_fields() {
        let uniform = SceneUniform::zeroed();
        let base = &uniform as *const _ as usize;
        let offset = |field: *const u8| field as usize - base;

        assert_eq!(offset(uniform.light_dir_matrix.as_ptr() as *const u8), 192);
        assert_eq!(offset(uniform.light_dir.as_ptr() as *const u8), 240);
        assert_eq!(offset(&uniform.fog_density as *const f32 as *const u8), 252);
        assert_eq!(offset(uniform.light_color.as_ptr() as *const u8), 256);
        assert_eq!(offset(uniform.point_light_position.as_ptr() as *const u8), 272);
        assert_eq!(offset(uniform.point_light_color.as_ptr() as *const u8), 288);
        assert_eq!(offset(uniform.fog_color.as_ptr() as *const u8), 304);
    }

    #[test]
    fn shadow_and_main_pass_share_bit_identical_light_space() {
        let frame = snapshot();
        let depth = DepthUniform::from_snapshot(&frame);
        let scene = SceneUniform::from_snapshot(&frame, Vec3::splat(0.5));

        assert_eq!(
            bytemuck::bytes_of(&depth.light_space),
            bytemuck::bytes_of(&scene.light_space)
        );
    }

    #[test]
    fn mat3_columns_are_padded() {
        let m = Mat3::from_cols(Vec3::X, Vec3::Y * 2.0, Vec3::Z * 3.0);
        assert_eq!(
            mat3_columns(m),
            [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 2.0, 0.0, 0.0],
                [0.0, 0.0, 3.0, 0.0]
            ]
        );
    }

    #[test]
    fn object_data_carries_normal_matrix() {
        let frame = snapshot();
        let data = ObjectData::from(&frame.objects[0]);
        assert_eq!(data.normal_matrix, mat3_columns(frame.objects[0].normal_matrix));
    }
}
