//! Projection, view and pivot math shared by both render passes.
//!
//! Everything here follows the wgpu clip-space convention: right-handed view
//! space and a `0..1` depth range.

use glam::{Mat3, Mat4, Vec3};

pub fn perspective(fov_y_radians: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh(fov_y_radians, aspect, near, far)
}

pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    Mat4::orthographic_rh(left, right, bottom, top, near, far)
}

pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    Mat4::look_at_rh(eye, target, up)
}

/// Rotates `base` around `pivot` instead of the local origin:
/// `T(pivot) * R(angle, axis) * T(-pivot) * base`.
///
/// `axis` must be normalized; [`crate::scene::Joint::new`] enforces that for
/// every animated object.
pub fn pivot_rotate(base: Mat4, pivot: Vec3, angle_radians: f32, axis: Vec3) -> Mat4 {
    Mat4::from_translation(pivot)
        * Mat4::from_axis_angle(axis, angle_radians)
        * Mat4::from_translation(-pivot)
        * base
}

/// Inverse-transpose of the linear part of `view * model`.
pub fn normal_matrix(view: Mat4, model: Mat4) -> Mat3 {
    Mat3::from_mat4(view * model).inverse().transpose()
}

/// Matrix that moves light directions from world space into eye space.
pub fn light_dir_matrix(view: Mat4) -> Mat3 {
    Mat3::from_mat4(view.inverse().transpose())
}

/// Orthographic volume that the directional shadow map covers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowFrustum {
    pub half_extent: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ShadowFrustum {
    fn default() -> Self {
        Self {
            half_extent: 150.0,
            near: 50.0,
            far: 300.0,
        }
    }
}

/// World to light clip space for a directional light.
///
/// The light has no real position, so the eye sits at `light_position` (a
/// point far along the light direction) and looks at `target`. Parallel rays
/// call for an orthographic projection.
pub fn directional_light_space(light_position: Vec3, target: Vec3, frustum: ShadowFrustum) -> Mat4 {
    let extent = frustum.half_extent;
    let projection = orthographic(-extent, extent, -extent, extent, frustum.near, frustum.far);
    projection * look_at(light_position, target, Vec3::Y)
}

/// World to light clip space for the point light.
///
/// No pass samples this yet; only the directional light casts shadows.
pub fn point_light_space(position: Vec3, target: Vec3, aspect: f32) -> Mat4 {
    perspective(45f32.to_radians(), aspect, 1.0, 100.0) * look_at(position, target, Vec3::Y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn pivot_point_is_fixed_by_pivot_rotation() {
        let pivot = Vec3::new(-7.989387, 0.281455, 8.464755);
        let axis = Vec3::new(-0.277844, 0.010992, -0.653046).normalize();

        for degrees in [-75.0f32, -30.0, 0.0, 12.5, 90.0] {
            let m = pivot_rotate(Mat4::IDENTITY, pivot, degrees.to_radians(), axis);
            let moved = m.transform_point3(pivot);
            assert!(moved.abs_diff_eq(pivot, 1e-4), "{moved:?} != {pivot:?}");
        }
    }

    #[test]
    fn pivot_rotation_spins_in_place_instead_of_orbiting_origin() {
        let pivot = Vec3::new(5.0, 0.0, 0.0);
        let m = pivot_rotate(Mat4::IDENTITY, pivot, 90f32.to_radians(), Vec3::Y);

        // A point one unit beyond the pivot swings around the pivot, not the origin.
        let p = m.transform_point3(Vec3::new(6.0, 0.0, 0.0));
        assert!(p.abs_diff_eq(Vec3::new(5.0, 0.0, -1.0), 1e-5), "{p:?}");
    }

    #[test]
    fn pivot_rotation_applies_base_first() {
        let base = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0));
        let m = pivot_rotate(base, Vec3::ZERO, 0.0, Vec3::Z);
        assert!(m.abs_diff_eq(base, 1e-6));
    }

    #[test]
    fn normal_matrix_keeps_normals_perpendicular_under_non_uniform_scale() {
        let view = look_at(Vec3::new(3.0, 1.0, 3.0), Vec3::new(0.0, 1.0, 10.0), Vec3::Y);
        let model = Mat4::from_scale(Vec3::new(4.0, 1.0, 0.5))
            * Mat4::from_rotation_y(0.3);
        let n = normal_matrix(view, model);
        let linear = Mat3::from_mat4(view * model);

        // A surface spanned by two tangents, with its normal.
        let t1 = Vec3::new(1.0, 1.0, 0.0);
        let t2 = Vec3::new(0.0, 1.0, 1.0);
        let normal = t1.cross(t2);

        let transformed_normal = n * normal;
        assert!(transformed_normal.dot(linear * t1).abs() < 1e-4);
        assert!(transformed_normal.dot(linear * t2).abs() < 1e-4);

        // Skipping the inverse-transpose skews the normal off the surface.
        let naive = linear * normal;
        assert!(naive.dot(linear * t1).abs() > 1e-2);
    }

    #[test]
    fn light_dir_matrix_matches_rotation_of_view() {
        let view = look_at(Vec3::new(3.0, 1.0, 3.0), Vec3::new(0.0, 1.0, 10.0), Vec3::Y);
        let m = light_dir_matrix(view);
        let dir = Vec3::new(0.0, 150.0, 150.0);
        let expected = view.transform_vector3(dir);
        assert!((m * dir).abs_diff_eq(expected, 1e-3));
    }

    #[test]
    fn perspective_maps_near_and_far_to_unit_depth_range() {
        let proj = perspective(45f32.to_radians(), 4.0 / 3.0, 0.1, 300.0);
        let near = proj * Vec4::new(0.0, 0.0, -0.1, 1.0);
        let far = proj * Vec4::new(0.0, 0.0, -300.0, 1.0);
        assert!((near.z / near.w).abs() < 1e-5);
        assert!((far.z / far.w - 1.0).abs() < 1e-5);
    }

    #[test]
    fn directional_light_space_keeps_target_inside_volume() {
        let target = Vec3::new(2.0, 1.0, 5.0);
        let light_space = directional_light_space(
            Vec3::new(0.0, 150.0, 150.0),
            target,
            ShadowFrustum::default(),
        );
        let clip = light_space * target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
        assert!((clip.w - 1.0).abs() < 1e-6);
    }

    #[test]
    fn point_light_space_is_a_perspective_projection() {
        let m = point_light_space(Vec3::new(6.3, 3.4, 3.9), Vec3::ZERO, 4.0 / 3.0);
        let clip = m * Vec3::ZERO.extend(1.0);
        assert!(clip.w > 1.0);
    }
}
