// asset/loader.rs
use std::fmt;
use std::path::{Path, PathBuf};

use glam::{Mat3, Mat4, Vec3};
use image::RgbaImage;

use crate::io;
use crate::renderer::Vertex;
use crate::scene::ConfigError;

#[derive(Debug)]
pub enum LoadError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    Gltf {
        path: PathBuf,
        source: gltf::Error,
    },
    InvalidMesh {
        path: PathBuf,
        reason: String,
    },
    InvalidImage {
        path: PathBuf,
        reason: String,
    },
    MissingUniform {
        shader: PathBuf,
        uniform: &'static str,
    },
    Config(ConfigError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, source } => write!(f, "Failed to read {:?}: {}", path, source),
            LoadError::Image { path, source } => {
                write!(f, "Failed to decode image {:?}: {}", path, source)
            }
            LoadError::Gltf { path, source } => {
                write!(f, "Failed to import glTF {:?}: {}", path, source)
            }
            LoadError::InvalidMesh { path, reason } => {
                write!(f, "Unusable mesh in {:?}: {}", path, reason)
            }
            LoadError::InvalidImage { path, reason } => {
                write!(f, "Unusable image {:?}: {}", path, reason)
            }
            LoadError::MissingUniform { shader, uniform } => {
                write!(f, "Shader {:?} does not declare `{}`", shader, uniform)
            }
            LoadError::Config(err) => write!(f, "Invalid scene configuration: {}", err),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Image { source, .. } => Some(source),
            LoadError::Gltf { source, .. } => Some(source),
            LoadError::Config(err) => Some(err),
            LoadError::InvalidMesh { .. }
            | LoadError::InvalidImage { .. }
            | LoadError::MissingUniform { .. } => None,
        }
    }
}

impl From<ConfigError> for LoadError {
    fn from(err: ConfigError) -> Self {
        LoadError::Config(err)
    }
}

/// Base color of a primitive: a texture (if the file has one) modulated by
/// the material's factor.
#[derive(Clone, Debug)]
pub struct BaseColor {
    pub factor: [f32; 4],
    pub image: Option<RgbaImage>,
}

#[derive(Clone, Debug)]
pub struct PartData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub base_color: BaseColor,
}

/// CPU-side model, node transforms already baked into the vertices.
#[derive(Clone, Debug)]
pub struct ModelData {
    pub name: String,
    pub parts: Vec<PartData>,
}

impl ModelData {
    pub fn vertex_count(&self) -> usize {
        self.parts.iter().map(|part| part.vertices.len()).sum()
    }
}

pub fn load_model(path: &Path) -> Result<ModelData, LoadError> {
    log::info!("Loading model: {:?}", path);
    let (document, buffers, images) = gltf::import(path).map_err(|source| LoadError::Gltf {
        path: path.to_path_buf(),
        source,
    })?;

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Unnamed".to_string());

    model_from_gltf(name, path, &document, &buffers, &images)
}

pub fn model_from_gltf(
    name: String,
    path: &Path,
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    images: &[gltf::image::Data],
) -> Result<ModelData, LoadError> {
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| LoadError::InvalidMesh {
            path: path.to_path_buf(),
            reason: "document has no scenes".into(),
        })?;

    let mut parts = Vec::new();
    for node in scene.nodes() {
        collect_node(&node, Mat4::IDENTITY, path, buffers, images, &mut parts)?;
    }

    if parts.is_empty() {
        return Err(LoadError::InvalidMesh {
            path: path.to_path_buf(),
            reason: "no triangle primitives found".into(),
        });
    }

    let model = ModelData { name, parts };
    log::debug!(
        "Model '{}': {} parts, {} vertices",
        model.name,
        model.parts.len(),
        model.vertex_count()
    );
    Ok(model)
}

fn collect_node(
    node: &gltf::Node,
    parent: Mat4,
    path: &Path,
    buffers: &[gltf::buffer::Data],
    images: &[gltf::image::Data],
    parts: &mut Vec<PartData>,
) -> Result<(), LoadError> {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if !matches!(primitive.mode(), gltf::mesh::Mode::Triangles) {
                log::warn!(
                    "Skipping {:?} primitive in node '{}'",
                    primitive.mode(),
                    node.name().unwrap_or("Unnamed")
                );
                continue;
            }
            parts.push(load_primitive(&primitive, world, path, buffers, images)?);
        }
    }

    for child in node.children() {
        collect_node(&child, world, path, buffers, images, parts)?;
    }

    Ok(())
}

fn load_primitive(
    primitive: &gltf::Primitive,
    world: Mat4,
    path: &Path,
    buffers: &[gltf::buffer::Data],
    images: &[gltf::image::Data],
) -> Result<PartData, LoadError> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let positions = reader
        .read_positions()
        .ok_or_else(|| LoadError::InvalidMesh {
            path: path.to_path_buf(),
            reason: "primitive has no positions".into(),
        })?
        .collect::<Vec<_>>();

    let mut indices = reader
        .read_indices()
        .map(|indices| indices.into_u32().collect::<Vec<_>>())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());

    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
        return Err(LoadError::InvalidMesh {
            path: path.to_path_buf(),
            reason: format!("index {} out of range for {} vertices", bad, positions.len()),
        });
    }

    let normals = reader
        .read_normals()
        .map(|normals| normals.collect::<Vec<_>>())
        .unwrap_or_else(|| {
            log::debug!("    No normals in primitive, generating them");
            generate_normals(&positions, &indices)
        });

    let uvs = reader
        .read_tex_coords(0)
        .map(|uv| uv.into_f32().collect::<Vec<_>>())
        .unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);

    for (attribute, count) in [("normals", normals.len()), ("uvs", uvs.len())] {
        if count != positions.len() {
            return Err(LoadError::InvalidMesh {
                path: path.to_path_buf(),
                reason: format!("{} {} for {} positions", count, attribute, positions.len()),
            });
        }
    }

    let normal_transform = Mat3::from_mat4(world).inverse().transpose();
    let vertices = positions
        .iter()
        .zip(normals.iter())
        .zip(uvs.iter())
        .map(|((pos, normal), uv)| Vertex {
            pos: world.transform_point3(Vec3::from(*pos)).to_array(),
            normal: (normal_transform * Vec3::from(*normal))
                .normalize_or_zero()
                .to_array(),
            uv: *uv,
        })
        .collect::<Vec<_>>();

    // A mirroring node transform flips triangle winding.
    if world.determinant() < 0.0 {
        for triangle in indices.chunks_exact_mut(3) {
            triangle.swap(1, 2);
        }
    }

    log::trace!(
        "    Primitive: {} vertices, {} indices",
        vertices.len(),
        indices.len()
    );

    Ok(PartData {
        vertices,
        indices,
        base_color: base_color(&primitive.material(), images),
    })
}

fn base_color(material: &gltf::Material, images: &[gltf::image::Data]) -> BaseColor {
    let pbr = material.pbr_metallic_roughness();
    let image = pbr.base_color_texture().and_then(|info| {
        let index = info.texture().source().index();
        let converted = images.get(index).and_then(gltf_image_to_rgba8);
        if converted.is_none() {
            log::warn!(
                "Base color image {} of material '{}' is unsupported; using the color factor",
                index,
                material.name().unwrap_or("Unnamed")
            );
        }
        converted
    });

    BaseColor {
        factor: pbr.base_color_factor(),
        image,
    }
}

fn gltf_image_to_rgba8(data: &gltf::image::Data) -> Option<RgbaImage> {
    use gltf::image::Format;

    let pixels = match data.format {
        Format::R8G8B8A8 => data.pixels.clone(),
        Format::R8G8B8 => data
            .pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        Format::R8G8 => data
            .pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        Format::R8 => data.pixels.iter().flat_map(|&v| [v, v, v, 255]).collect(),
        _ => return None,
    };

    RgbaImage::from_raw(data.width, data.height, pixels)
}

/// Area-weighted smooth normals for primitives that ship without them.
fn generate_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        let p0 = Vec3::from(positions[a]);
        let face = (Vec3::from(positions[b]) - p0).cross(Vec3::from(positions[c]) - p0);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }

    normals
        .into_iter()
        .map(|n| n.normalize_or(Vec3::Y).to_array())
        .collect()
}

/// Decodes any format the `image` crate understands into RGBA8.
pub fn load_rgba(path: &Path) -> Result<RgbaImage, LoadError> {
    let bytes = io::load_binary(path)?;
    let image = image::load_from_memory(&bytes).map_err(|source| LoadError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;

    // One triangle in the XY plane, no normals, indexed with u16. The mesh
    // node sits one unit along +X under a root translated five units along +Z.
    const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [
            { "translation": [0.0, 0.0, 5.0], "children": [1] },
            { "translation": [1.0, 0.0, 0.0], "mesh": 0 }
        ],
        "meshes": [{
            "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 }]
        }],
        "materials": [{
            "pbrMetallicRoughness": { "baseColorFactor": [0.5, 0.25, 1.0, 1.0] }
        }],
        "buffers": [{
            "byteLength": 44,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAIAAAA="
        }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ]
    }"#;

    fn triangle_model() -> ModelData {
        let (document, buffers, images) = gltf::import_slice(TRIANGLE_GLTF.as_bytes()).unwrap();
        model_from_gltf(
            "triangle".into(),
            Path::new("triangle.gltf"),
            &document,
            &buffers,
            &images,
        )
        .unwrap()
    }

    #[test]
    fn node_transforms_are_baked_into_vertices() {
        let model = triangle_model();
        assert_eq!(model.parts.len(), 1);

        let positions: Vec<[f32; 3]> = model.parts[0].vertices.iter().map(|v| v.pos).collect();
        assert_eq!(
            positions,
            vec![[1.0, 0.0, 5.0], [2.0, 0.0, 5.0], [1.0, 1.0, 5.0]]
        );
        assert_eq!(model.parts[0].indices, vec![0, 1, 2]);
    }

    #[test]
    fn short_normal_accessor_is_rejected() {
        let gltf = TRIANGLE_GLTF
            .replace(
                r#""attributes": { "POSITION": 0 }"#,
                r#""attributes": { "POSITION": 0, "NORMAL": 2 }"#,
            )
            .replace(
                r#"{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }"#,
                r#"{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" },
            { "bufferView": 0, "componentType": 5126, "count": 2, "type": "VEC3" }"#,
            );
        let (document, buffers, images) = gltf::import_slice(gltf.as_bytes()).unwrap();
        let err = model_from_gltf(
            "short".into(),
            Path::new("short.gltf"),
            &document,
            &buffers,
            &images,
        )
        .unwrap_err();

        assert!(matches!(err, LoadError::InvalidMesh { .. }));
        assert!(err.to_string().contains("2 normals for 3 positions"), "{err}");
    }

    #[test]
    fn missing_normals_are_generated_from_faces() {
        let model = triangle_model();
        for vertex in &model.parts[0].vertices {
            assert!(Vec3::from(vertex.normal).abs_diff_eq(Vec3::Z, 1e-6));
        }
    }

    #[test]
    fn material_without_texture_keeps_its_factor() {
        let model = triangle_model();
        let base = &model.parts[0].base_color;
        assert_eq!(base.factor, [0.5, 0.25, 1.0, 1.0]);
        assert!(base.image.is_none());
    }

    #[test]
    fn rgb_images_gain_an_opaque_alpha_channel() {
        let data = gltf::image::Data {
            pixels: vec![10, 20, 30, 40, 50, 60],
            format: gltf::image::Format::R8G8B8,
            width: 2,
            height: 1,
        };
        let rgba = gltf_image_to_rgba8(&data).unwrap();
        assert_eq!(rgba.as_raw(), &vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn missing_file_reports_the_path() {
        let err = load_rgba(Path::new("no/such/face.jpg")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().contains("face.jpg"));
    }
}
