// renderer/shader.rs
//
// WGSL programs are read from disk at startup. Each program must declare the
// identifiers the host binds by name, otherwise loading fails before any
// pipeline is built.
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::asset::LoadError;
use crate::io;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UniformRole {
    Model,
    View,
    Projection,
    NormalMatrix,
    LightDir,
    LightColor,
    LightDirMatrix,
    FogDensity,
    PointLightPosition,
    PointLightColor,
    LightSpaceTrMatrix,
    ShadowMap,
}

impl UniformRole {
    pub const ALL: [UniformRole; 12] = [
        UniformRole::Model,
        UniformRole::View,
        UniformRole::Projection,
        UniformRole::NormalMatrix,
        UniformRole::LightDir,
        UniformRole::LightColor,
        UniformRole::LightDirMatrix,
        UniformRole::FogDensity,
        UniformRole::PointLightPosition,
        UniformRole::PointLightColor,
        UniformRole::LightSpaceTrMatrix,
        UniformRole::ShadowMap,
    ];

    /// Identifier the shader must use for this value.
    pub fn name(self) -> &'static str {
        match self {
            UniformRole::Model => "model",
            UniformRole::View => "view",
            UniformRole::Projection => "projection",
            UniformRole::NormalMatrix => "normalMatrix",
            UniformRole::LightDir => "lightDir",
            UniformRole::LightColor => "lightColor",
            UniformRole::LightDirMatrix => "lightDirMatrix",
            UniformRole::FogDensity => "fogDensity",
            UniformRole::PointLightPosition => "pointLightPosition",
            UniformRole::PointLightColor => "pointLightColor",
            UniformRole::LightSpaceTrMatrix => "lightSpaceTrMatrix",
            UniformRole::ShadowMap => "shadowMap",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderKind {
    DepthMap,
    Basic,
    Skybox,
}

impl ShaderKind {
    pub fn file_name(self) -> &'static str {
        match self {
            ShaderKind::DepthMap => "depth_map.wgsl",
            ShaderKind::Basic => "basic.wgsl",
            ShaderKind::Skybox => "skybox.wgsl",
        }
    }

    pub fn required_roles(self) -> &'static [UniformRole] {
        match self {
            ShaderKind::DepthMap => &[UniformRole::Model, UniformRole::LightSpaceTrMatrix],
            ShaderKind::Basic => &UniformRole::ALL,
            ShaderKind::Skybox => &[
                UniformRole::View,
                UniformRole::Projection,
                UniformRole::FogDensity,
            ],
        }
    }
}

/// WGSL text that has passed the identifier check for its kind.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    kind: ShaderKind,
    path: PathBuf,
    source: String,
}

impl ShaderSource {
    pub fn load(dir: &Path, kind: ShaderKind) -> Result<Self, LoadError> {
        let path = dir.join(kind.file_name());
        let source = io::load_text(&path)?;
        let shader = Self::from_source(path, kind, source)?;
        log::info!("Loaded shader {:?}", shader.path);
        Ok(shader)
    }

    pub fn from_source(
        path: impl Into<PathBuf>,
        kind: ShaderKind,
        source: String,
    ) -> Result<Self, LoadError> {
        let path = path.into();
        let declared = identifiers(&source);
        if let Some(missing) = kind
            .required_roles()
            .iter()
            .find(|role| !declared.contains(role.name()))
        {
            return Err(LoadError::MissingUniform {
                shader: path,
                uniform: missing.name(),
            });
        }

        Ok(Self { kind, path, source })
    }

    pub fn kind(&self) -> ShaderKind {
        self.kind
    }

    pub fn create_module(&self, device: &wgpu::Device) -> wgpu::ShaderModule {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(self.kind.file_name()),
            source: wgpu::ShaderSource::Wgsl(self.source.as_str().into()),
        })
    }
}

/// Every identifier outside comments. Block comments nest in WGSL.
fn identifiers(source: &str) -> HashSet<&str> {
    let bytes = source.as_bytes();
    let mut found = HashSet::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        let rest = &bytes[i..];
        if rest.starts_with(b"/*") {
            depth += 1;
            i += 2;
        } else if depth > 0 && rest.starts_with(b"*/") {
            depth -= 1;
            i += 2;
        } else if depth > 0 {
            i += 1;
        } else if rest.starts_with(b"//") {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
        } else if bytes[i].is_ascii_alphabetic() || bytes[i] == b'_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            found.insert(&source[start..i]);
        } else if bytes[i].is_ascii_digit() {
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'.') {
                i += 1;
            }
        } else {
            i += 1;
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shader_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders")
    }

    #[test]
    fn shipped_shaders_declare_their_uniforms() {
        for kind in [ShaderKind::DepthMap, ShaderKind::Basic, ShaderKind::Skybox] {
            let shader = ShaderSource::load(&shader_dir(), kind).unwrap();
            assert_eq!(shader.kind(), kind);
        }
    }

    #[test]
    fn missing_uniform_is_reported_by_name() {
        let source = "struct U { model: mat4x4<f32> }\n".to_string();
        let err = ShaderSource::from_source("inline.wgsl", ShaderKind::DepthMap, source)
            .unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingUniform { uniform: "lightSpaceTrMatrix", .. }
        ));
    }

    #[test]
    fn names_inside_comments_do_not_count() {
        let source = "// lightSpaceTrMatrix\n/* outer /* model */ */ var<private> x: f32;"
            .to_string();
        let err = ShaderSource::from_source("inline.wgsl", ShaderKind::DepthMap, source)
            .unwrap_err();
        assert!(matches!(err, LoadError::MissingUniform { uniform: "model", .. }));
    }

    #[test]
    fn identifiers_are_matched_whole() {
        let ids = identifiers("let modelView = lightDir2;");
        assert!(!ids.contains("model"));
        assert!(!ids.contains("lightDir"));
        assert!(ids.contains("modelView"));
    }

    #[test]
    fn every_role_has_a_distinct_name() {
        let names: HashSet<&str> = UniformRole::ALL.iter().map(|r| r.name()).collect();
        assert_eq!(names.len(), UniformRole::ALL.len());
    }
}
