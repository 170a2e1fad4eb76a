mod buffers;
pub mod context;
pub mod depth;
pub mod diagnostics;
pub mod material;
pub mod pipeline;
pub mod pipeline_builder;
#[allow(clippy::module_inception)]
mod renderer;
pub mod shader;
pub mod shadows;
pub mod skybox;
pub mod texture;
pub mod uniforms;
pub mod vertex;

pub use context::InitError;
pub use depth::Depth;
pub use material::Material;
pub use renderer::Renderer;
pub use shader::{ShaderKind, ShaderSource, UniformRole};
pub use skybox::{face_paths, CubeImages};
pub use vertex::Vertex;
