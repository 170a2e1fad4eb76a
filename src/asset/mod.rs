pub mod cache;
pub mod handle;
pub mod loader;
pub mod mesh;
pub mod model;

pub use cache::AssetCache;
pub use handle::Handle;
pub use loader::{load_model, load_rgba, BaseColor, LoadError, ModelData, PartData};
pub use mesh::Mesh;
pub use model::{Model, ModelPart};

pub struct Assets {
    pub models: AssetCache<Model>,
}

impl Assets {
    pub fn new() -> Self {
        Self {
            models: AssetCache::new(),
        }
    }
}

impl Default for Assets {
    fn default() -> Self {
        Self::new()
    }
}
