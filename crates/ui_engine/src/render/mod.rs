//! Rendering layer: meshes, renderables and the per-frame compositor

pub mod compositor;
pub mod mesh;
pub mod renderable;

pub use compositor::{CameraMatrices, FrameStats, MeshRenderer};
pub use mesh::{GpuMesh, MeshData, UiVertex};
pub use renderable::{Material, Renderable, SharedRenderable};
