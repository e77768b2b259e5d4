//! GPU-side drawable: one mesh, one material, one transform
//!
//! A [`Renderable`] is the only thing in the core that turns into a
//! [`DrawCall`]. Primitives build their geometry, hand it to a renderable and
//! keep pushing state (color, topology, transform) into it.

use std::cell::RefCell;
use std::rc::Rc;

use super::mesh::{GpuMesh, MeshData, UiVertex};
use crate::backend::{
    BackendResult, DepthBias, DrawCall, PipelineHandle, PrimitiveTopology, RenderDevice,
    RenderEncoder, ShaderProgram, TextureHandle,
};
use crate::foundation::math::{to_cols_array, Mat4, Vec4};

/// Renderable shared between a primitive and the compositor's standalone list
pub type SharedRenderable = Rc<RefCell<Renderable>>;

/// Shader program, color and optional texture
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Program used to draw
    pub shader: ShaderProgram,
    /// RGBA color multiplied into the output
    pub color: Vec4,
    /// Texture sampled by the program
    pub texture: Option<TextureHandle>,
}

impl Material {
    /// Untextured material
    pub const fn flat(color: Vec4) -> Self {
        Self { shader: ShaderProgram::General, color, texture: None }
    }

    /// Glyph material sampling `atlas`
    pub const fn text(color: Vec4, atlas: Option<TextureHandle>) -> Self {
        Self { shader: ShaderProgram::Text, color, texture: atlas }
    }
}

/// A mesh plus everything needed to draw it
#[derive(Debug)]
pub struct Renderable {
    mesh: Option<GpuMesh>,
    material: Material,
    pipeline: Option<PipelineHandle>,
    transform: Mat4,
    screen_space: bool,
    topology: PrimitiveTopology,
    depth_bias: DepthBias,
}

impl Renderable {
    /// Upload `data` and resolve the material's pipeline
    ///
    /// Allocation failures leave the renderable without a mesh (or pipeline);
    /// it then simply draws nothing.
    pub fn new(device: &mut dyn RenderDevice, data: &MeshData, material: Material) -> BackendResult<Self> {
        let pipeline = device.create_pipeline(material.shader, UiVertex::layout());
        if pipeline.is_none() {
            log::warn!("No pipeline for shader '{}'", material.shader.name());
        }
        let mesh = if data.is_empty() { None } else { GpuMesh::upload(device, data)? };
        Ok(Self {
            mesh,
            material,
            pipeline,
            transform: Mat4::identity(),
            screen_space: false,
            topology: PrimitiveTopology::TriangleList,
            depth_bias: DepthBias::default(),
        })
    }

    /// Wrap into a shared handle
    pub fn into_shared(self) -> SharedRenderable {
        Rc::new(RefCell::new(self))
    }

    /// Replace the geometry
    ///
    /// Reuses the current buffers when the new data fits; otherwise the old
    /// buffers are released before new ones are allocated.
    pub fn update_mesh(&mut self, device: &mut dyn RenderDevice, data: &MeshData) -> BackendResult<()> {
        if data.is_empty() {
            self.release(device);
            return Ok(());
        }
        if let Some(mesh) = self.mesh.as_mut() {
            if mesh.try_update(device, data)? {
                return Ok(());
            }
        }
        self.release(device);
        self.mesh = GpuMesh::upload(device, data)?;
        Ok(())
    }

    /// Overwrite vertices in place without touching indices
    pub fn write_vertices(&mut self, device: &mut dyn RenderDevice, vertices: &[UiVertex]) -> BackendResult<()> {
        match self.mesh.as_mut() {
            Some(mesh) => mesh.write_vertices(device, vertices),
            None => Ok(()),
        }
    }

    /// Release the GPU buffers; the renderable draws nothing afterwards
    pub fn release(&mut self, device: &mut dyn RenderDevice) {
        if let Some(mesh) = self.mesh.take() {
            mesh.release(device);
        }
    }

    /// Record a draw with the given camera matrices
    pub fn draw(&self, encoder: &mut dyn RenderEncoder, projection: &Mat4, view: &Mat4) -> BackendResult<()> {
        let (Some(mesh), Some(pipeline)) = (self.mesh.as_ref(), self.pipeline) else {
            return Ok(());
        };
        if mesh.index_count() == 0 {
            return Ok(());
        }
        encoder.submit_draw(&DrawCall {
            pipeline,
            vertex_buffer: mesh.vertex_buffer(),
            vertex_count: mesh.vertex_count(),
            index_buffer: Some((mesh.index_buffer(), mesh.index_count())),
            topology: self.topology,
            model: to_cols_array(&self.transform),
            view: to_cols_array(view),
            projection: to_cols_array(projection),
            color: self.material.color.into(),
            texture: self.material.texture,
            depth_bias: self.depth_bias,
        })
    }

    /// Whether there is a mesh to draw
    pub const fn has_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    /// Current GPU mesh
    pub const fn mesh(&self) -> Option<&GpuMesh> {
        self.mesh.as_ref()
    }

    /// Material
    pub const fn material(&self) -> &Material {
        &self.material
    }

    /// Set the material color
    pub fn set_color(&mut self, color: Vec4) {
        self.material.color = color;
    }

    /// Set the sampled texture
    pub fn set_texture(&mut self, texture: Option<TextureHandle>) {
        self.material.texture = texture;
    }

    /// Model matrix
    pub const fn transform(&self) -> &Mat4 {
        &self.transform
    }

    /// Set the model matrix
    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    /// Whether this renderable is drawn as an overlay
    pub const fn is_screen_space(&self) -> bool {
        self.screen_space
    }

    /// Mark as overlay (ortho projection, no depth) or world geometry
    pub fn set_screen_space(&mut self, screen_space: bool) {
        self.screen_space = screen_space;
    }

    /// Primitive topology
    pub const fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// Set the primitive topology
    pub fn set_topology(&mut self, topology: PrimitiveTopology) {
        self.topology = topology;
    }

    /// Depth bias
    pub const fn depth_bias(&self) -> DepthBias {
        self.depth_bias
    }

    /// Set the rasterizer depth bias
    pub fn set_depth_bias(&mut self, depth_bias: DepthBias) {
        self.depth_bias = depth_bias;
    }
}
