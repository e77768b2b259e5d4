//! GPU collaborator interface
//!
//! The UI core never talks to a graphics API directly. It asks a
//! [`RenderDevice`] for buffers, textures and named pipelines, and hands
//! fully-described [`DrawCall`]s to a per-frame [`RenderEncoder`]. Any real
//! backend (Vulkan, Metal, wgpu) implements these two traits; the
//! [`recording`] backend implements them in memory for tests and headless runs.

pub mod recording;

pub use recording::{RecordedDraw, RecordingDevice, RecordingEncoder};

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors reported by a render backend
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Buffer handle was never allocated or already released
    #[error("Unknown buffer {0:?}")]
    UnknownBuffer(BufferHandle),

    /// Upload would write past the end of the buffer
    #[error("Upload of {len} bytes at offset {offset} overflows buffer {buffer:?} ({capacity} bytes)")]
    OutOfBounds {
        /// Target buffer
        buffer: BufferHandle,
        /// Byte offset of the write
        offset: usize,
        /// Length of the write
        len: usize,
        /// Buffer capacity in bytes
        capacity: usize,
    },

    /// The device can no longer accept work this frame
    #[error("Device lost: {0}")]
    DeviceLost(String),
}

/// Handle to a GPU buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

/// Handle to a GPU texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Handle to a compiled render pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineHandle(pub u64);

/// How vertices are assembled into primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Every three indices form a triangle
    #[default]
    TriangleList,
    /// Consecutive vertex pairs form line segments
    LineList,
    /// Each vertex is drawn as a point
    PointList,
}

/// Depth test/write policy for subsequent draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthState {
    /// Depth test and depth write enabled
    Enabled,
    /// No depth test and no depth write
    Disabled,
    /// Test always passes, depth is not written
    Always,
}

/// Texel format for textures created by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Single 8-bit channel (glyph coverage)
    R8Unorm,
}

impl TextureFormat {
    /// Size of one texel in bytes
    pub const fn bytes_per_texel(self) -> usize {
        match self {
            Self::R8Unorm => 1,
        }
    }
}

/// Shader programs the core asks for by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderProgram {
    /// Flat-colored geometry
    General,
    /// Glyph quads sampling a single-channel atlas
    Text,
}

impl ShaderProgram {
    /// Name used when asking the device for a pipeline
    pub const fn name(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Text => "text",
        }
    }
}

/// Attribute layout of the vertex buffers the core uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    /// Bytes between consecutive vertices
    pub stride: usize,
    /// Byte offset of the `position` attribute
    pub position_offset: usize,
    /// Byte offset of the `uv` attribute
    pub uv_offset: usize,
}

/// Constant and slope-scaled depth bias applied by the rasterizer
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DepthBias {
    /// Constant bias
    pub constant: f32,
    /// Slope-scaled bias
    pub slope: f32,
}

impl DepthBias {
    /// Bias that pushes geometry behind coplanar geometry without bias
    pub const fn new(constant: f32, slope: f32) -> Self {
        Self { constant, slope }
    }

    /// Whether the bias is non-zero
    pub fn is_active(&self) -> bool {
        self.constant != 0.0 || self.slope != 0.0
    }
}

/// Everything the backend needs to issue one draw
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// Pipeline for the material's shader program
    pub pipeline: PipelineHandle,
    /// Vertex buffer
    pub vertex_buffer: BufferHandle,
    /// Number of vertices in the buffer
    pub vertex_count: u32,
    /// Index buffer and index count for indexed draws
    pub index_buffer: Option<(BufferHandle, u32)>,
    /// Primitive assembly mode
    pub topology: PrimitiveTopology,
    /// Model matrix (column-major)
    pub model: [[f32; 4]; 4],
    /// View matrix (column-major)
    pub view: [[f32; 4]; 4],
    /// Projection matrix (column-major)
    pub projection: [[f32; 4]; 4],
    /// Material color (RGBA)
    pub color: [f32; 4],
    /// Texture bound to the material, if any
    pub texture: Option<TextureHandle>,
    /// Rasterizer depth bias
    pub depth_bias: DepthBias,
}

impl DrawCall {
    /// Whether this draw uses an index buffer
    pub const fn is_indexed(&self) -> bool {
        self.index_buffer.is_some()
    }
}

/// Resource allocation side of the GPU backend
///
/// Allocation failures are reported as `None` rather than errors: the caller
/// is expected to skip drawing, not fail the frame.
pub trait RenderDevice {
    /// Allocate a buffer of `size_bytes`
    fn allocate_buffer(&mut self, size_bytes: usize) -> Option<BufferHandle>;

    /// Copy `data` into `buffer` starting at `offset`
    fn upload_bytes(&mut self, buffer: BufferHandle, offset: usize, data: &[u8]) -> BackendResult<()>;

    /// Release a buffer; releasing an unknown handle is a no-op
    fn release_buffer(&mut self, buffer: BufferHandle);

    /// Create a texture initialised with `data`
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
        data: &[u8],
    ) -> Option<TextureHandle>;

    /// Release a texture; releasing an unknown handle is a no-op
    fn release_texture(&mut self, texture: TextureHandle);

    /// Create (or fetch a cached) pipeline for a named shader program
    fn create_pipeline(&mut self, shader: ShaderProgram, layout: VertexLayout) -> Option<PipelineHandle>;
}

/// Per-frame command recording side of the GPU backend
pub trait RenderEncoder {
    /// Set the depth policy for following draws
    fn set_depth_state(&mut self, state: DepthState);

    /// Record one draw
    fn submit_draw(&mut self, call: &DrawCall) -> BackendResult<()>;
}
