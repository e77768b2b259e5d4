//! Mesh data and GPU-resident meshes
//!
//! [`MeshData`] is plain CPU geometry produced by layout code. [`GpuMesh`] is
//! the vertex/index buffer pair it gets uploaded into; a `GpuMesh` is owned by
//! exactly one `Renderable` and must be released through the device that
//! allocated it.

use bytemuck::{Pod, Zeroable};

use crate::backend::{BackendResult, BufferHandle, RenderDevice, VertexLayout};

/// Vertex layout shared by all UI geometry
///
/// Position is in the primitive's local space (pixels for screen-space
/// primitives); `uv` addresses the bound texture and is zero for untextured
/// shapes. Color lives on the material, not the vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct UiVertex {
    /// Position (x, y, z)
    pub position: [f32; 3],
    /// Texture coordinates (u, v)
    pub uv: [f32; 2],
}

impl UiVertex {
    /// Untextured vertex in the z = 0 plane
    pub const fn flat(x: f32, y: f32) -> Self {
        Self { position: [x, y, 0.0], uv: [0.0, 0.0] }
    }

    /// Textured vertex in the z = 0 plane
    pub const fn textured(x: f32, y: f32, u: f32, v: f32) -> Self {
        Self { position: [x, y, 0.0], uv: [u, v] }
    }

    /// Attribute layout for pipeline creation
    pub const fn layout() -> VertexLayout {
        VertexLayout {
            stride: std::mem::size_of::<Self>(),
            position_offset: 0,
            uv_offset: std::mem::size_of::<[f32; 3]>(),
        }
    }
}

/// CPU-side triangle geometry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertices
    pub vertices: Vec<UiVertex>,
    /// Triangle-list indices into `vertices`
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Create mesh data from vertices and indices
    pub const fn new(vertices: Vec<UiVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Axis-aligned quad with its bottom-left corner at `(x, y)`
    pub fn quad(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            vertices: quad_vertices(x, y, width, height).to_vec(),
            indices: vec![0, 1, 2, 2, 3, 0],
        }
    }

    /// Whether there is nothing to draw
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }
}

/// Corners of an axis-aligned quad, counter-clockwise from bottom-left
pub const fn quad_vertices(x: f32, y: f32, width: f32, height: f32) -> [UiVertex; 4] {
    [
        UiVertex::flat(x, y),
        UiVertex::flat(x + width, y),
        UiVertex::flat(x + width, y + height),
        UiVertex::flat(x, y + height),
    ]
}

/// Vertex and index buffers living on the device
#[derive(Debug, PartialEq, Eq)]
pub struct GpuMesh {
    vertex_buffer: BufferHandle,
    vertex_capacity: usize,
    vertex_count: u32,
    index_buffer: BufferHandle,
    index_capacity: usize,
    index_count: u32,
}

impl GpuMesh {
    /// Allocate buffers sized for `data` and upload it
    ///
    /// Returns `Ok(None)` when the device refuses an allocation; any buffer
    /// already allocated for this mesh is released before returning.
    pub fn upload(device: &mut dyn RenderDevice, data: &MeshData) -> BackendResult<Option<Self>> {
        let vertex_bytes: &[u8] = bytemuck::cast_slice(&data.vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(&data.indices);

        let Some(vertex_buffer) = device.allocate_buffer(vertex_bytes.len()) else {
            log::warn!("Vertex buffer allocation failed ({} bytes)", vertex_bytes.len());
            return Ok(None);
        };
        let Some(index_buffer) = device.allocate_buffer(index_bytes.len()) else {
            log::warn!("Index buffer allocation failed ({} bytes)", index_bytes.len());
            device.release_buffer(vertex_buffer);
            return Ok(None);
        };

        let mesh = Self {
            vertex_buffer,
            vertex_capacity: vertex_bytes.len(),
            vertex_count: count_u32(data.vertices.len()),
            index_buffer,
            index_capacity: index_bytes.len(),
            index_count: count_u32(data.indices.len()),
        };
        if let Err(err) = mesh.write(device, vertex_bytes, index_bytes) {
            mesh.release(device);
            return Err(err);
        }
        Ok(Some(mesh))
    }

    /// Overwrite the buffers in place if `data` fits their capacity
    ///
    /// Returns `Ok(false)` without touching the device when it does not fit.
    pub fn try_update(&mut self, device: &mut dyn RenderDevice, data: &MeshData) -> BackendResult<bool> {
        let vertex_bytes: &[u8] = bytemuck::cast_slice(&data.vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(&data.indices);
        if vertex_bytes.len() > self.vertex_capacity || index_bytes.len() > self.index_capacity {
            return Ok(false);
        }
        self.write(device, vertex_bytes, index_bytes)?;
        self.vertex_count = count_u32(data.vertices.len());
        self.index_count = count_u32(data.indices.len());
        Ok(true)
    }

    /// Overwrite vertex positions only, keeping indices
    ///
    /// `vertices` must not exceed the vertex buffer capacity.
    pub fn write_vertices(&mut self, device: &mut dyn RenderDevice, vertices: &[UiVertex]) -> BackendResult<()> {
        device.upload_bytes(self.vertex_buffer, 0, bytemuck::cast_slice(vertices))
    }

    /// Return both buffers to the device
    pub fn release(self, device: &mut dyn RenderDevice) {
        device.release_buffer(self.vertex_buffer);
        device.release_buffer(self.index_buffer);
    }

    /// Vertex buffer handle
    pub const fn vertex_buffer(&self) -> BufferHandle {
        self.vertex_buffer
    }

    /// Index buffer handle
    pub const fn index_buffer(&self) -> BufferHandle {
        self.index_buffer
    }

    /// Number of vertices currently stored
    pub const fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Number of indices currently stored
    pub const fn index_count(&self) -> u32 {
        self.index_count
    }

    fn write(&self, device: &mut dyn RenderDevice, vertex_bytes: &[u8], index_bytes: &[u8]) -> BackendResult<()> {
        device.upload_bytes(self.vertex_buffer, 0, vertex_bytes)?;
        device.upload_bytes(self.index_buffer, 0, index_bytes)
    }
}

fn count_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingDevice;

    #[test]
    fn test_vertex_layout_matches_struct() {
        let layout = UiVertex::layout();
        assert_eq!(layout.stride, 20);
        assert_eq!(layout.uv_offset, 12);
    }

    #[test]
    fn test_upload_and_release() {
        let mut device = RecordingDevice::new();
        let mesh = GpuMesh::upload(&mut device, &MeshData::quad(0.0, 0.0, 10.0, 10.0))
            .unwrap()
            .unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.index_count(), 6);
        assert_eq!(device.live_buffers(), 2);

        mesh.release(&mut device);
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn test_partial_allocation_failure_leaks_nothing() {
        let mut device = RecordingDevice::with_buffer_budget(1);
        let mesh = GpuMesh::upload(&mut device, &MeshData::quad(0.0, 0.0, 1.0, 1.0)).unwrap();
        assert!(mesh.is_none());
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn test_in_place_update_only_when_it_fits() {
        let mut device = RecordingDevice::new();
        let mut mesh = GpuMesh::upload(&mut device, &MeshData::quad(0.0, 0.0, 1.0, 1.0))
            .unwrap()
            .unwrap();

        let smaller = MeshData::new(vec![UiVertex::flat(0.0, 0.0); 3], vec![0, 1, 2]);
        assert!(mesh.try_update(&mut device, &smaller).unwrap());
        assert_eq!(mesh.index_count(), 3);

        let mut bigger = MeshData::quad(0.0, 0.0, 1.0, 1.0);
        bigger.vertices.extend(quad_vertices(2.0, 0.0, 1.0, 1.0));
        bigger.indices.extend([4, 5, 6, 6, 7, 4]);
        assert!(!mesh.try_update(&mut device, &bigger).unwrap());
        assert_eq!(mesh.index_count(), 3);
    }
}
