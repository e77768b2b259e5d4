//! In-memory render backend
//!
//! Keeps every buffer as a byte vector and every draw as a value, which
//! makes buffer lifetimes and pass ordering observable without a GPU.

use std::collections::HashMap;

use super::{
    BackendError, BackendResult, BufferHandle, DepthState, DrawCall, PipelineHandle, RenderDevice,
    RenderEncoder, ShaderProgram, TextureFormat, TextureHandle, VertexLayout,
};

/// Device that stores all resources in host memory
#[derive(Debug, Default)]
pub struct RecordingDevice {
    next_id: u64,
    buffers: HashMap<BufferHandle, Vec<u8>>,
    textures: HashMap<TextureHandle, (u32, u32)>,
    pipelines: HashMap<ShaderProgram, PipelineHandle>,
    buffer_budget: Option<usize>,
    total_allocations: usize,
    total_releases: usize,
    uploads: usize,
}

impl RecordingDevice {
    /// Create a device with no allocation limit
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a device that refuses to hold more than `max_live_buffers` at once
    pub fn with_buffer_budget(max_live_buffers: usize) -> Self {
        Self {
            buffer_budget: Some(max_live_buffers),
            ..Self::default()
        }
    }

    /// Number of buffers currently allocated
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Number of buffers allocated over the device lifetime
    pub const fn total_allocations(&self) -> usize {
        self.total_allocations
    }

    /// Number of buffers released over the device lifetime
    pub const fn total_releases(&self) -> usize {
        self.total_releases
    }

    /// Number of successful `upload_bytes` calls
    pub const fn upload_count(&self) -> usize {
        self.uploads
    }

    /// Number of textures created
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Whether `buffer` is currently allocated
    pub fn is_live(&self, buffer: BufferHandle) -> bool {
        self.buffers.contains_key(&buffer)
    }

    /// Contents of a live buffer
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    fn next_handle(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl RenderDevice for RecordingDevice {
    fn allocate_buffer(&mut self, size_bytes: usize) -> Option<BufferHandle> {
        if self.buffer_budget.is_some_and(|budget| self.buffers.len() >= budget) {
            log::warn!("Buffer budget exhausted, refusing {} byte allocation", size_bytes);
            return None;
        }
        let handle = BufferHandle(self.next_handle());
        self.buffers.insert(handle, vec![0; size_bytes]);
        self.total_allocations += 1;
        Some(handle)
    }

    fn upload_bytes(&mut self, buffer: BufferHandle, offset: usize, data: &[u8]) -> BackendResult<()> {
        let storage = self
            .buffers
            .get_mut(&buffer)
            .ok_or(BackendError::UnknownBuffer(buffer))?;
        let end = offset + data.len();
        if end > storage.len() {
            return Err(BackendError::OutOfBounds {
                buffer,
                offset,
                len: data.len(),
                capacity: storage.len(),
            });
        }
        storage[offset..end].copy_from_slice(data);
        self.uploads += 1;
        Ok(())
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(&buffer).is_some() {
            self.total_releases += 1;
        }
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
        data: &[u8],
    ) -> Option<TextureHandle> {
        if data.len() != (width as usize) * (height as usize) * format.bytes_per_texel() {
            log::warn!("Texture data size {} does not match {}x{}", data.len(), width, height);
            return None;
        }
        let handle = TextureHandle(self.next_handle());
        self.textures.insert(handle, (width, height));
        Some(handle)
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture);
    }

    fn create_pipeline(&mut self, shader: ShaderProgram, _layout: VertexLayout) -> Option<PipelineHandle> {
        if let Some(existing) = self.pipelines.get(&shader) {
            return Some(*existing);
        }
        let handle = PipelineHandle(self.next_handle());
        log::debug!("Created pipeline '{}' as {:?}", shader.name(), handle);
        self.pipelines.insert(shader, handle);
        Some(handle)
    }
}

/// A draw together with the depth state that was active when it was submitted
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    /// The submitted draw
    pub call: DrawCall,
    /// Depth state at submission time
    pub depth_state: DepthState,
}

/// Encoder that appends every draw to a list
#[derive(Debug)]
pub struct RecordingEncoder {
    depth_state: DepthState,
    draws: Vec<RecordedDraw>,
    fail_after: Option<usize>,
}

impl Default for RecordingEncoder {
    fn default() -> Self {
        Self {
            depth_state: DepthState::Enabled,
            draws: Vec::new(),
            fail_after: None,
        }
    }
}

impl RecordingEncoder {
    /// Create an empty encoder with depth testing enabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder whose submissions fail after `draws` successful ones
    pub fn failing_after(draws: usize) -> Self {
        Self {
            fail_after: Some(draws),
            ..Self::default()
        }
    }

    /// Draws recorded so far
    pub fn draws(&self) -> &[RecordedDraw] {
        &self.draws
    }

    /// Current depth state
    pub const fn depth_state(&self) -> DepthState {
        self.depth_state
    }

    /// Forget recorded draws, keeping the depth state
    pub fn clear(&mut self) {
        self.draws.clear();
    }
}

impl RenderEncoder for RecordingEncoder {
    fn set_depth_state(&mut self, state: DepthState) {
        self.depth_state = state;
    }

    fn submit_draw(&mut self, call: &DrawCall) -> BackendResult<()> {
        if self.fail_after.is_some_and(|limit| self.draws.len() >= limit) {
            return Err(BackendError::DeviceLost(format!(
                "encoder rejected draw #{}",
                self.draws.len() + 1
            )));
        }
        self.draws.push(RecordedDraw {
            call: call.clone(),
            depth_state: self.depth_state,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_lifecycle_is_tracked() {
        let mut device = RecordingDevice::new();
        let a = device.allocate_buffer(16).unwrap();
        let b = device.allocate_buffer(32).unwrap();
        assert_ne!(a, b);
        assert_eq!(device.live_buffers(), 2);

        device.release_buffer(a);
        device.release_buffer(a);
        assert_eq!(device.live_buffers(), 1);
        assert_eq!(device.total_releases(), 1);
        assert!(!device.is_live(a));
        assert!(device.is_live(b));
    }

    #[test]
    fn test_budget_reports_exhaustion_as_none() {
        let mut device = RecordingDevice::with_buffer_budget(1);
        assert!(device.allocate_buffer(8).is_some());
        assert!(device.allocate_buffer(8).is_none());
    }

    #[test]
    fn test_upload_past_end_is_rejected() {
        let mut device = RecordingDevice::new();
        let buffer = device.allocate_buffer(4).unwrap();
        assert!(device.upload_bytes(buffer, 2, &[1, 2]).is_ok());
        assert_eq!(device.buffer_contents(buffer), Some(&[0, 0, 1, 2][..]));
        assert!(matches!(
            device.upload_bytes(buffer, 3, &[1, 2]),
            Err(BackendError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_pipelines_are_cached_per_program() {
        let mut device = RecordingDevice::new();
        let layout = VertexLayout { stride: 20, position_offset: 0, uv_offset: 12 };
        let text = device.create_pipeline(ShaderProgram::Text, layout);
        assert_eq!(device.create_pipeline(ShaderProgram::Text, layout), text);
        assert_ne!(device.create_pipeline(ShaderProgram::General, layout), text);
    }
}
