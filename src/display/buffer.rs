//! # Cached Rendering Buffers
//!
//! This module holds the per-layer buffer storage that sits between the
//! geometry builders and the host viewport. Each visualization server owns
//! a [`BufferArena`] of [`BufferStore`]s keyed by [`LayerKey`]; the arena
//! gives every drawable layer (surface, grid, per-face fill, per-vertex
//! arrow, ...) the same rebuild, validity and invalidation logic.
//!
//! CPU vertex/index arrays are authoritative. GPU buffers are a derived
//! cache created lazily on first upload and dropped whenever the CPU side
//! changes, so validity can be judged without a device in hand.

use std::collections::BTreeMap;

use wgpu::Device;

use crate::geometry::{BufferData, Topology};

/// A 3D vertex with position and normal data.
///
/// `#[repr(C)]` keeps the layout byte-stable so the array can be handed to
/// GPU vertex buffers as-is. Line-list layers carry zeroed normals.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3D {
    /// Position [x, y, z].
    pub position: [f32; 3],
    /// Normal [nx, ny, nz] used for lighting; zero on line layers.
    pub normal: [f32; 3],
}

impl Vertex3D {
    /// Vertex buffer layout for wgpu pipelines: position (Float32x3) at
    /// shader location 0, normal (Float32x3) at location 1.
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex3D>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Color and transparency applied to one drawable layer.
///
/// Transparency follows the inspector convention: `0.0` is fully opaque and
/// routes the layer through the opaque pass, anything above zero routes it
/// through the transparent pass.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VisualEffect {
    pub color: [f32; 3],
    pub transparency: f32,
}

impl Default for VisualEffect {
    fn default() -> Self {
        Self {
            color: [0.8, 0.8, 0.8],
            transparency: 0.0,
        }
    }
}

impl VisualEffect {
    /// Creates an effect with all components clamped to `[0, 1]`.
    pub fn new(color: [f32; 3], transparency: f32) -> Self {
        Self {
            color: [
                color[0].clamp(0.0, 1.0),
                color[1].clamp(0.0, 1.0),
                color[2].clamp(0.0, 1.0),
            ],
            transparency: transparency.clamp(0.0, 1.0),
        }
    }

    /// Fully opaque effect of the given color.
    pub fn opaque(color: [f32; 3]) -> Self {
        Self::new(color, 0.0)
    }

    /// Replaces the transparency, clamped to `[0, 1]`.
    pub fn with_transparency(mut self, transparency: f32) -> Self {
        self.transparency = transparency.clamp(0.0, 1.0);
        self
    }

    /// Whether this layer belongs in the transparent pass.
    pub fn is_transparent(&self) -> bool {
        self.transparency > 0.0
    }

    /// RGBA form with alpha derived from transparency.
    pub fn rgba(&self) -> [f32; 4] {
        [
            self.color[0],
            self.color[1],
            self.color[2],
            1.0 - self.transparency,
        ]
    }
}

/// Uploaded GPU resources for one layer.
pub struct GpuBuffers {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

/// CPU-side vertex/index storage for one drawable layer, with a lazily
/// uploaded GPU mirror.
pub struct BufferStore {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    topology: Topology,
    effect: VisualEffect,
    gpu: Option<GpuBuffers>,
}

impl Default for BufferStore {
    fn default() -> Self {
        Self::new(VisualEffect::default())
    }
}

impl BufferStore {
    pub fn new(effect: VisualEffect) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            topology: Topology::default(),
            effect,
            gpu: None,
        }
    }

    /// Replaces the stored geometry with freshly built buffer data.
    ///
    /// Missing normals (line lists) are zero-filled. Any uploaded GPU
    /// buffers are dropped since they no longer mirror the CPU arrays.
    pub fn ingest(&mut self, data: BufferData) {
        self.vertices = data
            .positions
            .iter()
            .enumerate()
            .map(|(i, &position)| Vertex3D {
                position,
                normal: data.normals.get(i).copied().unwrap_or([0.0; 3]),
            })
            .collect();
        self.indices = data.indices;
        self.topology = data.topology;
        self.gpu = None;
    }

    /// Clears all geometry, leaving the store invalid until re-ingested.
    pub fn invalidate(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.gpu = None;
    }

    /// Replaces the visual effect without touching geometry.
    ///
    /// Color and transparency ride alongside the draw call rather than
    /// being baked into vertices, so GPU buffers stay valid.
    pub fn set_effect(&mut self, effect: VisualEffect) {
        self.effect = effect;
    }

    /// A store is valid when it holds drawable geometry: non-empty vertex
    /// and index arrays, an index count matching the topology's primitive
    /// stride, and every index in range.
    pub fn is_valid(&self) -> bool {
        if self.vertices.is_empty() || self.indices.is_empty() {
            return false;
        }
        if self.indices.len() % self.topology.indices_per_primitive() != 0 {
            return false;
        }
        let count = self.vertices.len() as u32;
        self.indices.iter().all(|&index| index < count)
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn effect(&self) -> &VisualEffect {
        &self.effect
    }

    /// Uploads the CPU arrays to the device, reusing a previous upload when
    /// the geometry has not changed since. Returns `None` for invalid
    /// stores.
    pub fn upload(&mut self, device: &Device) -> Option<&GpuBuffers> {
        if !self.is_valid() {
            return None;
        }
        if self.gpu.is_none() {
            let vertex_buffer = wgpu::util::DeviceExt::create_buffer_init(
                device,
                &wgpu::util::BufferInitDescriptor {
                    label: Some("Layer Vertex Buffer"),
                    contents: bytemuck::cast_slice(&self.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                },
            );
            let index_buffer = wgpu::util::DeviceExt::create_buffer_init(
                device,
                &wgpu::util::BufferInitDescriptor {
                    label: Some("Layer Index Buffer"),
                    contents: bytemuck::cast_slice(&self.indices),
                    usage: wgpu::BufferUsages::INDEX,
                },
            );
            self.gpu = Some(GpuBuffers {
                vertex_buffer,
                index_buffer,
                index_count: self.indices.len() as u32,
            });
        }
        self.gpu.as_ref()
    }
}

/// Stable identity of one drawable layer within a server.
///
/// Declaration order doubles as flush order: surfaces first, wireframes and
/// glyph layers after, so lines draw over the fills they annotate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerKey {
    /// Single shell or tube surface.
    Surface,
    /// One fill per solid face, keyed by face index.
    Face(u32),
    /// Shell wireframe grid.
    Grid,
    /// Closed face outline.
    Outline,
    /// Bounding-box edge wireframe.
    Edges,
    /// One polyline per solid edge, keyed by edge index.
    Edge(u32),
    /// One normal arrow per mesh vertex, keyed by vertex index.
    Normal(u32),
    /// One side quad per bounding-box axis (0 = X, 1 = Y, 2 = Z).
    Axis(u8),
    /// Point cross marker.
    Marker,
}

/// Ordered collection of buffer stores, one per drawable layer.
///
/// Rebuild, validity and invalidation logic is identical for every server
/// kind because multiplicity (per-face, per-axis, per-vertex) lives in the
/// key instead of in parallel vectors.
#[derive(Default)]
pub struct BufferArena {
    stores: BTreeMap<LayerKey, BufferStore>,
}

impl BufferArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the store for `key`, creating an empty one on first use.
    pub fn store_mut(&mut self, key: LayerKey) -> &mut BufferStore {
        self.stores.entry(key).or_default()
    }

    pub fn get(&self, key: LayerKey) -> Option<&BufferStore> {
        self.stores.get(&key)
    }

    /// Layers in flush order.
    pub fn iter(&self) -> impl Iterator<Item = (LayerKey, &BufferStore)> {
        self.stores.iter().map(|(key, store)| (*key, store))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (LayerKey, &mut BufferStore)> {
        self.stores.iter_mut().map(|(key, store)| (*key, store))
    }

    /// Drops every layer. Used when the layer set itself changes, e.g. a
    /// different face count after a geometry swap.
    pub fn clear(&mut self) {
        self.stores.clear();
    }

    /// True when the arena holds at least one layer and every layer is
    /// valid. An empty arena reports `false` so a first frame always
    /// triggers a build.
    pub fn all_valid(&self) -> bool {
        !self.stores.is_empty() && self.stores.values().all(BufferStore::is_valid)
    }

    /// Invalidates every layer without dropping the layer set.
    pub fn invalidate_all(&mut self) {
        for store in self.stores.values_mut() {
            store.invalidate();
        }
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}
