// src/lib.rs
//! Keek Geometry Overlays
//!
//! On-demand 3D visualization servers for a modeling host, built on wgpu
//! and cgmath. Geometry goes in one side (solids, meshes, faces, curves,
//! boxes, points), cached vertex/index buffers come out the other, flushed
//! to the host viewport once per frame through its opaque and transparent
//! passes.

pub mod display;
pub mod error;
pub mod geometry;
pub mod host;
pub mod prelude;

use std::sync::Arc;

use host::dispatch::MainThreadQueue;
use host::{HostHandle, MemoryRegistry, RenderRegistry};

/// Creates a self-contained in-memory host.
///
/// Returns the handle servers are constructed with, the registry that
/// drives frames, and the application-thread queue the embedder must
/// drain. Useful for headless embeddings and tests; production code wraps
/// the real host's registry instead.
pub fn memory_host() -> (HostHandle, Arc<MemoryRegistry>, MainThreadQueue) {
    let registry = Arc::new(MemoryRegistry::new());
    let (queue, dispatcher) = MainThreadQueue::new();
    let handle = HostHandle::new(registry.clone() as Arc<dyn RenderRegistry>, dispatcher);
    (handle, registry, queue)
}
