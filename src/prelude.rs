//! # Keek Prelude
//!
//! This module provides a convenient way to import commonly used types and
//! traits for embedding visualization servers in a host. It's designed to
//! reduce boilerplate imports in typical integrations.
//!
//! ## Usage
//!
//! ```
//! use keek::prelude::*;
//! use std::sync::Arc;
//!
//! let (host, registry, queue) = keek::memory_host();
//!
//! let server = Arc::new(PointServer::new(host, Point3::new(0.0, 0.0, 1.0)));
//! server.register();
//! queue.drain();
//!
//! assert_eq!(registry.active_ids(), vec![server.id()]);
//! ```

// Re-export the visualization servers
pub use crate::display::{
    BoxServer, CurveServer, FaceServer, MeshServer, PointServer, SolidServer,
};

// Re-export the render contract
pub use crate::display::{
    DirtyFlags, DisplayEvents, LogEvents, RenderFrame, RenderPass, RenderServer, ServerId,
    ViewInfo,
};

// Re-export buffer storage types
pub use crate::display::{BufferArena, BufferStore, LayerKey, Vertex3D, VisualEffect};

// Re-export geometry inputs and buffer descriptions
pub use crate::geometry::{
    Aabb, BoxData, BufferData, CurveData, FaceData, MeshData, NormalBlend, SolidData, Topology,
};

// Re-export host integration
pub use crate::host::dispatch::{Dispatcher, MainThreadQueue};
pub use crate::host::{HostHandle, MemoryRegistry, RenderRegistry};

// Re-export error types
pub use crate::error::{BuildError, DisplayError, DrawError};

pub use crate::memory_host;

// Re-export common external dependencies
pub use cgmath::{InnerSpace, Point3, Vector3};
