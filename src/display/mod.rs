//! # Visualization Servers
//!
//! One server per geometry kind turns an immutable geometry input into
//! cached vertex/index buffers and flushes them to the host viewport
//! through the per-frame render contract:
//!
//! - [`SolidServer`] - per-face fills plus per-edge polylines
//! - [`MeshServer`] - shell surface, wireframe grid and normal arrows
//! - [`FaceServer`] - shell fill plus closed boundary outline
//! - [`CurveServer`] - swept tube surface and wireframe
//! - [`BoxServer`] - edge wireframe plus axis-indicator sides
//! - [`PointServer`] - cross marker
//!
//! ## Dirty flags
//!
//! Every server tracks two independent flags. Geometry-affecting setters
//! (thickness, diameter, scale) raise the geometry flag and force a full
//! buffer rebuild on the next frame; color and transparency setters raise
//! the effects flag and only re-attach visual effects to existing buffers.
//! Visibility toggles raise neither and take effect immediately.
//!
//! All server state sits behind one mutex per server instance, held across
//! the whole render callback and across every setter, since setters run on
//! the UI thread while the host drives rendering from its own thread.

pub mod bbox;
pub mod buffer;
pub mod curve;
pub mod face;
pub mod mesh;
pub mod point;
pub mod server;
pub mod solid;

pub use bbox::BoxServer;
pub use buffer::{BufferArena, BufferStore, GpuBuffers, LayerKey, Vertex3D, VisualEffect};
pub use curve::CurveServer;
pub use face::FaceServer;
pub use mesh::MeshServer;
pub use point::PointServer;
pub use server::{
    DirtyFlags, DisplayEvents, LogEvents, RenderFrame, RenderPass, RenderServer, ServerId,
    ViewInfo,
};
pub use solid::SolidServer;
