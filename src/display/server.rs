//! # Render Server Contract
//!
//! This module defines the contract between a visualization server and the
//! host viewport: a stable identity, descriptive metadata, pass
//! requirements, a bounding-volume query, and the per-frame render entry
//! point.
//!
//! ## Lifecycle
//!
//! A server moves through this pattern:
//! 1. **Construct** - Bind to one geometry input and a [`HostHandle`]
//! 2. **Register** - Become visible to the host's render registry
//! 3. **Update Loop** - The host invokes [`RenderServer::render`] once per
//!    eligible frame and pass; setters mark state dirty in between
//! 4. **Unregister** - Leave the registry; buffers drop with the server
//!
//! [`HostHandle`]: crate::host::HostHandle

use std::fmt;

use crate::display::buffer::{BufferArena, LayerKey, Vertex3D, VisualEffect};
use crate::error::{DisplayError, DrawError};
use crate::geometry::{Aabb, Topology};

/// Globally unique identity of a render server.
///
/// Generated once at construction and stable for the server's lifetime;
/// the host registry keys its active-server set on it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServerId(u128);

impl ServerId {
    /// Generates a fresh random identity.
    pub fn generate() -> Self {
        Self(rand::random())
    }

    /// Builds an identity from raw bits. Mainly useful in tests that need
    /// deterministic ids.
    pub fn from_bits(bits: u128) -> Self {
        Self(bits)
    }
}

impl fmt::Display for ServerId {
    /// Formats as a GUID-style hex string (8-4-4-4-12).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = format!("{:032x}", self.0);
        write!(
            f,
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        )
    }
}

/// Which of the host's two per-frame draw passes is running.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderPass {
    Opaque,
    Transparent,
}

/// Snapshot of the view a render invocation targets.
#[derive(Clone, Debug)]
pub struct ViewInfo {
    /// Host-side view name, for diagnostics.
    pub name: String,
    /// Whether the view hosts a 3D viewport at all.
    pub supports_3d: bool,
}

impl Default for ViewInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            supports_3d: true,
        }
    }
}

/// The geometry/effects dirty-flag pair every server tracks.
///
/// Geometry-affecting setters raise `geometry`, color/transparency setters
/// raise `effects`, and the render callback lowers whichever flags it
/// serviced. Visibility toggles raise neither.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DirtyFlags {
    pub geometry: bool,
    pub effects: bool,
}

impl DirtyFlags {
    /// Both flags raised, the state of a freshly constructed server.
    pub fn all() -> Self {
        Self {
            geometry: true,
            effects: true,
        }
    }
}

/// Host-side draw interface handed to a server for one pass invocation.
///
/// Exactly two primitive topologies exist; a server flushes each of its
/// layers through one of the two draw calls below.
pub trait RenderFrame {
    /// Which pass this invocation belongs to.
    fn pass(&self) -> RenderPass;

    /// Flushes one triangle-list layer.
    fn draw_triangles(
        &mut self,
        vertices: &[Vertex3D],
        indices: &[u32],
        effect: &VisualEffect,
    ) -> Result<(), DrawError>;

    /// Flushes one line-list layer.
    fn draw_lines(
        &mut self,
        vertices: &[Vertex3D],
        indices: &[u32],
        effect: &VisualEffect,
    ) -> Result<(), DrawError>;
}

/// Best-effort notification sink for failures caught at the render
/// boundary.
pub trait DisplayEvents: Send + Sync {
    /// A render callback caught a failure; the frame was skipped and no
    /// retry is scheduled.
    fn render_failed(&self, server: ServerId, error: &DisplayError);
}

/// Default event sink that writes failures to the log.
#[derive(Debug, Default)]
pub struct LogEvents;

impl DisplayEvents for LogEvents {
    fn render_failed(&self, server: ServerId, error: &DisplayError) {
        log::warn!("render server {} failed: {}", server, error);
    }
}

/// Contract consumed by the host's render registry.
///
/// Implementations must never let an error escape [`render`]: failures are
/// reported through [`DisplayEvents`] and the frame is skipped.
///
/// [`render`]: RenderServer::render
pub trait RenderServer: Send + Sync {
    /// Stable identity within the host registry.
    fn id(&self) -> ServerId;

    /// Short display name.
    fn name(&self) -> &str;

    /// One-line description for host UI.
    fn description(&self) -> &str;

    /// Whether this server can render into the given view right now.
    fn can_render(&self, view: &ViewInfo) -> bool {
        view.supports_3d
    }

    /// Whether the host must schedule this server for the transparent
    /// pass this frame.
    fn needs_transparent_pass(&self) -> bool;

    /// World-space bounds of the drawn geometry, or `None` when unknown.
    fn bounding_volume(&self) -> Option<Aabb>;

    /// Per-frame render entry point, invoked once per pass the host
    /// schedules this server for.
    fn render(&self, frame: &mut dyn RenderFrame);
}

/// Flushes every visible, valid layer of an arena for one pass invocation.
///
/// Triangle layers route to exactly one of the two passes: transparent if
/// their effect carries any transparency, opaque otherwise. Line layers
/// are exempt from the split and flush during the opaque invocation only,
/// which is the one invocation every scheduled server receives each frame.
pub(crate) fn flush_layers<F>(
    arena: &BufferArena,
    frame: &mut dyn RenderFrame,
    visible: F,
) -> Result<(), DrawError>
where
    F: Fn(LayerKey) -> bool,
{
    for (key, store) in arena.iter() {
        if !visible(key) || !store.is_valid() {
            continue;
        }
        match store.topology() {
            Topology::TriangleList => {
                let transparent = store.effect().is_transparent();
                let in_transparent = frame.pass() == RenderPass::Transparent;
                if transparent == in_transparent {
                    frame.draw_triangles(store.vertices(), store.indices(), store.effect())?;
                }
            }
            Topology::LineList => {
                if frame.pass() == RenderPass::Opaque {
                    frame.draw_lines(store.vertices(), store.indices(), store.effect())?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::testing::RecordingFrame;
    use crate::geometry::BufferData;

    fn triangle_data() -> BufferData {
        let mut data = BufferData::new(Topology::TriangleList);
        data.positions = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        data.normals = vec![[0.0, 0.0, 1.0]; 3];
        data.indices = vec![0, 1, 2];
        data
    }

    fn line_data() -> BufferData {
        let mut data = BufferData::new(Topology::LineList);
        data.positions = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        data.indices = vec![0, 1];
        data
    }

    #[test]
    fn test_server_id_formats_as_guid() {
        let id = ServerId::from_bits(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);
        assert_eq!(id.to_string(), "01234567-89ab-cdef-0123-456789abcdef");
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let a = ServerId::generate();
        let b = ServerId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_opaque_surface_flushes_only_in_opaque_pass() {
        let mut arena = BufferArena::new();
        arena.store_mut(LayerKey::Surface).ingest(triangle_data());

        let mut opaque = RecordingFrame::new(RenderPass::Opaque);
        flush_layers(&arena, &mut opaque, |_| true).unwrap();
        assert_eq!(opaque.triangle_draws.len(), 1);

        let mut transparent = RecordingFrame::new(RenderPass::Transparent);
        flush_layers(&arena, &mut transparent, |_| true).unwrap();
        assert!(transparent.triangle_draws.is_empty());
    }

    #[test]
    fn test_transparent_surface_flushes_only_in_transparent_pass() {
        let mut arena = BufferArena::new();
        let store = arena.store_mut(LayerKey::Surface);
        store.ingest(triangle_data());
        store.set_effect(VisualEffect::new([1.0, 1.0, 1.0], 0.5));

        let mut opaque = RecordingFrame::new(RenderPass::Opaque);
        flush_layers(&arena, &mut opaque, |_| true).unwrap();
        assert!(opaque.triangle_draws.is_empty());

        let mut transparent = RecordingFrame::new(RenderPass::Transparent);
        flush_layers(&arena, &mut transparent, |_| true).unwrap();
        assert_eq!(transparent.triangle_draws.len(), 1);
    }

    #[test]
    fn test_lines_flush_once_in_opaque_invocation() {
        let mut arena = BufferArena::new();
        arena.store_mut(LayerKey::Grid).ingest(line_data());

        let mut opaque = RecordingFrame::new(RenderPass::Opaque);
        flush_layers(&arena, &mut opaque, |_| true).unwrap();
        assert_eq!(opaque.line_draws.len(), 1);

        let mut transparent = RecordingFrame::new(RenderPass::Transparent);
        flush_layers(&arena, &mut transparent, |_| true).unwrap();
        assert!(transparent.line_draws.is_empty());
    }

    #[test]
    fn test_hidden_layers_are_skipped() {
        let mut arena = BufferArena::new();
        arena.store_mut(LayerKey::Surface).ingest(triangle_data());
        arena.store_mut(LayerKey::Grid).ingest(line_data());

        let mut frame = RecordingFrame::new(RenderPass::Opaque);
        flush_layers(&arena, &mut frame, |key| key != LayerKey::Grid).unwrap();
        assert_eq!(frame.triangle_draws.len(), 1);
        assert!(frame.line_draws.is_empty());
    }

    #[test]
    fn test_invalid_layers_are_skipped() {
        let mut arena = BufferArena::new();
        arena.store_mut(LayerKey::Surface).ingest(triangle_data());
        arena.store_mut(LayerKey::Grid);

        let mut frame = RecordingFrame::new(RenderPass::Opaque);
        flush_layers(&arena, &mut frame, |_| true).unwrap();
        assert_eq!(frame.triangle_draws.len(), 1);
    }

    #[test]
    fn test_draw_failure_stops_flush() {
        let mut arena = BufferArena::new();
        arena.store_mut(LayerKey::Surface).ingest(triangle_data());

        let mut frame = RecordingFrame::new(RenderPass::Opaque).failing();
        let result = flush_layers(&arena, &mut frame, |_| true);
        assert!(result.is_err());
    }

    #[test]
    fn test_dirty_flags_default_and_all() {
        assert_eq!(
            DirtyFlags::default(),
            DirtyFlags {
                geometry: false,
                effects: false
            }
        );
        assert_eq!(
            DirtyFlags::all(),
            DirtyFlags {
                geometry: true,
                effects: true
            }
        );
    }
}
