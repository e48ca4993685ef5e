//! # Point Visualization Server
//!
//! Renders a single point as a three-line axis-aligned cross marker.

use std::sync::Arc;

use cgmath::Point3;
use parking_lot::Mutex;

use crate::display::buffer::{BufferArena, LayerKey, VisualEffect};
use crate::display::server::{
    flush_layers, DirtyFlags, DisplayEvents, LogEvents, RenderFrame, RenderServer, ServerId,
};
use crate::error::BuildError;
use crate::geometry::{builders, Aabb};
use crate::host::HostHandle;

/// Visualization server for a single point.
pub struct PointServer {
    id: ServerId,
    host: HostHandle,
    events: Arc<dyn DisplayEvents>,
    point: Point3<f32>,
    state: Mutex<PointState>,
}

struct PointState {
    dirty: DirtyFlags,
    arena: BufferArena,
    rebuilds: u32,
    size: f32,
    color: [f32; 3],
    show_marker: bool,
}

impl PointState {
    fn visible(&self, key: LayerKey) -> bool {
        match key {
            LayerKey::Marker => self.show_marker,
            _ => true,
        }
    }
}

impl PointServer {
    pub fn new(host: HostHandle, point: Point3<f32>) -> Self {
        Self {
            id: ServerId::generate(),
            host,
            events: Arc::new(LogEvents),
            point,
            state: Mutex::new(PointState {
                dirty: DirtyFlags::all(),
                arena: BufferArena::new(),
                rebuilds: 0,
                size: 0.25,
                color: [0.9, 0.8, 0.1],
                show_marker: true,
            }),
        }
    }

    /// Replaces the failure notification sink. Defaults to the log.
    pub fn with_events(mut self, events: Arc<dyn DisplayEvents>) -> Self {
        self.events = events;
        self
    }

    pub fn register(self: &Arc<Self>) {
        self.host.register_server(Arc::clone(self) as Arc<dyn RenderServer>);
    }

    pub fn unregister(&self) {
        self.host.unregister_server(self.id);
    }

    /// Marker color.
    pub fn update_color(&self, color: [f32; 3]) {
        if !self.host.is_ready() {
            return;
        }
        {
            let mut state = self.state.lock();
            state.color = color;
            state.dirty.effects = true;
        }
        self.host.request_repaint();
    }

    /// Marker size (full cross extent). Forces a geometry rebuild.
    pub fn update_size(&self, size: f32) {
        if !self.host.is_ready() {
            return;
        }
        {
            let mut state = self.state.lock();
            state.size = size;
            state.dirty.geometry = true;
        }
        self.host.request_repaint();
    }

    /// Shows or hides the marker.
    pub fn set_marker_visible(&self, visible: bool) {
        if !self.host.is_ready() {
            return;
        }
        self.state.lock().show_marker = visible;
        self.host.request_repaint();
    }

    /// Current dirty-flag pair.
    pub fn dirty(&self) -> DirtyFlags {
        self.state.lock().dirty
    }

    /// Number of geometry rebuilds performed so far.
    pub fn rebuild_count(&self) -> u32 {
        self.state.lock().rebuilds
    }

    fn rebuild(&self, state: &mut PointState) -> Result<(), BuildError> {
        let marker = builders::point_marker(self.point, state.size)?;
        state.arena.clear();
        state.arena.store_mut(LayerKey::Marker).ingest(marker);
        state.rebuilds += 1;
        Ok(())
    }

    fn attach_effects(state: &mut PointState) {
        let marker = VisualEffect::opaque(state.color);
        for (key, store) in state.arena.iter_mut() {
            if key == LayerKey::Marker {
                store.set_effect(marker);
            }
        }
    }
}

impl RenderServer for PointServer {
    fn id(&self) -> ServerId {
        self.id
    }

    fn name(&self) -> &str {
        "Point"
    }

    fn description(&self) -> &str {
        "Cross marker at a single point"
    }

    fn needs_transparent_pass(&self) -> bool {
        // Line layers never enter the transparent pass.
        false
    }

    fn bounding_volume(&self) -> Option<Aabb> {
        let half = self.state.lock().size.abs() * 0.5;
        Some(
            Aabb {
                min: self.point,
                max: self.point,
            }
            .grown(half),
        )
    }

    fn render(&self, frame: &mut dyn RenderFrame) {
        let mut state = self.state.lock();
        if state.dirty.geometry || !state.arena.all_valid() {
            state.dirty.geometry = false;
            if let Err(error) = self.rebuild(&mut state) {
                self.events.render_failed(self.id, &error.into());
                return;
            }
            state.dirty.effects = true;
        }
        if state.dirty.effects {
            Self::attach_effects(&mut state);
            state.dirty.effects = false;
        }
        if let Err(error) = flush_layers(&state.arena, frame, |key| state.visible(key)) {
            self.events.render_failed(self.id, &error.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::server::RenderPass;
    use crate::display::testing::{test_host, RecordingFrame};

    fn marker_server() -> PointServer {
        let (host, _registry, _queue) = test_host();
        PointServer::new(host, Point3::new(1.0, 2.0, 3.0))
    }

    #[test]
    fn test_marker_renders_three_lines() {
        let server = marker_server();
        let mut frame = RecordingFrame::new(RenderPass::Opaque);
        server.render(&mut frame);

        assert_eq!(frame.line_draws.len(), 1);
        assert_eq!(frame.line_draws[0].indices.len(), 6);
        assert!(frame.triangle_draws.is_empty());
        assert!(!server.needs_transparent_pass());
    }

    #[test]
    fn test_size_rebuilds_color_does_not() {
        let server = marker_server();
        server.render(&mut RecordingFrame::new(RenderPass::Opaque));
        assert_eq!(server.rebuild_count(), 1);

        server.update_color([0.0, 1.0, 0.0]);
        server.render(&mut RecordingFrame::new(RenderPass::Opaque));
        assert_eq!(server.rebuild_count(), 1);

        server.update_size(1.0);
        let mut frame = RecordingFrame::new(RenderPass::Opaque);
        server.render(&mut frame);
        assert_eq!(server.rebuild_count(), 2);
        assert_eq!(frame.line_draws[0].effect.color, [0.0, 1.0, 0.0]);
        assert_eq!(frame.line_draws[0].vertices[0].position[0], 0.5);
    }

    #[test]
    fn test_hidden_marker_flushes_nothing() {
        let server = marker_server();
        server.set_marker_visible(false);

        let mut frame = RecordingFrame::new(RenderPass::Opaque);
        server.render(&mut frame);
        assert_eq!(frame.total_draws(), 0);
        assert_eq!(server.rebuild_count(), 1, "buffers still build");
    }

    #[test]
    fn test_bounding_volume_centers_on_point() {
        let server = marker_server();
        let aabb = server.bounding_volume().expect("bounds");
        assert_eq!(aabb.min, Point3::new(0.875, 1.875, 2.875));
        assert_eq!(aabb.max, Point3::new(1.125, 2.125, 3.125));
    }
}
