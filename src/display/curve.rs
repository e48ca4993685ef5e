//! # Curve Visualization Server
//!
//! Renders a sampled curve, edge or polyline as a swept tube: a solid
//! tube surface plus a wireframe made of the same cross-section rings.
//! Changing the diameter keeps the segment count and rebuilds the rings;
//! swapping the sample list changes vertex counts as well, which is why a
//! rebuild always regenerates both layers wholesale.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::display::buffer::{BufferArena, LayerKey, VisualEffect};
use crate::display::server::{
    flush_layers, DirtyFlags, DisplayEvents, LogEvents, RenderFrame, RenderServer, ServerId,
};
use crate::error::BuildError;
use crate::geometry::{builders, Aabb, CurveData};
use crate::host::HostHandle;

/// Visualization server for a sampled curve.
pub struct CurveServer {
    id: ServerId,
    host: HostHandle,
    events: Arc<dyn DisplayEvents>,
    curve: CurveData,
    state: Mutex<CurveState>,
}

struct CurveState {
    dirty: DirtyFlags,
    arena: BufferArena,
    rebuilds: u32,
    diameter: f32,
    color: [f32; 3],
    wire_color: [f32; 3],
    transparency: f32,
    show_surface: bool,
    show_wireframe: bool,
}

impl CurveState {
    fn visible(&self, key: LayerKey) -> bool {
        match key {
            LayerKey::Surface => self.show_surface,
            LayerKey::Grid => self.show_wireframe,
            _ => true,
        }
    }
}

impl CurveServer {
    pub fn new(host: HostHandle, curve: CurveData) -> Self {
        Self {
            id: ServerId::generate(),
            host,
            events: Arc::new(LogEvents),
            curve,
            state: Mutex::new(CurveState {
                dirty: DirtyFlags::all(),
                arena: BufferArena::new(),
                rebuilds: 0,
                diameter: 0.05,
                color: [0.2, 0.5, 0.9],
                wire_color: [0.05, 0.1, 0.2],
                transparency: 0.0,
                show_surface: true,
                show_wireframe: false,
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

    /// Tube surface color.
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

    /// Wireframe color.
    pub fn update_wire_color(&self, color: [f32; 3]) {
        if !self.host.is_ready() {
            return;
        }
        {
            let mut state = self.state.lock();
            state.wire_color = color;
            state.dirty.effects = true;
        }
        self.host.request_repaint();
    }

    /// Tube surface transparency in `[0, 1]`.
    pub fn update_transparency(&self, transparency: f32) {
        if !self.host.is_ready() {
            return;
        }
        {
            let mut state = self.state.lock();
            state.transparency = transparency.clamp(0.0, 1.0);
            state.dirty.effects = true;
        }
        self.host.request_repaint();
    }

    /// Tube diameter. Forces a geometry rebuild.
    pub fn update_diameter(&self, diameter: f32) {
        if !self.host.is_ready() {
            return;
        }
        {
            let mut state = self.state.lock();
            state.diameter = diameter;
            state.dirty.geometry = true;
        }
        self.host.request_repaint();
    }

    /// Shows or hides the solid tube surface.
    pub fn set_surface_visible(&self, visible: bool) {
        if !self.host.is_ready() {
            return;
        }
        self.state.lock().show_surface = visible;
        self.host.request_repaint();
    }

    /// Shows or hides the tube wireframe.
    pub fn set_wireframe_visible(&self, visible: bool) {
        if !self.host.is_ready() {
            return;
        }
        self.state.lock().show_wireframe = visible;
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

    fn rebuild(&self, state: &mut CurveState) -> Result<(), BuildError> {
        let surface = builders::tube_surface(&self.curve.samples, state.diameter)?;
        let wireframe = builders::tube_wireframe(&self.curve.samples, state.diameter)?;

        state.arena.clear();
        state.arena.store_mut(LayerKey::Surface).ingest(surface);
        state.arena.store_mut(LayerKey::Grid).ingest(wireframe);
        state.rebuilds += 1;
        Ok(())
    }

    fn attach_effects(state: &mut CurveState) {
        let surface = VisualEffect::new(state.color, state.transparency);
        let wire = VisualEffect::opaque(state.wire_color);
        for (key, store) in state.arena.iter_mut() {
            match key {
                LayerKey::Surface => store.set_effect(surface),
                LayerKey::Grid => store.set_effect(wire),
                _ => {}
            }
        }
    }
}

impl RenderServer for CurveServer {
    fn id(&self) -> ServerId {
        self.id
    }

    fn name(&self) -> &str {
        "Curve"
    }

    fn description(&self) -> &str {
        "Swept tube display of a sampled curve"
    }

    fn needs_transparent_pass(&self) -> bool {
        let state = self.state.lock();
        state.show_surface && state.transparency > 0.0
    }

    fn bounding_volume(&self) -> Option<Aabb> {
        let radius = self.state.lock().diameter.abs() * 0.5;
        Aabb::from_points(self.curve.samples.iter().copied()).map(|aabb| aabb.grown(radius))
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
    use crate::display::testing::{test_host, CollectingEvents, RecordingFrame};
    use crate::geometry::builders::TUBE_SEGMENTS;
    use cgmath::Point3;

    fn arc_samples() -> CurveData {
        CurveData::new(
            (0..6)
                .map(|i| {
                    let t = i as f32 * 0.5;
                    Point3::new(t.cos(), t.sin(), 0.1 * t)
                })
                .collect(),
        )
    }

    #[test]
    fn test_renders_tube_surface_by_default() {
        let (host, _registry, _queue) = test_host();
        let curve = arc_samples();
        let ring_vertices = curve.sample_count() * TUBE_SEGMENTS;
        let server = CurveServer::new(host, curve);

        let mut frame = RecordingFrame::new(RenderPass::Opaque);
        server.render(&mut frame);
        assert_eq!(frame.triangle_draws.len(), 1);
        assert!(frame.line_draws.is_empty(), "wireframe is off by default");
        assert_eq!(frame.triangle_draws[0].vertices.len(), ring_vertices);
    }

    #[test]
    fn test_diameter_change_rebuilds_same_vertex_count() {
        let (host, _registry, _queue) = test_host();
        let server = CurveServer::new(host, arc_samples());

        let mut before = RecordingFrame::new(RenderPass::Opaque);
        server.render(&mut before);

        server.update_diameter(0.2);
        let mut after = RecordingFrame::new(RenderPass::Opaque);
        server.render(&mut after);

        assert_eq!(server.rebuild_count(), 2);
        assert_eq!(
            before.triangle_draws[0].vertices.len(),
            after.triangle_draws[0].vertices.len()
        );
        assert_ne!(before.triangle_draws[0].vertices, after.triangle_draws[0].vertices);
    }

    #[test]
    fn test_wireframe_layer_flushes_in_opaque_invocation() {
        let (host, _registry, _queue) = test_host();
        let server = CurveServer::new(host, arc_samples());
        server.set_wireframe_visible(true);
        server.update_transparency(0.3);

        let mut opaque = RecordingFrame::new(RenderPass::Opaque);
        server.render(&mut opaque);
        assert!(opaque.triangle_draws.is_empty(), "surface went transparent");
        assert_eq!(opaque.line_draws.len(), 1);

        let mut transparent = RecordingFrame::new(RenderPass::Transparent);
        server.render(&mut transparent);
        assert_eq!(transparent.triangle_draws.len(), 1);
        assert!(transparent.line_draws.is_empty());
    }

    #[test]
    fn test_degenerate_samples_report_build_failure() {
        let (host, _registry, _queue) = test_host();
        let events = Arc::new(CollectingEvents::default());
        let curve = CurveData::new(vec![
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
        ]);
        let server =
            CurveServer::new(host, curve).with_events(events.clone() as Arc<dyn DisplayEvents>);

        let mut frame = RecordingFrame::new(RenderPass::Opaque);
        server.render(&mut frame);
        assert_eq!(frame.total_draws(), 0);
        assert_eq!(events.count(), 1);
    }

    #[test]
    fn test_bounding_volume_covers_tube_radius() {
        let (host, _registry, _queue) = test_host();
        let server = CurveServer::new(
            host,
            CurveData::new(vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
            ]),
        );
        server.update_diameter(0.5);
        let aabb = server.bounding_volume().expect("bounds");
        assert!(aabb.min.y <= -0.25);
        assert!(aabb.max.y >= 0.25);
    }
}
