//! # Bounding Box Visualization Server
//!
//! Renders a (possibly transformed) bounding box as a 12-edge wireframe
//! plus one thin side quad per principal axis, colored X/Y/Z for use as an
//! orientation indicator. The sides default to half transparency so the
//! indicator never occludes the geometry it frames.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::display::buffer::{BufferArena, LayerKey, VisualEffect};
use crate::display::server::{
    flush_layers, DirtyFlags, DisplayEvents, LogEvents, RenderFrame, RenderServer, ServerId,
};
use crate::error::BuildError;
use crate::geometry::{builders, Aabb, BoxData};
use crate::host::HostHandle;

/// Visualization server for a bounding box.
pub struct BoxServer {
    id: ServerId,
    host: HostHandle,
    events: Arc<dyn DisplayEvents>,
    bx: BoxData,
    state: Mutex<BoxState>,
}

struct BoxState {
    dirty: DirtyFlags,
    arena: BufferArena,
    rebuilds: u32,
    edge_color: [f32; 3],
    axis_colors: [[f32; 3]; 3],
    transparency: f32,
    show_edges: bool,
    show_axes: bool,
}

impl BoxState {
    fn visible(&self, key: LayerKey) -> bool {
        match key {
            LayerKey::Edges => self.show_edges,
            LayerKey::Axis(_) => self.show_axes,
            _ => true,
        }
    }
}

impl BoxServer {
    pub fn new(host: HostHandle, bx: BoxData) -> Self {
        Self {
            id: ServerId::generate(),
            host,
            events: Arc::new(LogEvents),
            bx,
            state: Mutex::new(BoxState {
                dirty: DirtyFlags::all(),
                arena: BufferArena::new(),
                rebuilds: 0,
                edge_color: [0.3, 0.3, 0.3],
                axis_colors: [
                    [0.9, 0.2, 0.2],
                    [0.2, 0.8, 0.2],
                    [0.2, 0.35, 0.9],
                ],
                transparency: 0.5,
                show_edges: true,
                show_axes: true,
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

    /// Edge wireframe color.
    pub fn update_color(&self, color: [f32; 3]) {
        if !self.host.is_ready() {
            return;
        }
        {
            let mut state = self.state.lock();
            state.edge_color = color;
            state.dirty.effects = true;
        }
        self.host.request_repaint();
    }

    /// Color of one axis indicator side (0 = X, 1 = Y, 2 = Z). Out-of-range
    /// axes are ignored.
    pub fn update_axis_color(&self, axis: u8, color: [f32; 3]) {
        if !self.host.is_ready() {
            return;
        }
        {
            let mut state = self.state.lock();
            let Some(slot) = state.axis_colors.get_mut(axis as usize) else {
                return;
            };
            *slot = color;
            state.dirty.effects = true;
        }
        self.host.request_repaint();
    }

    /// Axis side transparency in `[0, 1]`.
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

    /// Shows or hides the edge wireframe.
    pub fn set_edges_visible(&self, visible: bool) {
        if !self.host.is_ready() {
            return;
        }
        self.state.lock().show_edges = visible;
        self.host.request_repaint();
    }

    /// Shows or hides the axis indicator sides.
    pub fn set_axes_visible(&self, visible: bool) {
        if !self.host.is_ready() {
            return;
        }
        self.state.lock().show_axes = visible;
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

    fn rebuild(&self, state: &mut BoxState) -> Result<(), BuildError> {
        let edges = builders::box_edges(&self.bx)?;

        // One side per axis, spanning from corner 0 to the corner one
        // step along that axis (transform already applied).
        let corners = self.bx.corners();
        let mut sides = Vec::with_capacity(3);
        for axis in 0u8..3 {
            sides.push(builders::box_side(corners[0], corners[1 << axis])?);
        }

        state.arena.clear();
        state.arena.store_mut(LayerKey::Edges).ingest(edges);
        for (axis, side) in sides.into_iter().enumerate() {
            state.arena.store_mut(LayerKey::Axis(axis as u8)).ingest(side);
        }
        state.rebuilds += 1;
        Ok(())
    }

    fn attach_effects(state: &mut BoxState) {
        let edges = VisualEffect::opaque(state.edge_color);
        let transparency = state.transparency;
        let axis_colors = state.axis_colors;
        for (key, store) in state.arena.iter_mut() {
            match key {
                LayerKey::Edges => store.set_effect(edges),
                LayerKey::Axis(axis) => store.set_effect(VisualEffect::new(
                    axis_colors[axis as usize % 3],
                    transparency,
                )),
                _ => {}
            }
        }
    }
}

impl RenderServer for BoxServer {
    fn id(&self) -> ServerId {
        self.id
    }

    fn name(&self) -> &str {
        "Bounding box"
    }

    fn description(&self) -> &str {
        "Edge wireframe and axis indicator sides of a bounding box"
    }

    fn needs_transparent_pass(&self) -> bool {
        let state = self.state.lock();
        state.show_axes && state.transparency > 0.0
    }

    fn bounding_volume(&self) -> Option<Aabb> {
        Aabb::from_points(self.bx.corners())
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
    use cgmath::{Matrix4, Point3, Vector3};

    fn unit_box_server() -> BoxServer {
        let (host, _registry, _queue) = test_host();
        BoxServer::new(
            host,
            BoxData::axis_aligned(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)),
        )
    }

    #[test]
    fn test_edges_opaque_sides_transparent_by_default() {
        let server = unit_box_server();
        assert!(server.needs_transparent_pass());

        let mut opaque = RecordingFrame::new(RenderPass::Opaque);
        server.render(&mut opaque);
        assert_eq!(opaque.line_draws.len(), 1);
        assert_eq!(opaque.line_draws[0].indices.len(), 24, "12 edges");
        assert!(opaque.triangle_draws.is_empty());

        let mut transparent = RecordingFrame::new(RenderPass::Transparent);
        server.render(&mut transparent);
        assert_eq!(transparent.triangle_draws.len(), 3, "one side per axis");
        assert!(transparent.line_draws.is_empty());
    }

    #[test]
    fn test_opaque_sides_move_to_opaque_pass() {
        let server = unit_box_server();
        server.update_transparency(0.0);
        assert!(!server.needs_transparent_pass());

        let mut opaque = RecordingFrame::new(RenderPass::Opaque);
        server.render(&mut opaque);
        assert_eq!(opaque.triangle_draws.len(), 3);
        assert_eq!(opaque.line_draws.len(), 1);
    }

    #[test]
    fn test_each_axis_side_keeps_its_color() {
        let server = unit_box_server();
        server.update_axis_color(2, [0.0, 0.0, 1.0]);

        let mut transparent = RecordingFrame::new(RenderPass::Transparent);
        server.render(&mut transparent);
        let colors: Vec<[f32; 3]> = transparent
            .triangle_draws
            .iter()
            .map(|draw| draw.effect.color)
            .collect();
        assert_eq!(colors[2], [0.0, 0.0, 1.0]);
        assert_ne!(colors[0], colors[1]);
    }

    #[test]
    fn test_transform_moves_edges_and_bounds() {
        let (host, _registry, _queue) = test_host();
        let mut bx =
            BoxData::axis_aligned(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        bx.transform = Matrix4::from_translation(Vector3::new(10.0, 0.0, 0.0));
        let server = BoxServer::new(host, bx);

        let mut frame = RecordingFrame::new(RenderPass::Opaque);
        server.render(&mut frame);
        assert!(frame.line_draws[0]
            .vertices
            .iter()
            .all(|v| v.position[0] >= 10.0));

        let aabb = server.bounding_volume().expect("bounds");
        assert_eq!(aabb.min.x, 10.0);
        assert_eq!(aabb.max.x, 11.0);
    }

    #[test]
    fn test_hiding_axes_clears_transparent_need() {
        let server = unit_box_server();
        server.set_axes_visible(false);
        assert!(!server.needs_transparent_pass());

        let mut transparent = RecordingFrame::new(RenderPass::Transparent);
        server.render(&mut transparent);
        assert!(transparent.triangle_draws.is_empty());
    }
}
