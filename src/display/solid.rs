//! # Solid Visualization Server
//!
//! Renders a solid body as one fill per face plus one polyline per
//! boundary edge. Faces arrive already triangulated with real volume, so
//! they are drawn as plain surfaces rather than offset shells; edges are
//! drawn as plain polylines rather than tubes.
//!
//! Layer multiplicity lives in the arena keys: `Face(i)` and `Edge(j)`
//! stores share the same rebuild and invalidation path as every other
//! layer.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::display::buffer::{BufferArena, LayerKey, VisualEffect};
use crate::display::server::{
    flush_layers, DirtyFlags, DisplayEvents, LogEvents, RenderFrame, RenderServer, ServerId,
};
use crate::error::BuildError;
use crate::geometry::{builders, Aabb, SolidData};
use crate::host::HostHandle;

/// Visualization server for a solid body.
pub struct SolidServer {
    id: ServerId,
    host: HostHandle,
    events: Arc<dyn DisplayEvents>,
    solid: SolidData,
    state: Mutex<SolidState>,
}

struct SolidState {
    dirty: DirtyFlags,
    arena: BufferArena,
    rebuilds: u32,
    face_color: [f32; 3],
    edge_color: [f32; 3],
    transparency: f32,
    show_faces: bool,
    show_edges: bool,
}

impl SolidState {
    fn visible(&self, key: LayerKey) -> bool {
        match key {
            LayerKey::Face(_) => self.show_faces,
            LayerKey::Edge(_) => self.show_edges,
            _ => true,
        }
    }
}

impl SolidServer {
    pub fn new(host: HostHandle, solid: SolidData) -> Self {
        Self {
            id: ServerId::generate(),
            host,
            events: Arc::new(LogEvents),
            solid,
            state: Mutex::new(SolidState {
                dirty: DirtyFlags::all(),
                arena: BufferArena::new(),
                rebuilds: 0,
                face_color: [0.75, 0.75, 0.78],
                edge_color: [0.1, 0.1, 0.1],
                transparency: 0.0,
                show_faces: true,
                show_edges: true,
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

    /// Face fill color, applied to every face.
    pub fn update_color(&self, color: [f32; 3]) {
        if !self.host.is_ready() {
            return;
        }
        {
            let mut state = self.state.lock();
            state.face_color = color;
            state.dirty.effects = true;
        }
        self.host.request_repaint();
    }

    /// Edge polyline color, applied to every edge.
    pub fn update_edge_color(&self, color: [f32; 3]) {
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

    /// Face transparency in `[0, 1]`. Edges always stay opaque.
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

    /// Shows or hides all face fills.
    pub fn set_faces_visible(&self, visible: bool) {
        if !self.host.is_ready() {
            return;
        }
        self.state.lock().show_faces = visible;
        self.host.request_repaint();
    }

    /// Shows or hides all edge polylines.
    pub fn set_edges_visible(&self, visible: bool) {
        if !self.host.is_ready() {
            return;
        }
        self.state.lock().show_edges = visible;
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

    fn rebuild(&self, state: &mut SolidState) -> Result<(), BuildError> {
        if self.solid.faces.is_empty() && self.solid.edges.is_empty() {
            return Err(BuildError::Empty("solid"));
        }

        let mut fills = Vec::with_capacity(self.solid.faces.len());
        for face in &self.solid.faces {
            fills.push(builders::plain_surface(face)?);
        }
        let mut lines = Vec::with_capacity(self.solid.edges.len());
        for edge in &self.solid.edges {
            lines.push(builders::polyline(&edge.samples, false)?);
        }

        state.arena.clear();
        for (i, fill) in fills.into_iter().enumerate() {
            state.arena.store_mut(LayerKey::Face(i as u32)).ingest(fill);
        }
        for (j, line) in lines.into_iter().enumerate() {
            state.arena.store_mut(LayerKey::Edge(j as u32)).ingest(line);
        }
        state.rebuilds += 1;
        Ok(())
    }

    fn attach_effects(state: &mut SolidState) {
        let fill = VisualEffect::new(state.face_color, state.transparency);
        let edge = VisualEffect::opaque(state.edge_color);
        for (key, store) in state.arena.iter_mut() {
            match key {
                LayerKey::Face(_) => store.set_effect(fill),
                LayerKey::Edge(_) => store.set_effect(edge),
                _ => {}
            }
        }
    }
}

impl RenderServer for SolidServer {
    fn id(&self) -> ServerId {
        self.id
    }

    fn name(&self) -> &str {
        "Solid"
    }

    fn description(&self) -> &str {
        "Per-face fills and edge polylines of a solid body"
    }

    fn needs_transparent_pass(&self) -> bool {
        let state = self.state.lock();
        state.show_faces && state.transparency > 0.0
    }

    fn bounding_volume(&self) -> Option<Aabb> {
        let face_boxes = self
            .solid
            .faces
            .iter()
            .filter_map(|face| Aabb::from_points(face.positions.iter().copied()));
        let edge_boxes = self
            .solid
            .edges
            .iter()
            .filter_map(|edge| Aabb::from_points(edge.samples.iter().copied()));
        face_boxes
            .chain(edge_boxes)
            .reduce(|merged, next| merged.union(&next))
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
