//! # Face Visualization Server
//!
//! Renders a single face as a thin shell fill plus a closed outline
//! polyline around its boundary. A face triangulation orders its vertices
//! along the outer loop, which is exactly the shape the shell builder's
//! skirt construction expects.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::display::buffer::{BufferArena, LayerKey, VisualEffect};
use crate::display::server::{
    flush_layers, DirtyFlags, DisplayEvents, LogEvents, RenderFrame, RenderServer, ServerId,
};
use crate::error::BuildError;
use crate::geometry::{builders, Aabb, FaceData, NormalBlend};
use crate::host::HostHandle;

/// Visualization server for a single face.
pub struct FaceServer {
    id: ServerId,
    host: HostHandle,
    events: Arc<dyn DisplayEvents>,
    face: FaceData,
    state: Mutex<FaceState>,
}

struct FaceState {
    dirty: DirtyFlags,
    arena: BufferArena,
    rebuilds: u32,
    thickness: f32,
    fill_color: [f32; 3],
    outline_color: [f32; 3],
    transparency: f32,
    show_fill: bool,
    show_outline: bool,
}

impl FaceState {
    fn visible(&self, key: LayerKey) -> bool {
        match key {
            LayerKey::Surface => self.show_fill,
            LayerKey::Outline => self.show_outline,
            _ => true,
        }
    }
}

impl FaceServer {
    pub fn new(host: HostHandle, face: FaceData) -> Self {
        Self {
            id: ServerId::generate(),
            host,
            events: Arc::new(LogEvents),
            face,
            state: Mutex::new(FaceState {
                dirty: DirtyFlags::all(),
                arena: BufferArena::new(),
                rebuilds: 0,
                thickness: 0.0,
                fill_color: [0.7, 0.75, 0.8],
                outline_color: [0.05, 0.05, 0.1],
                transparency: 0.0,
                show_fill: true,
                show_outline: true,
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

    /// Fill color.
    pub fn update_color(&self, color: [f32; 3]) {
        if !self.host.is_ready() {
            return;
        }
        {
            let mut state = self.state.lock();
            state.fill_color = color;
            state.dirty.effects = true;
        }
        self.host.request_repaint();
    }

    /// Outline color.
    pub fn update_outline_color(&self, color: [f32; 3]) {
        if !self.host.is_ready() {
            return;
        }
        {
            let mut state = self.state.lock();
            state.outline_color = color;
            state.dirty.effects = true;
        }
        self.host.request_repaint();
    }

    /// Fill transparency in `[0, 1]`.
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

    /// Shell thickness of the fill. Forces a geometry rebuild.
    pub fn update_thickness(&self, thickness: f32) {
        if !self.host.is_ready() {
            return;
        }
        {
            let mut state = self.state.lock();
            state.thickness = thickness;
            state.dirty.geometry = true;
        }
        self.host.request_repaint();
    }

    /// Shows or hides the fill.
    pub fn set_fill_visible(&self, visible: bool) {
        if !self.host.is_ready() {
            return;
        }
        self.state.lock().show_fill = visible;
        self.host.request_repaint();
    }

    /// Shows or hides the boundary outline.
    pub fn set_outline_visible(&self, visible: bool) {
        if !self.host.is_ready() {
            return;
        }
        self.state.lock().show_outline = visible;
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

    fn rebuild(&self, state: &mut FaceState) -> Result<(), BuildError> {
        let fill =
            builders::shell_surface(&self.face.mesh, state.thickness, NormalBlend::Distributed)?;
        let outline = builders::polyline(self.face.outline(), true)?;

        state.arena.clear();
        state.arena.store_mut(LayerKey::Surface).ingest(fill);
        state.arena.store_mut(LayerKey::Outline).ingest(outline);
        state.rebuilds += 1;
        Ok(())
    }

    fn attach_effects(state: &mut FaceState) {
        let fill = VisualEffect::new(state.fill_color, state.transparency);
        let outline = VisualEffect::opaque(state.outline_color);
        for (key, store) in state.arena.iter_mut() {
            match key {
                LayerKey::Surface => store.set_effect(fill),
                LayerKey::Outline => store.set_effect(outline),
                _ => {}
            }
        }
    }
}

impl RenderServer for FaceServer {
    fn id(&self) -> ServerId {
        self.id
    }

    fn name(&self) -> &str {
        "Face"
    }

    fn description(&self) -> &str {
        "Shell fill and boundary outline of a single face"
    }

    fn needs_transparent_pass(&self) -> bool {
        let state = self.state.lock();
        state.show_fill && state.transparency > 0.0
    }

    fn bounding_volume(&self) -> Option<Aabb> {
        let thickness = self.state.lock().thickness.abs();
        Aabb::from_points(self.face.mesh.positions.iter().copied())
            .map(|aabb| aabb.grown(thickness))
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
