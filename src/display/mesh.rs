//! # Mesh Visualization Server
//!
//! Renders a triangle mesh as a thin double-layer shell with an optional
//! wireframe grid and per-vertex normal arrows. The shell gives
//! zero-thickness meshes visible volume for two-sided shading; the arrows
//! visualize the estimated (or area-weighted) vertex normals.
//!
//! Drawable layers: `Surface` (shell triangles), `Grid` (shell wireframe),
//! and one `Normal(i)` arrow per mesh vertex.

use std::sync::Arc;

use cgmath::InnerSpace;
use parking_lot::Mutex;

use crate::display::buffer::{BufferArena, LayerKey, VisualEffect};
use crate::display::server::{
    flush_layers, DirtyFlags, DisplayEvents, LogEvents, RenderFrame, RenderServer, ServerId,
};
use crate::error::BuildError;
use crate::geometry::{builders, Aabb, MeshData, NormalBlend};
use crate::host::HostHandle;

/// Visualization server for a triangle mesh.
pub struct MeshServer {
    id: ServerId,
    host: HostHandle,
    events: Arc<dyn DisplayEvents>,
    mesh: MeshData,
    state: Mutex<MeshState>,
}

struct MeshState {
    dirty: DirtyFlags,
    arena: BufferArena,
    rebuilds: u32,
    thickness: f32,
    normal_scale: f32,
    blend: NormalBlend,
    surface_color: [f32; 3],
    grid_color: [f32; 3],
    normal_color: [f32; 3],
    transparency: f32,
    show_surface: bool,
    show_grid: bool,
    show_normals: bool,
}

impl MeshState {
    fn visible(&self, key: LayerKey) -> bool {
        match key {
            LayerKey::Surface => self.show_surface,
            LayerKey::Grid => self.show_grid,
            LayerKey::Normal(_) => self.show_normals,
            _ => true,
        }
    }
}

impl MeshServer {
    /// Creates a server bound to `mesh`. The first frame after
    /// registration builds all buffers.
    pub fn new(host: HostHandle, mesh: MeshData) -> Self {
        Self {
            id: ServerId::generate(),
            host,
            events: Arc::new(LogEvents),
            mesh,
            state: Mutex::new(MeshState {
                dirty: DirtyFlags::all(),
                arena: BufferArena::new(),
                rebuilds: 0,
                thickness: 0.0,
                normal_scale: 0.5,
                blend: NormalBlend::Distributed,
                surface_color: [0.8, 0.8, 0.8],
                grid_color: [0.1, 0.1, 0.1],
                normal_color: [0.85, 0.25, 0.2],
                transparency: 0.0,
                show_surface: true,
                show_grid: true,
                show_normals: false,
            }),
        }
    }

    /// Replaces the failure notification sink. Defaults to the log.
    pub fn with_events(mut self, events: Arc<dyn DisplayEvents>) -> Self {
        self.events = events;
        self
    }

    /// Makes this server visible to the host.
    ///
    /// Marshaled onto the host's application thread and skipped silently
    /// while the host has no active document.
    pub fn register(self: &Arc<Self>) {
        self.host.register_server(Arc::clone(self) as Arc<dyn RenderServer>);
    }

    /// Removes this server from the host.
    pub fn unregister(&self) {
        self.host.unregister_server(self.id);
    }

    /// Shell surface color.
    pub fn update_color(&self, color: [f32; 3]) {
        if !self.host.is_ready() {
            return;
        }
        {
            let mut state = self.state.lock();
            state.surface_color = color;
            state.dirty.effects = true;
        }
        self.host.request_repaint();
    }

    /// Wireframe grid color.
    pub fn update_grid_color(&self, color: [f32; 3]) {
        if !self.host.is_ready() {
            return;
        }
        {
            let mut state = self.state.lock();
            state.grid_color = color;
            state.dirty.effects = true;
        }
        self.host.request_repaint();
    }

    /// Normal arrow color.
    pub fn update_normal_color(&self, color: [f32; 3]) {
        if !self.host.is_ready() {
            return;
        }
        {
            let mut state = self.state.lock();
            state.normal_color = color;
            state.dirty.effects = true;
        }
        self.host.request_repaint();
    }

    /// Shell surface transparency in `[0, 1]`. Routes the surface through
    /// the transparent pass when above zero.
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

    /// Shell offset thickness. Forces a geometry rebuild.
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

    /// Normal arrow length. Forces a geometry rebuild.
    pub fn update_normal_scale(&self, scale: f32) {
        if !self.host.is_ready() {
            return;
        }
        {
            let mut state = self.state.lock();
            state.normal_scale = scale;
            state.dirty.geometry = true;
        }
        self.host.request_repaint();
    }

    /// Normal blending strategy. Forces a geometry rebuild, since vertex
    /// normals feed both the shell offset and the arrows.
    pub fn update_normal_blend(&self, blend: NormalBlend) {
        if !self.host.is_ready() {
            return;
        }
        {
            let mut state = self.state.lock();
            state.blend = blend;
            state.dirty.geometry = true;
        }
        self.host.request_repaint();
    }

    /// Shows or hides the shell surface. No rebuild, effective next frame.
    pub fn set_surface_visible(&self, visible: bool) {
        if !self.host.is_ready() {
            return;
        }
        self.state.lock().show_surface = visible;
        self.host.request_repaint();
    }

    /// Shows or hides the wireframe grid.
    pub fn set_grid_visible(&self, visible: bool) {
        if !self.host.is_ready() {
            return;
        }
        self.state.lock().show_grid = visible;
        self.host.request_repaint();
    }

    /// Shows or hides the normal arrows.
    pub fn set_normals_visible(&self, visible: bool) {
        if !self.host.is_ready() {
            return;
        }
        self.state.lock().show_normals = visible;
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

    fn rebuild(&self, state: &mut MeshState) -> Result<(), BuildError> {
        let surface = builders::shell_surface(&self.mesh, state.thickness, state.blend)?;
        let grid = builders::shell_grid(&self.mesh, state.thickness, state.blend)?;
        let normals = builders::estimate_vertex_normals(&self.mesh, state.blend)?;

        let mut arrows = Vec::with_capacity(normals.len());
        for (i, (p, normal)) in self.mesh.positions.iter().zip(&normals).enumerate() {
            // Vertices touched only by zero-area triangles keep a zero
            // normal and get no arrow.
            if normal.magnitude2() == 0.0 {
                continue;
            }
            arrows.push((
                i as u32,
                builders::arrow_glyph(*p, *normal, state.thickness, state.normal_scale)?,
            ));
        }

        state.arena.clear();
        state.arena.store_mut(LayerKey::Surface).ingest(surface);
        state.arena.store_mut(LayerKey::Grid).ingest(grid);
        for (i, arrow) in arrows {
            state.arena.store_mut(LayerKey::Normal(i)).ingest(arrow);
        }
        state.rebuilds += 1;
        Ok(())
    }

    fn attach_effects(state: &mut MeshState) {
        let surface = VisualEffect::new(state.surface_color, state.transparency);
        let grid = VisualEffect::opaque(state.grid_color);
        let normal = VisualEffect::opaque(state.normal_color);
        for (key, store) in state.arena.iter_mut() {
            match key {
                LayerKey::Surface => store.set_effect(surface),
                LayerKey::Grid => store.set_effect(grid),
                LayerKey::Normal(_) => store.set_effect(normal),
                _ => {}
            }
        }
    }
}

impl RenderServer for MeshServer {
    fn id(&self) -> ServerId {
        self.id
    }

    fn name(&self) -> &str {
        "Mesh"
    }

    fn description(&self) -> &str {
        "Shell surface, wireframe grid and vertex normals of a triangle mesh"
    }

    fn needs_transparent_pass(&self) -> bool {
        let state = self.state.lock();
        state.show_surface && state.transparency > 0.0
    }

    fn bounding_volume(&self) -> Option<Aabb> {
        let state = self.state.lock();
        // Shell offsets reach `thickness` past the input; arrows start at
        // that offset and extend by `normal_scale`.
        let mut reach = state.thickness.abs();
        if state.show_normals {
            reach += state.normal_scale.abs();
        }
        Aabb::from_points(self.mesh.positions.iter().copied()).map(|aabb| aabb.grown(reach))
    }

    fn render(&self, frame: &mut dyn RenderFrame) {
        let mut state = self.state.lock();
        if state.dirty.geometry || !state.arena.all_valid() {
            // Lowered before the attempt: a failed build is not retried
            // until the next dirty-raising setter.
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
