//! # Host Integration
//!
//! This module connects visualization servers to the host viewport: the
//! render registry interface (the host's process-wide active-server set),
//! an in-memory registry with the per-frame two-pass driver, and the
//! [`HostHandle`] through which servers marshal registration onto the
//! host's application thread.
//!
//! ## Frame driving
//!
//! Once per frame the host runs an opaque pass over every eligible server,
//! then a transparent pass over the subset that asks for one. A server is
//! therefore invoked once or twice per frame and routes each of its layers
//! to exactly one invocation.

pub mod dispatch;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::display::server::{RenderFrame, RenderPass, RenderServer, ServerId, ViewInfo};
use dispatch::Dispatcher;

/// The host's multi-server render registry.
///
/// The real host exposes this as process-wide singleton state; keeping it
/// behind an interface lets tests substitute an in-memory fake.
pub trait RenderRegistry: Send + Sync {
    /// Whether the host has an active document that can accept servers.
    fn is_ready(&self) -> bool;

    /// Adds a server to the active set. Application thread only.
    fn add(&self, server: Arc<dyn RenderServer>);

    /// Removes a server from the active set. Application thread only.
    fn remove(&self, id: ServerId);

    /// Identities of all currently active servers.
    fn active_ids(&self) -> Vec<ServerId>;

    /// Asks the host to repaint every open view.
    fn request_repaint(&self);
}

/// In-memory render registry with a frame driver.
///
/// Stands in for the host's registry in tests and headless embeddings.
/// Starts ready; flip with [`set_ready`] to simulate a host without an
/// active document.
///
/// [`set_ready`]: MemoryRegistry::set_ready
pub struct MemoryRegistry {
    servers: Mutex<BTreeMap<ServerId, Arc<dyn RenderServer>>>,
    ready: AtomicBool,
    repaints: AtomicUsize,
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self {
            servers: Mutex::new(BTreeMap::new()),
            ready: AtomicBool::new(true),
            repaints: AtomicUsize::new(0),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Number of repaint requests seen so far.
    pub fn repaint_requests(&self) -> usize {
        self.repaints.load(Ordering::SeqCst)
    }

    /// Runs one full frame against every eligible server: the opaque pass
    /// for all of them, then the transparent pass for those that need it.
    ///
    /// The server set is snapshotted up front, so render callbacks never
    /// hold the registry lock.
    pub fn render_frame(
        &self,
        view: &ViewInfo,
        opaque: &mut dyn RenderFrame,
        transparent: &mut dyn RenderFrame,
    ) {
        debug_assert_eq!(opaque.pass(), RenderPass::Opaque);
        debug_assert_eq!(transparent.pass(), RenderPass::Transparent);

        let servers: Vec<Arc<dyn RenderServer>> =
            self.servers.lock().values().cloned().collect();

        for server in &servers {
            if server.can_render(view) {
                server.render(opaque);
            }
        }
        for server in &servers {
            if server.can_render(view) && server.needs_transparent_pass() {
                server.render(transparent);
            }
        }
    }
}

impl RenderRegistry for MemoryRegistry {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn add(&self, server: Arc<dyn RenderServer>) {
        self.servers.lock().insert(server.id(), server);
    }

    fn remove(&self, id: ServerId) {
        self.servers.lock().remove(&id);
    }

    fn active_ids(&self) -> Vec<ServerId> {
        self.servers.lock().keys().copied().collect()
    }

    fn request_repaint(&self) {
        self.repaints.fetch_add(1, Ordering::SeqCst);
    }
}

/// A server's connection to the host: the registry plus the dispatcher for
/// its application thread.
///
/// Cloneable so every server can carry its own handle.
#[derive(Clone)]
pub struct HostHandle {
    registry: Arc<dyn RenderRegistry>,
    dispatcher: Dispatcher,
}

impl HostHandle {
    pub fn new(registry: Arc<dyn RenderRegistry>, dispatcher: Dispatcher) -> Self {
        Self {
            registry,
            dispatcher,
        }
    }

    /// Whether the host currently has an active document. Setters and
    /// registration are silently skipped while this is `false`.
    pub fn is_ready(&self) -> bool {
        self.registry.is_ready()
    }

    /// Marshals registration onto the application thread, fire-and-forget.
    ///
    /// The queued action adds the server to the registry and then requests
    /// a repaint of all open views so the new server is picked up
    /// promptly. No-op while the host is not ready.
    pub fn register_server(&self, server: Arc<dyn RenderServer>) {
        if !self.is_ready() {
            return;
        }
        let registry = Arc::clone(&self.registry);
        self.dispatcher.post(move || {
            registry.add(server);
            registry.request_repaint();
        });
    }

    /// Marshals removal onto the application thread, fire-and-forget.
    pub fn unregister_server(&self, id: ServerId) {
        if !self.is_ready() {
            return;
        }
        let registry = Arc::clone(&self.registry);
        self.dispatcher.post(move || {
            registry.remove(id);
            registry.request_repaint();
        });
    }

    /// Immediate repaint request, used by setters after flipping dirty
    /// flags. Setter state lives server-side, so no marshaling is needed.
    pub fn request_repaint(&self) {
        self.registry.request_repaint();
    }
}
