//! # Application-Thread Dispatch
//!
//! The host mutates its document and its active-server list on exactly one
//! designated application thread. This module provides the single-consumer
//! action queue used to marshal work onto that thread: any thread may post
//! a closure and return immediately, and the application thread drains the
//! queue whenever it gets control.

use crossbeam_channel::{unbounded, Receiver, Sender};

type Action = Box<dyn FnOnce() + Send + 'static>;

/// Producer handle for the application-thread queue.
///
/// Cheap to clone; every clone feeds the same queue.
#[derive(Clone)]
pub struct Dispatcher {
    tx: Sender<Action>,
}

impl Dispatcher {
    /// Queues `action` for the application thread and returns immediately.
    ///
    /// Fire-and-forget: posting never blocks, and if the consuming side
    /// has already shut down the action is silently dropped.
    pub fn post(&self, action: impl FnOnce() + Send + 'static) {
        let _ = self.tx.send(Box::new(action));
    }
}

/// Consumer half of the queue, owned by the host's application thread.
pub struct MainThreadQueue {
    rx: Receiver<Action>,
}

impl MainThreadQueue {
    /// Creates a queue and its first producer handle.
    pub fn new() -> (Self, Dispatcher) {
        let (tx, rx) = unbounded();
        (Self { rx }, Dispatcher { tx })
    }

    /// Runs every currently queued action in posting order.
    ///
    /// # Returns
    ///
    /// The number of actions executed.
    pub fn drain(&self) -> usize {
        let mut ran = 0;
        while let Ok(action) = self.rx.try_recv() {
            action();
            ran += 1;
        }
        ran
    }

    /// Number of actions waiting to run.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
