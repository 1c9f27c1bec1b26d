#![forbid(unsafe_code)]

//! Deferred render queue.
//!
//! Stateful instances enqueue themselves here when their state changes.
//! Nothing renders until the renderer drains the queue in
//! [`Renderer::flush`](crate::Renderer::flush), so several updates issued
//! by one event handler coalesce into a single render per instance.
//!
//! # Invariants
//!
//! 1. Instances are drained in the order they were first enqueued.
//! 2. The queue never renders anything itself; it only hands instances back.

use std::cell::RefCell;
use std::collections::VecDeque;

use rspy_core::{Instance, Schedule};

/// FIFO of dirty instances.
#[derive(Default)]
pub struct RenderQueue {
    pending: RefCell<VecDeque<Instance>>,
}

impl RenderQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next dirty instance.
    pub fn pop(&self) -> Option<Instance> {
        self.pending.borrow_mut().pop_front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }
}

impl Schedule for RenderQueue {
    fn enqueue(&self, instance: Instance) {
        tracing::trace!(target: "rspy", instance = instance.id(), "render enqueued");
        self.pending.borrow_mut().push_back(instance);
    }
}
