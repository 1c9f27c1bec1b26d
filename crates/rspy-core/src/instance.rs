#![forbid(unsafe_code)]

//! Live handle to a mounted stateful component.
//!
//! # Design
//!
//! An [`Instance`] wraps the component's state in shared, reference-counted
//! storage (`Rc<..>` with interior mutability). The renderer creates one per
//! stateful mount and hands clones to every lifecycle hook; event handlers
//! capture clones to update state later.
//!
//! `set_state` merges the patch immediately and, the first time an instance
//! becomes dirty, enqueues it on the attached [`Schedule`]. The renderer
//! clears the dirty flag whenever it renders the instance, so an instance
//! re-rendered by its parent before the queue is flushed is skipped.
//!
//! # Invariants
//!
//! 1. An instance is enqueued at most once between two renders.
//! 2. State reads always observe the latest merged state.
//! 3. Updates to an unmounted instance merge but never enqueue.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::value::{State, Value};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Receiver of dirty instances.
pub trait Schedule {
    fn enqueue(&self, instance: Instance);
}

struct InstanceInner {
    id: u64,
    state: RefCell<State>,
    dirty: Cell<bool>,
    mounted: Cell<bool>,
    scheduler: RefCell<Option<Weak<dyn Schedule>>>,
}

/// Shared handle to a stateful component's state.
///
/// Cloning an `Instance` creates a new handle to the **same** instance.
#[derive(Clone)]
pub struct Instance {
    inner: Rc<InstanceInner>,
}

impl Instance {
    /// Create a detached instance with empty state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(InstanceInner {
                id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
                state: RefCell::new(State::new()),
                dirty: Cell::new(false),
                mounted: Cell::new(false),
                scheduler: RefCell::new(None),
            }),
        }
    }

    /// Process-unique id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Attach to a scheduler and mark mounted.
    pub fn attach(&self, scheduler: Weak<dyn Schedule>) {
        *self.inner.scheduler.borrow_mut() = Some(scheduler);
        self.inner.mounted.set(true);
    }

    /// Mark unmounted; later updates no longer schedule renders.
    pub fn detach(&self) {
        self.inner.mounted.set(false);
        *self.inner.scheduler.borrow_mut() = None;
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.get()
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.get()
    }

    /// Clear the dirty flag. Called by the renderer right before rendering.
    pub fn mark_clean(&self) {
        self.inner.dirty.set(false);
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> State {
        self.inner.state.borrow().clone()
    }

    /// Look up one state key.
    #[must_use]
    pub fn state_value(&self, key: &str) -> Option<Value> {
        self.inner.state.borrow().get(key).cloned()
    }

    /// Access the state by reference without cloning.
    pub fn with_state<R>(&self, f: impl FnOnce(&State) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    /// Replace the state without scheduling a render. Meant for `construct`.
    pub fn init_state(&self, state: State) {
        *self.inner.state.borrow_mut() = state;
    }

    /// Merge `patch` into the state and schedule a render.
    pub fn set_state(&self, patch: State) {
        {
            let mut state = self.inner.state.borrow_mut();
            for (key, value) in patch {
                state.insert(key, value);
            }
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(target: "rspy", instance = self.inner.id, "state merged");
        self.schedule();
    }

    /// Compute a patch from the current state, then merge it.
    pub fn update_state(&self, f: impl FnOnce(&State) -> State) {
        let patch = f(&self.inner.state.borrow());
        self.set_state(patch);
    }

    /// Identity comparison.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn schedule(&self) {
        if !self.is_mounted() || self.inner.dirty.replace(true) {
            return;
        }
        let scheduler = self
            .inner
            .scheduler
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade);
        if let Some(scheduler) = scheduler {
            scheduler.enqueue(self.clone());
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.inner.id)
            .field("state", &self.inner.state.borrow())
            .field("dirty", &self.inner.dirty.get())
            .field("mounted", &self.inner.mounted.get())
            .finish()
    }
}
