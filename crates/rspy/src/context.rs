#![forbid(unsafe_code)]

//! Render context: one instrumented mount point and its recording tables.
//!
//! [`RenderContext::render`] takes an authored tree, gives every component
//! node a slot key, records the tree as the output of the root slot, swaps
//! each component definition for a spy, and mounts the result through a
//! [`Renderer`]. From then on, spies call back into the context to record
//! what each component rendered (see [`crate::spy`]).
//!
//! # Design
//!
//! The context owns four tables, all keyed by [`SlotKey`]:
//!
//! | Table       | Holds                                               |
//! |-------------|-----------------------------------------------------|
//! | `recorded`  | the latest output of the component at that slot     |
//! | `depths`    | the instrumentation depth it rendered at (root = 0) |
//! | `instances` | the live stateful instance, when there is one       |
//! | `slots`     | the arena interning `(parent, path, definition)`    |
//!
//! Recorded trees carry slots but never spies; the renderer sees spies but
//! the query layer never does.
//!
//! # Invariants
//!
//! 1. The revision counter grows on every recorded output, so any change to
//!    what the query layer can see makes older [`FindResult`]s stale.
//! 2. A slot is allocated once per logical position; re-rendering in place
//!    overwrites the recorded output instead of adding one.
//! 3. Components scheduled past the depth budget get inert spies before the
//!    renderer ever sees them.
//!
//! # Failure Modes
//!
//! - **Re-entrant render**: calling [`RenderContext::render`] from inside a
//!   component render panics on the renderer borrow. Handlers invoked by
//!   `simulate` run outside any borrow and may render freely.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use rspy_core::{Attributes, Instance, SlotKey, State, VNode, Value};
use rspy_render::{HostNode, RenderStats, Renderer};

use crate::error::Result;
use crate::find::FindResult;
use crate::options::RenderOptions;
use crate::selector::Selector;
use crate::slot::{SlotArena, SlotPath};
use crate::spy::{SPY_PRIVATE_KEY, SpyCache, SpyTag};

#[derive(Default)]
struct Tables {
    slots: SlotArena,
    recorded: AHashMap<SlotKey, VNode>,
    depths: AHashMap<SlotKey, usize>,
    instances: AHashMap<SlotKey, Instance>,
    root: Option<VNode>,
    revision: u64,
}

pub(crate) struct ContextInner {
    me: Weak<ContextInner>,
    options: RenderOptions,
    tables: RefCell<Tables>,
    renderer: RefCell<Renderer>,
    spies: RefCell<SpyCache>,
    stale_warnings: Cell<u64>,
}

impl ContextInner {
    fn new(options: RenderOptions) -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            me: me.clone(),
            options,
            tables: RefCell::new(Tables::default()),
            renderer: RefCell::new(Renderer::new()),
            spies: RefCell::new(SpyCache::default()),
            stale_warnings: Cell::new(0),
        })
    }

    fn render_root(&self, vdom: VNode) {
        let span = tracing::info_span!(
            "rspy.render",
            depth = %self.options.depth,
            revision = tracing::field::Empty
        );
        let _guard = span.enter();
        let annotated = {
            let mut tables = self.tables.borrow_mut();
            let annotated = assign_slots(&mut tables.slots, vdom, SlotKey::ROOT, &mut SlotPath::new());
            tables.recorded.insert(SlotKey::ROOT, annotated.clone());
            tables.depths.insert(SlotKey::ROOT, 0);
            tables.root = Some(annotated.clone());
            tables.revision += 1;
            annotated
        };
        let instrumented = self.spy_walk(annotated, 0);
        self.renderer.borrow_mut().render(instrumented);
        span.record("revision", self.revision());
    }

    /// Record `output` as the latest output of `tag.slot` and return the
    /// instrumented copy for the renderer.
    pub(crate) fn record_output(&self, tag: SpyTag, output: VNode) -> VNode {
        let annotated = {
            let mut tables = self.tables.borrow_mut();
            let annotated = assign_slots(&mut tables.slots, output, tag.slot, &mut SlotPath::new());
            tables.recorded.insert(tag.slot, annotated.clone());
            tables.depths.insert(tag.slot, tag.depth);
            tables.revision += 1;
            annotated
        };
        tracing::trace!(target: "rspy", slot = %tag.slot, depth = tag.depth, "recorded output");
        self.spy_walk(annotated, tag.depth + 1)
    }

    pub(crate) fn register_instance(&self, slot: SlotKey, instance: &Instance) {
        self.tables
            .borrow_mut()
            .instances
            .insert(slot, instance.clone());
    }

    /// Swap component definitions for spies. Depth only grows across
    /// component boundaries, so element children keep `depth`.
    fn spy_walk(&self, node: VNode, depth: usize) -> VNode {
        match node {
            VNode::Component(mut c) if !c.def.is_spy() => {
                c.def = {
                    let mut spies = self.spies.borrow_mut();
                    if self.options.depth.exceeded_by(depth) {
                        spies.inert(&c.def)
                    } else {
                        spies.active(&self.me, &c.def)
                    }
                };
                if let Some(slot) = c.slot {
                    c.attributes
                        .insert(SPY_PRIVATE_KEY.to_owned(), SpyTag::new(slot, depth).into_value());
                }
                VNode::Component(c)
            }
            VNode::Element(mut e) => {
                e.children = e
                    .children
                    .into_iter()
                    .map(|child| self.spy_walk(child, depth))
                    .collect();
                VNode::Element(e)
            }
            other => other,
        }
    }

    pub(crate) fn rerender(&self) -> usize {
        self.renderer.borrow_mut().flush()
    }

    pub(crate) fn revision(&self) -> u64 {
        self.tables.borrow().revision
    }

    pub(crate) fn with_recorded<R>(&self, f: impl FnOnce(&AHashMap<SlotKey, VNode>) -> R) -> R {
        f(&self.tables.borrow().recorded)
    }

    pub(crate) fn instance(&self, slot: SlotKey) -> Option<Instance> {
        self.tables.borrow().instances.get(&slot).cloned()
    }

    pub(crate) fn warn_stale(&self, operation: &'static str, captured: u64) {
        self.stale_warnings.set(self.stale_warnings.get() + 1);
        tracing::warn!(
            target: "rspy",
            operation,
            captured,
            current = self.revision(),
            "operation on stale find() result"
        );
    }
}

/// Give each non-spy component node a slot under `parent`, keyed by its
/// element path from the root of this output.
fn assign_slots(slots: &mut SlotArena, node: VNode, parent: SlotKey, path: &mut SlotPath) -> VNode {
    match node {
        VNode::Component(mut c) => {
            if !c.def.is_spy() {
                c.slot = Some(slots.child(parent, path, c.def.id()));
            }
            VNode::Component(c)
        }
        VNode::Element(mut e) => {
            e.children = e
                .children
                .into_iter()
                .enumerate()
                .map(|(i, child)| {
                    path.push(u32::try_from(i).unwrap_or(u32::MAX));
                    let child = assign_slots(slots, child, parent, path);
                    path.pop();
                    child
                })
                .collect();
            VNode::Element(e)
        }
        other => other,
    }
}

/// An instrumented render of one tree.
///
/// Cloning shares the same context. The context also answers every query a
/// [`FindResult`] does, against a fresh view of the current root.
#[derive(Clone)]
pub struct RenderContext {
    inner: Rc<ContextInner>,
}

impl RenderContext {
    #[must_use]
    pub fn new(options: RenderOptions) -> Self {
        Self {
            inner: ContextInner::new(options),
        }
    }

    /// Render `vdom`: mount on the first call, update the same mount point
    /// afterwards.
    pub fn render(&self, vdom: impl Into<VNode>) -> &Self {
        self.inner.render_root(vdom.into());
        self
    }

    /// Flush pending state-driven updates. Returns the number of instances
    /// re-rendered.
    pub fn rerender(&self) -> usize {
        self.inner.rerender()
    }

    /// A find result holding the current root.
    #[must_use]
    pub fn view(&self) -> FindResult {
        let root = self.inner.tables.borrow().root.clone();
        FindResult::new(Rc::clone(&self.inner), root.into_iter().collect(), None)
    }

    /// Committed host tree of the mount point.
    #[must_use]
    pub fn fragment(&self) -> Vec<HostNode> {
        self.inner.renderer.borrow().host()
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.inner.revision()
    }

    #[must_use]
    pub fn options(&self) -> RenderOptions {
        self.inner.options
    }

    /// Number of stale-result warnings emitted so far.
    #[must_use]
    pub fn stale_warnings(&self) -> u64 {
        self.inner.stale_warnings.get()
    }

    #[must_use]
    pub fn render_stats(&self) -> RenderStats {
        self.inner.renderer.borrow().stats()
    }

    /// Depth at which the component node `node` last rendered.
    #[must_use]
    pub fn depth_of(&self, node: &VNode) -> Option<usize> {
        let slot = node.slot()?;
        self.inner.tables.borrow().depths.get(&slot).copied()
    }

    /// Latest recorded output of the component node `node`.
    #[must_use]
    pub fn recorded_output(&self, node: &VNode) -> Option<VNode> {
        let slot = node.slot()?;
        self.inner.with_recorded(|recorded| recorded.get(&slot).cloned())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.view().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.view().is_empty()
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.view().exists()
    }

    pub fn at(&self, index: usize) -> Result<FindResult> {
        self.view().at(index)
    }

    pub fn first(&self) -> Result<FindResult> {
        self.view().first()
    }

    pub fn last(&self) -> Result<FindResult> {
        self.view().last()
    }

    #[must_use]
    pub fn find(&self, selector: impl Into<Selector>) -> FindResult {
        self.view().find(selector)
    }

    #[must_use]
    pub fn filter(&self, selector: impl Into<Selector>) -> FindResult {
        self.view().filter(selector)
    }

    pub fn attr(&self, name: &str) -> Result<Option<Value>> {
        self.view().attr(name)
    }

    pub fn attrs(&self) -> Result<Attributes> {
        self.view().attrs()
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.view().text()
    }

    #[must_use]
    pub fn contains(&self, pattern: impl Into<VNode>) -> bool {
        self.view().contains(pattern)
    }

    pub fn simulate(&self, event: &str, args: &[Value]) -> usize {
        self.view().simulate(event, args)
    }

    pub fn output(&self) -> Result<VNode> {
        self.view().output()
    }

    pub fn component(&self) -> Result<Instance> {
        self.view().component()
    }

    pub fn state(&self) -> Result<State> {
        self.view().state()
    }

    pub fn state_of(&self, key: &str) -> Result<Option<Value>> {
        self.view().state_of(key)
    }

    pub fn set_state(&self, patch: State) -> Result<()> {
        self.view().set_state(patch)
    }

    pub fn children(&self) -> Result<FindResult> {
        self.view().children()
    }

    pub fn child_at(&self, index: usize) -> Result<FindResult> {
        self.view().child_at(index)
    }

    pub fn map<T>(&self, f: impl FnMut(FindResult, usize) -> T) -> Vec<T> {
        self.view().map(f)
    }
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tables = self.inner.tables.borrow();
        f.debug_struct("RenderContext")
            .field("depth", &self.inner.options.depth)
            .field("revision", &tables.revision)
            .field("recorded", &tables.recorded.len())
            .field("spies", &self.inner.spies.borrow().len())
            .finish()
    }
}
