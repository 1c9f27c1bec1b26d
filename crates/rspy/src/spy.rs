#![forbid(unsafe_code)]

//! Spy factory: transparent stand-ins for component definitions.
//!
//! A spy is a [`ComponentDef`] marked with the spy flag that the renderer
//! mounts in place of the original. Spies come in two flavors:
//!
//! - **active**: runs the original render logic, records its output under the
//!   node's slot, and hands the renderer an instrumented copy of that output
//!   one depth level deeper;
//! - **inert**: used past the depth budget; never runs original logic and
//!   renders a [`noop_spy`] placeholder carrying the original definition in
//!   its `component` attribute. Authored children are discarded.
//!
//! The function/stateful split is resolved once, when the spy is built.
//! Stateful spies wrap the original object in [`SpyComponent`], which
//! forwards every lifecycle hook.
//!
//! # Private key
//!
//! The slot and depth a spy needs travel in the [`SPY_PRIVATE_KEY`]
//! attribute, as a [`SpyTag`] inside [`Value::Opaque`]. Every spy strips it
//! before delegating, so original logic never sees it.
//!
//! # Invariants
//!
//! 1. At most one active and one inert spy exist per original definition per
//!    context ([`SpyCache`]).
//! 2. Wrapping a definition that is already a spy returns it unchanged.
//! 3. The renderer never mounts uninstrumented output of an active spy.

use std::rc::{Rc, Weak};

use ahash::AHashMap;
use rspy_core::{
    Component, ComponentDef, ComponentNode, FunctionDef, Instance, Props, SlotKey, StatefulDef,
    VNode, Value,
};

use crate::context::ContextInner;

/// Attribute carrying a [`SpyTag`] from the instrumented tree to the spy.
pub const SPY_PRIVATE_KEY: &str = "SPY_PRIVATE_KEY";

/// Name of the inert placeholder definition.
pub const NOOP_SPY_NAME: &str = "NoopSpy";

/// Where a spied node sits: its slot, and the depth it was scheduled at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpyTag {
    pub slot: SlotKey,
    pub depth: usize,
}

impl SpyTag {
    #[must_use]
    pub fn new(slot: SlotKey, depth: usize) -> Self {
        Self { slot, depth }
    }

    pub(crate) fn into_value(self) -> Value {
        Value::Opaque(Rc::new(self))
    }
}

/// Split the private tag off `props`.
#[must_use]
pub fn pop_spy_tag(props: &Props) -> (Option<SpyTag>, Props) {
    let mut clean = props.clone();
    let tag = clean
        .attributes
        .remove(SPY_PRIVATE_KEY)
        .and_then(|v| v.downcast_opaque::<SpyTag>().copied());
    (tag, clean)
}

thread_local! {
    static NOOP_SPY: ComponentDef = FunctionDef::new(NOOP_SPY_NAME, |_| VNode::Null)
        .mark_spy()
        .into();
}

/// The placeholder definition inert spies render. It renders nothing.
#[must_use]
pub fn noop_spy() -> ComponentDef {
    NOOP_SPY.with(Clone::clone)
}

/// Per-context cache of spies, keyed by original definition identity.
///
/// Entries keep the original alive so its identity cannot be reused.
#[derive(Default)]
pub(crate) struct SpyCache {
    active: AHashMap<usize, (ComponentDef, ComponentDef)>,
    inert: AHashMap<usize, (ComponentDef, ComponentDef)>,
}

impl SpyCache {
    pub(crate) fn active(&mut self, ctx: &Weak<ContextInner>, def: &ComponentDef) -> ComponentDef {
        if def.is_spy() {
            return def.clone();
        }
        self.active
            .entry(def.id())
            .or_insert_with(|| (def.clone(), active_spy(ctx, def)))
            .1
            .clone()
    }

    pub(crate) fn inert(&mut self, def: &ComponentDef) -> ComponentDef {
        if def.is_spy() {
            return def.clone();
        }
        self.inert
            .entry(def.id())
            .or_insert_with(|| (def.clone(), inert_spy(def)))
            .1
            .clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.active.len() + self.inert.len()
    }
}

fn active_spy(ctx: &Weak<ContextInner>, def: &ComponentDef) -> ComponentDef {
    match def {
        ComponentDef::Function(original) => {
            let original = Rc::clone(original);
            let ctx = ctx.clone();
            let spy = FunctionDef::new(def.name(), move |props: &Props| {
                let (tag, props) = pop_spy_tag(props);
                let output = original.call(&props);
                record(&ctx, tag, output)
            });
            with_display_name(spy, def.display_name()).mark_spy().into()
        }
        ComponentDef::Stateful(original) => {
            let original = Rc::clone(original);
            let ctx = ctx.clone();
            let spy = StatefulDef::new(def.name(), move || {
                Box::new(SpyComponent {
                    inner: original.instantiate(),
                    ctx: ctx.clone(),
                    tag: None,
                })
            });
            let spy = match def.display_name() {
                Some(name) => spy.with_display_name(name),
                None => spy,
            };
            spy.mark_spy().into()
        }
    }
}

fn with_display_name(def: FunctionDef, display_name: Option<&str>) -> FunctionDef {
    match display_name {
        Some(name) => def.with_display_name(name),
        None => def,
    }
}

fn inert_spy(def: &ComponentDef) -> ComponentDef {
    let original = def.clone();
    let spy = FunctionDef::new(def.name(), move |props: &Props| {
        let (_, props) = pop_spy_tag(props);
        tracing::debug!(
            target: "rspy",
            component = original.name(),
            "depth budget exhausted, rendering placeholder"
        );
        let mut attributes = props.attributes;
        attributes
            .entry("component".to_owned())
            .or_insert_with(|| Value::Component(original.clone()));
        VNode::Component(ComponentNode {
            def: noop_spy(),
            attributes,
            children: Vec::new(),
            slot: None,
        })
    });
    with_display_name(spy, def.display_name()).mark_spy().into()
}

fn record(ctx: &Weak<ContextInner>, tag: Option<SpyTag>, output: VNode) -> VNode {
    match (ctx.upgrade(), tag) {
        (Some(ctx), Some(tag)) => ctx.record_output(tag, output),
        _ => output,
    }
}

/// Stateful spy object: forwards lifecycle hooks to the original object and
/// records each render.
pub struct SpyComponent {
    inner: Box<dyn Component>,
    ctx: Weak<ContextInner>,
    tag: Option<SpyTag>,
}

impl Component for SpyComponent {
    fn construct(&mut self, props: &Props, this: &Instance) {
        let (tag, props) = pop_spy_tag(props);
        self.tag = tag;
        self.inner.construct(&props, this);
    }

    fn will_receive_props(&mut self, next_props: &Props, this: &Instance) {
        let (tag, props) = pop_spy_tag(next_props);
        if tag.is_some() {
            self.tag = tag;
        }
        self.inner.will_receive_props(&props, this);
    }

    fn render(&self, props: &Props, this: &Instance) -> VNode {
        let (_, props) = pop_spy_tag(props);
        let output = self.inner.render(&props, this);
        if let (Some(ctx), Some(tag)) = (self.ctx.upgrade(), self.tag) {
            ctx.register_instance(tag.slot, this);
        }
        record(&self.ctx, self.tag, output)
    }
}
