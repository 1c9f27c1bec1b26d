#![forbid(unsafe_code)]

//! Find results: immutable views over selected nodes.
//!
//! A [`FindResult`] is a snapshot of nodes taken from a [`RenderContext`]'s
//! recorded trees, stamped with the context revision it was taken at. All
//! queries read through the recorded outputs, so component boundaries are
//! transparent: the children of a rendered component are what it rendered,
//! not what it was given.
//!
//! # Staleness
//!
//! Once the context records new output, results taken earlier may describe
//! nodes that no longer exist. Operations on such a result still run against
//! the captured nodes but emit a `warn` event on target `rspy` and bump
//! [`RenderContext::stale_warnings`].
//!
//! [`RenderContext`]: crate::RenderContext
//! [`RenderContext::stale_warnings`]: crate::RenderContext::stale_warnings

use std::fmt;
use std::ops::Index;
use std::rc::Rc;

use ahash::AHashMap;
use rspy_core::{Attributes, ComponentNode, Element, Handler, Instance, SlotKey, State, VNode, Value};

use crate::context::ContextInner;
use crate::error::{QueryError, Result};
use crate::selector::Selector;
use crate::walk::Walk;

/// Selected nodes of one render context.
#[derive(Clone)]
pub struct FindResult {
    ctx: Rc<ContextInner>,
    nodes: Vec<VNode>,
    revision: u64,
    selector: Option<Selector>,
}

impl FindResult {
    pub(crate) fn new(ctx: Rc<ContextInner>, nodes: Vec<VNode>, selector: Option<Selector>) -> Self {
        let revision = ctx.revision();
        Self {
            ctx,
            nodes,
            revision,
            selector,
        }
    }

    fn derive(&self, nodes: Vec<VNode>, selector: Option<Selector>) -> Self {
        Self::new(Rc::clone(&self.ctx), nodes, selector)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&VNode> {
        self.nodes.get(index)
    }

    #[must_use]
    pub fn nodes(&self) -> &[VNode] {
        &self.nodes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VNode> {
        self.nodes.iter()
    }

    /// The selector that produced this result, if any.
    #[must_use]
    pub fn selector(&self) -> Option<&Selector> {
        self.selector.as_ref()
    }

    /// Context revision this result was taken at.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the context recorded new output since this result was taken.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.revision != self.ctx.revision()
    }

    fn verify_fresh(&self, operation: &'static str) {
        if self.is_stale() {
            self.ctx.warn_stale(operation, self.revision);
        }
    }

    fn single(&self, operation: &'static str, argument: Option<&str>) -> Result<&VNode> {
        match self.nodes.as_slice() {
            [node] => Ok(node),
            nodes => Err(QueryError::NotSingleNode {
                operation,
                argument: argument.map(str::to_owned),
                found: nodes.len(),
            }),
        }
    }

    /// Singleton result for position `index`.
    pub fn at(&self, index: usize) -> Result<FindResult> {
        let Some(node) = self.nodes.get(index) else {
            return Err(QueryError::IndexOutOfRange {
                operation: "at",
                index,
                len: self.nodes.len(),
            });
        };
        self.verify_fresh("at");
        Ok(self.derive(vec![node.clone()], None))
    }

    pub fn first(&self) -> Result<FindResult> {
        if self.is_empty() {
            return Err(QueryError::EmptyResult { operation: "first" });
        }
        self.at(0)
    }

    pub fn last(&self) -> Result<FindResult> {
        if self.is_empty() {
            return Err(QueryError::EmptyResult { operation: "last" });
        }
        self.at(self.nodes.len() - 1)
    }

    /// Descendants of every node matching `selector`, in pre-order. A node is
    /// never its own descendant.
    #[must_use]
    pub fn find(&self, selector: impl Into<Selector>) -> FindResult {
        self.verify_fresh("find");
        let selector = selector.into();
        let predicate = selector.to_where();
        let nodes: Vec<VNode> = self.ctx.with_recorded(|recorded| {
            self.nodes
                .iter()
                .flat_map(|root| Walk::descendants(recorded, root))
                .filter(|node| predicate.matches(node))
                .cloned()
                .collect()
        });
        self.derive(nodes, Some(selector))
    }

    /// Nodes of this result matching `selector`, without descending.
    #[must_use]
    pub fn filter(&self, selector: impl Into<Selector>) -> FindResult {
        self.verify_fresh("filter");
        let selector = selector.into();
        let predicate = selector.to_where();
        let nodes: Vec<VNode> = self
            .nodes
            .iter()
            .filter(|node| predicate.matches(node))
            .cloned()
            .collect();
        self.derive(nodes, Some(selector))
    }

    /// Attribute `name` of the single node. Missing attributes are `None`.
    pub fn attr(&self, name: &str) -> Result<Option<Value>> {
        let node = self.single("attr", Some(name))?;
        self.verify_fresh("attr");
        Ok(node.attributes().and_then(|a| a.get(name)).cloned())
    }

    /// Copy of all attributes of the single node.
    pub fn attrs(&self) -> Result<Attributes> {
        let node = self.single("attrs", None)?;
        self.verify_fresh("attrs");
        Ok(node.attributes().cloned().unwrap_or_default())
    }

    /// Concatenated text of every node and its descendants.
    #[must_use]
    pub fn text(&self) -> String {
        self.verify_fresh("text");
        self.ctx.with_recorded(|recorded| {
            Walk::new(recorded, &self.nodes)
                .filter_map(VNode::as_text)
                .collect()
        })
    }

    /// Whether any node or descendant equals `pattern` structurally.
    #[must_use]
    pub fn contains(&self, pattern: impl Into<VNode>) -> bool {
        self.verify_fresh("contains");
        let pattern = pattern.into();
        self.ctx
            .with_recorded(|recorded| Walk::new(recorded, &self.nodes).any(|node| *node == pattern))
    }

    /// Literal children of the single node (authored children for a
    /// component).
    pub fn children(&self) -> Result<FindResult> {
        self.verify_fresh("children");
        let node = self.single("children", None)?;
        Ok(self.derive(node.children().to_vec(), None))
    }

    pub fn child_at(&self, index: usize) -> Result<FindResult> {
        self.children()?.at(index)
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.verify_fresh("exists");
        !self.is_empty()
    }

    /// Invoke the `on<event>` handler of every node (falling back to
    /// `on<event>capture`, both case-insensitive), then flush pending
    /// updates. Nodes without a handler are skipped.
    ///
    /// Returns the number of handlers invoked.
    pub fn simulate(&self, event: &str, args: &[Value]) -> usize {
        self.verify_fresh("simulate");
        let handlers: Vec<Handler> = self
            .nodes
            .iter()
            .filter_map(|node| node.attributes().and_then(|a| event_handler(a, event)))
            .collect();
        for handler in &handlers {
            handler.call(args);
        }
        let rendered = self.ctx.rerender();
        tracing::debug!(
            target: "rspy",
            event,
            handlers = handlers.len(),
            rendered,
            "simulated event"
        );
        handlers.len()
    }

    /// Apply `f` to each node, wrapped as a singleton result, with its index.
    pub fn map<T>(&self, mut f: impl FnMut(FindResult, usize) -> T) -> Vec<T> {
        self.verify_fresh("map");
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| f(self.derive(vec![node.clone()], None), i))
            .collect()
    }

    /// Live stateful instance of the single component node.
    pub fn component(&self) -> Result<Instance> {
        let node = self.single("component", None)?;
        self.verify_fresh("component");
        let VNode::Component(c) = node else {
            return Err(QueryError::NotComponent {
                operation: "component",
            });
        };
        c.slot
            .and_then(|slot| self.ctx.instance(slot))
            .ok_or_else(|| QueryError::NoInstance {
                operation: "component",
                component: c.def.name().to_owned(),
            })
    }

    pub fn state(&self) -> Result<State> {
        Ok(self.component()?.state())
    }

    pub fn state_of(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.component()?.state_value(key))
    }

    /// Merge `patch` into the instance state and flush.
    pub fn set_state(&self, patch: State) -> Result<()> {
        self.component()?.set_state(patch);
        self.ctx.rerender();
        Ok(())
    }

    /// What the single component node rendered, fully resolved through
    /// recorded outputs and detached from instrumentation.
    pub fn output(&self) -> Result<VNode> {
        let node = self.single("output", None)?;
        if !node.is_component() {
            return Err(QueryError::NotComponent {
                operation: "output",
            });
        }
        self.verify_fresh("output");
        Ok(self.ctx.with_recorded(|recorded| resolve_output(recorded, node)))
    }
}

fn event_handler(attributes: &Attributes, event: &str) -> Option<Handler> {
    let bubble = format!("on{}", event.to_lowercase());
    let capture = format!("{bubble}capture");
    let lookup = |wanted: &str| {
        attributes
            .iter()
            .find(|(key, _)| key.to_lowercase() == wanted)
            .and_then(|(_, value)| value.as_handler().cloned())
    };
    lookup(&bubble).or_else(|| lookup(&capture))
}

fn resolve_output(recorded: &AHashMap<SlotKey, VNode>, node: &VNode) -> VNode {
    let mut current = node;
    while let Some(next) = current.slot().and_then(|slot| recorded.get(&slot)) {
        current = next;
    }
    match current {
        VNode::Element(e) => Element::new(e.tag.as_str())
            .with_attributes(e.attributes.clone())
            .with_children(e.children.iter().map(|child| resolve_output(recorded, child)))
            .into(),
        VNode::Component(c) => ComponentNode::new(c.def.clone())
            .with_attributes(c.attributes.clone())
            .with_children(c.children.iter().map(|child| resolve_output(recorded, child)))
            .into(),
        other => other.clone(),
    }
}

impl Index<usize> for FindResult {
    type Output = VNode;

    fn index(&self, index: usize) -> &VNode {
        &self.nodes[index]
    }
}

impl<'a> IntoIterator for &'a FindResult {
    type Item = &'a VNode;
    type IntoIter = std::slice::Iter<'a, VNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl fmt::Debug for FindResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FindResult")
            .field("selector", &self.selector)
            .field("revision", &self.revision)
            .field("nodes", &self.nodes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rspy_core::{ComponentDef, attrs, component, h, text};

    #[test]
    fn handler_lookup_prefers_bubble() {
        let hit = Handler::new(|_| {});
        let miss = Handler::new(|_| {});
        let attributes = attrs! { "onClickCapture" => miss.clone(), "onclick" => hit.clone() };
        let found = event_handler(&attributes, "Click").expect("handler");
        assert!(found.ptr_eq(&hit));

        let attributes = attrs! { "onClickCapture" => miss.clone() };
        let found = event_handler(&attributes, "click").expect("capture handler");
        assert!(found.ptr_eq(&miss));

        assert!(event_handler(&attrs! { "onClick" => "not callable" }, "click").is_none());
    }

    #[test]
    fn output_follows_recorded_chain() {
        let outer = ComponentDef::function("Outer", |_| VNode::Null);
        let inner = ComponentDef::function("Inner", |_| VNode::Null);
        let mut outer_node = component(&outer);
        outer_node.slot = Some(SlotKey::new(1));
        let mut inner_node = component(&inner).child("x");
        inner_node.slot = Some(SlotKey::new(2));

        let mut recorded = AHashMap::new();
        recorded.insert(SlotKey::new(1), VNode::from(inner_node));
        recorded.insert(SlotKey::new(2), h("div").child("a ").into());

        let out = resolve_output(&recorded, &outer_node.into());
        assert_eq!(out, VNode::from(h("div").child("a ")));
        assert_eq!(resolve_output(&recorded, &text("t")), text("t"));
    }

    #[test]
    fn output_keeps_unrecorded_components() {
        let leaf = ComponentDef::function("Leaf", |_| VNode::Null);
        let mut node = component(&leaf).child("k");
        node.slot = Some(SlotKey::new(5));
        let out = resolve_output(&AHashMap::new(), &node.into());
        assert_eq!(out, VNode::from(component(&leaf).child("k")));
        assert_eq!(out.slot(), None);
    }
}
