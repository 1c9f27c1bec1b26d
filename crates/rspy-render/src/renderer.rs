#![forbid(unsafe_code)]

//! Mount, patch, and flush.
//!
//! [`Renderer`] owns one mount point. The first [`Renderer::render`] mounts
//! the tree; later calls patch it in place:
//!
//! - a component node whose definition is identical (by identity) to the one
//!   mounted at the same position keeps its instance; stateful instances get
//!   `will_receive_props` before re-rendering,
//! - an element with the same tag keeps its position and patches children
//!   pairwise by index,
//! - anything else is unmounted and mounted fresh.
//!
//! State updates do not render on their own. They enqueue the instance on
//! the shared [`RenderQueue`]; [`Renderer::flush`] drains it and re-renders
//! each instance that is still dirty and still mounted.
//!
//! # Failure Modes
//!
//! - **Panicking render**: a component render that panics unwinds through
//!   `render`/`flush`. The mount point is left without a root; the next
//!   `render` mounts fresh.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use rspy_core::{
    Attributes, Component, ComponentDef, ComponentNode, FunctionDef, Instance, Props, Schedule,
    VNode,
};

use crate::host::HostNode;
use crate::queue::RenderQueue;

enum Mounted {
    Element {
        tag: String,
        attributes: Attributes,
        children: Vec<Mounted>,
    },
    Text(String),
    Empty,
    Component(Rc<RefCell<MountedComponent>>),
}

struct MountedComponent {
    def: ComponentDef,
    props: Props,
    body: Body,
    child: Mounted,
}

enum Body {
    Function(Rc<FunctionDef>),
    Stateful {
        object: Box<dyn Component>,
        instance: Instance,
    },
}

/// Lifetime counters of a renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Component mounts.
    pub mounts: u64,
    /// Component re-renders (prop-driven or state-driven).
    pub updates: u64,
    /// Component unmounts.
    pub unmounts: u64,
    /// Calls to [`Renderer::flush`], including the one closing each `render`.
    pub flushes: u64,
    /// Component render invocations.
    pub renders: u64,
}

/// A single mount point.
pub struct Renderer {
    root: Option<Mounted>,
    queue: Rc<RenderQueue>,
    registry: AHashMap<u64, Weak<RefCell<MountedComponent>>>,
    stats: RenderStats,
}

impl Renderer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: None,
            queue: Rc::new(RenderQueue::new()),
            registry: AHashMap::new(),
            stats: RenderStats::default(),
        }
    }

    /// Mount `vnode`, or patch the existing tree towards it, then flush.
    pub fn render(&mut self, vnode: VNode) {
        let old = self.root.take();
        let root = self.reconcile(old, vnode);
        self.root = Some(root);
        self.flush();
    }

    /// Re-render every instance whose state changed since its last render.
    ///
    /// Returns the number of instances rendered.
    pub fn flush(&mut self) -> usize {
        let _span = tracing::debug_span!("rspy.flush", pending = self.queue.len()).entered();
        self.stats.flushes += 1;
        let mut rendered = 0;
        while let Some(instance) = self.queue.pop() {
            if !instance.is_dirty() || !instance.is_mounted() {
                continue;
            }
            let Some(cell) = self.registry.get(&instance.id()).and_then(Weak::upgrade) else {
                continue;
            };
            self.update_component(&cell, None);
            rendered += 1;
        }
        self.registry.retain(|_, weak| weak.strong_count() > 0);
        tracing::debug!(target: "rspy", rendered, "flush complete");
        rendered
    }

    /// Tear down the mounted tree.
    pub fn unmount(&mut self) {
        if let Some(root) = self.root.take() {
            self.unmount_tree(root);
        }
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.root.is_some()
    }

    /// Number of instances waiting for a flush.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Committed host nodes of the mount point.
    #[must_use]
    pub fn host(&self) -> Vec<HostNode> {
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            collect_host(root, &mut out);
        }
        out
    }

    fn reconcile(&mut self, old: Option<Mounted>, next: VNode) -> Mounted {
        match (old, next) {
            (Some(Mounted::Component(cell)), VNode::Component(node))
                if cell.borrow().def.ptr_eq(&node.def) =>
            {
                let props = Props::new(node.attributes, node.children);
                self.update_component(&cell, Some(props));
                Mounted::Component(cell)
            }
            (Some(Mounted::Element { tag, children, .. }), VNode::Element(el)) if tag == el.tag => {
                let children = self.reconcile_children(children, el.children);
                Mounted::Element {
                    tag,
                    attributes: el.attributes,
                    children,
                }
            }
            (Some(Mounted::Text(_)), VNode::Text(s)) => Mounted::Text(s),
            (old, next) => {
                if let Some(old) = old {
                    self.unmount_tree(old);
                }
                self.mount(next)
            }
        }
    }

    fn reconcile_children(&mut self, old: Vec<Mounted>, next: Vec<VNode>) -> Vec<Mounted> {
        let mut old = old.into_iter();
        let mut out = Vec::with_capacity(next.len());
        for child in next {
            out.push(self.reconcile(old.next(), child));
        }
        for leftover in old {
            self.unmount_tree(leftover);
        }
        out
    }

    fn mount(&mut self, next: VNode) -> Mounted {
        match next {
            VNode::Null => Mounted::Empty,
            VNode::Text(s) => Mounted::Text(s),
            VNode::Element(el) => {
                let children = el.children.into_iter().map(|c| self.mount(c)).collect();
                Mounted::Element {
                    tag: el.tag,
                    attributes: el.attributes,
                    children,
                }
            }
            VNode::Component(node) => self.mount_component(node),
        }
    }

    fn mount_component(&mut self, node: ComponentNode) -> Mounted {
        self.stats.mounts += 1;
        let props = Props::new(node.attributes, node.children);
        let body = match &node.def {
            ComponentDef::Function(def) => Body::Function(Rc::clone(def)),
            ComponentDef::Stateful(def) => {
                let mut object = def.instantiate();
                let instance = Instance::new();
                let queue: Rc<dyn Schedule> = self.queue.clone();
                instance.attach(Rc::downgrade(&queue));
                object.construct(&props, &instance);
                Body::Stateful { object, instance }
            }
        };
        let cell = Rc::new(RefCell::new(MountedComponent {
            def: node.def,
            props,
            body,
            child: Mounted::Empty,
        }));
        if let Body::Stateful { instance, .. } = &cell.borrow().body {
            self.registry.insert(instance.id(), Rc::downgrade(&cell));
        }
        let output = self.render_component(&cell);
        let child = self.reconcile(None, output);
        cell.borrow_mut().child = child;
        Mounted::Component(cell)
    }

    fn update_component(&mut self, cell: &Rc<RefCell<MountedComponent>>, props: Option<Props>) {
        self.stats.updates += 1;
        if let Some(props) = props {
            let mut mounted = cell.borrow_mut();
            if let Body::Stateful { object, instance } = &mut mounted.body {
                object.will_receive_props(&props, instance);
            }
            mounted.props = props;
        }
        let output = self.render_component(cell);
        let old = std::mem::replace(&mut cell.borrow_mut().child, Mounted::Empty);
        let child = self.reconcile(Some(old), output);
        cell.borrow_mut().child = child;
    }

    fn render_component(&mut self, cell: &Rc<RefCell<MountedComponent>>) -> VNode {
        self.stats.renders += 1;
        let mounted = cell.borrow();
        match &mounted.body {
            Body::Function(def) => def.call(&mounted.props),
            Body::Stateful { object, instance } => {
                instance.mark_clean();
                object.render(&mounted.props, instance)
            }
        }
    }

    fn unmount_tree(&mut self, mounted: Mounted) {
        match mounted {
            Mounted::Element { children, .. } => {
                for child in children {
                    self.unmount_tree(child);
                }
            }
            Mounted::Component(cell) => {
                self.stats.unmounts += 1;
                let child = {
                    let mut mounted = cell.borrow_mut();
                    if let Body::Stateful { instance, .. } = &mounted.body {
                        instance.detach();
                        self.registry.remove(&instance.id());
                    }
                    std::mem::replace(&mut mounted.child, Mounted::Empty)
                };
                self.unmount_tree(child);
            }
            Mounted::Text(_) | Mounted::Empty => {}
        }
    }
}

fn collect_host(mounted: &Mounted, out: &mut Vec<HostNode>) {
    match mounted {
        Mounted::Element {
            tag,
            attributes,
            children,
        } => {
            let mut host_children = Vec::new();
            for child in children {
                collect_host(child, &mut host_children);
            }
            out.push(HostNode::Element {
                tag: tag.clone(),
                attributes: attributes.clone(),
                children: host_children,
            });
        }
        Mounted::Text(s) => out.push(HostNode::Text(s.clone())),
        Mounted::Empty => {}
        Mounted::Component(cell) => collect_host(&cell.borrow().child, out),
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("mounted", &self.root.is_some())
            .field("pending", &self.queue.len())
            .field("stats", &self.stats)
            .finish()
    }
}
