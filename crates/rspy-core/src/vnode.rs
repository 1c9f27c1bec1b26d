#![forbid(unsafe_code)]

//! Virtual nodes.
//!
//! [`VNode`] is the lightweight tree a component produces before the
//! renderer reconciles it: tag elements, component references, text, and
//! null. The variant alone tells elements and components apart.
//!
//! # Children normalization
//!
//! Element builders ([`Element::child`], [`Element::with_children`]) drop
//! [`VNode::Null`] children and merge adjacent text children, so
//! `h("div").child("second ").child("first")` equals
//! `h("div").child("second first")`. Component children are kept exactly as
//! authored, since they are props and not rendered output.
//!
//! # Slots
//!
//! [`ComponentNode::slot`] is left empty by authors and filled in by
//! instrumentation layers to correlate a node with its recorded output.
//! Structural equality ignores it.

use std::fmt;

use crate::component::ComponentDef;
use crate::value::{Attributes, Handler, Value};

/// Opaque identifier of a logical render position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey(u32);

impl SlotKey {
    /// The slot of the tree root request.
    pub const ROOT: SlotKey = SlotKey(0);

    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::ROOT {
            f.write_str("root")
        } else {
            write!(f, "slot#{}", self.0)
        }
    }
}

/// A virtual node.
#[derive(Clone, PartialEq)]
pub enum VNode {
    Element(Element),
    Component(ComponentNode),
    Text(String),
    Null,
}

/// A tag element such as `<div>`.
#[derive(Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attributes: Attributes,
    pub children: Vec<VNode>,
}

/// A reference to a component, with its props as authored.
#[derive(Clone)]
pub struct ComponentNode {
    pub def: ComponentDef,
    pub attributes: Attributes,
    pub children: Vec<VNode>,
    pub slot: Option<SlotKey>,
}

/// Start an element.
#[must_use]
pub fn h(tag: &str) -> Element {
    Element::new(tag)
}

/// Start a component reference.
#[must_use]
pub fn component(def: &ComponentDef) -> ComponentNode {
    ComponentNode::new(def.clone())
}

/// A text node.
#[must_use]
pub fn text(s: impl Into<String>) -> VNode {
    VNode::Text(s.into())
}

fn handler_key(event: &str) -> String {
    let mut chars = event.chars();
    match chars.next() {
        Some(first) => format!("on{}{}", first.to_uppercase(), chars.as_str()),
        None => "on".to_owned(),
    }
}

impl Element {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Replace all attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Attach an event handler; `on("click", ..)` sets `onClick`.
    #[must_use]
    pub fn on(self, event: &str, f: impl Fn(&[Value]) + 'static) -> Self {
        let key = handler_key(event);
        self.attr(key, Handler::new(f))
    }

    /// Append a child.
    #[must_use]
    pub fn child(mut self, child: impl Into<VNode>) -> Self {
        self.push_child(child.into());
        self
    }

    /// Append several children.
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = VNode>) -> Self {
        for child in children {
            self.push_child(child);
        }
        self
    }

    /// Append a child, applying normalization.
    pub fn push_child(&mut self, child: VNode) {
        match child {
            VNode::Null => {}
            VNode::Text(s) => {
                if let Some(VNode::Text(last)) = self.children.last_mut() {
                    last.push_str(&s);
                } else {
                    self.children.push(VNode::Text(s));
                }
            }
            other => self.children.push(other),
        }
    }
}

impl ComponentNode {
    #[must_use]
    pub fn new(def: ComponentDef) -> Self {
        Self {
            def,
            attributes: Attributes::new(),
            children: Vec::new(),
            slot: None,
        }
    }

    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn on(self, event: &str, f: impl Fn(&[Value]) + 'static) -> Self {
        let key = handler_key(event);
        self.attr(key, Handler::new(f))
    }

    /// Append an authored child, unnormalized.
    #[must_use]
    pub fn child(mut self, child: impl Into<VNode>) -> Self {
        self.children.push(child.into());
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = VNode>) -> Self {
        self.children.extend(children);
        self
    }
}

impl PartialEq for ComponentNode {
    fn eq(&self, other: &Self) -> bool {
        self.def.ptr_eq(&other.def)
            && self.attributes == other.attributes
            && self.children == other.children
    }
}

impl VNode {
    /// Attributes of an element or component node.
    #[must_use]
    pub fn attributes(&self) -> Option<&Attributes> {
        match self {
            Self::Element(e) => Some(&e.attributes),
            Self::Component(c) => Some(&c.attributes),
            _ => None,
        }
    }

    /// Literal children. For components these are the authored children.
    #[must_use]
    pub fn children(&self) -> &[VNode] {
        match self {
            Self::Element(e) => &e.children,
            Self::Component(c) => &c.children,
            _ => &[],
        }
    }

    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Element(e) => Some(&e.tag),
            _ => None,
        }
    }

    #[must_use]
    pub fn def(&self) -> Option<&ComponentDef> {
        match self {
            Self::Component(c) => Some(&c.def),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn slot(&self) -> Option<SlotKey> {
        match self {
            Self::Component(c) => c.slot,
            _ => None,
        }
    }

    #[must_use]
    pub fn is_component(&self) -> bool {
        matches!(self, Self::Component(_))
    }

    /// Whether the node renders nothing (`null` or empty text).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl From<Element> for VNode {
    fn from(e: Element) -> Self {
        Self::Element(e)
    }
}

impl From<ComponentNode> for VNode {
    fn from(c: ComponentNode) -> Self {
        Self::Component(c)
    }
}

impl From<&str> for VNode {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for VNode {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for VNode {
    fn from(i: i64) -> Self {
        Self::Text(i.to_string())
    }
}

impl From<&Value> for VNode {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null | Value::Bool(_) => Self::Null,
            other => Self::Text(other.to_text()),
        }
    }
}

impl<T: Into<VNode>> From<Option<T>> for VNode {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

fn fmt_attributes(f: &mut fmt::Formatter<'_>, attributes: &Attributes) -> fmt::Result {
    for (key, value) in attributes {
        write!(f, " {key}={value:?}")?;
    }
    Ok(())
}

fn fmt_children(f: &mut fmt::Formatter<'_>, children: &[VNode]) -> fmt::Result {
    for child in children {
        write!(f, "{child:?}")?;
    }
    Ok(())
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(e) => write!(f, "{e:?}"),
            Self::Component(c) => write!(f, "{c:?}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Null => f.write_str("null"),
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        fmt_attributes(f, &self.attributes)?;
        if self.children.is_empty() {
            return f.write_str(" />");
        }
        f.write_str(">")?;
        fmt_children(f, &self.children)?;
        write!(f, "</{}>", self.tag)
    }
}

impl fmt::Debug for ComponentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.def.name();
        write!(f, "<{name}")?;
        if let Some(slot) = self.slot {
            write!(f, " @{slot}")?;
        }
        fmt_attributes(f, &self.attributes)?;
        if self.children.is_empty() {
            return f.write_str(" />");
        }
        f.write_str(">")?;
        fmt_children(f, &self.children)?;
        write!(f, "</{name}>")
    }
}
