#![forbid(unsafe_code)]

//! Component definitions.
//!
//! A component is either a plain render function ([`FunctionDef`]) or a
//! factory for stateful objects implementing [`Component`]
//! ([`StatefulDef`]). The two shapes are distinguished once, when the
//! definition is built, and carried as a [`ComponentDef`] variant from then
//! on.
//!
//! Definitions have identity. Cloning a [`ComponentDef`] shares the same
//! definition; [`ComponentDef::ptr_eq`] and [`ComponentDef::id`] expose that
//! identity to renderers (which reuse instances only when the definition at a
//! position is unchanged) and to instrumentation layers (which cache wrappers
//! per definition).

use std::fmt;
use std::rc::Rc;

use crate::instance::Instance;
use crate::value::{Attributes, Value};
use crate::vnode::VNode;

/// Props handed to a component: its attributes plus the authored children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
    pub attributes: Attributes,
    pub children: Vec<VNode>,
}

impl Props {
    #[must_use]
    pub fn new(attributes: Attributes, children: Vec<VNode>) -> Self {
        Self {
            attributes,
            children,
        }
    }

    /// Look up an attribute.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Look up a string attribute.
    #[must_use]
    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Authored children.
    #[must_use]
    pub fn children(&self) -> &[VNode] {
        &self.children
    }
}

/// Lifecycle of a stateful component.
///
/// Every hook receives the live [`Instance`] so the component can read and
/// update its state. State lives on the instance, not on the implementing
/// type, which keeps wrappers free to forward hooks without copying state.
pub trait Component: 'static {
    /// Called once, before the first render.
    fn construct(&mut self, props: &Props, this: &Instance) {
        let _ = (props, this);
    }

    /// Called when the parent re-renders this instance with new props.
    fn will_receive_props(&mut self, next_props: &Props, this: &Instance) {
        let _ = (next_props, this);
    }

    /// Produce the virtual node for the current props and state.
    fn render(&self, props: &Props, this: &Instance) -> VNode;
}

type RenderFn = dyn Fn(&Props) -> VNode;
type Factory = dyn Fn() -> Box<dyn Component>;

/// A function-style component.
pub struct FunctionDef {
    name: String,
    display_name: Option<String>,
    render: Box<RenderFn>,
    is_spy: bool,
}

impl FunctionDef {
    pub fn new(name: impl Into<String>, render: impl Fn(&Props) -> VNode + 'static) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            render: Box::new(render),
            is_spy: false,
        }
    }

    /// Set an explicit display name used by name-based selectors.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Mark this definition as an instrumentation wrapper.
    #[must_use]
    pub fn mark_spy(mut self) -> Self {
        self.is_spy = true;
        self
    }

    /// Run the render function.
    pub fn call(&self, props: &Props) -> VNode {
        (self.render)(props)
    }
}

/// A stateful component: a factory of [`Component`] objects.
pub struct StatefulDef {
    name: String,
    display_name: Option<String>,
    factory: Box<Factory>,
    is_spy: bool,
}

impl StatefulDef {
    pub fn new(name: impl Into<String>, factory: impl Fn() -> Box<dyn Component> + 'static) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            factory: Box::new(factory),
            is_spy: false,
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    #[must_use]
    pub fn mark_spy(mut self) -> Self {
        self.is_spy = true;
        self
    }

    /// Build a fresh, unconstructed component object.
    #[must_use]
    pub fn instantiate(&self) -> Box<dyn Component> {
        (self.factory)()
    }
}

/// Shared handle to a component definition.
#[derive(Clone)]
pub enum ComponentDef {
    Function(Rc<FunctionDef>),
    Stateful(Rc<StatefulDef>),
}

impl ComponentDef {
    /// Define a function component.
    pub fn function(name: impl Into<String>, render: impl Fn(&Props) -> VNode + 'static) -> Self {
        FunctionDef::new(name, render).into()
    }

    /// Define a stateful component whose objects start from `Default`.
    #[must_use]
    pub fn stateful<C: Component + Default>(name: impl Into<String>) -> Self {
        StatefulDef::new(name, || Box::new(C::default())).into()
    }

    /// Define a stateful component from an explicit factory.
    pub fn stateful_with(
        name: impl Into<String>,
        factory: impl Fn() -> Box<dyn Component> + 'static,
    ) -> Self {
        StatefulDef::new(name, factory).into()
    }

    /// Declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Function(f) => &f.name,
            Self::Stateful(s) => &s.name,
        }
    }

    /// Display-name override, if any.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        match self {
            Self::Function(f) => f.display_name.as_deref(),
            Self::Stateful(s) => s.display_name.as_deref(),
        }
    }

    /// Whether this definition is an instrumentation wrapper.
    #[must_use]
    pub fn is_spy(&self) -> bool {
        match self {
            Self::Function(f) => f.is_spy,
            Self::Stateful(s) => s.is_spy,
        }
    }

    #[must_use]
    pub fn is_stateful(&self) -> bool {
        matches!(self, Self::Stateful(_))
    }

    /// Identity comparison.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }

    /// Stable identity for the lifetime of the definition.
    #[must_use]
    pub fn id(&self) -> usize {
        match self {
            Self::Function(f) => Rc::as_ptr(f) as usize,
            Self::Stateful(s) => Rc::as_ptr(s) as usize,
        }
    }
}

impl From<FunctionDef> for ComponentDef {
    fn from(def: FunctionDef) -> Self {
        Self::Function(Rc::new(def))
    }
}

impl From<StatefulDef> for ComponentDef {
    fn from(def: StatefulDef) -> Self {
        Self::Stateful(Rc::new(def))
    }
}

impl PartialEq for ComponentDef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ComponentDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_stateful() { "stateful" } else { "fn" };
        write!(f, "{kind} {}", self.name())?;
        if self.is_spy() {
            f.write_str(" (spy)")?;
        }
        Ok(())
    }
}
