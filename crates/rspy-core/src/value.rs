#![forbid(unsafe_code)]

//! Attribute and state values.
//!
//! A [`Value`] is anything a virtual node can carry in its attribute map or a
//! stateful component can keep in its state: plain data, event handlers,
//! component definitions, and opaque payloads used by instrumentation layers.
//!
//! # Equality
//!
//! Data variants compare structurally. [`Value::Handler`],
//! [`Value::Component`] and [`Value::Opaque`] compare by identity, so two
//! closures with the same body are still different values.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::component::ComponentDef;

/// Attribute map of a virtual node. Also used for component state.
pub type Attributes = BTreeMap<String, Value>;

/// Component state; merged key by key on `set_state`.
pub type State = BTreeMap<String, Value>;

type HandlerFn = dyn Fn(&[Value]);

/// A shared event callback stored in an attribute such as `onClick`.
#[derive(Clone)]
pub struct Handler(Rc<HandlerFn>);

impl Handler {
    /// Wrap a closure as a handler.
    pub fn new(f: impl Fn(&[Value]) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the handler with the given arguments.
    pub fn call(&self, args: &[Value]) {
        (self.0)(args);
    }

    /// Identity comparison.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

/// A dynamically-typed attribute or state value.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(Attributes),
    /// Event callback.
    Handler(Handler),
    /// Component definition, compared by identity.
    Component(ComponentDef),
    /// Arbitrary payload, compared by identity.
    Opaque(Rc<dyn Any>),
}

impl Value {
    /// Script-style truthiness: `null`,
    /// `false`, `0`, `NaN` and `""` are falsy, everything else is truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0 && !f.is_nan(),
            Self::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&Attributes> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            Self::Handler(h) => Some(h),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_component(&self) -> Option<&ComponentDef> {
        match self {
            Self::Component(def) => Some(def),
            _ => None,
        }
    }

    /// Downcast an opaque payload.
    #[must_use]
    pub fn downcast_opaque<T: 'static>(&self) -> Option<&T> {
        match self {
            Self::Opaque(any) => any.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Text form used when a value is rendered as a text child.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Str(s) => s.clone(),
            other => format!("{other:?}"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Handler(a), Self::Handler(b)) => a.ptr_eq(b),
            (Self::Component(a), Self::Component(b)) => a.ptr_eq(b),
            (Self::Opaque(a), Self::Opaque(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::List(l) => f.debug_list().entries(l).finish(),
            Self::Map(m) => f.debug_map().entries(m).finish(),
            Self::Handler(h) => write!(f, "{h:?}"),
            Self::Component(def) => write!(f, "<{}>", def.name()),
            Self::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Self::List(l)
    }
}

impl From<Attributes> for Value {
    fn from(m: Attributes) -> Self {
        Self::Map(m)
    }
}

impl From<Handler> for Value {
    fn from(h: Handler) -> Self {
        Self::Handler(h)
    }
}

impl From<ComponentDef> for Value {
    fn from(def: ComponentDef) -> Self {
        Self::Component(def)
    }
}

impl From<&ComponentDef> for Value {
    fn from(def: &ComponentDef) -> Self {
        Self::Component(def.clone())
    }
}

/// Build an [`Attributes`] (or [`State`]) map from `key => value` pairs.
///
/// ```
/// use rspy_core::{attrs, Value};
///
/// let a = attrs! { "id" => "main", "count" => 2 };
/// assert_eq!(a.get("count"), Some(&Value::Int(2)));
/// ```
#[macro_export]
macro_rules! attrs {
    () => { $crate::Attributes::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::Attributes::new();
        $( map.insert(::std::string::String::from($key), $crate::Value::from($value)); )+
        map
    }};
}
