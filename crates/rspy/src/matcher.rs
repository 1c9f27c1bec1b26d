#![forbid(unsafe_code)]

//! Predicate matching against virtual nodes.
//!
//! A [`Where`] is an ordered list of `key => Expect` constraints. Every
//! constraint must hold (logical AND). Keys are looked up on a subject: on a
//! node, the keys are `nodeName`, `attributes` and `children`; on an
//! attribute map, its own keys.
//!
//! | Expect           | Passes when                                         |
//! |------------------|-----------------------------------------------------|
//! | `Exists`         | the key is present at all, whatever its value       |
//! | `Null`           | the value is exactly `null` (absent does not count) |
//! | `Nested(w)`      | the value is truthy and `w` matches it               |
//! | `AnyOf(vs)`      | the value equals at least one of `vs`                |
//! | `Equals(v)`      | the value equals `v`                                 |
//! | `Unset`          | always (an optional constraint left empty)           |
//!
//! Two keys are special:
//!
//! - `nodeName` on a component matches the definition identity, its declared
//!   name, or its display name. On a tag it matches only a lowercase-led
//!   string equal to the tag, so component-name selectors never match tags.
//! - `class`/`className` resolve the subject's class (a whitespace-separated
//!   string or a map of class name to active flag) to a token set and pass
//!   when the expected string is one of the tokens. A missing or `null`
//!   class is an empty set.
//!
//! Text and null nodes have no keys: every constraint except `Unset` fails
//! on them, without panicking.

use rspy_core::{Attributes, ComponentDef, VNode, Value};

/// One constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Expect {
    Exists,
    Null,
    Nested(Where),
    AnyOf(Vec<Value>),
    Equals(Value),
    Unset,
}

impl Expect {
    /// `Equals` for `Some`, `Unset` for `None`.
    pub fn optional<V: Into<Value>>(value: Option<V>) -> Self {
        value.map_or(Self::Unset, |v| Self::Equals(v.into()))
    }
}

macro_rules! expect_equals_from {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Expect {
                fn from(value: $ty) -> Self {
                    Self::Equals(value.into())
                }
            }
        )+
    };
}

expect_equals_from!(Value, &str, String, bool, i64, i32, f64, ComponentDef, &ComponentDef);

impl From<Where> for Expect {
    fn from(where_: Where) -> Self {
        Self::Nested(where_)
    }
}

/// A conjunction of key constraints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Where {
    entries: Vec<(String, Expect)>,
}

impl Where {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constraint.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, expect: impl Into<Expect>) -> Self {
        self.entries.push((key.into(), expect.into()));
        self
    }

    /// Constrain `nodeName`.
    #[must_use]
    pub fn node_name(self, name: impl Into<Value>) -> Self {
        self.with("nodeName", Expect::Equals(name.into()))
    }

    /// Constrain one attribute, nesting under `attributes`.
    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, expect: impl Into<Expect>) -> Self {
        let key = key.into();
        let expect = expect.into();
        let nested = self.entries.iter_mut().find_map(|(k, e)| match e {
            Expect::Nested(w) if k == "attributes" => Some(w),
            _ => None,
        });
        match nested {
            Some(w) => w.entries.push((key, expect)),
            None => {
                let w = Where::new().with(key, expect);
                self.entries.push(("attributes".to_owned(), Expect::Nested(w)));
            }
        }
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Expect> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, e)| e)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Expect)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Test a node.
    #[must_use]
    pub fn matches(&self, node: &VNode) -> bool {
        eval(self, Subject::Node(node))
    }

    /// Test an attribute map directly.
    #[must_use]
    pub fn matches_attributes(&self, attributes: &Attributes) -> bool {
        eval(self, Subject::Map(attributes))
    }
}

/// Test `target` against `where_`.
#[must_use]
pub fn matches(where_: &Where, target: &VNode) -> bool {
    where_.matches(target)
}

#[derive(Clone, Copy)]
enum Subject<'a> {
    Node(&'a VNode),
    Map(&'a Attributes),
    List(&'a [Value]),
    Nodes(&'a [VNode]),
    Opaque,
}

#[derive(Clone, Copy)]
enum Field<'a> {
    Value(&'a Value),
    Tag(&'a str),
    Def(&'a ComponentDef),
    Text(&'a str),
    Node(&'a VNode),
    Attributes(&'a Attributes),
    Nodes(&'a [VNode]),
}

impl<'a> Subject<'a> {
    fn lookup(self, key: &str) -> Option<Field<'a>> {
        match self {
            Self::Node(node) => match (node, key) {
                (VNode::Element(e), "nodeName") => Some(Field::Tag(&e.tag)),
                (VNode::Component(c), "nodeName") => Some(Field::Def(&c.def)),
                (VNode::Element(_) | VNode::Component(_), "attributes") => {
                    node.attributes().map(Field::Attributes)
                }
                (VNode::Element(_) | VNode::Component(_), "children") => {
                    Some(Field::Nodes(node.children()))
                }
                (VNode::Text(s), "text") => Some(Field::Text(s)),
                _ => None,
            },
            Self::Map(map) => map.get(key).map(Field::Value),
            Self::List(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)).map(Field::Value),
            Self::Nodes(nodes) => key.parse::<usize>().ok().and_then(|i| nodes.get(i)).map(Field::Node),
            Self::Opaque => None,
        }
    }
}

impl<'a> Field<'a> {
    fn is_truthy(self) -> bool {
        match self {
            Self::Value(v) => v.is_truthy(),
            Self::Tag(s) | Self::Text(s) => !s.is_empty(),
            Self::Node(n) => !n.is_empty(),
            Self::Def(_) | Self::Attributes(_) | Self::Nodes(_) => true,
        }
    }

    fn is_null(self) -> bool {
        matches!(self, Self::Value(Value::Null))
    }

    fn as_subject(self) -> Subject<'a> {
        match self {
            Self::Value(Value::Map(m)) => Subject::Map(m),
            Self::Value(Value::List(l)) => Subject::List(l),
            Self::Attributes(m) => Subject::Map(m),
            Self::Nodes(n) => Subject::Nodes(n),
            Self::Node(n) => Subject::Node(n),
            _ => Subject::Opaque,
        }
    }

    fn equals(self, expected: &Value) -> bool {
        match (self, expected) {
            (Self::Value(v), _) => v == expected,
            (Self::Tag(s) | Self::Text(s), Value::Str(e)) => s == e,
            (Self::Def(d), Value::Component(e)) => d.ptr_eq(e),
            _ => false,
        }
    }
}

fn eval(where_: &Where, subject: Subject<'_>) -> bool {
    where_
        .entries
        .iter()
        .all(|(key, expect)| check(key, expect, subject))
}

fn check(key: &str, expect: &Expect, subject: Subject<'_>) -> bool {
    match expect {
        Expect::Unset => true,
        Expect::Exists => subject.lookup(key).is_some(),
        Expect::Null => subject.lookup(key).is_some_and(Field::is_null),
        Expect::Nested(inner) => subject
            .lookup(key)
            .is_some_and(|field| field.is_truthy() && eval(inner, field.as_subject())),
        Expect::Equals(value) => check_value(key, value, subject),
        Expect::AnyOf(values) => values.iter().any(|value| check_value(key, value, subject)),
    }
}

fn check_value(key: &str, value: &Value, subject: Subject<'_>) -> bool {
    match key {
        "nodeName" => node_name_matches(subject, value),
        "class" | "className" => class_tokens(subject)
            .iter()
            .any(|token| value.as_str() == Some(token.as_str())),
        _ => subject.lookup(key).is_some_and(|field| field.equals(value)),
    }
}

fn node_name_matches(subject: Subject<'_>, value: &Value) -> bool {
    match (subject.lookup("nodeName"), value) {
        (Some(Field::Def(def)), Value::Component(expected)) => def.ptr_eq(expected),
        (Some(Field::Def(def)), Value::Str(name)) => {
            def.name() == name || def.display_name() == Some(name.as_str())
        }
        (Some(Field::Tag(tag)), Value::Str(name)) => is_tag_name(name) && tag == name,
        (Some(Field::Value(Value::Str(tag))), Value::Str(name)) => is_tag_name(name) && tag == name,
        _ => false,
    }
}

/// Lowercase-led names select tags; anything else selects components.
fn is_tag_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_lowercase())
}

fn class_tokens(subject: Subject<'_>) -> Vec<String> {
    let class = ["class", "className"]
        .into_iter()
        .filter_map(|key| subject.lookup(key))
        .find(|field| field.is_truthy());
    match class {
        Some(Field::Value(Value::Str(s))) => s.split_whitespace().map(str::to_owned).collect(),
        Some(Field::Value(Value::Map(flags))) => flags
            .iter()
            .filter(|(_, active)| active.is_truthy())
            .map(|(name, _)| name.clone())
            .collect(),
        Some(Field::Value(Value::List(items))) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        _ => Vec::new(),
    }
}
