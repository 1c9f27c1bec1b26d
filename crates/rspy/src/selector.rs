#![forbid(unsafe_code)]

//! Selectors: the three ways to say which nodes a query wants.
//!
//! - a CSS-like string: `.class`, `#id`, `[attr]`, or a node name (`div`,
//!   `Widget`); only single simple selectors are understood,
//! - a node pattern: `h("div").attr("id", "a")` or `component(&Widget)`,
//!   matched on node name plus the attributes it carries,
//! - a [`Where`] predicate, used as-is.
//!
//! Every selector reduces to a [`Where`] through [`Selector::to_where`].

use std::fmt;

use rspy_core::{ComponentNode, Element, VNode, Value};

use crate::matcher::{Expect, Where};

/// A node selector.
#[derive(Clone, PartialEq)]
pub enum Selector {
    Css(String),
    Pattern(VNode),
    Where(Where),
}

impl Selector {
    /// Reduce to a predicate.
    #[must_use]
    pub fn to_where(&self) -> Where {
        match self {
            Self::Css(css) => css_to_where(css),
            Self::Pattern(node) => pattern_to_where(node),
            Self::Where(w) => w.clone(),
        }
    }

    /// Test one node.
    #[must_use]
    pub fn matches(&self, node: &VNode) -> bool {
        self.to_where().matches(node)
    }
}

fn css_to_where(css: &str) -> Where {
    let css = css.trim();
    if let Some(class) = css.strip_prefix('.') {
        Where::new().attribute("class", class)
    } else if let Some(id) = css.strip_prefix('#') {
        Where::new().attribute("id", id)
    } else if let Some(attr) = css.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        Where::new().attribute(attr.trim(), Expect::Exists)
    } else {
        Where::new().node_name(css)
    }
}

fn pattern_to_where(node: &VNode) -> Where {
    match node {
        VNode::Element(el) => Where::new()
            .node_name(el.tag.as_str())
            .with("attributes", Expect::Nested(value_map_where(&el.attributes))),
        VNode::Component(c) => Where::new()
            .node_name(&c.def)
            .with("attributes", Expect::Nested(value_map_where(&c.attributes))),
        VNode::Text(s) => Where::new().with("text", s.as_str()),
        // Nothing has a null node name; the pattern matches nothing.
        VNode::Null => Where::new().with("nodeName", Expect::Null),
    }
}

fn value_map_where(map: &rspy_core::Attributes) -> Where {
    map.iter().fold(Where::new(), |w, (key, value)| {
        let expect = match value {
            Value::Map(inner) => Expect::Nested(value_map_where(inner)),
            other => Expect::Equals(other.clone()),
        };
        w.with(key.as_str(), expect)
    })
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(css) => f.write_str(css),
            Self::Pattern(node) => write!(f, "{node:?}"),
            Self::Where(w) => write!(f, "{w:?}"),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<&str> for Selector {
    fn from(css: &str) -> Self {
        Self::Css(css.to_owned())
    }
}

impl From<String> for Selector {
    fn from(css: String) -> Self {
        Self::Css(css)
    }
}

impl From<VNode> for Selector {
    fn from(node: VNode) -> Self {
        Self::Pattern(node)
    }
}

impl From<Element> for Selector {
    fn from(el: Element) -> Self {
        Self::Pattern(el.into())
    }
}

impl From<ComponentNode> for Selector {
    fn from(c: ComponentNode) -> Self {
        Self::Pattern(c.into())
    }
}

impl From<&rspy_core::ComponentDef> for Selector {
    fn from(def: &rspy_core::ComponentDef) -> Self {
        Self::Pattern(rspy_core::component(def).into())
    }
}

impl From<Where> for Selector {
    fn from(w: Where) -> Self {
        Self::Where(w)
    }
}
