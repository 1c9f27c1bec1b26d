// Forbid unsafe in production; deny (with targeted allows) in tests.
#![cfg_attr(not(test), forbid(unsafe_code))]
#![cfg_attr(test, deny(unsafe_code))]

//! Render spy: depth-limited instrumented rendering with tree queries.
//!
//! # Role in rspy
//! This crate is the public surface. It renders a [`VNode`] tree through the
//! `rspy-render` engine with every component definition swapped for a spy,
//! records what each component produced, and answers queries against those
//! recordings so tests see through component boundaries.
//!
//! # Quick start
//!
//! ```
//! use rspy::{ComponentDef, component, h, shallow};
//!
//! let label = ComponentDef::function("Label", |props| {
//!     h("span").attr("class", "label").with_children(props.children().to_vec()).into()
//! });
//! let ctx = shallow(component(&label).child("hello"));
//! assert_eq!(ctx.find(".label").text(), "hello");
//! ```
//!
//! # Depth
//!
//! [`deep`] takes [`RenderOptions`]; a depth of `n` runs component logic
//! only for the first `n` component levels and substitutes inert
//! placeholders below. [`shallow`] is depth 1 and [`render`] is unbounded.
//!
//! # Modules
//!
//! - [`matcher`]: the `Where` predicate language.
//! - [`selector`]: CSS-like strings and node patterns.
//! - [`spy`]: active and inert spies.
//! - [`context`]: the render context and its recording tables.
//! - [`find`]: find results and their operations.

pub mod context;
pub mod error;
pub mod find;
pub mod matcher;
pub mod options;
pub mod selector;
pub mod slot;
pub mod spy;
pub mod walk;

pub use context::RenderContext;
pub use error::{QueryError, Result};
pub use find::FindResult;
pub use matcher::{Expect, Where, matches};
pub use options::{DEPTH_ENV, Depth, RenderOptions};
pub use selector::Selector;
pub use spy::{NOOP_SPY_NAME, SPY_PRIVATE_KEY, noop_spy};

pub use rspy_core::{
    Attributes, Component, ComponentDef, ComponentNode, Element, FunctionDef, Handler, Instance,
    Props, SlotKey, State, StatefulDef, VNode, Value, attrs, component, h, text,
};
pub use rspy_render::{HostNode, RenderStats};

/// Render `vdom` with `options`.
pub fn deep(vdom: impl Into<VNode>, options: RenderOptions) -> RenderContext {
    let ctx = RenderContext::new(options);
    ctx.render(vdom);
    ctx
}

/// Render `vdom` with unbounded depth.
pub fn render(vdom: impl Into<VNode>) -> RenderContext {
    deep(vdom, RenderOptions::default())
}

/// Render `vdom` one component level deep.
pub fn shallow(vdom: impl Into<VNode>) -> RenderContext {
    deep(vdom, RenderOptions::shallow())
}
