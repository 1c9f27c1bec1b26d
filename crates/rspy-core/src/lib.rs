// Forbid unsafe in production; deny (with targeted allows) in tests.
#![cfg_attr(not(test), forbid(unsafe_code))]
#![cfg_attr(test, deny(unsafe_code))]

//! Core: virtual nodes, attribute values, and component definitions.
//!
//! # Role in rspy
//! `rspy-core` is the data layer. It owns the node model every other crate
//! speaks: [`VNode`] trees built with [`h`], [`component`] and [`text`],
//! dynamically-typed [`Value`]s in attribute maps, and the two component
//! shapes ([`FunctionDef`] and [`StatefulDef`] behind [`ComponentDef`]).
//!
//! # How it fits in the system
//! The renderer (`rspy-render`) mounts `VNode` trees and drives component
//! lifecycles through the [`Component`] trait and [`Instance`] handles. The
//! instrumentation and query layer (`rspy`) rewrites trees of these same
//! types and reads them back.

pub mod component;
pub mod instance;
pub mod value;
pub mod vnode;

pub use component::{Component, ComponentDef, FunctionDef, Props, StatefulDef};
pub use instance::{Instance, Schedule};
pub use value::{Attributes, Handler, State, Value};
pub use vnode::{ComponentNode, Element, SlotKey, VNode, component, h, text};
