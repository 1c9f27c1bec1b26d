// Forbid unsafe in production; deny (with targeted allows) in tests.
#![cfg_attr(not(test), forbid(unsafe_code))]
#![cfg_attr(test, deny(unsafe_code))]

//! Render kernel: mount points, reconciliation, and the update queue.
//!
//! # Role in rspy
//! `rspy-render` is the rendering engine the instrumentation layer wraps. It
//! executes component render logic, keeps stateful instances alive across
//! re-renders of the same position, and commits the result to a host tree.
//!
//! # Primary responsibilities
//! - **Renderer**: mount on first render, patch afterwards.
//! - **RenderQueue**: defer state-driven renders until an explicit flush.
//! - **HostNode**: the committed element/text tree of a mount point.
//!
//! # How it fits in the system
//! The engine only sees [`rspy_core::VNode`] trees and
//! [`rspy_core::ComponentDef`]s. It has no notion of spies; the `rspy`
//! crate hands it wrapped definitions that behave like the originals.

pub mod host;
pub mod queue;
pub mod renderer;

pub use host::HostNode;
pub use queue::RenderQueue;
pub use renderer::{RenderStats, Renderer};
