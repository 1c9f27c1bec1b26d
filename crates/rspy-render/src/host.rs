#![forbid(unsafe_code)]

//! Committed host tree.
//!
//! [`HostNode`] is what a mount point holds after reconciliation: elements
//! and text only. Components are flattened away into the nodes they
//! produced.

use std::fmt;

use rspy_core::Attributes;

/// A committed node.
#[derive(Clone, PartialEq)]
pub enum HostNode {
    Element {
        tag: String,
        attributes: Attributes,
        children: Vec<HostNode>,
    },
    Text(String),
}

impl HostNode {
    /// Tag name in upper case, as a DOM `tagName` would report it.
    #[must_use]
    pub fn tag_name(&self) -> Option<String> {
        match self {
            Self::Element { tag, .. } => Some(tag.to_ascii_uppercase()),
            Self::Text(_) => None,
        }
    }

    #[must_use]
    pub fn children(&self) -> &[HostNode] {
        match self {
            Self::Element { children, .. } => children,
            Self::Text(_) => &[],
        }
    }

    /// Concatenated text content.
    #[must_use]
    pub fn text_content(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Element { children, .. } => {
                children.iter().map(HostNode::text_content).collect()
            }
        }
    }
}

impl fmt::Debug for HostNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Element { tag, children, .. } => {
                write!(f, "<{tag}>")?;
                for child in children {
                    write!(f, "{child:?}")?;
                }
                write!(f, "</{tag}>")
            }
        }
    }
}
