#![forbid(unsafe_code)]

//! Pre-order expansion of recorded trees.
//!
//! [`Walk`] yields a node, then its logical descendants: for a component
//! with recorded output, that output; otherwise the literal children. Null
//! and empty-text nodes are skipped. The traversal uses an explicit stack, so
//! deep trees do not grow the call stack.

use ahash::AHashMap;
use rspy_core::{SlotKey, VNode};

/// Pre-order iterator over one or more roots.
pub struct Walk<'a> {
    recorded: &'a AHashMap<SlotKey, VNode>,
    stack: Vec<&'a VNode>,
}

impl<'a> Walk<'a> {
    pub fn new(recorded: &'a AHashMap<SlotKey, VNode>, roots: &'a [VNode]) -> Self {
        Self {
            recorded,
            stack: roots.iter().rev().collect(),
        }
    }

    /// Descendants of `root`, excluding `root` itself.
    pub fn descendants(recorded: &'a AHashMap<SlotKey, VNode>, root: &'a VNode) -> Self {
        let mut walk = Self::new(recorded, std::slice::from_ref(root));
        walk.next();
        walk
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a VNode;

    fn next(&mut self) -> Option<&'a VNode> {
        while let Some(node) = self.stack.pop() {
            if node.is_empty() {
                continue;
            }
            match node {
                VNode::Component(c) => match c.slot.and_then(|slot| self.recorded.get(&slot)) {
                    Some(output) => self.stack.push(output),
                    None => self.stack.extend(c.children.iter().rev()),
                },
                VNode::Element(e) => self.stack.extend(e.children.iter().rev()),
                VNode::Text(_) | VNode::Null => {}
            }
            return Some(node);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rspy_core::{ComponentDef, component, h, text};

    #[test]
    fn pre_order_over_elements() {
        let recorded = AHashMap::new();
        let tree: VNode = h("a").child(h("b").child("1")).child(h("c")).into();
        let roots = [tree];
        let names: Vec<String> = Walk::new(&recorded, &roots)
            .map(|n| n.tag().map_or_else(|| n.as_text().unwrap_or_default().to_owned(), str::to_owned))
            .collect();
        assert_eq!(names, ["a", "b", "1", "c"]);
    }

    #[test]
    fn components_expand_through_recorded_output() {
        let def = ComponentDef::function("C", |_| VNode::Null);
        let slot = SlotKey::new(1);
        let mut node = component(&def).child("authored");
        node.slot = Some(slot);
        let mut recorded = AHashMap::new();
        recorded.insert(slot, h("p").child("rendered").into());
        let roots = [VNode::from(node)];
        let texts: Vec<&str> = Walk::new(&recorded, &roots).filter_map(VNode::as_text).collect();
        assert_eq!(texts, ["rendered"]);
    }

    #[test]
    fn unrecorded_components_expand_children() {
        let def = ComponentDef::function("C", |_| VNode::Null);
        let recorded = AHashMap::new();
        let roots = [VNode::from(component(&def).child(VNode::Null).child(text("kid")))];
        let walk: Vec<&VNode> = Walk::new(&recorded, &roots).collect();
        assert_eq!(walk.len(), 2);
        assert_eq!(walk[1], &text("kid"));
    }

    #[test]
    fn descendants_skip_self() {
        let recorded = AHashMap::new();
        let root: VNode = h("div").child(h("div")).into();
        assert_eq!(Walk::descendants(&recorded, &root).count(), 1);
    }
}
