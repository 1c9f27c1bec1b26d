//! Property-based invariant tests for element children normalization.
//!
//! 1. Element children never contain `Null`
//! 2. Element children never contain two adjacent text nodes
//! 3. Normalization preserves the concatenated text and element order
//! 4. Component children are kept exactly as authored

use proptest::prelude::*;
use rspy_core::{ComponentDef, VNode, component, h, text};

// ── Strategies ──────────────────────────────────────────────────────────

fn child() -> impl Strategy<Value = VNode> {
    prop_oneof![
        Just(VNode::Null),
        "[a-z]{0,3}".prop_map(|s| text(s)),
        prop::sample::select(vec!["b", "i"]).prop_map(|tag| VNode::from(h(tag))),
    ]
}

fn flatten(children: &[VNode]) -> (String, Vec<String>) {
    let mut texts = String::new();
    let mut tags = Vec::new();
    for child in children {
        match child {
            VNode::Text(s) => texts.push_str(s),
            VNode::Element(e) => tags.push(e.tag.clone()),
            _ => {}
        }
    }
    (texts, tags)
}

proptest! {
    #[test]
    fn element_children_are_normalized(children in prop::collection::vec(child(), 0..12)) {
        let el = h("div").with_children(children.clone());
        prop_assert!(el.children.iter().all(|c| !matches!(c, VNode::Null)));
        prop_assert!(
            el.children
                .windows(2)
                .all(|w| !(matches!(w[0], VNode::Text(_)) && matches!(w[1], VNode::Text(_))))
        );
        prop_assert_eq!(flatten(&el.children), flatten(&children));
    }

    #[test]
    fn builder_forms_agree(children in prop::collection::vec(child(), 0..8)) {
        let bulk = h("p").with_children(children.clone());
        let one_by_one = children.into_iter().fold(h("p"), |el, c| el.child(c));
        prop_assert_eq!(VNode::from(bulk), VNode::from(one_by_one));
    }

    #[test]
    fn component_children_are_untouched(children in prop::collection::vec(child(), 0..8)) {
        let def = ComponentDef::function("C", |_| VNode::Null);
        let node = component(&def).with_children(children.clone());
        prop_assert_eq!(node.children, children);
    }
}
