//! Property-based invariant tests for the update queue.
//!
//! 1. Any number of `set_state` calls before a flush renders each instance once
//! 2. The committed host text reflects the last merged state
//! 3. A second flush with nothing pending renders nothing

use proptest::prelude::*;
use rspy_core::{Component, ComponentDef, Instance, Props, VNode, Value, attrs, component, h};
use rspy_render::{HostNode, Renderer};

#[derive(Default)]
struct Cell;

impl Component for Cell {
    fn construct(&mut self, props: &Props, this: &Instance) {
        let id = props.get("id").cloned().unwrap_or(Value::Null);
        this.init_state(attrs! { "id" => id, "v" => 0 });
    }

    fn render(&self, _props: &Props, this: &Instance) -> VNode {
        let handle = this.clone();
        let v = this.state_value("v").and_then(|v| v.as_int()).unwrap_or(0);
        h("td")
            .on("set", move |args| {
                let next = args.first().and_then(|a| a.as_int()).unwrap_or(0);
                handle.set_state(attrs! { "v" => next });
            })
            .child(v.to_string())
            .into()
    }
}

fn cell_handlers(renderer: &Renderer) -> Vec<rspy_core::Handler> {
    let host = renderer.host();
    let Some(HostNode::Element { children, .. }) = host.first() else {
        return Vec::new();
    };
    children
        .iter()
        .filter_map(|cell| match cell {
            HostNode::Element { attributes, .. } => attributes.get("onSet").and_then(|v| v.as_handler()).cloned(),
            HostNode::Text(_) => None,
        })
        .collect()
}

proptest! {
    #[test]
    fn flush_renders_each_dirty_instance_once(
        cells in 1usize..6,
        updates in prop::collection::vec((0usize..6, 0i64..100), 0..24),
    ) {
        let def = ComponentDef::stateful::<Cell>("Cell");
        let mut renderer = Renderer::new();
        renderer.render(
            h("tr")
                .with_children((0..cells).map(|i| component(&def).attr("id", i64::try_from(i).unwrap_or(0)).into()))
                .into(),
        );
        let handlers = cell_handlers(&renderer);
        prop_assert_eq!(handlers.len(), cells);

        let mut expected = vec![0i64; cells];
        let mut touched = vec![false; cells];
        for (index, value) in &updates {
            let index = index % cells;
            handlers[index].call(&[(*value).into()]);
            expected[index] = *value;
            touched[index] = true;
        }

        let dirty = touched.iter().filter(|t| **t).count();
        prop_assert_eq!(renderer.pending(), dirty);
        prop_assert_eq!(renderer.flush(), dirty);
        prop_assert_eq!(renderer.flush(), 0);

        let shown: String = expected.iter().map(i64::to_string).collect();
        prop_assert_eq!(renderer.host()[0].text_content(), shown);
    }
}
