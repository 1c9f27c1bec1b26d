#![forbid(unsafe_code)]

//! Lifecycle tests for stateful components under the renderer.
//!
//! 1. `construct` runs once per mount and seeds state.
//! 2. `set_state` defers rendering until `flush`.
//! 3. `will_receive_props` runs before a parent-driven re-render.
//! 4. Instances rendered by their parent are skipped by the next flush.
//! 5. Unmounted instances never render again.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rspy_core::{Component, ComponentDef, Instance, Props, VNode, Value, attrs, component, h};
use rspy_render::Renderer;

fn count_of(this: &Instance) -> i64 {
    this.state_value("count").and_then(|v| v.as_int()).unwrap_or(0)
}

#[derive(Default)]
struct Counter;

impl Component for Counter {
    fn construct(&mut self, _props: &Props, this: &Instance) {
        this.init_state(attrs! { "count" => 0 });
    }

    fn render(&self, _props: &Props, this: &Instance) -> VNode {
        let handle = this.clone();
        h("div")
            .on("click", move |_| {
                let next = count_of(&handle) + 1;
                handle.set_state(attrs! { "count" => next });
            })
            .child(count_of(this).to_string())
            .into()
    }
}

fn click(renderer: &Renderer) {
    let host = renderer.host();
    let rspy_render::HostNode::Element { attributes, .. } = &host[0] else {
        panic!("expected an element root");
    };
    let handler = attributes["onClick"].as_handler().cloned().expect("onClick handler");
    handler.call(&[]);
}

#[test]
fn set_state_waits_for_flush() {
    let def = ComponentDef::stateful::<Counter>("Counter");
    let mut renderer = Renderer::new();
    renderer.render(component(&def).into());
    assert_eq!(renderer.host()[0].text_content(), "0");

    click(&renderer);
    assert_eq!(renderer.pending(), 1);
    assert_eq!(renderer.host()[0].text_content(), "0");

    assert_eq!(renderer.flush(), 1);
    assert_eq!(renderer.host()[0].text_content(), "1");
    assert_eq!(renderer.flush(), 0);
}

#[test]
fn updates_coalesce_per_instance() {
    let def = ComponentDef::stateful::<Counter>("Counter");
    let mut renderer = Renderer::new();
    renderer.render(component(&def).into());
    click(&renderer);
    click(&renderer);
    assert_eq!(renderer.pending(), 1);
    assert_eq!(renderer.flush(), 1);
    assert_eq!(renderer.host()[0].text_content(), "2");
}

struct Echo {
    received: Rc<RefCell<Vec<String>>>,
}

impl Component for Echo {
    fn construct(&mut self, props: &Props, this: &Instance) {
        let value = props.get("value").cloned().unwrap_or(Value::Null);
        this.init_state(attrs! { "value" => value });
    }

    fn will_receive_props(&mut self, next_props: &Props, this: &Instance) {
        let value = next_props.str("value").unwrap_or_default().to_owned();
        self.received.borrow_mut().push(value.clone());
        this.set_state(attrs! { "value" => format!("_{value}_") });
    }

    fn render(&self, _props: &Props, this: &Instance) -> VNode {
        let value = this.state_value("value").map(|v| v.to_text()).unwrap_or_default();
        h("div").child(value).into()
    }
}

#[test]
fn will_receive_props_runs_before_rerender() {
    let received = Rc::new(RefCell::new(Vec::new()));
    let shared = received.clone();
    let def = ComponentDef::stateful_with("Echo", move || {
        Box::new(Echo {
            received: shared.clone(),
        })
    });
    let mut renderer = Renderer::new();
    renderer.render(component(&def).attr("value", "a").into());
    assert_eq!(renderer.host()[0].text_content(), "a");

    renderer.render(component(&def).attr("value", "b").into());
    assert_eq!(renderer.host()[0].text_content(), "_b_");
    assert_eq!(*received.borrow(), vec!["b".to_owned()]);
    // The state update from the hook was consumed by the parent-driven render.
    assert_eq!(renderer.pending(), 0);
    assert_eq!(renderer.stats().mounts, 1);
}

#[test]
fn unmounted_instances_do_not_render() {
    let renders = Rc::new(Cell::new(0));
    let seen = renders.clone();
    let captured: Rc<RefCell<Option<Instance>>> = Rc::new(RefCell::new(None));
    let slot = captured.clone();

    struct Probe {
        renders: Rc<Cell<u32>>,
        slot: Rc<RefCell<Option<Instance>>>,
    }

    impl Component for Probe {
        fn render(&self, _props: &Props, this: &Instance) -> VNode {
            self.renders.set(self.renders.get() + 1);
            *self.slot.borrow_mut() = Some(this.clone());
            VNode::Null
        }
    }

    let def = ComponentDef::stateful_with("Probe", move || {
        Box::new(Probe {
            renders: seen.clone(),
            slot: slot.clone(),
        })
    });
    let mut renderer = Renderer::new();
    renderer.render(h("div").child(component(&def)).into());
    assert_eq!(renders.get(), 1);

    renderer.render(h("div").into());
    let instance = captured.borrow().clone().expect("probe instance");
    assert!(!instance.is_mounted());
    instance.set_state(attrs! { "x" => 1 });
    assert_eq!(renderer.flush(), 0);
    assert_eq!(renders.get(), 1);
    assert_eq!(renderer.stats().unmounts, 1);
}

#[test]
fn different_definition_at_same_position_remounts() {
    let a = ComponentDef::stateful::<Counter>("A");
    let b = ComponentDef::stateful::<Counter>("B");
    let mut renderer = Renderer::new();
    renderer.render(component(&a).into());
    renderer.render(component(&b).into());
    assert_eq!(renderer.stats().mounts, 2);
    assert_eq!(renderer.stats().unmounts, 1);
}
