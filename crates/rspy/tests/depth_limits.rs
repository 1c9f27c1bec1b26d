#![forbid(unsafe_code)]

//! Depth budget and instance tests.
//!
//! Components past the requested depth must never run. Components within it
//! run once per mount or update, and stateful ones expose their instance to
//! the query layer.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rspy::{
    Component, ComponentDef, Instance, Props, QueryError, RenderOptions, VNode, Value, attrs,
    component, deep, h, noop_spy, render, shallow,
};

fn error_if_rendered() -> ComponentDef {
    ComponentDef::function("ErrorIfRendered", |_| panic!("should not ever render"))
}

fn wraps(name: &str, inner: &ComponentDef) -> ComponentDef {
    let inner = inner.clone();
    ComponentDef::function(name, move |_| component(&inner).into())
}

fn counting(name: &str, calls: &Rc<Cell<u32>>, output: impl Fn() -> VNode + 'static) -> ComponentDef {
    let calls = calls.clone();
    ComponentDef::function(name, move |_| {
        calls.set(calls.get() + 1);
        output()
    })
}

// -------------------------------------------------------------------------
// Depth budget
// -------------------------------------------------------------------------

#[test]
#[should_panic(expected = "should not ever render")]
fn unbounded_render_runs_every_level() {
    let node = wraps("Node", &error_if_rendered());
    let _ = render(component(&node));
}

#[test]
fn shallow_renders_the_first_level_only() {
    let node = wraps("Node", &error_if_rendered());
    let ctx = shallow(component(&node));
    assert_eq!(ctx.find("ErrorIfRendered").len(), 1);
}

#[test]
fn third_level_is_blocked_at_depth_two() {
    let leaf = error_if_rendered();
    let middle = wraps("Middle", &leaf);
    let top = wraps("Top", &middle);
    let ctx = deep(component(&top), RenderOptions::new().depth(2));
    assert_eq!(ctx.find("Middle").len(), 1);
    assert_eq!(ctx.find("ErrorIfRendered").len(), 1);
    let middle_node = ctx.find("Middle")[0].clone();
    assert_eq!(ctx.depth_of(&middle_node), Some(1));
    let leaf_node = ctx.find("ErrorIfRendered")[0].clone();
    assert_eq!(ctx.depth_of(&leaf_node), None);
}

#[test]
fn depth_zero_is_unbounded() {
    let calls = Rc::new(Cell::new(0));
    let leaf = counting("Leaf", &calls, || h("i").into());
    let ctx = deep(component(&wraps("Top", &leaf)), RenderOptions::new().depth(0));
    assert_eq!(calls.get(), 1);
    assert!(ctx.contains(h("i")));
}

#[test]
fn every_reachable_component_runs_once_per_mount() {
    let calls = Rc::new(Cell::new(0));
    let leaf = counting("Leaf", &calls, || h("i").into());
    let ctx = render(
        h("ul")
            .child(h("li").child(component(&leaf)))
            .child(h("li").child(component(&leaf))),
    );
    assert_eq!(calls.get(), 2);
    assert_eq!(ctx.find("i").len(), 2);

    ctx.render(h("ul").child(h("li").child(component(&leaf))));
    assert_eq!(calls.get(), 3);
    assert_eq!(ctx.find("i").len(), 1);
}

#[test]
fn element_boundaries_do_not_consume_depth() {
    let calls = Rc::new(Cell::new(0));
    let leaf = counting("Leaf", &calls, || VNode::Null);
    let ctx = shallow(h("div").child(h("p").child(h("b").child(component(&leaf)))));
    assert_eq!(calls.get(), 1);
    assert_eq!(ctx.find("Leaf").len(), 1);
}

#[test]
fn inert_placeholder_discards_children() {
    let calls = Rc::new(Cell::new(0));
    let kid = counting("Kid", &calls, || h("i").into());
    let kid_ref = kid.clone();
    let holder = ComponentDef::function("Holder", |props| {
        h("section").with_children(props.children().to_vec()).into()
    });
    let holder_ref = holder.clone();
    let top = ComponentDef::function("Top", move |_| {
        component(&holder_ref).child(component(&kid_ref)).into()
    });

    let ctx = shallow(component(&top));
    assert_eq!(calls.get(), 0);
    assert!(ctx.fragment().is_empty());
    // The authored child is still visible as an unrendered component.
    assert_eq!(ctx.find("Kid").len(), 1);
    assert_eq!(ctx.find("section").len(), 0);
}

#[test]
fn placeholder_definition_renders_nothing() {
    let ComponentDef::Function(noop) = noop_spy() else {
        panic!("placeholder is a function component");
    };
    assert_eq!(noop.call(&Props::default()), VNode::Null);
    assert!(noop_spy().is_spy());
    assert!(noop_spy().ptr_eq(&noop_spy()));
}

#[test]
fn output_of_blocked_component_is_its_authored_form() {
    let leaf = error_if_rendered();
    let top = wraps("Top", &leaf);
    let ctx = shallow(component(&top));
    let blocked = ctx.find(&leaf);
    assert_eq!(blocked.output(), Ok(VNode::from(component(&leaf))));
    assert!(matches!(
        blocked.component(),
        Err(QueryError::NoInstance { .. })
    ));
}

// -------------------------------------------------------------------------
// Instances
// -------------------------------------------------------------------------

#[derive(Default)]
struct Toggle;

impl Component for Toggle {
    fn construct(&mut self, _props: &Props, this: &Instance) {
        this.init_state(attrs! { "on" => false });
    }

    fn render(&self, _props: &Props, this: &Instance) -> VNode {
        let on = this.state_value("on").and_then(|v| v.as_bool()).unwrap_or(false);
        h("button").child(if on { "on" } else { "off" }).into()
    }
}

#[test]
fn state_is_reachable_from_find_results() {
    let toggle = ComponentDef::stateful::<Toggle>("Toggle");
    let ctx = render(h("div").child(component(&toggle)));
    let found = ctx.find("Toggle");
    assert_eq!(found.state_of("on"), Ok(Some(Value::Bool(false))));
    assert_eq!(found.state(), Ok(attrs! { "on" => false }));

    found.set_state(attrs! { "on" => true }).expect("set_state");
    assert_eq!(ctx.find("button").text(), "on");
    assert_eq!(ctx.find("Toggle").state_of("on"), Ok(Some(Value::Bool(true))));
}

#[test]
fn component_requires_a_stateful_node() {
    let toggle = ComponentDef::stateful::<Toggle>("Toggle");
    let plain = ComponentDef::function("Plain", |_| h("p").into());
    let ctx = render(h("div").child(component(&toggle)).child(component(&plain)));

    assert!(ctx.find("Toggle").component().is_ok());
    assert_eq!(
        ctx.find("Plain").component().map(|_| ()),
        Err(QueryError::NoInstance {
            operation: "component",
            component: "Plain".into(),
        })
    );
    assert_eq!(
        ctx.find("p").component().map(|_| ()),
        Err(QueryError::NotComponent {
            operation: "component"
        })
    );
    assert!(matches!(
        ctx.find("div").component(),
        Err(QueryError::NotSingleNode { found: 0, .. })
    ));
}

#[test]
fn root_component_instance_survives_rerender() {
    let toggle = ComponentDef::stateful::<Toggle>("Toggle");
    let ctx = render(component(&toggle));
    let before = ctx.component().expect("instance");
    ctx.set_state(attrs! { "on" => true }).expect("set_state");
    ctx.render(component(&toggle));
    let after = ctx.component().expect("instance");
    assert!(before.ptr_eq(&after));
    assert_eq!(ctx.text(), "on");
}

// -------------------------------------------------------------------------
// Parent-driven updates
// -------------------------------------------------------------------------

struct Child {
    received: Rc<RefCell<Vec<String>>>,
}

impl Component for Child {
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
        h("div").child(this.state_value("value").as_ref()).into()
    }
}

struct Parent {
    child: ComponentDef,
}

impl Component for Parent {
    fn construct(&mut self, _props: &Props, this: &Instance) {
        this.init_state(attrs! { "value" => "default" });
    }

    fn render(&self, _props: &Props, this: &Instance) -> VNode {
        let handle = this.clone();
        component(&self.child)
            .on("click", move |_| handle.set_state(attrs! { "value" => "clicked" }))
            .attr("value", this.state_value("value").unwrap_or(Value::Null))
            .into()
    }
}

#[test]
fn child_receives_props_after_parent_state_change() {
    let received = Rc::new(RefCell::new(Vec::new()));
    let log = received.clone();
    let child = ComponentDef::stateful_with("Child", move || {
        Box::new(Child {
            received: log.clone(),
        })
    });
    let child_def = child.clone();
    let parent = ComponentDef::stateful_with("Parent", move || {
        Box::new(Parent {
            child: child_def.clone(),
        })
    });

    let ctx = render(component(&parent));
    let get_child = || ctx.find("Child").at(0).expect("child");
    assert_eq!(get_child().text(), "default");
    assert!(received.borrow().is_empty());

    get_child().simulate("click", &[]);
    assert_eq!(get_child().text(), "_clicked_");
    assert_eq!(*received.borrow(), vec!["clicked".to_owned()]);
}

#[test]
fn simulate_flushes_exactly_once() {
    let count = Rc::new(Cell::new(0));
    let seen = count.clone();
    let ctx = render(h("button").on("click", move |_| seen.set(seen.get() + 1)));
    let flushes = ctx.render_stats().flushes;
    assert_eq!(ctx.simulate("click", &[]), 1);
    assert_eq!(count.get(), 1);
    assert_eq!(ctx.render_stats().flushes, flushes + 1);

    // No handler: nothing is invoked, still no error.
    assert_eq!(ctx.simulate("keydown", &[]), 0);
    assert_eq!(count.get(), 1);
}

#[test]
fn simulate_passes_arguments_and_accepts_capture_handlers() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    let ctx = render(h("input").attr(
        "onInputCapture",
        rspy::Handler::new(move |args| log.borrow_mut().extend(args.iter().cloned())),
    ));
    ctx.simulate("INPUT", &[Value::from("typed")]);
    assert_eq!(*seen.borrow(), vec![Value::from("typed")]);
}

#[test]
fn from_env_defaults_to_unbounded() {
    // The variable is not set by the test harness.
    if std::env::var(rspy::DEPTH_ENV).is_err() {
        assert_eq!(RenderOptions::from_env(), RenderOptions::default());
    }
}
