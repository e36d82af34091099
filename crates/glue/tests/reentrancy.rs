use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glue::{Glue, GlueError, GlueOptions, Registration};
use serde_json::json;

#[test]
fn nested_mutation_dispatches_before_outer_round_continues() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let mut glue = Glue::new(json!({"v1": 0, "v2": 0}));
    glue.add_listener(Registration::key("v1", |rx, msg| {
        let next = msg.new_value().cloned().unwrap_or_default();
        rx.glue().set("v2", next).unwrap();
    }))
    .unwrap();
    let sink = Rc::clone(&order);
    glue.add_listener(Registration::any(move |rx, _| {
        sink.borrow_mut().push(rx.target().clone());
    }))
    .unwrap();

    glue.set("v1", json!(7)).unwrap();

    // The wildcard listener first sees the nested write, then the outer one,
    // and both observe the fully updated target.
    assert_eq!(
        *order.borrow(),
        vec![json!({"v1": 7, "v2": 7}), json!({"v1": 7, "v2": 7})]
    );
}

#[test]
fn running_listener_is_skipped_in_nested_rounds() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let mut glue = Glue::new(json!({}));
    glue.add_listener(Registration::any(move |rx, _| {
        counter.set(counter.get() + 1);
        let echo = counter.get();
        rx.glue().set("echo", json!(echo)).unwrap();
    }))
    .unwrap();

    glue.set("v1", json!(1)).unwrap();
    glue.set("v2", json!(2)).unwrap();

    assert_eq!(calls.get(), 2);
    assert_eq!(glue.target(), &json!({"v1": 1, "echo": 2, "v2": 2}));
}

#[test]
fn dispatch_depth_is_bounded() {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let options = GlueOptions::default().max_dispatch_depth(2);
    let mut glue = Glue::with_options(json!({}), options);
    for i in 0..5 {
        let errors = Rc::clone(&errors);
        let next = format!("k{}", i + 1);
        glue.add_listener(Registration::key(format!("k{i}"), move |rx, _| {
            if let Err(err) = rx.glue().set(&next, json!(i + 1)) {
                errors.borrow_mut().push(err);
            }
        }))
        .unwrap();
    }

    glue.set("k0", json!(0)).unwrap();

    assert_eq!(*errors.borrow(), vec![GlueError::ReentrancyLimit { depth: 3 }]);
    assert_eq!(glue.target(), &json!({"k0": 0, "k1": 1, "k2": 2}));
}

#[test]
fn listeners_added_during_dispatch_wait_for_the_next_round() {
    let late_calls = Rc::new(Cell::new(0));
    let added = Rc::new(Cell::new(false));
    let mut glue = Glue::new(json!({"v1": 0}));

    let late = Rc::clone(&late_calls);
    let flag = Rc::clone(&added);
    let mut pending = Some(move |_: &mut glue::Receiver<'_>, _: &glue::ChangeMessage| {
        late.set(late.get() + 1);
    });
    glue.add_listener(Registration::any(move |rx, _| {
        if let Some(cb) = pending.take() {
            rx.glue().add_listener(Registration::key("v1", cb)).unwrap();
            flag.set(true);
        }
    }))
    .unwrap();

    glue.set("v1", json!(1)).unwrap();
    assert!(added.get());
    assert_eq!(late_calls.get(), 0);

    glue.set("v1", json!(2)).unwrap();
    assert_eq!(late_calls.get(), 1);
}

#[test]
fn reset_from_a_callback_finishes_the_current_round() {
    let calls = Rc::new(Cell::new(0));
    let mut glue = Glue::new(json!({"v1": 0}));
    glue.add_listener(Registration::any(|rx, _| {
        rx.glue().reset_listeners();
    }))
    .unwrap();
    let counter = Rc::clone(&calls);
    glue.add_listener(Registration::key("v1", move |_, _| counter.set(counter.get() + 1)))
        .unwrap();

    glue.set("v1", json!(1)).unwrap();
    glue.set("v1", json!(2)).unwrap();

    assert_eq!(calls.get(), 1);
    assert_eq!(glue.listener_count(), 0);
}
