use std::cell::RefCell;
use std::rc::Rc;

use glue::{ChangeMessage, Glue, Receiver, Registration, Scope};
use serde_json::{json, Value};

type Log = Rc<RefCell<Vec<ChangeMessage>>>;

fn recorder() -> (Log, impl FnMut(&mut Receiver<'_>, &ChangeMessage) + 'static) {
    let log: Log = Rc::default();
    let sink = Rc::clone(&log);
    (log, move |_, msg| sink.borrow_mut().push(msg.clone()))
}

#[test]
fn wildcard_sees_every_set_in_order() {
    let (log, cb) = recorder();
    let mut glue = Glue::new(json!({"v1": "", "v2": "", "v3": ""}));
    glue.add_listener(Registration::any(cb)).unwrap();

    glue.set("v1", json!(1)).unwrap();
    glue.set("v2", json!(2)).unwrap();
    glue.set("v3", json!(3)).unwrap();

    let seen: Vec<Value> = log.borrow().iter().filter_map(|m| m.new_value().cloned()).collect();
    assert_eq!(seen, vec![json!(1), json!(2), json!(3)]);
}

#[test]
fn key_listener_ignores_other_keys() {
    let (log, cb) = recorder();
    let mut glue = Glue::new(json!({"v1": "", "v2": ""}));
    glue.add_listener(Registration::key("v1", cb)).unwrap();

    glue.set("v2", json!("x")).unwrap();
    assert!(log.borrow().is_empty());

    glue.set("v1", json!("y")).unwrap();
    assert_eq!(*log.borrow(), vec![ChangeMessage::set(Some(json!("")), json!("y"))]);
}

#[test]
fn receiver_defaults_to_target() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let mut glue = Glue::new(json!({"v1": "foo"}));
    glue.add_listener(Registration::key("v1", move |rx, _| {
        assert!(rx.scope().is_none());
        sink.borrow_mut().push(rx.with_this(|this| this["v1"].clone()));
    }))
    .unwrap();

    glue.set("v1", json!("bar")).unwrap();
    assert_eq!(*seen.borrow(), vec![json!("bar")]);
}

#[test]
fn explicit_scope_is_the_receiver() {
    let scope: Scope = Rc::new(RefCell::new(json!({})));
    let mut glue = Glue::new(json!({"v1": "foo", "v2": 0}));
    glue.add_listener(Registration::key_scoped(
        "v1",
        Rc::clone(&scope),
        |rx, msg| {
            let value = msg.new_value().cloned().unwrap_or(Value::Null);
            if let Some(scope) = rx.scope() {
                scope.borrow_mut()["seen"] = value;
            }
        },
    ))
    .unwrap();
    glue.add_listener(Registration::scoped(Rc::clone(&scope), |rx, _| {
        let hits = rx.with_this(|this| this["hits"].as_u64().unwrap_or(0));
        if let Some(scope) = rx.scope() {
            scope.borrow_mut()["hits"] = json!(hits + 1);
        }
    }))
    .unwrap();

    glue.set("v1", json!("bar")).unwrap();
    glue.set("v2", json!(1)).unwrap();

    assert_eq!(*scope.borrow(), json!({"seen": "bar", "hits": 2}));
    assert_eq!(glue.target(), &json!({"v1": "bar", "v2": 1}));
}

#[test]
fn nested_key_resolves_through_intermediate_node() {
    let (log, cb) = recorder();
    let mut glue = Glue::new(json!({"v1": {"n1": "foo"}}));
    glue.add_listener(Registration::key("v1.n1", cb)).unwrap();

    glue.set("v1.n1", json!("bar")).unwrap();

    assert_eq!(*log.borrow(), vec![ChangeMessage::set(Some(json!("foo")), json!("bar"))]);
    assert_eq!(glue.target(), &json!({"v1": {"n1": "bar"}}));
}

#[test]
fn multi_key_listener_fires_once_per_sub_key() {
    let (log, cb) = recorder();
    let mut glue = Glue::new(json!({"v1": "", "v2": ""}));
    glue.add_listener(Registration::key("v1, v2", cb)).unwrap();
    assert_eq!(glue.listener_count(), 2);

    glue.set("v1, v2", json!(2)).unwrap();

    assert_eq!(log.borrow().len(), 2);
    assert_eq!(glue.target(), &json!({"v1": 2, "v2": 2}));
}

#[test]
fn listeners_fire_in_registration_order() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let mut glue = Glue::new(json!({"v1": 0}));
    for (label, pattern) in [("a", "v1"), ("b", "*"), ("c", "v1")] {
        let order = Rc::clone(&order);
        glue.add_listener(Registration::key(pattern, move |_, _| order.borrow_mut().push(label)))
            .unwrap();
    }

    glue.set("v1", json!(1)).unwrap();
    assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
}

#[test]
fn reset_listeners_drops_everything() {
    let (log, cb) = recorder();
    let mut glue = Glue::new(json!({"arr": []}));
    glue.add_listener(Registration::any(cb))
        .unwrap()
        .add_observer(Registration::key("arr#length", |_, _| {}))
        .unwrap();
    assert_eq!(glue.listener_count(), 2);
    assert_eq!(glue.computed_cache().len(), 1);

    glue.reset_listeners().push_to("arr", json!(1)).unwrap();

    assert!(log.borrow().is_empty());
    assert_eq!(glue.listener_count(), 0);
    assert!(glue.computed_cache().is_empty());
}

#[test]
fn registration_errors() {
    let mut glue = Glue::new(json!({"v1": "str", "arr": []}));

    let err = glue.add_listener(Registration::key("v1[]", |_, _| {})).unwrap_err();
    assert!(err.is_type_mismatch());

    let err = glue.add_listener(Registration::key("arr[", |_, _| {})).unwrap_err();
    assert!(err.is_syntax());

    let err = glue.add_listener(Registration::key("arr#size", |_, _| {})).unwrap_err();
    assert!(err.is_syntax());

    // An element pattern on a node that does not exist yet is fine.
    glue.add_listener(Registration::key("later[]", |_, _| {})).unwrap();
    assert_eq!(glue.listener_count(), 1);
}

#[test]
fn registration_shape_is_visible() {
    let any = Registration::any(|_, _| {});
    let keyed = Registration::key_scoped("v1", Rc::new(RefCell::new(json!({}))), |_, _| {});
    assert_eq!(any.pattern(), None);
    assert_eq!(keyed.pattern(), Some("v1"));
    assert!(format!("{keyed:?}").contains("scoped: true"));
}

#[test]
fn normalize_keys_is_exposed_on_the_wrapper() {
    assert_eq!(Glue::normalize_keys("fi.#fi.   fum()"), "fi.fi.fum()");
    assert_eq!(Glue::normalize_keys("fi.#fi, fum()"), ["fi.fi", "fum()"]);
}
