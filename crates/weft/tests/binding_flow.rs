use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use serde_json::json;

use weft::{el, Document, Entity, View, DIRECTIVE_ATTR, TEXT_ATTR};

fn shared(doc: Document) -> Rc<RefCell<Document>> {
    Rc::new(RefCell::new(doc))
}

#[test]
fn one_mutation_turn_yields_one_change_event() {
    let mut entity = Entity::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    entity.changed(move |event| sink.borrow_mut().push(event.detail.clone()));

    entity.transact(|entity| {
        entity.set("a.b", json!(1));
        entity.set("a.c", json!(2));
    });

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].contains(&"a.b".to_owned()));
    assert!(seen[0].contains(&"a.c".to_owned()));
}

#[test]
fn text_markers_render_on_change() {
    let doc = shared(Document::from_markup(&el(
        "div",
        [("data-view", "main")],
        vec![el("span", [("data-text", "Hello {{user.name}}")], vec![])],
    )));
    let mut entity = Entity::new();
    let view = View::new("main", Rc::clone(&doc), &mut entity, BTreeSet::new()).unwrap();

    entity.set("user.name", json!("Ana"));
    let span = {
        let doc = doc.borrow();
        doc.elements_with_attr(view.root(), TEXT_ATTR)[0]
    };
    assert_eq!(doc.borrow().text_content(span), "Hello Ana");

    entity.set("user.name", json!(null));
    assert_eq!(doc.borrow().text_content(span), "Hello ");
}

#[test]
fn directives_toggle_visibility_and_style() {
    let doc = shared(Document::from_markup(&el(
        "div",
        [("data-view", "main")],
        vec![el(
            "p",
            [("data-directive", "if:show,style:{color:textColor}")],
            vec![],
        )],
    )));
    let mut entity = Entity::new();
    let view = View::new("main", Rc::clone(&doc), &mut entity, BTreeSet::new()).unwrap();
    let p = {
        let doc = doc.borrow();
        doc.elements_with_attr(view.root(), DIRECTIVE_ATTR)[0]
    };

    entity.transact(|entity| {
        entity.set("show", json!(true));
        entity.set("textColor", json!("red"));
    });
    {
        let doc = doc.borrow();
        assert!(doc.is_visible(p));
        assert_eq!(doc.style(p, "color"), Some("red"));
    }

    entity.set("show", json!(""));
    assert!(!doc.borrow().is_visible(p));
}

#[test]
fn checkbox_groups_reflect_sequence_membership() {
    let doc = shared(Document::from_markup(&el(
        "form",
        [("data-view", "prefs")],
        vec![
            el(
                "input",
                [("type", "checkbox"), ("name", "tags"), ("value", "y")],
                vec![],
            ),
            el(
                "input",
                [("type", "checkbox"), ("name", "tags"), ("value", "z")],
                vec![],
            ),
        ],
    )));
    let mut entity = Entity::new();
    let view = View::new("prefs", Rc::clone(&doc), &mut entity, BTreeSet::new()).unwrap();

    entity.push("tags", json!(["x", "y"]));

    let doc = doc.borrow();
    let boxes = doc.fields_named(view.root(), "tags");
    assert!(doc.is_checked(boxes[0]));
    assert!(!doc.is_checked(boxes[1]));
}

#[test]
fn unchanged_paths_leave_elements_alone() {
    let doc = shared(Document::from_markup(&el(
        "div",
        [("data-view", "main")],
        vec![
            el("span", [("data-text", "{{a}}")], vec![]),
            el("em", [("data-text", "{{b}}")], vec![]),
        ],
    )));
    let mut entity = Entity::new();
    let view = View::new("main", Rc::clone(&doc), &mut entity, BTreeSet::new()).unwrap();

    entity.set("a", json!("first"));
    entity.set("b", json!("second"));
    // Overwrite only `a`; the `b` template must not be re-rendered from it.
    entity.set("a", json!("third"));

    let doc = doc.borrow();
    let spans = doc.elements_with_attr(view.root(), TEXT_ATTR);
    assert_eq!(doc.text_content(spans[0]), "third");
    assert_eq!(doc.text_content(spans[1]), "second");
}
