//! View — the association between one entity and one rendering-target
//! subtree.
//!
//! Construction locates the element whose root marker attribute equals the
//! view's name, discovers field and event bindings under it, and subscribes
//! the render pass to the entity's `"changed"` event. Each change event
//! triggers, per path: text interpolation, directive rendering, then field
//! write-back — one synchronized pass over the elements that reference the
//! changed paths.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use thiserror::Error;

use weft_core::{Entity, HandlerId, PropertyStore};

use crate::binder::{self, Bindings};
use crate::document::{Document, NodeId};
use crate::engine::{self, DirectiveEngine};

/// Root marker attribute; its value is the view's registered name.
pub const VIEW_ATTR: &str = "data-view";
/// Event-binding attribute: `eventType:methodName` pairs.
pub const EVENT_ATTR: &str = "data-event";
/// Text-template attribute: literal text with `{{path}}` markers.
pub const TEXT_ATTR: &str = "data-text";
/// Directive attribute: the mini-grammar of [`crate::directive`].
pub const DIRECTIVE_ATTR: &str = "data-directive";

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("view root '{0}' not found; check the data-view attribute")]
    MissingRoot(String),
}

/// Shared render state: captured by the entity subscription and reachable
/// from the owning [`View`].
pub(crate) struct ViewCore {
    pub doc: Rc<RefCell<Document>>,
    pub store: Rc<RefCell<PropertyStore>>,
    pub root: NodeId,
    pub bindings: Bindings,
    pub engine: DirectiveEngine,
}

impl ViewCore {
    pub fn handle_change(&mut self, paths: &[String]) {
        let Self {
            doc,
            store,
            root,
            bindings,
            engine,
        } = self;
        let mut doc = doc.borrow_mut();
        let store = store.borrow();
        for path in paths {
            engine::render_text(&mut doc, &store, *root, path, None);
            engine.render_path(&mut doc, &store, *root, path, bindings);
            binder::write_back(&mut doc, &store, *root, path);
        }
    }
}

/// One entity bound to one document subtree.
pub struct View {
    name: String,
    core: Rc<RefCell<ViewCore>>,
    handler: HandlerId,
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl View {
    /// Bind `entity` to the subtree rooted at the element whose
    /// [`VIEW_ATTR`] equals `name`. `method_names` is the controller's
    /// registered method set, used to resolve event bindings at bind time.
    pub fn new(
        name: &str,
        doc: Rc<RefCell<Document>>,
        entity: &mut Entity,
        method_names: BTreeSet<String>,
    ) -> Result<Self, ViewError> {
        let root = {
            let doc = doc.borrow();
            doc.find_by_attr(doc.root(), VIEW_ATTR, name)
        };
        let Some(root) = root else {
            tracing::error!(view = name, "view root not found; check the data-view attribute");
            return Err(ViewError::MissingRoot(name.to_owned()));
        };

        let mut bindings = Bindings::new(root, method_names);
        bindings.scan(&doc.borrow(), root);

        let core = Rc::new(RefCell::new(ViewCore {
            doc,
            store: entity.store(),
            root,
            bindings,
            engine: DirectiveEngine::new(),
        }));
        let subscriber = Rc::clone(&core);
        let handler = entity.changed(move |event| {
            subscriber.borrow_mut().handle_change(&event.detail);
        });

        Ok(Self {
            name: name.to_owned(),
            core,
            handler,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> NodeId {
        self.core.borrow().root
    }

    pub fn document(&self) -> Rc<RefCell<Document>> {
        Rc::clone(&self.core.borrow().doc)
    }

    /// Id of the `"changed"` subscription, for explicit teardown.
    pub fn handler(&self) -> HandlerId {
        self.handler
    }

    /// HTML rendition of the bound subtree.
    pub fn to_html(&self) -> String {
        let core = self.core.borrow();
        let doc = core.doc.borrow();
        doc.to_html(core.root)
    }

    pub(crate) fn core(&self) -> Rc<RefCell<ViewCore>> {
        Rc::clone(&self.core)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::markup::el;

    fn shared_doc() -> Rc<RefCell<Document>> {
        Rc::new(RefCell::new(Document::from_markup(&el(
            "div",
            [("data-view", "main")],
            vec![
                el("span", [("data-text", "Hello {{user.name}}")], vec![]),
                el("p", [("data-directive", "if:show")], vec![]),
                el("input", [("type", "text"), ("name", "user.name")], vec![]),
            ],
        ))))
    }

    #[test]
    fn missing_root_fails_construction() {
        let doc = shared_doc();
        let mut entity = Entity::new();
        let err = View::new("absent", doc, &mut entity, BTreeSet::new()).unwrap_err();
        assert!(matches!(err, ViewError::MissingRoot(name) if name == "absent"));
    }

    #[test]
    fn change_events_drive_text_rendering() {
        let doc = shared_doc();
        let mut entity = Entity::new();
        let view = View::new("main", Rc::clone(&doc), &mut entity, BTreeSet::new()).unwrap();
        entity.set("user.name", json!("Ana"));
        let span = {
            let doc = doc.borrow();
            doc.elements_with_attr(view.root(), TEXT_ATTR)[0]
        };
        assert_eq!(doc.borrow().text_content(span), "Hello Ana");
    }

    #[test]
    fn change_events_drive_directives_and_fields() {
        let doc = shared_doc();
        let mut entity = Entity::new();
        let view = View::new("main", Rc::clone(&doc), &mut entity, BTreeSet::new()).unwrap();
        entity.transact(|entity| {
            entity.set("show", json!(false));
            entity.set("user.name", json!("Ana"));
        });
        let borrowed = doc.borrow();
        let p = borrowed.elements_with_attr(view.root(), DIRECTIVE_ATTR)[0];
        assert!(!borrowed.is_visible(p));
        let field = borrowed.fields_named(view.root(), "user.name")[0];
        assert_eq!(borrowed.attr(field, "value"), Some("Ana"));
    }

    #[test]
    fn unsubscribing_stops_rendering() {
        let doc = shared_doc();
        let mut entity = Entity::new();
        let view = View::new("main", Rc::clone(&doc), &mut entity, BTreeSet::new()).unwrap();
        entity.unchanged(view.handler());
        entity.set("user.name", json!("Ana"));
        let borrowed = doc.borrow();
        let span = borrowed.elements_with_attr(view.root(), TEXT_ATTR)[0];
        assert_eq!(borrowed.text_content(span), "");
    }
}
