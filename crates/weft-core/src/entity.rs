//! Entity — one property store plus change notification for one controller.
//!
//! Every public mutator forms one mutation turn: the store reports the paths
//! it touched, the observer coalesces them, and the resulting change event
//! is republished on the bus as `"changed"`. The store itself lives behind a
//! shared handle so render subscribers can read values while the entity is
//! mid-notification.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::events::{BusEvent, EventBus, HandlerId};
use crate::observer::ChangeObserver;
use crate::store::{PropertyStore, ValueKind};

/// Name of the change-notification event.
pub const CHANGED: &str = "changed";

/// Owner of one [`PropertyStore`] and its change-notification point.
#[derive(Default)]
pub struct Entity {
    store: Rc<RefCell<PropertyStore>>,
    observer: ChangeObserver,
    bus: EventBus,
}

impl Entity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the underlying store. Readers may hold this across
    /// notifications; mutating through it bypasses change detection and is
    /// not supported.
    pub fn store(&self) -> Rc<RefCell<PropertyStore>> {
        Rc::clone(&self.store)
    }

    pub fn set(&mut self, path: &str, value: Value) {
        self.observer.begin();
        let touched = self.store.borrow_mut().set(path, value);
        self.observer.record_all(touched);
        self.commit();
    }

    pub fn push(&mut self, path: &str, value: Value) {
        self.observer.begin();
        let touched = self.store.borrow_mut().push(path, value);
        self.observer.record_all(touched);
        self.commit();
    }

    pub fn splice(&mut self, path: &str, value: &Value) {
        self.observer.begin();
        let touched = self.store.borrow_mut().splice(path, value);
        self.observer.record_all(touched);
        self.commit();
    }

    pub fn ensure_sequence(&mut self, path: &str) {
        self.observer.begin();
        let touched = self.store.borrow_mut().ensure_sequence(path);
        self.observer.record_all(touched);
        self.commit();
    }

    /// Group several mutations into a single mutation turn, delivering one
    /// change event for all of them.
    pub fn transact<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.observer.begin();
        f(self);
        self.commit();
    }

    /// Subscribe to the `"changed"` event.
    pub fn changed<F>(&mut self, handler: F) -> HandlerId
    where
        F: FnMut(&BusEvent) + 'static,
    {
        self.bus.on(CHANGED, handler)
    }

    pub fn unchanged(&mut self, id: HandlerId) -> bool {
        self.bus.off(CHANGED, id)
    }

    pub fn bus(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn get_cloned(&self, path: &str) -> Option<Value> {
        self.store.borrow().get(path).cloned()
    }

    pub fn has(&self, path: &str) -> bool {
        self.store.borrow().has(path)
    }

    pub fn kind(&self, path: &str) -> Option<ValueKind> {
        self.store.borrow().kind(path)
    }

    pub fn is_kind(&self, path: &str, kind: ValueKind) -> bool {
        self.store.borrow().is_kind(path, kind)
    }

    pub fn index_of(&self, path: &str, value: &Value) -> Option<usize> {
        self.store.borrow().index_of(path, value)
    }

    pub fn snapshot(&self) -> Value {
        self.store.borrow().snapshot()
    }

    fn commit(&mut self) {
        if let Some(event) = self.observer.end() {
            self.bus.emit(CHANGED, &event.paths);
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(&self.snapshot()).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn collect_events(entity: &mut Entity) -> Rc<RefCell<Vec<Vec<String>>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        entity.changed(move |event| sink.borrow_mut().push(event.detail.clone()));
        events
    }

    #[test]
    fn each_mutator_is_one_turn() {
        let mut entity = Entity::new();
        let events = collect_events(&mut entity);
        entity.set("user.name", json!("Ana"));
        entity.push("items", json!("a"));
        assert_eq!(events.borrow().len(), 2);
        assert_eq!(events.borrow()[0], vec!["user", "user.name"]);
        assert_eq!(events.borrow()[1], vec!["items"]);
    }

    #[test]
    fn transact_batches_into_one_event() {
        let mut entity = Entity::new();
        let events = collect_events(&mut entity);
        entity.transact(|entity| {
            entity.set("a.b", json!(1));
            entity.set("a.c", json!(2));
        });
        let events = events.borrow();
        assert_eq!(events.len(), 1);
        assert!(events[0].contains(&"a.b".to_owned()));
        assert!(events[0].contains(&"a.c".to_owned()));
    }

    #[test]
    fn keys_named_length_notify_like_any_other() {
        let mut entity = Entity::new();
        let events = collect_events(&mut entity);
        entity.set("box.length", json!(5));
        entity.set("box.length", json!(6));
        assert_eq!(entity.get_cloned("box.length"), Some(json!(6)));
        assert_eq!(events.borrow().len(), 2);
        assert!(events.borrow()[1].contains(&"box.length".to_owned()));
    }

    #[test]
    fn rejected_sequence_assignment_emits_nothing() {
        let mut entity = Entity::new();
        let events = collect_events(&mut entity);
        entity.set("items", json!([1, 2]));
        assert!(events.borrow().is_empty());
        assert!(!entity.has("items"));
    }

    #[test]
    fn handlers_can_read_the_store_during_notification() {
        let mut entity = Entity::new();
        let store = entity.store();
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        entity.changed(move |_| {
            *sink.borrow_mut() = store.borrow().get("user.name").cloned();
        });
        entity.set("user.name", json!("Ana"));
        assert_eq!(*seen.borrow(), Some(json!("Ana")));
    }

    #[test]
    fn display_is_the_json_snapshot() {
        let mut entity = Entity::new();
        entity.set("a", json!(1));
        assert_eq!(entity.to_string(), r#"{"a":1}"#);
    }
}
