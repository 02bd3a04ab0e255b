//! Name-keyed synchronous event bus.
//!
//! Handlers are invoked synchronously, in registration order, with a payload
//! carrying the changed-path list under `detail`. Deregistration uses the id
//! token returned at registration.

use std::collections::BTreeMap;

/// Token identifying one registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HandlerId(u64);

/// Payload delivered to bus handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusEvent {
    /// Event name the handler was registered under.
    pub name: String,
    /// Paths altered in the originating mutation turn.
    pub detail: Vec<String>,
}

type Handler = Box<dyn FnMut(&BusEvent)>;

/// Name-keyed subscriber lists.
#[derive(Default)]
pub struct EventBus {
    listeners: BTreeMap<String, Vec<(HandlerId, Handler)>>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&mut self, name: &str, handler: F) -> HandlerId
    where
        F: FnMut(&BusEvent) + 'static,
    {
        self.next_id += 1;
        let id = HandlerId(self.next_id);
        self.listeners
            .entry(name.to_owned())
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    pub fn off(&mut self, name: &str, id: HandlerId) -> bool {
        let Some(handlers) = self.listeners.get_mut(name) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        handlers.len() != before
    }

    pub fn emit(&mut self, name: &str, detail: &[String]) {
        let Some(handlers) = self.listeners.get_mut(name) else {
            return;
        };
        let event = BusEvent {
            name: name.to_owned(),
            detail: detail.to_vec(),
        };
        for (_, handler) in handlers.iter_mut() {
            handler(&event);
        }
    }
}
