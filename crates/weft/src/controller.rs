//! Controller — wires named event methods and request definitions onto one
//! entity/view pair.
//!
//! Methods and requests live in explicit dispatch tables validated at
//! construction instead of being looked up by string on a dynamic object.
//! A request name colliding with another request or with an event method is
//! fatal at construction.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

use weft_core::Entity;

use crate::binder::{self, VALUE_ATTR};
use crate::document::{Document, NodeId};
use crate::net::{NetOutcome, NetworkClient, Transport, Verb};
use crate::view::{View, ViewError};

/// Interaction event handed to controller methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewEvent {
    pub node: NodeId,
    pub event_type: String,
}

pub type EventMethod = Box<dyn FnMut(&mut Entity, &ViewEvent)>;
pub type ResponseHandler = Box<dyn FnMut(&mut Entity, &NetOutcome)>;

/// One named request definition. The response handler receives the outcome
/// whenever the transport produces it — possibly long after the initiating
/// interaction — and may drive further store mutations.
pub struct RequestDef {
    pub name: String,
    pub verb: Verb,
    pub url: String,
    pub body: Option<Value>,
    pub response: Option<ResponseHandler>,
}

impl RequestDef {
    pub fn new(name: &str, verb: Verb, url: &str) -> Self {
        Self {
            name: name.to_owned(),
            verb,
            url: url.to_owned(),
            body: None,
            response: None,
        }
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn response<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&mut Entity, &NetOutcome) + 'static,
    {
        self.response = Some(Box::new(handler));
        self
    }
}

/// Construction-time settings: named event methods plus request
/// definitions. A method registered twice keeps the later registration.
#[derive(Default)]
pub struct ControllerConfig {
    methods: BTreeMap<String, EventMethod>,
    requests: Vec<RequestDef>,
}

impl ControllerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method<F>(mut self, name: &str, handler: F) -> Self
    where
        F: FnMut(&mut Entity, &ViewEvent) + 'static,
    {
        self.methods.insert(name.to_owned(), Box::new(handler));
        self
    }

    pub fn request(mut self, def: RequestDef) -> Self {
        self.requests.push(def);
        self
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("duplicated request name: {0}")]
    DuplicateRequestName(String),
    #[error("unknown request: {0}")]
    UnknownRequest(String),
    #[error(transparent)]
    View(#[from] ViewError),
}

/// Conduit between user interaction, entity state, and requests.
pub struct Controller<T: Transport> {
    entity: Entity,
    view: View,
    methods: BTreeMap<String, EventMethod>,
    requests: BTreeMap<String, RequestDef>,
    client: NetworkClient<T>,
}

impl<T: Transport> std::fmt::Debug for Controller<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("methods", &self.methods.keys())
            .field("requests", &self.requests.keys())
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Controller<T> {
    pub fn new(
        name: &str,
        doc: Rc<RefCell<Document>>,
        config: ControllerConfig,
        transport: T,
    ) -> Result<Self, ControllerError> {
        let ControllerConfig { methods, requests } = config;

        let mut request_table: BTreeMap<String, RequestDef> = BTreeMap::new();
        for def in requests {
            if def.name.is_empty() || def.url.is_empty() {
                tracing::debug!(request = %def.name, "skipping request definition without name or url");
                continue;
            }
            if methods.contains_key(&def.name) || request_table.contains_key(&def.name) {
                return Err(ControllerError::DuplicateRequestName(def.name));
            }
            request_table.insert(def.name.clone(), def);
        }

        let mut entity = Entity::new();
        let view = View::new(name, doc, &mut entity, methods.keys().cloned().collect())?;

        Ok(Self {
            entity,
            view,
            methods,
            requests: request_table,
            client: NetworkClient::new(transport),
        })
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn client(&mut self) -> &mut NetworkClient<T> {
        &mut self.client
    }

    /// Deliver a user-interaction event on `node`: field binding first
    /// (committing the field's value into the store), then `data-event`
    /// method dispatch.
    pub fn fire(&mut self, node: NodeId, event_type: &str) {
        let core = self.view.core();

        let field = core.borrow().bindings.field_for(node, event_type).cloned();
        if let Some(binding) = field {
            let value = {
                let core = core.borrow();
                let doc = core.doc.borrow();
                doc.attr(binding.node, VALUE_ATTR).unwrap_or_default().to_owned()
            };
            binder::apply_field_event(&mut self.entity, &binding, &value);
        }

        let method_name = core
            .borrow()
            .bindings
            .method_for(node, event_type)
            .map(str::to_owned);
        if let Some(name) = method_name {
            if let Some(method) = self.methods.get_mut(&name) {
                let event = ViewEvent {
                    node,
                    event_type: event_type.to_owned(),
                };
                method(&mut self.entity, &event);
            }
        }
    }

    /// Perform the named request and hand the outcome to its response
    /// handler.
    pub fn request(&mut self, name: &str) -> Result<NetOutcome, ControllerError> {
        let def = self
            .requests
            .get_mut(name)
            .ok_or_else(|| ControllerError::UnknownRequest(name.to_owned()))?;
        let outcome = self.client.dispatch(def.verb, &def.url, def.body.clone());
        if let Some(handler) = def.response.as_mut() {
            handler(&mut self.entity, &outcome);
        }
        Ok(outcome)
    }
}
