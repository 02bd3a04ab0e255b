//! weft — a declarative data-binding engine over an in-memory document tree.
//!
//! State lives in a path-addressed property store ([`weft_core`]); markup
//! elements declare what they render through `data-*` attributes. A
//! [`Controller`] ties one entity to one view subtree: store mutations emit
//! one change event per turn, and the render pass updates exactly the
//! elements whose attributes reference the changed paths — text templates,
//! directives, then form-field write-back.

pub mod binder;
pub mod controller;
pub mod directive;
pub mod document;
pub mod engine;
pub mod markup;
pub mod net;
pub mod view;

pub use weft_core::{
    is_truthy, value_text, BusEvent, ChangeEvent, Entity, EventBus, HandlerId, PropertyStore,
    ValueKind,
};

pub use binder::{Control, EventBinding, FieldBinding, VALUE_ATTR};
pub use controller::{
    Controller, ControllerConfig, ControllerError, RequestDef, ViewEvent,
};
pub use directive::{DirectiveKind, DirectiveParseError, DirectiveValue};
pub use document::{Document, NodeId};
pub use engine::DirectiveEngine;
pub use markup::{el, text, Node};
pub use net::{NetOutcome, NetworkClient, Request, Response, Transport, TransportError, Verb};
pub use view::{View, ViewError, DIRECTIVE_ATTR, EVENT_ATTR, TEXT_ATTR, VIEW_ATTR};
