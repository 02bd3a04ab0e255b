//! Two-way synchronization between form fields and the property store.
//!
//! One way: interaction events on bound fields write the field's current
//! value to the store path named by the field's `name` attribute. The other
//! way: on a change event for path P, every field named P has its visual
//! state updated from the store.

use std::collections::BTreeSet;

use serde_json::Value;

use weft_core::{value_text, Entity, PropertyStore, ValueKind};

use crate::directive;
use crate::document::{Document, NodeId};
use crate::view::EVENT_ATTR;

/// Attribute holding a field's current value.
pub const VALUE_ATTR: &str = "value";

/// Field control category, derived from tag and `type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Text,
    Radio,
    Checkbox,
    Select,
    TextArea,
}

impl Control {
    pub fn of(doc: &Document, node: NodeId) -> Option<Self> {
        let element = doc.element(node)?;
        match element.tag.as_str() {
            "select" => Some(Self::Select),
            "textarea" => Some(Self::TextArea),
            "input" => match doc.attr(node, "type").unwrap_or("text") {
                "text" => Some(Self::Text),
                "radio" => Some(Self::Radio),
                "checkbox" => Some(Self::Checkbox),
                _ => None,
            },
            _ => None,
        }
    }

    /// Interaction event that commits this control's value.
    pub fn trigger_event(&self) -> &'static str {
        match self {
            Self::Radio | Self::Checkbox => "click",
            Self::Text | Self::Select | Self::TextArea => "input",
        }
    }
}

/// A field element bound to a store path through its `name` attribute.
#[derive(Debug, Clone)]
pub struct FieldBinding {
    pub node: NodeId,
    pub path: String,
    pub control: Control,
}

/// A `data-event` association from (element, event type) to a controller
/// method name.
#[derive(Debug, Clone)]
pub struct EventBinding {
    pub node: NodeId,
    pub event_type: String,
    pub method: String,
}

/// Discovered field and event bindings for one view subtree.
///
/// Discovery resolves method names once at bind time against the
/// controller's registered method set; elements inserted later (by
/// `foreach`) get discovery re-run explicitly via [`rescan`](Self::rescan).
#[derive(Debug)]
pub struct Bindings {
    root: NodeId,
    method_names: BTreeSet<String>,
    fields: Vec<FieldBinding>,
    events: Vec<EventBinding>,
}

impl Bindings {
    pub fn new(root: NodeId, method_names: BTreeSet<String>) -> Self {
        Self {
            root,
            method_names,
            fields: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Discover bindings in the subtree at `start` (inclusive).
    pub fn scan(&mut self, doc: &Document, start: NodeId) {
        for node in doc.walk(start) {
            if let Some(control) = Control::of(doc, node) {
                if let Some(name) = doc.attr(node, "name") {
                    self.fields.push(FieldBinding {
                        node,
                        path: name.to_owned(),
                        control,
                    });
                }
            }
            let Some(text) = doc.attr(node, EVENT_ATTR) else {
                continue;
            };
            match directive::parse(text) {
                Ok(entries) => {
                    for (event_type, target) in entries {
                        let Some(method) = target.as_path() else {
                            tracing::warn!(event = %event_type, "event binding target must be a method name");
                            continue;
                        };
                        if !self.method_names.contains(method) {
                            tracing::debug!(method, "skipping event binding with unregistered method");
                            continue;
                        }
                        self.events.push(EventBinding {
                            node,
                            event_type,
                            method: method.to_owned(),
                        });
                    }
                }
                Err(error) => {
                    tracing::warn!(%error, "skipping element with malformed event text");
                }
            }
        }
    }

    /// Re-run discovery after a `foreach` rebuild: bindings to detached
    /// elements are dropped, then the inserted fragments are scanned, so
    /// dispatch stays single-shot per element and event.
    pub fn rescan(&mut self, doc: &Document, inserted: &[NodeId]) {
        let root = self.root;
        self.fields.retain(|binding| doc.is_attached(binding.node, root));
        self.events.retain(|binding| doc.is_attached(binding.node, root));
        for id in inserted {
            self.scan(doc, *id);
        }
    }

    pub fn field_for(&self, node: NodeId, event_type: &str) -> Option<&FieldBinding> {
        self.fields
            .iter()
            .find(|binding| binding.node == node && binding.control.trigger_event() == event_type)
    }

    pub fn method_for(&self, node: NodeId, event_type: &str) -> Option<&str> {
        self.events
            .iter()
            .find(|binding| binding.node == node && binding.event_type == event_type)
            .map(|binding| binding.method.as_str())
    }

    pub fn fields(&self) -> &[FieldBinding] {
        &self.fields
    }

    pub fn events(&self) -> &[EventBinding] {
        &self.events
    }
}

/// Write a committed field value into the store.
///
/// Checkbox clicks only guarantee the path holds a sequence; membership is
/// not derived from the checked state. The read-back direction in
/// [`write_back`] does support multi-value groups.
pub fn apply_field_event(entity: &mut Entity, binding: &FieldBinding, field_value: &str) {
    match binding.control {
        Control::Checkbox => {
            if !entity.is_kind(&binding.path, ValueKind::Sequence) {
                entity.ensure_sequence(&binding.path);
            }
        }
        Control::Text | Control::Radio | Control::Select | Control::TextArea => {
            entity.set(&binding.path, Value::String(field_value.to_owned()));
        }
    }
}

/// Update the visual state of every field named `changed` from the store.
pub fn write_back(doc: &mut Document, store: &PropertyStore, root: NodeId, changed: &str) {
    let stored = store.get(changed).cloned();
    for node in doc.fields_named(root, changed) {
        let Some(control) = Control::of(doc, node) else {
            continue;
        };
        match control {
            Control::Radio => {
                let field_value = doc.attr(node, VALUE_ATTR).unwrap_or_default().to_owned();
                if let Some(value) = &stored {
                    if value_text(value) == field_value {
                        doc.set_checked(node, true);
                    }
                }
            }
            Control::Checkbox => {
                let Some(Value::Array(items)) = &stored else {
                    continue;
                };
                let field_value = doc.attr(node, VALUE_ATTR).unwrap_or_default().to_owned();
                let member = items.iter().any(|item| value_text(item) == field_value);
                doc.set_checked(node, member);
            }
            Control::Text | Control::Select | Control::TextArea => {
                let text = stored.as_ref().map(value_text).unwrap_or_default();
                doc.set_attr(node, VALUE_ATTR, &text);
            }
        }
    }
}
