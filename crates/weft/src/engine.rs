//! Directive rendering and text interpolation.
//!
//! The engine re-renders only the elements whose directive or text-template
//! attribute references a changed path (substring prefilter over the
//! attribute text). `foreach` is a full rebuild per change: the captured
//! template is re-instantiated once per item, with no incremental diffing —
//! downstream binding discovery assumes a full re-bind after every rebuild,
//! so this behavior is load-bearing, not an optimization target.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use weft_core::{is_truthy, path, value_text, PropertyStore};

use crate::binder::Bindings;
use crate::directive::{self, DirectiveKind, DirectiveValue};
use crate::document::{Document, NodeId};
use crate::markup::Node;
use crate::view::{DIRECTIVE_ATTR, TEXT_ATTR};

/// Resolution scope inside a `foreach` fragment: paths under `sub` resolve
/// into the current item, everything else falls back to the store.
pub struct Scope<'a> {
    pub(crate) sub: &'a str,
    pub(crate) item: &'a Value,
}

impl Scope<'_> {
    fn lookup(&self, path_str: &str) -> Option<Value> {
        let rel = if self.sub.is_empty() {
            path_str
        } else if path_str == self.sub {
            return Some(self.item.clone());
        } else {
            path_str.strip_prefix(self.sub)?.strip_prefix('.')?
        };
        let mut current = self.item;
        for seg in path::segments(rel) {
            current = current.as_object()?.get(seg)?;
        }
        Some(current.clone())
    }

    /// Paths a fragment rendered for this item may reference: one per
    /// top-level field, prefixed with `sub` when present.
    fn paths(&self) -> Vec<String> {
        match self.item {
            Value::Object(fields) => fields
                .keys()
                .map(|key| {
                    if self.sub.is_empty() {
                        key.clone()
                    } else {
                        path::join(self.sub, key)
                    }
                })
                .collect(),
            _ if !self.sub.is_empty() => vec![self.sub.to_owned()],
            _ => Vec::new(),
        }
    }
}

fn resolve(store: &PropertyStore, scope: Option<&Scope<'_>>, path_str: &str) -> Option<Value> {
    if let Some(scope) = scope {
        if let Some(value) = scope.lookup(path_str) {
            return Some(value);
        }
    }
    store.get(path_str).cloned()
}

fn resolve_text(store: &PropertyStore, scope: Option<&Scope<'_>>, path_str: &str) -> String {
    resolve(store, scope, path_str)
        .map(|value| value_text(&value))
        .unwrap_or_default()
}

fn marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([\s\S]+?)\}\}").expect("marker pattern"))
}

/// Substitute every `{{path}}` marker in `template`; absent paths become the
/// empty string.
pub fn interpolate(template: &str, store: &PropertyStore, scope: Option<&Scope<'_>>) -> String {
    marker_regex()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            resolve_text(store, scope, caps[1].trim())
        })
        .into_owned()
}

/// Re-render the text content of every element under `start` whose template
/// references `changed` through a `{{changed}}` marker.
pub(crate) fn render_text(
    doc: &mut Document,
    store: &PropertyStore,
    start: NodeId,
    changed: &str,
    scope: Option<&Scope<'_>>,
) {
    let marker = format!("{{{{{changed}}}}}");
    for node in doc.elements_with_attr_containing(start, TEXT_ATTR, &marker) {
        let Some(template) = doc.attr(node, TEXT_ATTR).map(str::to_owned) else {
            continue;
        };
        let rendered = interpolate(&template, store, scope);
        doc.set_text(node, &rendered);
    }
}

/// Dispatch table plus the `foreach` template cache.
#[derive(Default)]
pub struct DirectiveEngine {
    templates: BTreeMap<String, Vec<Node>>,
}

impl DirectiveEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render every element under `start` whose directive attribute
    /// references `changed`.
    pub(crate) fn render_path(
        &mut self,
        doc: &mut Document,
        store: &PropertyStore,
        start: NodeId,
        changed: &str,
        bindings: &mut Bindings,
    ) {
        for node in doc.elements_with_attr_containing(start, DIRECTIVE_ATTR, changed) {
            self.render_element(doc, store, node, bindings, None);
        }
    }

    fn render_element(
        &mut self,
        doc: &mut Document,
        store: &PropertyStore,
        node: NodeId,
        bindings: &mut Bindings,
        scope: Option<&Scope<'_>>,
    ) {
        let Some(text) = doc.attr(node, DIRECTIVE_ATTR).map(str::to_owned) else {
            return;
        };
        let parsed = match directive::parse(&text) {
            Ok(parsed) => parsed,
            Err(error) => {
                tracing::warn!(directive = %text, %error, "skipping element with malformed directive text");
                return;
            }
        };
        for (name, body) in &parsed {
            let Some(kind) = DirectiveKind::from_name(name) else {
                tracing::warn!(directive = %name, "unknown directive name");
                continue;
            };
            self.apply(doc, store, node, kind, body, bindings, scope);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn apply(
        &mut self,
        doc: &mut Document,
        store: &PropertyStore,
        node: NodeId,
        kind: DirectiveKind,
        body: &DirectiveValue,
        bindings: &mut Bindings,
        scope: Option<&Scope<'_>>,
    ) {
        match kind {
            DirectiveKind::If | DirectiveKind::IfNot => {
                let Some(path_str) = body.as_path() else { return };
                let truthy = resolve(store, scope, path_str)
                    .as_ref()
                    .map(is_truthy)
                    .unwrap_or(false);
                let visible = match kind {
                    DirectiveKind::If => truthy,
                    _ => !truthy,
                };
                doc.set_visible(node, visible);
            }
            DirectiveKind::Style => {
                let DirectiveValue::Map(entries) = body else { return };
                for (style_name, target) in entries {
                    if let Some(path_str) = target.as_path() {
                        let text = resolve_text(store, scope, path_str);
                        doc.set_style(node, style_name, &text);
                    }
                }
            }
            DirectiveKind::Css => {
                // Class tokens are literal, added idempotently, never removed.
                if let Some(classes) = body.as_path() {
                    for class in classes.split_whitespace() {
                        doc.add_class(node, class);
                    }
                }
            }
            DirectiveKind::Attr => {
                let DirectiveValue::Map(entries) = body else { return };
                for (attr_name, target) in entries {
                    if let Some(path_str) = target.as_path() {
                        let text = resolve_text(store, scope, path_str);
                        doc.set_attr(node, attr_name, &text);
                    }
                }
            }
            DirectiveKind::Html => {
                let Some(path_str) = body.as_path() else { return };
                let text = resolve_text(store, scope, path_str);
                doc.set_raw(node, &text);
            }
            DirectiveKind::Foreach => {
                self.render_foreach(doc, store, node, body, bindings, scope);
            }
        }
    }

    fn render_foreach(
        &mut self,
        doc: &mut Document,
        store: &PropertyStore,
        node: NodeId,
        body: &DirectiveValue,
        bindings: &mut Bindings,
        scope: Option<&Scope<'_>>,
    ) {
        let Some(expr) = body.as_path() else { return };
        let (prop, sub) = match expr.split_once("->") {
            Some((prop, sub)) => (prop.trim(), sub.trim()),
            None => (expr, ""),
        };

        // Capture the child markup once, keyed by property name. Every
        // later rebuild instantiates this cache, never the already mutated
        // tree.
        let template = match self.templates.get(prop) {
            Some(template) => template.clone(),
            None => {
                let template = doc.capture_fragment(node);
                self.templates.insert(prop.to_owned(), template.clone());
                template
            }
        };

        doc.clear_children(node);

        let value = resolve(store, scope, prop).unwrap_or(Value::Null);
        let items = match value {
            Value::Array(items) => items,
            other => vec![other],
        };

        for item in &items {
            let inserted = doc.append_fragment(node, &template);
            bindings.rescan(doc, &inserted);
            let item_scope = Scope { sub, item };
            for fragment_root in &inserted {
                for item_path in item_scope.paths() {
                    render_text(doc, store, *fragment_root, &item_path, Some(&item_scope));
                    let matched = doc.elements_with_attr_containing(
                        *fragment_root,
                        DIRECTIVE_ATTR,
                        &item_path,
                    );
                    for element in matched {
                        self.render_element(doc, store, element, bindings, Some(&item_scope));
                    }
                }
            }
        }
    }
}
