//! Path-addressed property store.
//!
//! The store is a tree whose internal nodes are ordered-key mappings and
//! whose leaves are scalars or sequences. It is the sole legitimate mutation
//! surface for entity state: every mutator returns the list of structurally
//! touched paths, which the entity feeds into the change observer. Nothing
//! here watches anything — change detection is a direct consequence of the
//! explicit mutation API.

use serde_json::{Map, Value};

use crate::path;

/// Runtime category of a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Sequence,
    Mapping,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Sequence,
            Value::Object(_) => Self::Mapping,
        }
    }
}

/// Truthiness used by the `if`/`ifnot` directives: `false`, `0`, NaN, the
/// empty string, and `null` are falsy; sequences and mappings are truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Textual rendition of a stored value, used for field values, attributes,
/// and text interpolation. Strings render without quotes; containers render
/// as compact JSON; `null` renders empty.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string(value).unwrap_or_default()
        }
    }
}

/// Path-addressed nested mutable state tree.
#[derive(Debug, Clone, Default)]
pub struct PropertyStore {
    root: Map<String, Value>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value at `path`, or `None` the moment any intermediate segment is
    /// absent or not a mapping.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segs = path::segments(path);
        let mut current = self.root.get(segs.next()?)?;
        for seg in segs {
            current = current.as_object()?.get(seg)?;
        }
        Some(current)
    }

    /// Whether `path` addresses a present node. Distinguishes "absent" from
    /// "present but falsy": `false`, `0`, and `""` all count as present.
    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Assign `value` at `path`.
    ///
    /// Sequences may only be created by [`push`](Self::push); assigning a
    /// sequence value is a silent no-op. Missing intermediate mappings are
    /// created on demand, and an intermediate currently holding a scalar is
    /// discarded and replaced by an empty mapping (lossy, intentional).
    pub fn set(&mut self, path: &str, value: Value) -> Vec<String> {
        if value.is_array() {
            return Vec::new();
        }
        let segs: Vec<&str> = path::segments(path).collect();
        let Some((leaf, parents)) = segs.split_last() else {
            return Vec::new();
        };
        let mut touched = Vec::new();
        let map = descend(&mut self.root, parents, &mut touched);
        map.insert((*leaf).to_owned(), value);
        touched.push(path.to_owned());
        touched
    }

    /// Append `value` to the sequence at `path`, creating missing
    /// intermediates and the sequence itself on demand. A sequence argument
    /// is appended element by element, preserving order. No-op when the
    /// existing node at `path` is not a sequence.
    pub fn push(&mut self, path: &str, value: Value) -> Vec<String> {
        let mut touched = Vec::new();
        let Some(arr) = self.sequence_at(path, &mut touched) else {
            return Vec::new();
        };
        match value {
            Value::Array(items) => arr.extend(items),
            other => arr.push(other),
        }
        if touched.last().map(String::as_str) != Some(path) {
            touched.push(path.to_owned());
        }
        touched
    }

    /// Remove the first element equal to `value` from the sequence at
    /// `path`. No-op when the node is not a sequence or the value is absent.
    pub fn splice(&mut self, path: &str, value: &Value) -> Vec<String> {
        let Some(Value::Array(arr)) = self.get_mut(path) else {
            return Vec::new();
        };
        match arr.iter().position(|item| item == value) {
            Some(index) => {
                arr.remove(index);
                vec![path.to_owned()]
            }
            None => Vec::new(),
        }
    }

    /// Coerce the node at `path` into an empty sequence unless it already is
    /// one. Used by checkbox binding, which guarantees a sequence exists
    /// before membership is read back.
    pub fn ensure_sequence(&mut self, path: &str) -> Vec<String> {
        if matches!(self.get(path), Some(Value::Array(_))) {
            return Vec::new();
        }
        let segs: Vec<&str> = path::segments(path).collect();
        let Some((leaf, parents)) = segs.split_last() else {
            return Vec::new();
        };
        let mut touched = Vec::new();
        let map = descend(&mut self.root, parents, &mut touched);
        map.insert((*leaf).to_owned(), Value::Array(Vec::new()));
        touched.push(path.to_owned());
        touched
    }

    /// Position of `value` in the sequence at `path`.
    pub fn index_of(&self, path: &str, value: &Value) -> Option<usize> {
        self.get(path)?.as_array()?.iter().position(|item| item == value)
    }

    /// Runtime category of the value at `path`.
    pub fn kind(&self, path: &str) -> Option<ValueKind> {
        self.get(path).map(ValueKind::of)
    }

    pub fn is_kind(&self, path: &str, kind: ValueKind) -> bool {
        self.kind(path) == Some(kind)
    }

    /// Whole-tree clone as a JSON value.
    pub fn snapshot(&self) -> Value {
        Value::Object(self.root.clone())
    }

    fn get_mut(&mut self, path: &str) -> Option<&mut Value> {
        let mut segs = path::segments(path);
        let mut current = self.root.get_mut(segs.next()?)?;
        for seg in segs {
            current = current.as_object_mut()?.get_mut(seg)?;
        }
        Some(current)
    }

    /// Walk to `path`, creating intermediate mappings, and return the
    /// sequence there — creating it when the slot is vacant. `None` when an
    /// existing node is not a sequence.
    fn sequence_at(&mut self, path: &str, touched: &mut Vec<String>) -> Option<&mut Vec<Value>> {
        let segs: Vec<&str> = path::segments(path).collect();
        let (leaf, parents) = segs.split_last()?;
        let map = descend(&mut self.root, parents, touched);
        let node = map.entry((*leaf).to_owned()).or_insert_with(|| {
            touched.push(path.to_owned());
            Value::Array(Vec::new())
        });
        node.as_array_mut()
    }
}

/// Walk `parents` from `root`, creating missing intermediate mappings and
/// coercing non-mapping intermediates into empty mappings. Every node this
/// creates or replaces is recorded in `touched`.
fn descend<'a>(
    root: &'a mut Map<String, Value>,
    parents: &[&str],
    touched: &mut Vec<String>,
) -> &'a mut Map<String, Value> {
    let mut current = root;
    let mut walked = String::new();
    for seg in parents {
        walked = path::join(&walked, seg);
        let node = current.entry((*seg).to_owned()).or_insert(Value::Null);
        if !node.is_object() {
            *node = Value::Object(Map::new());
            touched.push(walked.clone());
        }
        current = match node {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
    }
    current
}
