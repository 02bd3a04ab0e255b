//! The rendering target: a live, mutable document tree.
//!
//! Nodes live in an arena addressed by [`NodeId`]; detached slots are not
//! reclaimed (a `foreach` rebuild simply orphans the old subtree). Element
//! state the directives act on — inline style, class list, checked flag —
//! is held structurally and folded back into the `style`/`class`/`checked`
//! attributes on serialization, so a captured template is verbatim markup.

use indexmap::IndexMap;

use crate::markup::{self, Element, Node};

/// Handle to one node in a [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Tags treated as form fields by the binder.
const FIELD_TAGS: [&str; 3] = ["input", "select", "textarea"];

#[derive(Debug, Clone)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
    Raw(String),
}

/// Live element state.
#[derive(Debug, Clone, Default)]
pub struct ElementData {
    pub tag: String,
    pub attrs: IndexMap<String, String>,
    pub style: IndexMap<String, String>,
    pub classes: Vec<String>,
    pub checked: bool,
}

#[derive(Debug, Clone)]
struct NodeData {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// Arena document tree.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Document {
    /// Build a document from a markup tree.
    pub fn from_markup(tree: &Node) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        let root = doc.insert_tree(None, tree);
        doc.root = root;
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Whether `id` is still reachable from `root` through parent links.
    pub fn is_attached(&self, id: NodeId, root: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == root {
                return true;
            }
            current = self.nodes[node.0].parent;
        }
        false
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Pre-order walk of the subtree rooted at `start`, including `start`.
    pub fn walk(&self, start: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            out.push(id);
            for child in self.nodes[id.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// First element (document order, from `start` inclusive) whose
    /// attribute `name` equals `value`.
    pub fn find_by_attr(&self, start: NodeId, name: &str, value: &str) -> Option<NodeId> {
        self.walk(start)
            .into_iter()
            .find(|id| self.attr(*id, name) == Some(value))
    }

    /// Elements in the subtree (inclusive) carrying attribute `name`.
    pub fn elements_with_attr(&self, start: NodeId, name: &str) -> Vec<NodeId> {
        self.walk(start)
            .into_iter()
            .filter(|id| self.attr(*id, name).is_some())
            .collect()
    }

    /// Elements in the subtree (inclusive) whose attribute `name` contains
    /// `needle` as a substring. This is the prefilter the render passes use
    /// to touch only elements that reference a changed path.
    pub fn elements_with_attr_containing(
        &self,
        start: NodeId,
        name: &str,
        needle: &str,
    ) -> Vec<NodeId> {
        self.walk(start)
            .into_iter()
            .filter(|id| self.attr(*id, name).is_some_and(|v| v.contains(needle)))
            .collect()
    }

    /// Field elements in the subtree whose `name` attribute equals `name_value`.
    pub fn fields_named(&self, start: NodeId, name_value: &str) -> Vec<NodeId> {
        self.walk(start)
            .into_iter()
            .filter(|id| {
                self.element(*id)
                    .is_some_and(|el| FIELD_TAGS.contains(&el.tag.as_str()))
                    && self.attr(*id, "name") == Some(name_value)
            })
            .collect()
    }

    // ── Element state ─────────────────────────────────────────────────────

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attrs.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.attrs.insert(name.to_owned(), value.to_owned());
        }
    }

    pub fn style(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.style.get(name).map(String::as_str)
    }

    pub fn set_style(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.style.insert(name.to_owned(), value.to_owned());
        }
    }

    /// Toggle visibility through the `display` style key.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.set_style(id, "display", if visible { "block" } else { "none" });
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.style(id, "display") != Some("none")
    }

    /// Idempotent class addition.
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if let Some(el) = self.element_mut(id) {
            if !el.classes.iter().any(|c| c == class) {
                el.classes.push(class.to_owned());
            }
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id)
            .is_some_and(|el| el.classes.iter().any(|c| c == class))
    }

    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        if let Some(el) = self.element_mut(id) {
            el.checked = checked;
        }
    }

    pub fn is_checked(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|el| el.checked)
    }

    // ── Content mutation ──────────────────────────────────────────────────

    /// Detach all children of `id`.
    pub fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    /// Replace the content of `id` with a single escaped text node.
    pub fn set_text(&mut self, id: NodeId, content: &str) {
        self.clear_children(id);
        let child = self.push_node(Some(id), NodeKind::Text(content.to_owned()));
        self.nodes[id.0].children.push(child);
    }

    /// Replace the content of `id` with raw, unescaped markup.
    pub fn set_raw(&mut self, id: NodeId, content: &str) {
        self.clear_children(id);
        let child = self.push_node(Some(id), NodeKind::Raw(content.to_owned()));
        self.nodes[id.0].children.push(child);
    }

    /// Text content of the subtree (escaped text nodes only, in order).
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.walk(id) {
            if let NodeKind::Text(s) = &self.nodes[node.0].kind {
                out.push_str(s);
            }
        }
        out
    }

    // ── Fragments ─────────────────────────────────────────────────────────

    /// Capture the children of `id` as a detached markup fragment.
    pub fn capture_fragment(&self, id: NodeId) -> Vec<Node> {
        self.nodes[id.0]
            .children
            .iter()
            .map(|child| self.to_markup(*child))
            .collect()
    }

    /// Instantiate a markup fragment under `parent`; returns the roots of
    /// the inserted subtrees in order.
    pub fn append_fragment(&mut self, parent: NodeId, fragment: &[Node]) -> Vec<NodeId> {
        fragment
            .iter()
            .map(|tree| {
                let id = self.insert_tree(Some(parent), tree);
                self.nodes[parent.0].children.push(id);
                id
            })
            .collect()
    }

    /// Serialize the subtree at `id` back into a markup tree.
    pub fn to_markup(&self, id: NodeId) -> Node {
        match &self.nodes[id.0].kind {
            NodeKind::Text(s) => Node::Text(s.clone()),
            NodeKind::Raw(s) => Node::Raw(s.clone()),
            NodeKind::Element(el) => {
                let mut attrs = el.attrs.clone();
                if !el.style.is_empty() {
                    attrs.insert("style".to_owned(), style_attr(&el.style));
                }
                if !el.classes.is_empty() {
                    attrs.insert("class".to_owned(), el.classes.join(" "));
                }
                if el.checked {
                    attrs.insert("checked".to_owned(), "checked".to_owned());
                }
                Node::Element(Element {
                    tag: el.tag.clone(),
                    attrs,
                    children: self.nodes[id.0]
                        .children
                        .iter()
                        .map(|child| self.to_markup(*child))
                        .collect(),
                })
            }
        }
    }

    /// HTML rendition of the subtree at `id`.
    pub fn to_html(&self, id: NodeId) -> String {
        markup::to_html(&self.to_markup(id))
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn push_node(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            parent,
            children: Vec::new(),
            kind,
        });
        id
    }

    fn insert_tree(&mut self, parent: Option<NodeId>, tree: &Node) -> NodeId {
        match tree {
            Node::Text(s) => self.push_node(parent, NodeKind::Text(s.clone())),
            Node::Raw(s) => self.push_node(parent, NodeKind::Raw(s.clone())),
            Node::Element(el) => {
                let mut attrs = el.attrs.clone();
                let style = attrs
                    .shift_remove("style")
                    .map(|s| parse_style(&s))
                    .unwrap_or_default();
                let classes = attrs
                    .shift_remove("class")
                    .map(|s| s.split_whitespace().map(str::to_owned).collect())
                    .unwrap_or_default();
                let checked = attrs.shift_remove("checked").is_some();
                let id = self.push_node(
                    parent,
                    NodeKind::Element(ElementData {
                        tag: el.tag.clone(),
                        attrs,
                        style,
                        classes,
                        checked,
                    }),
                );
                for child in &el.children {
                    let child_id = self.insert_tree(Some(id), child);
                    self.nodes[id.0].children.push(child_id);
                }
                id
            }
        }
    }
}

fn parse_style(s: &str) -> IndexMap<String, String> {
    s.split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_owned(), value.trim().to_owned()))
        })
        .collect()
}

fn style_attr(style: &IndexMap<String, String>) -> String {
    style
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("; ")
}
