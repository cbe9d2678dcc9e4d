//! Host element tree: the live, rendered graphic elements.
//!
//! The tree is produced by the layout engine and mutated in place by the
//! editor. It is a `StableDiGraph` whose edges are
//! parent→child containment; element ids are indexed for O(1) lookup.
//!
//! Geometry is read from the `x`, `y`, `width`, `height` attributes.

use crate::id::ElementId;
use crate::model::{Attrs, IndexPath, merge_attrs};
use crate::role::ElementRole;
use kurbo::Rect;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde_json::{Map, Value, json};
use std::collections::HashMap;

/// Attribute key that maps to a text element's content.
pub const TEXT_KEY: &str = "text";
/// Attribute key that maps to an icon element's resource reference.
pub const HREF_KEY: &str = "href";

#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Group,
    Shape,
    Text { content: String },
    Icon { href: String },
}

/// One node of the rendered tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: ElementId,
    pub role: ElementRole,
    pub kind: ElementKind,
    pub attrs: Attrs,
    /// Embedded index path for item-scoped elements.
    pub indexes: Option<IndexPath>,
}

impl Element {
    pub fn new(id: ElementId, role: ElementRole, kind: ElementKind) -> Self {
        Self {
            id,
            role,
            kind,
            attrs: Attrs::new(),
            indexes: None,
        }
    }

    pub fn group(id: &str, role: ElementRole) -> Self {
        Self::new(ElementId::intern(id), role, ElementKind::Group)
    }

    pub fn shape(id: &str, role: ElementRole) -> Self {
        Self::new(ElementId::intern(id), role, ElementKind::Shape)
    }

    pub fn text(id: &str, role: ElementRole, content: &str) -> Self {
        Self::new(
            ElementId::intern(id),
            role,
            ElementKind::Text {
                content: content.to_string(),
            },
        )
    }

    pub fn icon(id: &str, href: &str) -> Self {
        Self::new(
            ElementId::intern(id),
            ElementRole::ItemIcon,
            ElementKind::Icon {
                href: href.to_string(),
            },
        )
    }

    pub fn with_indexes(mut self, indexes: &[usize]) -> Self {
        self.indexes = Some(IndexPath::from_slice(indexes));
        self
    }

    pub fn with_attr(mut self, key: &str, value: Value) -> Self {
        self.attrs.insert(key.to_string(), value);
        self
    }

    pub fn with_rect(self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.with_attr("x", json!(x))
            .with_attr("y", json!(y))
            .with_attr("width", json!(width))
            .with_attr("height", json!(height))
    }

    pub fn attr_f64(&self, key: &str) -> Option<f64> {
        self.attrs.get(key).and_then(Value::as_f64)
    }

    pub fn text_content(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Text { content } => Some(content),
            _ => None,
        }
    }

    pub fn set_text_content(&mut self, text: &str) -> bool {
        match &mut self.kind {
            ElementKind::Text { content } => {
                *content = text.to_string();
                true
            }
            _ => false,
        }
    }

    /// Bounds from the geometry attributes. Missing `x`/`y` read as 0;
    /// missing size means the element has no bounds.
    pub fn bounds(&self) -> Option<Rect> {
        let x = self.attr_f64("x").unwrap_or(0.0);
        let y = self.attr_f64("y").unwrap_or(0.0);
        let w = self.attr_f64("width")?;
        let h = self.attr_f64("height")?;
        Some(Rect::new(x, y, x + w, y + h))
    }

    /// Read the current values of `keys`, role-aware: `text` reads a text
    /// element's content, `href` an icon's reference. Absent keys read as
    /// `null`, so writing the result back removes them again.
    pub fn read_props<'a>(&self, keys: impl IntoIterator<Item = &'a String>) -> Attrs {
        let mut out = Map::new();
        for key in keys {
            let value = match (&self.kind, key.as_str()) {
                (ElementKind::Text { content }, TEXT_KEY) => Value::String(content.clone()),
                (ElementKind::Icon { href }, HREF_KEY) => Value::String(href.clone()),
                _ => self.attrs.get(key).cloned().unwrap_or(Value::Null),
            };
            out.insert(key.clone(), value);
        }
        out
    }

    /// Write `props` to the live element (inverse of [`Element::read_props`]).
    pub fn write_props(&mut self, props: &Attrs) {
        let mut rest = Map::new();
        for (key, value) in props {
            match (&mut self.kind, key.as_str()) {
                (ElementKind::Text { content }, TEXT_KEY) => {
                    *content = value.as_str().unwrap_or_default().to_string();
                }
                (ElementKind::Icon { href }, HREF_KEY) => {
                    *href = value.as_str().unwrap_or_default().to_string();
                }
                _ => {
                    rest.insert(key.clone(), value.clone());
                }
            }
        }
        merge_attrs(&mut self.attrs, &rest);
    }

    fn to_export_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("id".into(), json!(self.id.as_str()));
        obj.insert("role".into(), json!(self.role));
        match &self.kind {
            ElementKind::Text { content } => {
                obj.insert("text".into(), json!(content));
            }
            ElementKind::Icon { href } => {
                obj.insert("href".into(), json!(href));
            }
            ElementKind::Group | ElementKind::Shape => {}
        }
        if let Some(indexes) = &self.indexes {
            obj.insert("indexes".into(), json!(indexes.as_slice()));
        }
        if !self.attrs.is_empty() {
            obj.insert("attrs".into(), Value::Object(self.attrs.clone()));
        }
        Value::Object(obj)
    }
}

/// The rendered element tree of one document.
#[derive(Debug, Clone)]
pub struct ElementTree {
    pub graph: StableDiGraph<Element, ()>,
    pub root: NodeIndex,
    id_index: HashMap<ElementId, NodeIndex>,
    /// Insertion sequence, used for deterministic child order.
    seq: HashMap<NodeIndex, u64>,
    next_seq: u64,
    /// Counter behind [`ElementTree::fresh_id`].
    minted: u64,
}

impl ElementTree {
    /// Create a tree whose root is the document element.
    pub fn new(document: Element) -> Self {
        let mut graph = StableDiGraph::new();
        let id = document.id;
        let root = graph.add_node(document);
        let mut id_index = HashMap::new();
        id_index.insert(id, root);
        let mut seq = HashMap::new();
        seq.insert(root, 0);
        Self {
            graph,
            root,
            id_index,
            seq,
            next_seq: 1,
            minted: 0,
        }
    }

    /// A name not yet used in this tree, `{prefix}-{n}` with `n` counting
    /// per tree. Used for overlay elements the layout engine never named.
    pub fn fresh_id(&mut self, prefix: &str) -> ElementId {
        loop {
            self.minted += 1;
            let id = ElementId::intern(&format!("{prefix}-{}", self.minted));
            if !self.id_index.contains_key(&id) {
                return id;
            }
        }
    }

    pub fn document(&self) -> ElementId {
        self.graph[self.root].id
    }

    /// Append `element` as the last child of `parent`.
    pub fn append(&mut self, parent: ElementId, element: Element) -> Option<NodeIndex> {
        let parent_idx = self.index_of(parent)?;
        if self.id_index.contains_key(&element.id) {
            log::warn!("element {} already in tree", element.id);
            return None;
        }
        let id = element.id;
        let idx = self.graph.add_node(element);
        self.graph.add_edge(parent_idx, idx, ());
        self.id_index.insert(id, idx);
        self.seq.insert(idx, self.next_seq);
        self.next_seq += 1;
        Some(idx)
    }

    /// Remove an element and its whole subtree. Returns the removed element.
    pub fn remove(&mut self, id: ElementId) -> Option<Element> {
        let idx = self.index_of(id)?;
        if idx == self.root {
            return None;
        }
        for child in self.children(id) {
            self.remove(child);
        }
        let removed = self.graph.remove_node(idx)?;
        self.id_index.remove(&removed.id);
        self.seq.remove(&idx);
        Some(removed)
    }

    pub fn index_of(&self, id: ElementId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.index_of(id).map(|idx| &self.graph[idx])
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.index_of(id).map(|idx| &mut self.graph[idx])
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        let idx = self.index_of(id)?;
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
            .map(|p| self.graph[p].id)
    }

    /// Children in insertion order.
    pub fn children(&self, id: ElementId) -> Vec<ElementId> {
        let Some(idx) = self.index_of(id) else {
            return Vec::new();
        };
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .collect();
        children.sort_by_key(|c| self.seq.get(c).copied().unwrap_or(u64::MAX));
        children.into_iter().map(|c| self.graph[c].id).collect()
    }

    /// Other children of the same parent.
    pub fn siblings(&self, id: ElementId) -> Vec<ElementId> {
        self.parent(id)
            .map(|p| self.children(p).into_iter().filter(|c| *c != id).collect())
            .unwrap_or_default()
    }

    /// Whether `id` is `ancestor` itself or one of its descendants.
    pub fn contains(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.parent(c);
        }
        false
    }

    pub fn bounds(&self, id: ElementId) -> Option<Rect> {
        self.get(id).and_then(Element::bounds)
    }

    /// Every element in depth-first, paint order (parents before children).
    pub fn walk(&self) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![self.document()];
        while let Some(id) = stack.pop() {
            out.push(id);
            let mut children = self.children(id);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Whether the element or any ancestor is part of the transient overlay.
    pub fn is_transient(&self, id: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            match self.get(c) {
                Some(el) if el.role.is_transient() => return true,
                Some(_) => current = self.parent(c),
                None => return false,
            }
        }
        false
    }

    /// Export view of the tree. Transient overlay elements never appear.
    pub fn to_export_value(&self) -> Value {
        self.export_node(self.document())
    }

    fn export_node(&self, id: ElementId) -> Value {
        let mut value = self.get(id).map(Element::to_export_value).unwrap_or(Value::Null);
        let children: Vec<Value> = self
            .children(id)
            .into_iter()
            .filter(|c| self.get(*c).is_some_and(|el| !el.role.is_transient()))
            .map(|c| self.export_node(c))
            .collect();
        if !children.is_empty()
            && let Value::Object(obj) = &mut value
        {
            obj.insert("children".into(), Value::Array(children));
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tree() -> ElementTree {
        let mut tree = ElementTree::new(
            Element::group("svg", ElementRole::Document).with_rect(0.0, 0.0, 400.0, 300.0),
        );
        let svg = tree.document();
        tree.append(svg, Element::text("title", ElementRole::Title, "Plan"));
        tree.append(svg, Element::group("item-0", ElementRole::Item).with_indexes(&[0]));
        tree.append(
            ElementId::intern("item-0"),
            Element::text("label-0", ElementRole::ItemLabel, "Item 1")
                .with_indexes(&[0])
                .with_rect(10.0, 10.0, 50.0, 20.0),
        );
        tree
    }

    #[test]
    fn fresh_ids_skip_taken_names() {
        let mut tree = tree();
        let svg = tree.document();
        tree.append(svg, Element::shape("mask-1", ElementRole::Highlight));
        let a = tree.fresh_id("mask");
        assert_eq!(a.as_str(), "mask-2");
        tree.append(svg, Element::new(a, ElementRole::Highlight, ElementKind::Shape));
        assert_eq!(tree.fresh_id("mask").as_str(), "mask-3");
        // Numbering is per tree.
        assert_eq!(self::tree().fresh_id("mask").as_str(), "mask-1");
    }

    #[test]
    fn children_keep_insertion_order() {
        let tree = tree();
        assert_eq!(
            tree.children(tree.document()),
            vec![ElementId::intern("title"), ElementId::intern("item-0")]
        );
    }

    #[test]
    fn contains_checks_descendants() {
        let tree = tree();
        let svg = tree.document();
        assert!(tree.contains(svg, ElementId::intern("label-0")));
        assert!(tree.contains(svg, svg));
        assert!(!tree.contains(ElementId::intern("title"), ElementId::intern("label-0")));
    }

    #[test]
    fn remove_drops_subtree() {
        let mut tree = tree();
        tree.remove(ElementId::intern("item-0"));
        assert!(tree.get(ElementId::intern("label-0")).is_none());
        assert!(tree.remove(tree.document()).is_none());
    }

    #[test]
    fn read_and_write_props_are_role_aware() {
        let mut tree = tree();
        let label = tree.get_mut(ElementId::intern("label-0")).unwrap();
        let keys = vec!["text".to_string(), "fill".to_string(), "x".to_string()];
        let before = label.read_props(&keys);
        assert_eq!(
            Value::Object(before.clone()),
            json!({ "text": "Item 1", "fill": null, "x": 10.0 })
        );

        let mut modified = Attrs::new();
        modified.insert("text".into(), json!("Renamed"));
        modified.insert("fill".into(), json!("#333"));
        label.write_props(&modified);
        assert_eq!(label.text_content(), Some("Renamed"));
        assert_eq!(label.attrs.get("fill"), Some(&json!("#333")));

        label.write_props(&before);
        assert_eq!(label.text_content(), Some("Item 1"));
        assert!(!label.attrs.contains_key("fill"));
    }

    #[test]
    fn bounds_need_size() {
        let tree = tree();
        let b = tree.bounds(ElementId::intern("label-0")).unwrap();
        assert_eq!((b.x0, b.y0, b.width(), b.height()), (10.0, 10.0, 50.0, 20.0));
        assert!(tree.bounds(ElementId::intern("title")).is_none());
    }

    #[test]
    fn export_skips_transient_overlay() {
        let mut tree = tree();
        let svg = tree.document();
        tree.append(svg, Element::group("overlay", ElementRole::TransientContainer));
        tree.append(
            ElementId::intern("overlay"),
            Element::shape("mask", ElementRole::Highlight),
        );
        let exported = tree.to_export_value().to_string();
        assert!(!exported.contains("overlay"));
        assert!(!exported.contains("mask"));
        assert!(exported.contains("label-0"));
        assert!(tree.is_transient(ElementId::intern("mask")));
    }
}
