//! Document state manager: the single owner of the editable data model
//! and the live element tree.
//!
//! - **Data side**: indexed CRUD over the hierarchical item list and the
//!   top-level fields, plus the dual-path attribute merge behind
//!   [`StateManager::update_element`].
//! - **Element side**: role-aware reads and writes of live element
//!   attributes, used by commands for exact undo and by gestures for live
//!   feedback.
//!
//! The manager is shared as `Rc<StateManager>`. Every operation releases its
//! internal borrow before emitting, so event handlers may read the state.

use crate::error::EditError;
use crate::events::{ChangeOp, DataChange, EditorEvent, EventChannel};
use ig_core::model::merge_attrs;
use ig_core::{
    Attrs, Data, DataField, Element, ElementId, ElementTree, FieldAttrs, IndexPath, ItemDatum,
    ItemPatch, RenderOptions, RoleScope,
};
use serde_json::Value;
use std::cell::{Ref, RefCell};

pub struct StateManager {
    data: RefCell<Data>,
    options: RefCell<RenderOptions>,
    tree: RefCell<ElementTree>,
    events: EventChannel,
}

impl StateManager {
    pub fn new(data: Data, options: RenderOptions, tree: ElementTree, events: EventChannel) -> Self {
        Self {
            data: RefCell::new(data),
            options: RefCell::new(options),
            tree: RefCell::new(tree),
            events,
        }
    }

    pub fn events(&self) -> &EventChannel {
        &self.events
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    /// Borrow the data model. Do not hold the guard across an `.await`.
    pub fn data(&self) -> Ref<'_, Data> {
        self.data.borrow()
    }

    pub fn options(&self) -> RenderOptions {
        self.options.borrow().clone()
    }

    pub fn document(&self) -> ElementId {
        self.tree.borrow().document()
    }

    pub fn with_tree<R>(&self, f: impl FnOnce(&ElementTree) -> R) -> R {
        f(&self.tree.borrow())
    }

    /// Direct mutable access to the live tree. Reserved for gestures that
    /// hold the exclusivity token and for the coordinator's overlay.
    pub fn with_tree_mut<R>(&self, f: impl FnOnce(&mut ElementTree) -> R) -> R {
        f(&mut self.tree.borrow_mut())
    }

    pub fn element(&self, id: ElementId) -> Option<Element> {
        self.tree.borrow().get(id).cloned()
    }

    /// Suspend once so a pending layout pass can settle before the next read.
    pub async fn settle(&self) {
        tokio::task::yield_now().await;
    }

    // ─── Item CRUD ───────────────────────────────────────────────────────

    /// Insert `items` at the terminal index of `path`, inside the list
    /// addressed by its prefix. Missing `children` lists are created.
    pub fn add_item_datum(&self, path: &[usize], items: Vec<ItemDatum>) -> Result<(), EditError> {
        let indexes = IndexPath::from_slice(path);
        {
            let mut data = self.data.borrow_mut();
            let len = insert_slot_len(&data, path).ok_or_else(|| invalid_path(path))?;
            let at = *path.last().ok_or_else(|| invalid_path(path))?;
            if at > len {
                return Err(invalid_path(path));
            }
            let container = data
                .container_mut(path, true)
                .ok_or_else(|| invalid_path(path))?;
            container.splice(at..at, items.iter().cloned());
        }
        log::debug!("add {} item(s) at {path:?}", items.len());
        let value = serde_json::to_value(&items).unwrap_or(Value::Null);
        self.events.emit(EditorEvent::AddItem {
            indexes: indexes.clone(),
            datum: items,
        });
        self.emit_change(ChangeOp::AddItem, Some(indexes), value);
        Ok(())
    }

    /// Shallow-merge `patch` into the item at `path`.
    pub fn update_item_datum(&self, path: &[usize], patch: ItemPatch) -> Result<(), EditError> {
        {
            let mut data = self.data.borrow_mut();
            let item = data.item_mut(path).ok_or_else(|| invalid_path(path))?;
            patch.apply_to(item);
        }
        log::debug!("update item {path:?}");
        let indexes = IndexPath::from_slice(path);
        let value = serde_json::to_value(&patch).unwrap_or(Value::Null);
        self.events.emit(EditorEvent::UpdateItem {
            indexes: indexes.clone(),
            datum: patch,
        });
        self.emit_change(ChangeOp::UpdateItem, Some(indexes), value);
        Ok(())
    }

    /// Remove `count` items starting at `path`. Returns the removed slice,
    /// which is also the event payload, so re-adding it undoes the removal.
    pub fn remove_item_datum(
        &self,
        path: &[usize],
        count: usize,
    ) -> Result<Vec<ItemDatum>, EditError> {
        let removed: Vec<ItemDatum> = {
            let mut data = self.data.borrow_mut();
            let at = *path.last().ok_or_else(|| invalid_path(path))?;
            let container = data
                .container_mut(path, false)
                .ok_or_else(|| invalid_path(path))?;
            if at >= container.len() {
                return Err(invalid_path(path));
            }
            let end = (at + count).min(container.len());
            container.drain(at..end).collect()
        };
        log::debug!("remove {} item(s) at {path:?}", removed.len());
        let indexes = IndexPath::from_slice(path);
        let value = serde_json::to_value(&removed).unwrap_or(Value::Null);
        self.events.emit(EditorEvent::RemoveItem {
            indexes: indexes.clone(),
            datum: removed.clone(),
        });
        self.emit_change(ChangeOp::RemoveItem, Some(indexes), value);
        Ok(removed)
    }

    /// Set a top-level field.
    pub fn update_data(&self, key: DataField, value: Option<String>) {
        self.data.borrow_mut().set_field(key, value.clone());
        log::debug!("update data {}", key.as_str());
        let json = value.clone().map(Value::String).unwrap_or(Value::Null);
        self.events.emit(EditorEvent::UpdateData { key, value });
        self.emit_change(ChangeOp::UpdateData, None, json);
    }

    /// Resolve where the data behind `id` lives without touching it.
    ///
    /// Returns the item path for item-scoped roles and `None` for
    /// top-level roles. Fails when the role has no data or the path no
    /// longer addresses an item.
    pub fn data_target(&self, id: ElementId) -> Result<Option<IndexPath>, EditError> {
        let (role, indexes) = {
            let tree = self.tree.borrow();
            let el = tree.get(id).ok_or(EditError::UnknownElement(id))?;
            (el.role, el.indexes.clone())
        };
        match role.scope() {
            RoleScope::Item(_) => {
                let path = indexes.ok_or(EditError::MissingIndexes(id))?;
                if self.data.borrow().item(&path).is_none() {
                    return Err(invalid_path(&path));
                }
                Ok(Some(path))
            }
            RoleScope::TopLevel(_) => Ok(None),
            RoleScope::None => Err(EditError::UnsupportedRole { id, role }),
        }
    }

    /// Merge `props` into the attribute bag behind `id`.
    ///
    /// Item-scoped roles merge into `item.attributes[field]` of the item at
    /// the element's index path; top-level roles merge into
    /// `data.attributes[role]`. Bags left empty are dropped.
    pub fn update_element(&self, id: ElementId, props: &Attrs) -> Result<(), EditError> {
        let (role, indexes) = {
            let tree = self.tree.borrow();
            let el = tree.get(id).ok_or(EditError::UnknownElement(id))?;
            (el.role, el.indexes.clone())
        };
        {
            let mut data = self.data.borrow_mut();
            match role.scope() {
                RoleScope::Item(key) => {
                    let path = indexes.ok_or(EditError::MissingIndexes(id))?;
                    let item = data.item_mut(&path).ok_or_else(|| invalid_path(&path))?;
                    merge_into_bag(&mut item.attributes, key, props);
                }
                RoleScope::TopLevel(key) => merge_into_bag(&mut data.attributes, key, props),
                RoleScope::None => {
                    log::error!("update_element on non-data element {id} ({role:?})");
                    return Err(EditError::UnsupportedRole { id, role });
                }
            }
        }
        log::debug!("update element {id}");
        let indexes = self.with_tree(|t| t.get(id).and_then(|el| el.indexes.clone()));
        self.events.emit(EditorEvent::UpdateElement {
            element: id,
            role,
            props: props.clone(),
        });
        self.emit_change(ChangeOp::UpdateElement, indexes, Value::Object(props.clone()));
        Ok(())
    }

    /// Replace the whole render option set.
    pub fn update_options(&self, options: RenderOptions) {
        *self.options.borrow_mut() = options.clone();
        log::debug!("update options");
        self.events.emit(EditorEvent::OptionsChange { options });
    }

    fn emit_change(&self, op: ChangeOp, indexes: Option<IndexPath>, value: Value) {
        self.events
            .emit(EditorEvent::Change(DataChange { op, indexes, value }));
    }

    // ─── Live element access ─────────────────────────────────────────────

    /// Current values of `keys` on the live element (role-aware).
    pub fn element_props<'a>(
        &self,
        id: ElementId,
        keys: impl IntoIterator<Item = &'a String>,
    ) -> Result<Attrs, EditError> {
        let tree = self.tree.borrow();
        let el = tree.get(id).ok_or(EditError::UnknownElement(id))?;
        Ok(el.read_props(keys))
    }

    /// Write `props` onto the live element (role-aware).
    pub fn write_element_props(&self, id: ElementId, props: &Attrs) -> Result<(), EditError> {
        let mut tree = self.tree.borrow_mut();
        let el = tree.get_mut(id).ok_or(EditError::UnknownElement(id))?;
        el.write_props(props);
        Ok(())
    }

    pub fn element_text(&self, id: ElementId) -> Result<String, EditError> {
        let tree = self.tree.borrow();
        let el = tree.get(id).ok_or(EditError::UnknownElement(id))?;
        el.text_content()
            .map(str::to_string)
            .ok_or(EditError::UnsupportedRole { id, role: el.role })
    }

    pub fn set_element_text(&self, id: ElementId, text: &str) -> Result<(), EditError> {
        let mut tree = self.tree.borrow_mut();
        let el = tree.get_mut(id).ok_or(EditError::UnknownElement(id))?;
        let role = el.role;
        if el.set_text_content(text) {
            Ok(())
        } else {
            Err(EditError::UnsupportedRole { id, role })
        }
    }
}

fn invalid_path(path: &[usize]) -> EditError {
    log::error!("invalid index path {path:?}");
    EditError::InvalidPath(IndexPath::from_slice(path))
}

/// Length of the list an insertion at `path` would land in. The direct
/// parent may lack a `children` list (it will be created); deeper gaps are
/// invalid.
fn insert_slot_len(data: &Data, path: &[usize]) -> Option<usize> {
    let (_, prefix) = path.split_last()?;
    let mut items = &data.items;
    for (depth, &i) in prefix.iter().enumerate() {
        let item = items.get(i)?;
        match &item.children {
            Some(children) => items = children,
            None if depth + 1 == prefix.len() => return Some(0),
            None => return None,
        }
    }
    Some(items.len())
}

fn merge_into_bag(bags: &mut FieldAttrs, key: &str, props: &Attrs) {
    let bag = bags.entry(key.to_string()).or_default();
    merge_attrs(bag, props);
    if bag.is_empty() {
        bags.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ig_core::ElementRole;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::rc::Rc;

    fn state() -> (StateManager, Rc<RefCell<Vec<EditorEvent>>>) {
        let data = Data {
            title: Some("Plan".into()),
            items: vec![ItemDatum::labeled("Item 1"), ItemDatum::labeled("Item 2")],
            ..Data::default()
        };
        let mut tree = ElementTree::new(Element::group("svg", ElementRole::Document));
        let svg = tree.document();
        tree.append(svg, Element::text("title", ElementRole::Title, "Plan"));
        tree.append(
            svg,
            Element::text("label-1", ElementRole::ItemLabel, "Item 2").with_indexes(&[1]),
        );
        tree.append(svg, Element::shape("stray", ElementRole::ItemShape));

        let events = EventChannel::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        events.subscribe_all(move |e| sink.borrow_mut().push(e.clone()));
        (
            StateManager::new(data, RenderOptions::default(), tree, events),
            log,
        )
    }

    #[test]
    fn add_creates_missing_children() {
        let (state, _) = state();
        state
            .add_item_datum(&[0, 0], vec![ItemDatum::labeled("Child")])
            .unwrap();
        assert_eq!(
            state.data().item(&[0, 0]).unwrap().label.as_deref(),
            Some("Child")
        );
    }

    #[test]
    fn add_past_end_fails_without_mutation() {
        let (state, log) = state();
        let before = state.data().clone();
        assert!(matches!(
            state.add_item_datum(&[5], vec![ItemDatum::labeled("x")]),
            Err(EditError::InvalidPath(_))
        ));
        assert!(matches!(
            state.add_item_datum(&[0, 0, 0], vec![ItemDatum::labeled("x")]),
            Err(EditError::InvalidPath(_))
        ));
        assert_eq!(*state.data(), before);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn remove_returns_slice_and_emits_it() {
        let (state, log) = state();
        let removed = state.remove_item_datum(&[0], 5).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(state.data().items.is_empty());
        assert_eq!(
            log.borrow()[0],
            EditorEvent::RemoveItem {
                indexes: IndexPath::from_slice(&[0]),
                datum: removed,
            }
        );
        assert!(state.remove_item_datum(&[0], 1).is_err());
    }

    #[test]
    fn update_data_emits_both_events() {
        let (state, log) = state();
        state.update_data(DataField::Title, Some("New".into()));
        assert_eq!(state.data().title.as_deref(), Some("New"));
        let names: Vec<_> = log.borrow().iter().map(EditorEvent::name).collect();
        assert_eq!(names, vec!["data:update:data", "data:change"]);
    }

    #[test]
    fn update_element_resolves_item_and_top_level_bags() {
        let (state, _) = state();
        let mut props = Attrs::new();
        props.insert("fill".into(), json!("#f00"));

        state
            .update_element(ElementId::intern("label-1"), &props)
            .unwrap();
        state
            .update_element(ElementId::intern("title"), &props)
            .unwrap();

        let data = state.data();
        assert_eq!(data.items[1].attributes["label"]["fill"], json!("#f00"));
        assert_eq!(data.attributes["title"]["fill"], json!("#f00"));
        assert!(data.items[0].attributes.is_empty());
    }

    #[test]
    fn update_element_null_drops_empty_bag() {
        let (state, _) = state();
        let label = ElementId::intern("label-1");
        let mut props = Attrs::new();
        props.insert("fill".into(), json!("#f00"));
        state.update_element(label, &props).unwrap();
        props.insert("fill".into(), Value::Null);
        state.update_element(label, &props).unwrap();
        assert!(state.data().items[1].attributes.is_empty());
    }

    #[test]
    fn update_element_rejects_bad_targets() {
        let (state, _) = state();
        let props = Attrs::new();
        assert!(matches!(
            state.update_element(ElementId::intern("svg"), &props),
            Err(EditError::UnsupportedRole { .. })
        ));
        assert!(matches!(
            state.update_element(ElementId::intern("stray"), &props),
            Err(EditError::MissingIndexes(_))
        ));
        assert!(matches!(
            state.update_element(ElementId::intern("nowhere"), &props),
            Err(EditError::UnknownElement(_))
        ));
    }

    #[test]
    fn handlers_can_read_state_during_emit() {
        let (state, _) = state();
        let state = Rc::new(state);
        let seen = Rc::new(RefCell::new(None));
        let (s, out) = (Rc::downgrade(&state), seen.clone());
        state.events().subscribe(EditorEvent::UPDATE_DATA, move |_| {
            if let Some(s) = s.upgrade() {
                *out.borrow_mut() = s.data().title.clone();
            }
        });
        state.update_data(DataField::Title, Some("Seen".into()));
        assert_eq!(seen.borrow().as_deref(), Some("Seen"));
    }
}
