//! Explicit publish/subscribe channel for editor events.
//!
//! Every component receives the channel at construction; there is no
//! global emitter. Event names are stable strings (`data:update:item`, ...)
//! and each name maps to exactly one payload variant of [`EditorEvent`].

use crate::coordinator::SelectMode;
use ig_core::{Attrs, DataField, ElementId, ElementRole, IndexPath, ItemDatum, ItemPatch, RenderOptions};
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// Kind of data operation carried by the generic `data:change` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeOp {
    AddItem,
    UpdateItem,
    RemoveItem,
    UpdateData,
    UpdateElement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataChange {
    pub op: ChangeOp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexes: Option<IndexPath>,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionChange {
    pub previous: Vec<ElementId>,
    pub next: Vec<ElementId>,
    pub added: Vec<ElementId>,
    pub removed: Vec<ElementId>,
    pub mode: SelectMode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum EditorEvent {
    #[serde(rename = "data:add:item")]
    AddItem {
        indexes: IndexPath,
        datum: Vec<ItemDatum>,
    },
    #[serde(rename = "data:update:item")]
    UpdateItem { indexes: IndexPath, datum: ItemPatch },
    #[serde(rename = "data:remove:item")]
    RemoveItem {
        indexes: IndexPath,
        datum: Vec<ItemDatum>,
    },
    #[serde(rename = "data:update:data")]
    UpdateData {
        key: DataField,
        value: Option<String>,
    },
    #[serde(rename = "data:update:element")]
    UpdateElement {
        element: ElementId,
        role: ElementRole,
        props: Attrs,
    },
    #[serde(rename = "data:change")]
    Change(DataChange),
    #[serde(rename = "options:change")]
    OptionsChange { options: RenderOptions },
    #[serde(rename = "selection:change")]
    SelectionChange(SelectionChange),
    #[serde(rename = "history:change")]
    HistoryChange { can_undo: bool, can_redo: bool },
}

impl EditorEvent {
    pub const ADD_ITEM: &'static str = "data:add:item";
    pub const UPDATE_ITEM: &'static str = "data:update:item";
    pub const REMOVE_ITEM: &'static str = "data:remove:item";
    pub const UPDATE_DATA: &'static str = "data:update:data";
    pub const UPDATE_ELEMENT: &'static str = "data:update:element";
    pub const CHANGE: &'static str = "data:change";
    pub const OPTIONS_CHANGE: &'static str = "options:change";
    pub const SELECTION_CHANGE: &'static str = "selection:change";
    pub const HISTORY_CHANGE: &'static str = "history:change";

    pub fn name(&self) -> &'static str {
        match self {
            Self::AddItem { .. } => Self::ADD_ITEM,
            Self::UpdateItem { .. } => Self::UPDATE_ITEM,
            Self::RemoveItem { .. } => Self::REMOVE_ITEM,
            Self::UpdateData { .. } => Self::UPDATE_DATA,
            Self::UpdateElement { .. } => Self::UPDATE_ELEMENT,
            Self::Change(_) => Self::CHANGE,
            Self::OptionsChange { .. } => Self::OPTIONS_CHANGE,
            Self::SelectionChange(_) => Self::SELECTION_CHANGE,
            Self::HistoryChange { .. } => Self::HISTORY_CHANGE,
        }
    }
}

pub type Handler = Rc<dyn Fn(&EditorEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    /// `None` receives every event.
    name: Option<&'static str>,
    handler: Handler,
}

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    list: Vec<Subscription>,
}

/// Cheaply clonable handle to one shared channel.
#[derive(Clone, Default)]
pub struct EventChannel {
    inner: Rc<RefCell<Subscribers>>,
}

impl std::fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel")
            .field("subscribers", &self.inner.borrow().list.len())
            .finish()
    }
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one event name.
    pub fn subscribe(
        &self,
        name: &'static str,
        handler: impl Fn(&EditorEvent) + 'static,
    ) -> SubscriptionId {
        self.add(Some(name), Rc::new(handler))
    }

    /// Subscribe to every event.
    pub fn subscribe_all(&self, handler: impl Fn(&EditorEvent) + 'static) -> SubscriptionId {
        self.add(None, Rc::new(handler))
    }

    fn add(&self, name: Option<&'static str>, handler: Handler) -> SubscriptionId {
        let mut subs = self.inner.borrow_mut();
        let id = SubscriptionId(subs.next_id);
        subs.next_id += 1;
        subs.list.push(Subscription { id, name, handler });
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.inner.borrow_mut();
        let before = subs.list.len();
        subs.list.retain(|s| s.id != id);
        subs.list.len() != before
    }

    /// Deliver `event` to matching subscribers in subscription order.
    ///
    /// Handlers are snapshotted first, so a handler may subscribe,
    /// unsubscribe or emit without deadlocking the channel.
    pub fn emit(&self, event: EditorEvent) {
        let name = event.name();
        let handlers: Vec<Handler> = self
            .inner
            .borrow()
            .list
            .iter()
            .filter(|s| s.name.is_none_or(|n| n == name))
            .map(|s| s.handler.clone())
            .collect();
        log::trace!("emit {name} to {} handler(s)", handlers.len());
        for handler in handlers {
            handler(&event);
        }
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().list.clear();
    }
}
