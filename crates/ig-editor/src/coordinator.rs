//! Interaction coordinator.
//!
//! Owns the editing surface's activation flag, the selection set, the
//! exclusivity token that keeps gestures from overlapping, the modifier
//! state, and the transient overlay container for interaction-only visuals.
//!
//! ## Activation
//!
//! | From | Event | To |
//! |------|-------|----|
//! | inactive | primary press inside the document | active |
//! | active | primary press outside the document | inactive |
//!
//! There are no other transitions and no timeout.
//!
//! ## Exclusivity
//!
//! [`InteractionCoordinator::execute_exclusive`] runs a callback only while
//! active and only if no other interaction holds the token; a second caller
//! is rejected with [`Exclusive::Busy`], never interleaved. The token is an
//! RAII guard, so it is released however the callback settles.

use crate::error::EditError;
use crate::events::{EditorEvent, EventChannel, SelectionChange};
use crate::input::{InputEvent, ModifierState, PointerButton};
use crate::state::StateManager;
use ig_core::{Attrs, Element, ElementId, ElementRole};
use serde::Serialize;
use smallvec::SmallVec;
use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

/// How [`InteractionCoordinator::select`] combines targets with the
/// current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectMode {
    Replace,
    Add,
    Remove,
    /// Single-element sets only.
    Toggle,
}

/// Identity of one interaction instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InteractionId {
    name: &'static str,
    instance: u32,
}

impl InteractionId {
    pub fn new(name: &'static str) -> Self {
        use std::sync::atomic::{AtomicU32, Ordering};
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        Self {
            name,
            instance: COUNTER.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for InteractionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.instance)
    }
}

impl fmt::Display for InteractionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Outcome of a gated interaction call.
#[derive(Debug, PartialEq)]
pub enum Exclusive<T> {
    Ran(T),
    /// The coordinator is inactive; nothing ran.
    Inactive,
    /// Another interaction holds the token; nothing ran.
    Busy(InteractionId),
}

impl<T> Exclusive<T> {
    pub fn ran(self) -> Option<T> {
        match self {
            Self::Ran(v) => Some(v),
            Self::Inactive | Self::Busy(_) => None,
        }
    }
}

/// Held exclusivity token. Dropping it releases the token.
pub struct ExclusiveToken {
    slot: Rc<Cell<Option<InteractionId>>>,
    owner: InteractionId,
}

impl ExclusiveToken {
    pub fn owner(&self) -> InteractionId {
        self.owner
    }
}

impl fmt::Debug for ExclusiveToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExclusiveToken({})", self.owner)
    }
}

impl Drop for ExclusiveToken {
    fn drop(&mut self) {
        // A forced release (destroy) may already have handed the slot on.
        if self.slot.get() == Some(self.owner) {
            self.slot.set(None);
            log::trace!("{} released token", self.owner);
        }
    }
}

#[derive(Default)]
pub struct InteractionCoordinator {
    state: OnceCell<Rc<StateManager>>,
    events: OnceCell<EventChannel>,
    active: Cell<bool>,
    selection: RefCell<SmallVec<[ElementId; 8]>>,
    holder: Rc<Cell<Option<InteractionId>>>,
    overlay: Cell<Option<ElementId>>,
    modifiers: ModifierState,
    /// Set when a press-move-release gesture ends; the host's trailing
    /// click for that release is then not a selection click.
    gesture_ended: Cell<bool>,
}

impl InteractionCoordinator {
    /// First init phase: an inert coordinator with no peers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Second init phase: link the state manager and event channel.
    pub fn init(&self, state: Rc<StateManager>, events: EventChannel) {
        if self.state.set(state).is_err() || self.events.set(events).is_err() {
            log::warn!("coordinator initialised twice; keeping the first peers");
        }
    }

    fn state(&self) -> Result<&Rc<StateManager>, EditError> {
        self.state
            .get()
            .ok_or(EditError::NotInitialized("InteractionCoordinator"))
    }

    pub fn modifiers(&self) -> &ModifierState {
        &self.modifiers
    }

    // ─── Activation ──────────────────────────────────────────────────────

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Update modifier and activation state from a raw input event.
    pub fn observe(&self, event: &InputEvent) {
        self.modifiers.observe(event);
        if matches!(event, InputEvent::PointerDown { .. }) {
            self.gesture_ended.set(false);
        }
        if let InputEvent::PointerDown {
            button: PointerButton::Primary,
            target,
            ..
        } = event
        {
            self.handle_primary_click(*target);
        }
    }

    /// Activate when `target` lies inside the document, deactivate otherwise.
    pub fn handle_primary_click(&self, target: Option<ElementId>) -> bool {
        let inside = match (self.state.get(), target) {
            (Some(state), Some(t)) => {
                state.with_tree(|tree| tree.contains(tree.document(), t))
            }
            _ => false,
        };
        if inside != self.active.get() {
            log::debug!("coordinator {}", if inside { "activated" } else { "deactivated" });
        }
        self.active.set(inside);
        inside
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn selection(&self) -> Vec<ElementId> {
        self.selection.borrow().to_vec()
    }

    pub fn is_selected(&self, id: ElementId) -> bool {
        self.selection.borrow().contains(&id)
    }

    pub fn clear_selection(&self) {
        self.select(&[], SelectMode::Replace);
    }

    /// Mutate the selection and emit `selection:change`, even when the
    /// result equals the previous selection.
    pub fn select(&self, targets: &[ElementId], mode: SelectMode) -> Vec<ElementId> {
        let previous = self.selection();
        let mut next: SmallVec<[ElementId; 8]> = match mode {
            SelectMode::Replace => SmallVec::new(),
            _ => previous.iter().copied().collect(),
        };
        match mode {
            SelectMode::Replace | SelectMode::Add => {
                for t in targets {
                    if !next.contains(t) {
                        next.push(*t);
                    }
                }
            }
            SelectMode::Remove => next.retain(|id| !targets.contains(id)),
            SelectMode::Toggle => {
                if targets.len() > 1 {
                    log::warn!("toggle with {} targets is out of contract", targets.len());
                }
                for t in targets {
                    if let Some(pos) = next.iter().position(|id| id == t) {
                        next.remove(pos);
                    } else {
                        next.push(*t);
                    }
                }
            }
        }

        let added: Vec<ElementId> = next.iter().filter(|id| !previous.contains(id)).copied().collect();
        let removed: Vec<ElementId> = previous.iter().filter(|id| !next.contains(id)).copied().collect();
        let next_vec = next.to_vec();
        *self.selection.borrow_mut() = next;

        log::debug!("select {mode:?}: +{} -{}", added.len(), removed.len());
        if let Some(events) = self.events.get() {
            events.emit(EditorEvent::SelectionChange(SelectionChange {
                previous,
                next: next_vec.clone(),
                added,
                removed,
                mode,
            }));
        }
        next_vec
    }

    // ─── Exclusivity ─────────────────────────────────────────────────────

    pub fn holder(&self) -> Option<InteractionId> {
        self.holder.get()
    }

    /// Take the token for a gesture spanning several input events. The
    /// gesture keeps the returned guard until it completes or is cancelled.
    pub fn acquire(&self, id: InteractionId) -> Exclusive<ExclusiveToken> {
        if !self.is_active() {
            return Exclusive::Inactive;
        }
        if let Some(holder) = self.holder.get() {
            log::debug!("{id} rejected: token held by {holder}");
            return Exclusive::Busy(holder);
        }
        self.holder.set(Some(id));
        log::trace!("{id} acquired token");
        Exclusive::Ran(ExclusiveToken {
            slot: self.holder.clone(),
            owner: id,
        })
    }

    /// Run `callback` while holding the exclusivity token.
    pub async fn execute_exclusive<F, Fut, T>(&self, id: InteractionId, callback: F) -> Exclusive<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let token = match self.acquire(id) {
            Exclusive::Ran(token) => token,
            Exclusive::Inactive => return Exclusive::Inactive,
            Exclusive::Busy(holder) => return Exclusive::Busy(holder),
        };
        let out = callback().await;
        drop(token);
        Exclusive::Ran(out)
    }

    /// Run `callback` if active, without touching the token. For work that
    /// is safe to overlap with a gesture (e.g. highlight redraw).
    pub async fn execute_concurrent<F, Fut, T>(&self, callback: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if !self.is_active() {
            return None;
        }
        Some(callback().await)
    }

    /// Mark the current release as the end of a drag-like gesture.
    pub fn end_gesture(&self) {
        self.gesture_ended.set(true);
    }

    /// Whether the current release ended a gesture. Clears the mark, so
    /// only the first click after the release sees it.
    pub fn take_gesture_end(&self) -> bool {
        self.gesture_ended.replace(false)
    }

    // ─── Transient overlay ───────────────────────────────────────────────

    /// A fresh, unused id for an overlay element.
    pub fn fresh_transient_id(&self, prefix: &str) -> Result<ElementId, EditError> {
        Ok(self.state()?.with_tree_mut(|tree| tree.fresh_id(prefix)))
    }

    pub fn overlay_container(&self) -> Option<ElementId> {
        self.overlay.get()
    }

    /// Append `element` to the overlay container, creating the container
    /// under the document root on first use.
    pub fn append_transient_element(&self, element: Element) -> Result<ElementId, EditError> {
        let state = self.state()?;
        let id = element.id;
        state.with_tree_mut(|tree| {
            let container = match self.overlay.get() {
                Some(c) if tree.get(c).is_some() => c,
                _ => {
                    let c = tree.fresh_id("transient");
                    let document = tree.document();
                    tree.append(
                        document,
                        Element::new(c, ElementRole::TransientContainer, ig_core::ElementKind::Group),
                    )
                    .ok_or(EditError::DuplicateElement(c))?;
                    self.overlay.set(Some(c));
                    log::debug!("created transient overlay {c}");
                    c
                }
            };
            tree.append(container, element)
                .map(|_| id)
                .ok_or(EditError::DuplicateElement(id))
        })
    }

    /// Write `props` onto an overlay element. Non-overlay ids are refused.
    pub fn update_transient_element(&self, id: ElementId, props: &Attrs) -> bool {
        let Ok(state) = self.state() else {
            return false;
        };
        state.with_tree_mut(|tree| {
            if !tree.is_transient(id) {
                log::warn!("refusing overlay write to document element {id}");
                return false;
            }
            match tree.get_mut(id) {
                Some(el) => {
                    el.write_props(props);
                    true
                }
                None => false,
            }
        })
    }

    /// Remove an element previously appended to the overlay.
    pub fn remove_transient_element(&self, id: ElementId) -> bool {
        let Ok(state) = self.state() else {
            return false;
        };
        state.with_tree_mut(|tree| {
            if tree.is_transient(id) && Some(id) != self.overlay.get() {
                tree.remove(id).is_some()
            } else {
                false
            }
        })
    }

    // ─── Teardown ────────────────────────────────────────────────────────

    /// Clear selection, release the token, reset modifiers, drop overlay.
    pub fn destroy(&self) {
        if !self.selection.borrow().is_empty() {
            self.clear_selection();
        }
        self.holder.set(None);
        self.gesture_ended.set(false);
        self.modifiers.reset();
        self.active.set(false);
        if let (Some(container), Ok(state)) = (self.overlay.take(), self.state()) {
            state.with_tree_mut(|tree| tree.remove(container));
        }
        log::debug!("coordinator destroyed");
    }
}
