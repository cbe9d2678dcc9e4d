use super::{Handled, Interaction, moves_overlay};
use crate::coordinator::{InteractionCoordinator, InteractionId};
use crate::editor::EditorContext;
use crate::error::EditError;
use crate::events::SubscriptionId;
use crate::input::InputEvent;
use crate::state::StateManager;
use async_trait::async_trait;
use ig_core::{Attrs, Element, ElementId, ElementKind, ElementRole, Rect};
use serde_json::json;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Selected element -> its overlay mask.
type Masks = Rc<RefCell<HashMap<ElementId, ElementId>>>;

/// One overlay mask per selected element, kept on its current bounds.
///
/// Runs concurrently with gestures: it only touches the overlay, so it
/// never takes the exclusivity token. Besides input events it redraws on
/// selection, element and history changes, so masks follow an undo made
/// outside any gesture.
pub struct SelectionHighlight {
    id: InteractionId,
    masks: Masks,
    subscription: Option<SubscriptionId>,
}

impl SelectionHighlight {
    pub fn new() -> Self {
        Self {
            id: InteractionId::new("selection-highlight"),
            masks: Rc::default(),
            subscription: None,
        }
    }

    /// Mask id for a highlighted element.
    pub fn mask_of(&self, element: ElementId) -> Option<ElementId> {
        self.masks.borrow().get(&element).copied()
    }
}

impl Default for SelectionHighlight {
    fn default() -> Self {
        Self::new()
    }
}

fn redraw(
    masks: &RefCell<HashMap<ElementId, ElementId>>,
    state: &StateManager,
    coordinator: &InteractionCoordinator,
) -> Result<(), EditError> {
    let selection = coordinator.selection();

    let stale: Vec<ElementId> = {
        let mut masks = masks.borrow_mut();
        let gone: Vec<ElementId> = masks
            .keys()
            .filter(|id| !selection.contains(id))
            .copied()
            .collect();
        gone.iter().filter_map(|id| masks.remove(id)).collect()
    };
    for mask in stale {
        coordinator.remove_transient_element(mask);
    }

    for id in selection {
        let Some(bounds) = state.with_tree(|tree| tree.bounds(id)) else {
            continue;
        };
        let current = masks.borrow().get(&id).copied();
        match current {
            Some(mask) if state.element(mask).is_some() => {
                coordinator.update_transient_element(mask, &rect_props(bounds));
            }
            _ => {
                let mask = Element::new(
                    coordinator.fresh_transient_id("highlight")?,
                    ElementRole::Highlight,
                    ElementKind::Shape,
                )
                .with_rect(bounds.x0, bounds.y0, bounds.width(), bounds.height());
                let mask = coordinator.append_transient_element(mask)?;
                masks.borrow_mut().insert(id, mask);
            }
        }
    }
    Ok(())
}

fn rect_props(rect: Rect) -> Attrs {
    let mut attrs = Attrs::new();
    attrs.insert("x".into(), json!(rect.x0));
    attrs.insert("y".into(), json!(rect.y0));
    attrs.insert("width".into(), json!(rect.width()));
    attrs.insert("height".into(), json!(rect.height()));
    attrs
}

#[async_trait(?Send)]
impl Interaction for SelectionHighlight {
    fn id(&self) -> InteractionId {
        self.id
    }

    async fn handle(
        &mut self,
        _event: &InputEvent,
        cx: &EditorContext,
    ) -> Result<Handled, EditError> {
        let masks = &self.masks;
        match cx
            .coordinator
            .execute_concurrent(|| async move { redraw(masks, &cx.state, &cx.coordinator) })
            .await
        {
            Some(result) => result.map(|()| Handled::Ignored),
            None => Ok(Handled::Ignored),
        }
    }

    fn attach(&mut self, cx: &EditorContext) {
        let masks = self.masks.clone();
        let state = Rc::downgrade(&cx.state);
        let coordinator = Rc::downgrade(&cx.coordinator);
        let subscription = cx.events.subscribe_all(move |event| {
            if !moves_overlay(event) {
                return;
            }
            let (Some(state), Some(coordinator)) = (state.upgrade(), coordinator.upgrade()) else {
                return;
            };
            if !coordinator.is_active() {
                return;
            }
            if let Err(e) = redraw(&masks, &state, &coordinator) {
                log::warn!("highlight redraw after {} failed: {e}", event.name());
            }
        });
        self.subscription = Some(subscription);
    }

    fn destroy(&mut self, cx: &EditorContext) {
        if let Some(subscription) = self.subscription.take() {
            cx.events.unsubscribe(subscription);
        }
        let masks: Vec<ElementId> = self.masks.borrow_mut().drain().map(|(_, m)| m).collect();
        for mask in masks {
            cx.coordinator.remove_transient_element(mask);
        }
    }
}
