use super::{Handled, Interaction};
use crate::coordinator::{Exclusive, InteractionId, SelectMode};
use crate::editor::EditorContext;
use crate::error::EditError;
use crate::input::InputEvent;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use async_trait::async_trait;
use ig_core::hit::resolve_editable;

/// Click replaces the selection with the clicked element, Shift+click
/// toggles it, a click on nothing editable clears. Escape also clears.
/// The click a host fires after a drag, resize or brush release is
/// skipped.
pub struct ClickSelect {
    id: InteractionId,
}

impl ClickSelect {
    pub fn new() -> Self {
        Self {
            id: InteractionId::new("click-select"),
        }
    }
}

impl Default for ClickSelect {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Interaction for ClickSelect {
    fn id(&self) -> InteractionId {
        self.id
    }

    async fn handle(
        &mut self,
        event: &InputEvent,
        cx: &EditorContext,
    ) -> Result<Handled, EditError> {
        let coordinator = &cx.coordinator;
        match event {
            InputEvent::Click { target, .. } => {
                if coordinator.take_gesture_end() {
                    log::trace!("click after a drag-like release, selection kept");
                    return Ok(Handled::Ignored);
                }
                // Overlay visuals (handles) belong to other gestures.
                if target.is_some_and(|t| cx.state.with_tree(|tree| tree.is_transient(t))) {
                    return Ok(Handled::Ignored);
                }
                let resolved =
                    target.and_then(|t| cx.state.with_tree(|tree| resolve_editable(tree, t)));
                let shift = coordinator.modifiers().shift();
                let outcome = coordinator
                    .execute_exclusive(self.id, || async move {
                        match resolved {
                            Some(id) if shift => {
                                coordinator.select(&[id], SelectMode::Toggle);
                            }
                            Some(id) => {
                                coordinator.select(&[id], SelectMode::Replace);
                            }
                            None => coordinator.clear_selection(),
                        }
                    })
                    .await;
                Ok(match outcome {
                    Exclusive::Ran(()) => Handled::Consumed,
                    Exclusive::Inactive | Exclusive::Busy(_) => Handled::Ignored,
                })
            }
            InputEvent::KeyDown { key, modifiers } => {
                if ShortcutMap::resolve(key, *modifiers) != Some(ShortcutAction::Deselect) {
                    return Ok(Handled::Ignored);
                }
                let outcome = coordinator
                    .execute_exclusive(self.id, || async move { coordinator.clear_selection() })
                    .await;
                Ok(match outcome {
                    Exclusive::Ran(()) => Handled::Consumed,
                    Exclusive::Inactive | Exclusive::Busy(_) => Handled::Ignored,
                })
            }
            _ => Ok(Handled::Ignored),
        }
    }
}
