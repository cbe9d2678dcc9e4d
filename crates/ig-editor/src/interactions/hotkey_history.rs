use super::{Handled, Interaction};
use crate::coordinator::{Exclusive, InteractionId};
use crate::editor::EditorContext;
use crate::error::EditError;
use crate::input::InputEvent;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use async_trait::async_trait;

/// Mod+Z undoes, Mod+Shift+Z and Mod+Y redo. Only while the editor is
/// active; a bound key always asks the host to suppress its default.
pub struct HotkeyHistory {
    id: InteractionId,
}

impl HotkeyHistory {
    pub fn new() -> Self {
        Self {
            id: InteractionId::new("hotkey-history"),
        }
    }
}

impl Default for HotkeyHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Interaction for HotkeyHistory {
    fn id(&self) -> InteractionId {
        self.id
    }

    async fn handle(
        &mut self,
        event: &InputEvent,
        cx: &EditorContext,
    ) -> Result<Handled, EditError> {
        let InputEvent::KeyDown { key, modifiers } = event else {
            return Ok(Handled::Ignored);
        };
        let action = match ShortcutMap::resolve(key, *modifiers) {
            Some(action @ (ShortcutAction::Undo | ShortcutAction::Redo)) => action,
            _ => return Ok(Handled::Ignored),
        };
        let history = &cx.history;
        let outcome = cx
            .coordinator
            .execute_exclusive(self.id, || async move {
                match action {
                    ShortcutAction::Redo => history.redo().await,
                    _ => history.undo().await,
                }
            })
            .await;
        match outcome {
            Exclusive::Ran(result) => {
                if result?.is_none() {
                    log::debug!("{action:?}: nothing to do");
                }
                Ok(Handled::PreventDefault)
            }
            Exclusive::Busy(holder) => {
                log::debug!("{action:?} ignored while {holder} is running");
                Ok(Handled::PreventDefault)
            }
            Exclusive::Inactive => Ok(Handled::Ignored),
        }
    }
}
