//! Interaction system.
//!
//! Each interaction is a self-contained gesture: it reads input events,
//! asks the coordinator for the exclusivity token, gives live feedback by
//! writing the element directly, and on completion hands commands to the
//! history.
//!
//! | Interaction | Trigger | Token | Produces |
//! |-------------|---------|-------|----------|
//! | [`ClickSelect`] | click | per event | selection |
//! | [`DblClickEditText`] | double-click on text | whole session | `UpdateText` |
//! | [`Drag`] | press on element | whole gesture | batch of `UpdateElement` |
//! | [`BrushSelect`] | press on empty space | whole gesture | selection |
//! | [`Resize`] | press on handle | whole gesture | `UpdateElement` |
//! | [`ZoomWheel`] | Mod + wheel | per event | viewBox (no history) |
//! | [`HotkeyHistory`] | Mod+Z / Mod+Shift+Z / Mod+Y | per event | undo / redo |
//! | [`SelectionHighlight`] | any event, selection or history change | never | overlay masks |

mod brush_select;
mod click_select;
mod dblclick_edit_text;
mod drag;
mod highlight;
mod hotkey_history;
mod resize;
mod zoom_wheel;

pub use brush_select::BrushSelect;
pub use click_select::ClickSelect;
pub use dblclick_edit_text::DblClickEditText;
pub use drag::Drag;
pub use highlight::SelectionHighlight;
pub use hotkey_history::HotkeyHistory;
pub use resize::Resize;
pub use zoom_wheel::ZoomWheel;

use crate::coordinator::InteractionId;
use crate::editor::EditorContext;
use crate::error::EditError;
use crate::events::EditorEvent;
use crate::input::InputEvent;
use async_trait::async_trait;

/// What an interaction did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// Not relevant to this interaction.
    Ignored,
    Consumed,
    /// Consumed, and the host should suppress its default action.
    PreventDefault,
}

#[async_trait(?Send)]
pub trait Interaction {
    fn id(&self) -> InteractionId;

    async fn handle(&mut self, event: &InputEvent, cx: &EditorContext)
    -> Result<Handled, EditError>;

    /// Called once the interaction is registered with an editor. Overlay
    /// interactions subscribe here so they follow changes that arrive
    /// without input, such as a programmatic undo.
    fn attach(&mut self, _cx: &EditorContext) {}

    /// Abandon any gesture in progress and drop subscriptions. Must not
    /// submit a command.
    fn destroy(&mut self, _cx: &EditorContext) {}
}

/// Events after which overlay visuals may sit on stale bounds.
pub(crate) fn moves_overlay(event: &EditorEvent) -> bool {
    matches!(
        event,
        EditorEvent::SelectionChange(_)
            | EditorEvent::UpdateElement { .. }
            | EditorEvent::HistoryChange { .. }
    )
}

/// Ordered set of interactions, unique by name.
#[derive(Default)]
pub struct InteractionRegistry {
    entries: Vec<Box<dyn Interaction>>,
}

impl InteractionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `interaction`. A second interaction with the same name is
    /// rejected.
    pub fn register(&mut self, interaction: Box<dyn Interaction>) -> Result<(), EditError> {
        let name = interaction.id().name();
        if self.position(name).is_some() {
            log::warn!("interaction `{name}` registered twice");
            return Err(EditError::DuplicateInteraction(name.to_string()));
        }
        log::debug!("registered interaction `{name}`");
        self.entries.push(interaction);
        Ok(())
    }

    /// Register `interaction`, replacing (in place) any existing one with
    /// the same name. Returns the replaced interaction.
    pub fn register_override(
        &mut self,
        interaction: Box<dyn Interaction>,
    ) -> Option<Box<dyn Interaction>> {
        let name = interaction.id().name();
        match self.position(name) {
            Some(i) => {
                log::debug!("overriding interaction `{name}`");
                Some(std::mem::replace(&mut self.entries[i], interaction))
            }
            None => {
                self.entries.push(interaction);
                None
            }
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|i| i.id().name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Box<dyn Interaction>> {
        let i = self.position(name)?;
        self.entries.get_mut(i)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|i| i.id().name()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Interaction>> {
        self.entries.iter_mut()
    }

    /// Destroy and drop every interaction.
    pub fn destroy_all(&mut self, cx: &EditorContext) {
        for interaction in &mut self.entries {
            interaction.destroy(cx);
        }
        self.entries.clear();
    }
}
