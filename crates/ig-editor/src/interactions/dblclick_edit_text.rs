use super::{Handled, Interaction};
use crate::commands::UpdateText;
use crate::coordinator::{Exclusive, ExclusiveToken, InteractionId};
use crate::editor::EditorContext;
use crate::error::EditError;
use crate::input::InputEvent;
use async_trait::async_trait;
use ig_core::{ElementId, ElementTree};
use ig_core::hit::resolve_editable;

struct EditSession {
    element: ElementId,
    original: String,
    text: String,
    _token: ExclusiveToken,
}

/// Inline text editing.
///
/// Double-click on a text element opens a session that holds the token.
/// `TextInput` rewrites the live element; Enter or a click elsewhere
/// commits one `UpdateText`; Escape or cancel restores the original text.
pub struct DblClickEditText {
    id: InteractionId,
    session: Option<EditSession>,
}

impl DblClickEditText {
    pub fn new() -> Self {
        Self {
            id: InteractionId::new("dblclick-edit-text"),
            session: None,
        }
    }

    pub fn editing(&self) -> Option<ElementId> {
        self.session.as_ref().map(|s| s.element)
    }

    fn begin(
        &mut self,
        target: Option<ElementId>,
        cx: &EditorContext,
    ) -> Result<Handled, EditError> {
        let is_text = |tree: &ElementTree, id: ElementId| {
            tree.get(id).is_some_and(|el| el.role.is_text())
        };
        let Some(element) = target.and_then(|t| {
            cx.state
                .with_tree(|tree| resolve_editable(tree, t).filter(|id| is_text(tree, *id)))
        }) else {
            return Ok(Handled::Ignored);
        };
        let token = match cx.coordinator.acquire(self.id) {
            Exclusive::Ran(token) => token,
            Exclusive::Inactive | Exclusive::Busy(_) => return Ok(Handled::Ignored),
        };
        let original = cx.state.element_text(element)?;
        log::debug!("text edit started on {element}");
        self.session = Some(EditSession {
            element,
            text: original.clone(),
            original,
            _token: token,
        });
        Ok(Handled::Consumed)
    }

    async fn commit(&mut self, cx: &EditorContext) -> Result<(), EditError> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        if session.text == session.original {
            log::debug!("text edit on {} closed without change", session.element);
            return Ok(());
        }
        log::debug!("text edit on {} committed", session.element);
        let command =
            UpdateText::with_original(&cx.state, session.element, &session.text, &session.original)?;
        let result = cx.history.execute(Box::new(command)).await;
        if result.is_err() {
            // Leave the element showing what the document holds.
            cx.state.set_element_text(session.element, &session.original)?;
        }
        result
    }

    fn cancel(&mut self, cx: &EditorContext) -> Result<(), EditError> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        log::debug!("text edit on {} cancelled", session.element);
        cx.state.set_element_text(session.element, &session.original)
    }
}

impl Default for DblClickEditText {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Interaction for DblClickEditText {
    fn id(&self) -> InteractionId {
        self.id
    }

    async fn handle(
        &mut self,
        event: &InputEvent,
        cx: &EditorContext,
    ) -> Result<Handled, EditError> {
        let Some(element) = self.editing() else {
            return match event {
                InputEvent::DoubleClick { target, .. } => self.begin(*target, cx),
                _ => Ok(Handled::Ignored),
            };
        };

        match event {
            InputEvent::TextInput { text } => {
                cx.state.set_element_text(element, text)?;
                if let Some(session) = &mut self.session {
                    session.text = text.clone();
                }
                Ok(Handled::Consumed)
            }
            InputEvent::KeyDown { key, modifiers } if key == "Enter" && !modifiers.shift => {
                self.commit(cx).await?;
                Ok(Handled::PreventDefault)
            }
            InputEvent::KeyDown { key, .. } if key == "Escape" => {
                self.cancel(cx)?;
                Ok(Handled::PreventDefault)
            }
            InputEvent::Click { target, .. } if *target != Some(element) => {
                self.commit(cx).await?;
                Ok(Handled::Consumed)
            }
            InputEvent::Cancel => {
                self.cancel(cx)?;
                Ok(Handled::Consumed)
            }
            _ => Ok(Handled::Ignored),
        }
    }

    fn destroy(&mut self, cx: &EditorContext) {
        if let Err(e) = self.cancel(cx) {
            log::warn!("text edit teardown: {e}");
        }
    }
}
