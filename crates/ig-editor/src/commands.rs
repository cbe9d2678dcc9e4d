//! Reversible edit commands.
//!
//! Every edit is wrapped in a [`Command`] that captures enough original
//! data to undo itself exactly. `apply` and `undo` may suspend once (to let
//! layout settle) and must each be called once per stack transition.
//! `serialize` is pure and never exposes live handles, only id strings.

use crate::error::EditError;
use crate::state::StateManager;
use async_trait::async_trait;
use ig_core::element::{HREF_KEY, TEXT_KEY};
use ig_core::{Attrs, ElementId, ElementRole, IndexPath, ItemPatch, RenderOptions};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

#[async_trait(?Send)]
pub trait Command: fmt::Debug {
    async fn apply(&mut self, state: &StateManager) -> Result<(), EditError>;

    async fn undo(&mut self, state: &StateManager) -> Result<(), EditError>;

    fn serialize(&self) -> CommandRecord;

    /// Human-readable label, e.g. for an "Undo …" menu entry.
    fn description(&self) -> String {
        self.serialize().kind().replace('-', " ")
    }
}

/// Plain structured form of a command, for logging and diffing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CommandRecord {
    UpdateElement {
        id: ElementId,
        role: ElementRole,
        original: Attrs,
        modified: Attrs,
    },
    UpdateText {
        id: ElementId,
        role: ElementRole,
        original: String,
        text: String,
    },
    UpdateOptions {
        original: Option<RenderOptions>,
        options: RenderOptions,
    },
    Batch {
        commands: Vec<CommandRecord>,
    },
}

impl CommandRecord {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UpdateElement { .. } => "update-element",
            Self::UpdateText { .. } => "update-text",
            Self::UpdateOptions { .. } => "update-options",
            Self::Batch { .. } => "batch",
        }
    }
}

// ─── Update-Element ──────────────────────────────────────────────────────

/// Change attributes of one element, mirrored into its attribute bag.
#[derive(Debug, Clone)]
pub struct UpdateElement {
    id: ElementId,
    role: ElementRole,
    original: Attrs,
    modified: Attrs,
}

impl UpdateElement {
    /// Capture the current values of exactly the keys in `modified`.
    pub fn new(state: &StateManager, id: ElementId, modified: Attrs) -> Result<Self, EditError> {
        let role = data_role(state, id)?;
        let original = state.element_props(id, modified.keys())?;
        Ok(Self {
            id,
            role,
            original,
            modified,
        })
    }

    /// Use an explicit original, for gestures that already mutated the
    /// live element.
    pub fn with_original(
        state: &StateManager,
        id: ElementId,
        original: Attrs,
        modified: Attrs,
    ) -> Result<Self, EditError> {
        let role = data_role(state, id)?;
        Ok(Self {
            id,
            role,
            original,
            modified,
        })
    }

    /// Validate first, so a stale path fails before the live element moves.
    async fn write(&self, state: &StateManager, props: &Attrs) -> Result<(), EditError> {
        let path = state.data_target(self.id)?;
        state.write_element_props(self.id, props)?;
        let bag = bag_props(props);
        if !bag.is_empty() {
            state.update_element(self.id, &bag)?;
        }
        // An icon's reference is the item's `icon` field, not a bag entry.
        if let (true, Some(path), Some(href)) = (
            self.role.is_icon(),
            path,
            props.get(HREF_KEY).and_then(Value::as_str),
        ) {
            let patch = ItemPatch {
                icon: Some(href.to_string()),
                ..ItemPatch::default()
            };
            state.update_item_datum(&path, patch)?;
        }
        state.settle().await;
        Ok(())
    }
}

#[async_trait(?Send)]
impl Command for UpdateElement {
    async fn apply(&mut self, state: &StateManager) -> Result<(), EditError> {
        self.write(state, &self.modified).await
    }

    async fn undo(&mut self, state: &StateManager) -> Result<(), EditError> {
        self.write(state, &self.original).await
    }

    fn serialize(&self) -> CommandRecord {
        CommandRecord::UpdateElement {
            id: self.id,
            role: self.role,
            original: self.original.clone(),
            modified: self.modified.clone(),
        }
    }

    fn description(&self) -> String {
        format!("Update {}", self.id)
    }
}

fn data_role(state: &StateManager, id: ElementId) -> Result<ElementRole, EditError> {
    let role = state
        .element(id)
        .map(|el| el.role)
        .ok_or(EditError::UnknownElement(id))?;
    if !role.is_editable() {
        return Err(EditError::UnsupportedRole { id, role });
    }
    Ok(role)
}

/// Content keys live on the element itself, not in the attribute bag.
fn bag_props(props: &Attrs) -> Attrs {
    props
        .iter()
        .filter(|(k, _)| k.as_str() != TEXT_KEY && k.as_str() != HREF_KEY)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

// ─── Update-Text ─────────────────────────────────────────────────────────

/// Replace the text of a text-bearing element and its backing field.
#[derive(Debug, Clone)]
pub struct UpdateText {
    id: ElementId,
    role: ElementRole,
    original: String,
    text: String,
}

impl UpdateText {
    /// Capture the element's current text as the original.
    pub fn new(state: &StateManager, id: ElementId, text: &str) -> Result<Self, EditError> {
        let original = state.element_text(id)?;
        Self::with_original(state, id, text, &original)
    }

    pub fn with_original(
        state: &StateManager,
        id: ElementId,
        text: &str,
        original: &str,
    ) -> Result<Self, EditError> {
        let role = state
            .element(id)
            .map(|el| el.role)
            .ok_or(EditError::UnknownElement(id))?;
        if !role.is_text() {
            return Err(EditError::UnsupportedRole { id, role });
        }
        Ok(Self {
            id,
            role,
            original: original.to_string(),
            text: text.to_string(),
        })
    }

    async fn write(&self, state: &StateManager, text: &str) -> Result<(), EditError> {
        if let Some(field) = self.role.item_field() {
            let indexes: IndexPath = state
                .element(self.id)
                .and_then(|el| el.indexes)
                .ok_or(EditError::MissingIndexes(self.id))?;
            // Validate before touching the live element.
            if state.data().item(&indexes).is_none() {
                return Err(EditError::InvalidPath(indexes));
            }
            let patch = ItemPatch::from_text(field, text).map_err(|_| EditError::InvalidValue {
                field: field.as_str(),
                value: text.to_string(),
            })?;
            state.set_element_text(self.id, text)?;
            state.update_item_datum(&indexes, patch)?;
        } else if let Some(field) = self.role.data_field() {
            state.set_element_text(self.id, text)?;
            state.update_data(field, Some(text.to_string()));
        } else {
            return Err(EditError::UnsupportedRole {
                id: self.id,
                role: self.role,
            });
        }
        state.settle().await;
        Ok(())
    }
}

#[async_trait(?Send)]
impl Command for UpdateText {
    async fn apply(&mut self, state: &StateManager) -> Result<(), EditError> {
        self.write(state, &self.text).await
    }

    async fn undo(&mut self, state: &StateManager) -> Result<(), EditError> {
        self.write(state, &self.original).await
    }

    fn serialize(&self) -> CommandRecord {
        CommandRecord::UpdateText {
            id: self.id,
            role: self.role,
            original: self.original.clone(),
            text: self.text.clone(),
        }
    }

    fn description(&self) -> String {
        format!("Edit text of {}", self.id)
    }
}

// ─── Update-Options ──────────────────────────────────────────────────────

/// Merge a partial render-option set; undo restores the whole original set.
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    options: RenderOptions,
    original: Option<RenderOptions>,
}

impl UpdateOptions {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            original: None,
        }
    }

    pub fn with_original(options: RenderOptions, original: RenderOptions) -> Self {
        Self {
            options,
            original: Some(original),
        }
    }
}

#[async_trait(?Send)]
impl Command for UpdateOptions {
    async fn apply(&mut self, state: &StateManager) -> Result<(), EditError> {
        let mut next = state.options();
        if self.original.is_none() {
            self.original = Some(next.clone());
        }
        next.merge(&self.options);
        state.update_options(next);
        state.settle().await;
        Ok(())
    }

    async fn undo(&mut self, state: &StateManager) -> Result<(), EditError> {
        match &self.original {
            Some(original) => {
                state.update_options(original.clone());
                state.settle().await;
            }
            None => log::warn!("update-options undone before it was applied"),
        }
        Ok(())
    }

    fn serialize(&self) -> CommandRecord {
        CommandRecord::UpdateOptions {
            original: self.original.clone(),
            options: self.options.clone(),
        }
    }
}

// ─── Batch ───────────────────────────────────────────────────────────────

/// Ordered group of commands treated as one history entry.
///
/// A failing child aborts the batch with [`EditError::BatchFailed`]; the
/// children that already ran are not rolled back.
#[derive(Debug, Default)]
pub struct Batch {
    commands: Vec<Box<dyn Command>>,
}

impl Batch {
    pub fn new(commands: Vec<Box<dyn Command>>) -> Self {
        Self { commands }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

fn batch_failed(index: usize, source: EditError) -> EditError {
    log::error!("batch child {index} failed, earlier children stay applied: {source}");
    EditError::BatchFailed {
        index,
        source: Box::new(source),
    }
}

#[async_trait(?Send)]
impl Command for Batch {
    async fn apply(&mut self, state: &StateManager) -> Result<(), EditError> {
        for (index, command) in self.commands.iter_mut().enumerate() {
            command
                .apply(state)
                .await
                .map_err(|e| batch_failed(index, e))?;
        }
        Ok(())
    }

    async fn undo(&mut self, state: &StateManager) -> Result<(), EditError> {
        for (index, command) in self.commands.iter_mut().enumerate().rev() {
            command
                .undo(state)
                .await
                .map_err(|e| batch_failed(index, e))?;
        }
        Ok(())
    }

    fn serialize(&self) -> CommandRecord {
        CommandRecord::Batch {
            commands: self.commands.iter().map(|c| c.serialize()).collect(),
        }
    }

    fn description(&self) -> String {
        match self.commands.as_slice() {
            [only] => only.description(),
            _ => format!("{} edits", self.commands.len()),
        }
    }
}
