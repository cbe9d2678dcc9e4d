//! Undo/Redo history.
//!
//! Commands are applied on `execute` and pushed to the undo stack; undo pops
//! and reverts, redo re-applies. A fresh `execute` clears the redo stack.
//!
//! Transitions run one at a time: each acquires a FIFO gate before touching
//! a stack, so a second `execute` waits until the first command's apply has
//! settled. A command only reaches a stack after its apply/undo succeeded.

use crate::commands::{Batch, Command, CommandRecord};
use crate::config::EditorConfig;
use crate::error::EditError;
use crate::events::{EditorEvent, EventChannel};
use crate::state::StateManager;
use std::cell::{OnceCell, RefCell};
use std::rc::Rc;
use tokio::sync::Mutex;

pub struct History {
    state: OnceCell<Rc<StateManager>>,
    events: OnceCell<EventChannel>,
    undo_stack: RefCell<Vec<Box<dyn Command>>>,
    redo_stack: RefCell<Vec<Box<dyn Command>>>,
    /// Maximum undo depth. 0 keeps every entry.
    max_depth: usize,
    gate: Mutex<()>,
}

impl History {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            state: OnceCell::new(),
            events: OnceCell::new(),
            undo_stack: RefCell::new(Vec::new()),
            redo_stack: RefCell::new(Vec::new()),
            max_depth: config.history_depth,
            gate: Mutex::new(()),
        }
    }

    pub fn init(&self, state: Rc<StateManager>, events: EventChannel) {
        if self.state.set(state).is_err() || self.events.set(events).is_err() {
            log::warn!("history initialised twice; keeping the first peers");
        }
    }

    fn state(&self) -> Result<Rc<StateManager>, EditError> {
        self.state
            .get()
            .cloned()
            .ok_or(EditError::NotInitialized("History"))
    }

    /// Apply `command` and push it to the undo stack.
    pub async fn execute(&self, mut command: Box<dyn Command>) -> Result<(), EditError> {
        let state = self.state()?;
        let _gate = self.gate.lock().await;

        let description = command.description();
        if let Err(e) = command.apply(&state).await {
            log::error!("{description} failed: {e}");
            return Err(e);
        }
        log::debug!("execute: {description}");

        {
            let mut undo = self.undo_stack.borrow_mut();
            undo.push(command);
            if self.max_depth > 0 && undo.len() > self.max_depth {
                undo.remove(0);
            }
        }
        // Clear redo stack on new action
        self.redo_stack.borrow_mut().clear();
        self.notify();
        Ok(())
    }

    /// Wrap `commands` in one [`Batch`] entry. An empty list does nothing.
    pub async fn execute_batch(&self, commands: Vec<Box<dyn Command>>) -> Result<(), EditError> {
        if commands.is_empty() {
            return Ok(());
        }
        self.execute(Box::new(Batch::new(commands))).await
    }

    /// Undo the last command. Returns its description, or `None` when the
    /// undo stack is empty.
    pub async fn undo(&self) -> Result<Option<String>, EditError> {
        let state = self.state()?;
        let _gate = self.gate.lock().await;

        let Some(mut command) = self.undo_stack.borrow_mut().pop() else {
            return Ok(None);
        };
        let description = command.description();
        if let Err(e) = command.undo(&state).await {
            log::error!("undo of {description} failed: {e}");
            self.undo_stack.borrow_mut().push(command);
            return Err(e);
        }
        log::debug!("undo: {description}");
        self.redo_stack.borrow_mut().push(command);
        self.notify();
        Ok(Some(description))
    }

    /// Redo the last undone command.
    pub async fn redo(&self) -> Result<Option<String>, EditError> {
        let state = self.state()?;
        let _gate = self.gate.lock().await;

        let Some(mut command) = self.redo_stack.borrow_mut().pop() else {
            return Ok(None);
        };
        let description = command.description();
        if let Err(e) = command.apply(&state).await {
            log::error!("redo of {description} failed: {e}");
            self.redo_stack.borrow_mut().push(command);
            return Err(e);
        }
        log::debug!("redo: {description}");
        self.undo_stack.borrow_mut().push(command);
        self.notify();
        Ok(Some(description))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.borrow().is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.borrow().is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.borrow().len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.borrow().len()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.borrow().last().map(|c| c.description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.borrow().last().map(|c| c.description())
    }

    /// The undo stack, oldest first.
    pub fn serialize(&self) -> Vec<CommandRecord> {
        self.undo_stack
            .borrow()
            .iter()
            .map(|c| c.serialize())
            .collect()
    }

    /// Drop both stacks without undoing or applying anything.
    pub fn clear(&self) {
        self.undo_stack.borrow_mut().clear();
        self.redo_stack.borrow_mut().clear();
        log::debug!("history cleared");
        self.notify();
    }

    fn notify(&self) {
        if let Some(events) = self.events.get() {
            events.emit(EditorEvent::HistoryChange {
                can_undo: self.can_undo(),
                can_redo: self.can_redo(),
            });
        }
    }
}
