//! Editor aggregate: wires the state manager, history, coordinator and
//! interactions around one event channel.

use crate::config::EditorConfig;
use crate::coordinator::InteractionCoordinator;
use crate::error::EditError;
use crate::events::EventChannel;
use crate::history::History;
use crate::input::InputEvent;
use crate::interactions::{
    BrushSelect, ClickSelect, DblClickEditText, Drag, Handled, HotkeyHistory, Interaction,
    InteractionRegistry, Resize, SelectionHighlight, ZoomWheel,
};
use crate::state::StateManager;
use ig_core::{Data, ElementId, ElementTree, RenderOptions};
use std::rc::Rc;

/// Shared components handed to every interaction.
pub struct EditorContext {
    pub config: EditorConfig,
    pub events: EventChannel,
    pub state: Rc<StateManager>,
    pub history: Rc<History>,
    pub coordinator: Rc<InteractionCoordinator>,
}

pub struct Editor {
    cx: EditorContext,
    interactions: InteractionRegistry,
}

impl Editor {
    /// Build an editor with the default interaction set.
    pub fn new(config: EditorConfig, data: Data, options: RenderOptions, tree: ElementTree) -> Self {
        let mut editor = Self::bare(config, data, options, tree);
        let defaults: Vec<Box<dyn Interaction>> = vec![
            Box::new(ClickSelect::new()),
            Box::new(DblClickEditText::new()),
            Box::new(Drag::new()),
            Box::new(BrushSelect::new()),
            Box::new(Resize::new()),
            Box::new(ZoomWheel::new()),
            Box::new(HotkeyHistory::new()),
            Box::new(SelectionHighlight::new()),
        ];
        for interaction in defaults {
            // Fresh registry, names are distinct.
            editor.register_override(interaction);
        }
        editor
    }

    /// Build an editor with no interactions registered.
    pub fn bare(config: EditorConfig, data: Data, options: RenderOptions, tree: ElementTree) -> Self {
        let config = config.sanitized();
        let events = EventChannel::new();
        let state = Rc::new(StateManager::new(data, options, tree, events.clone()));
        let history = Rc::new(History::new(&config));
        let coordinator = Rc::new(InteractionCoordinator::new());

        history.init(state.clone(), events.clone());
        coordinator.init(state.clone(), events.clone());
        log::debug!("editor ready (history depth {})", config.history_depth);

        Self {
            cx: EditorContext {
                config,
                events,
                state,
                history,
                coordinator,
            },
            interactions: InteractionRegistry::new(),
        }
    }

    pub fn context(&self) -> &EditorContext {
        &self.cx
    }

    pub fn state(&self) -> &Rc<StateManager> {
        &self.cx.state
    }

    pub fn history(&self) -> &Rc<History> {
        &self.cx.history
    }

    pub fn coordinator(&self) -> &Rc<InteractionCoordinator> {
        &self.cx.coordinator
    }

    pub fn events(&self) -> &EventChannel {
        &self.cx.events
    }

    /// Register and attach `interaction`. A duplicate name is rejected
    /// before anything is attached.
    pub fn register(&mut self, interaction: Box<dyn Interaction>) -> Result<(), EditError> {
        let name = interaction.id().name();
        self.interactions.register(interaction)?;
        self.attach(name);
        Ok(())
    }

    /// Register `interaction`, destroying any interaction it replaces.
    pub fn register_override(&mut self, interaction: Box<dyn Interaction>) {
        let name = interaction.id().name();
        if let Some(mut replaced) = self.interactions.register_override(interaction) {
            replaced.destroy(&self.cx);
        }
        self.attach(name);
    }

    fn attach(&mut self, name: &str) {
        if let Some(interaction) = self.interactions.get_mut(name) {
            interaction.attach(&self.cx);
        }
    }

    pub fn interaction_names(&self) -> Vec<&'static str> {
        self.interactions.names()
    }

    /// Topmost element at a document point, for hosts that do not resolve
    /// pointer targets themselves.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<ElementId> {
        self.cx
            .state
            .with_tree(|tree| ig_core::hit::hit_test(tree, x, y))
    }

    /// Route one input event. Updates modifier and activation state first,
    /// then offers the event to every interaction in registration order.
    ///
    /// Returns whether the host should suppress the event's default action.
    /// A failing interaction does not stop later ones; the first error is
    /// returned after all have run.
    pub async fn dispatch(&mut self, event: &InputEvent) -> Result<bool, EditError> {
        self.cx.coordinator.observe(event);
        let mut prevent_default = false;
        let mut first_error = None;
        for interaction in self.interactions.iter_mut() {
            match interaction.handle(event, &self.cx).await {
                Ok(Handled::PreventDefault) => prevent_default = true,
                Ok(Handled::Consumed | Handled::Ignored) => {}
                Err(e) => {
                    log::error!("{} failed on {event:?}: {e}", interaction.id());
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(prevent_default),
        }
    }

    /// Cancel gestures, drop interactions, clear selection and history,
    /// and detach every event subscriber.
    pub fn destroy(&mut self) {
        self.interactions.destroy_all(&self.cx);
        self.cx.coordinator.destroy();
        self.cx.history.clear();
        self.cx.events.clear();
        log::debug!("editor destroyed");
    }
}
