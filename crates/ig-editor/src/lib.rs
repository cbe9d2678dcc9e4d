pub mod commands;
pub mod config;
pub mod coordinator;
pub mod editor;
pub mod error;
pub mod events;
pub mod history;
pub mod input;
pub mod interactions;
pub mod shortcuts;
pub mod snap;
pub mod state;

pub use commands::{Batch, Command, CommandRecord, UpdateElement, UpdateOptions, UpdateText};
pub use config::EditorConfig;
pub use coordinator::{Exclusive, ExclusiveToken, InteractionCoordinator, InteractionId, SelectMode};
pub use editor::{Editor, EditorContext};
pub use error::EditError;
pub use events::{EditorEvent, EventChannel, SubscriptionId};
pub use history::History;
pub use input::{InputEvent, Modifiers, PointerButton};
pub use interactions::{Handled, Interaction, InteractionRegistry};
pub use state::StateManager;
