//! Error types for the editing core.

use ig_core::{ElementId, ElementRole, IndexPath};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditError {
    #[error("no item at index path {0:?}")]
    InvalidPath(IndexPath),

    #[error("element {0} is not in the document")]
    UnknownElement(ElementId),

    #[error("element {id} has role {role:?}, which is not backed by document data")]
    UnsupportedRole { id: ElementId, role: ElementRole },

    #[error("element {0} is already in the document")]
    DuplicateElement(ElementId),

    #[error("element {0} carries no index path")]
    MissingIndexes(ElementId),

    #[error("invalid value {value:?} for {field}")]
    InvalidValue { field: &'static str, value: String },

    #[error("{0} used before init")]
    NotInitialized(&'static str),

    #[error("interaction `{0}` is already registered")]
    DuplicateInteraction(String),

    #[error("batch child {index} failed: {source}")]
    BatchFailed {
        index: usize,
        #[source]
        source: Box<EditError>,
    },

    #[error("invalid editor config: {0}")]
    Config(#[from] serde_json::Error),
}
