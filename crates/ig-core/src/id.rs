//! Host element references.
//!
//! The layout engine names every element it renders (`title`, `item-0`,
//! `item-0-label`, ...). Those names are the only identity an element has
//! outside the live tree: commands and events carry them, and a serialized
//! command never holds a live node.
//!
//! Names are interned so an [`ElementId`] is a `Copy` key. Overlay ids are
//! not minted here; [`ElementTree::fresh_id`](crate::ElementTree::fresh_id)
//! numbers them per document.

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static NAMES: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Reference to one rendered element, by name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct ElementId(Spur);

impl ElementId {
    pub fn intern(name: &str) -> Self {
        Self(NAMES.get_or_intern(name))
    }

    pub fn as_str(&self) -> &'static str {
        NAMES.resolve(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(name: &str) -> Self {
        Self::intern(name)
    }
}

impl From<String> for ElementId {
    fn from(name: String) -> Self {
        Self::intern(&name)
    }
}

impl From<ElementId> for String {
    fn from(id: ElementId) -> Self {
        id.as_str().to_string()
    }
}

impl AsRef<str> for ElementId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
