pub mod element;
pub mod hit;
pub mod id;
pub mod model;
pub mod role;

pub use element::{Element, ElementKind, ElementTree};
pub use id::ElementId;
pub use model::*;
pub use role::{ElementRole, HandlePos, RoleScope};

// Re-export geometry so downstream crates share one `Rect` type.
pub use kurbo::{Point, Rect};
