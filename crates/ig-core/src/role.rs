//! Structural roles of rendered elements.
//!
//! The layout engine tags every element it produces with a role. Editing
//! code uses the role to decide where an element's data lives: inside the
//! hierarchical item list (item-scoped roles, addressed by the element's
//! index path) or on the document itself (top-level roles).

use crate::model::{DataField, ItemField};
use serde::{Deserialize, Serialize};

/// Where the data behind a role is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleScope {
    /// Item-scoped; the attribute bag key inside `item.attributes`.
    Item(&'static str),
    /// Singleton; the attribute bag key inside `data.attributes`.
    TopLevel(&'static str),
    /// Not backed by document data.
    None,
}

/// The eight resize handles around a selected element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlePos {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl HandlePos {
    pub const ALL: [HandlePos; 8] = [
        HandlePos::NW,
        HandlePos::N,
        HandlePos::NE,
        HandlePos::E,
        HandlePos::SE,
        HandlePos::S,
        HandlePos::SW,
        HandlePos::W,
    ];

    /// Horizontal edge moved by this handle: -1 left, 1 right, 0 none.
    pub fn x_edge(self) -> i8 {
        match self {
            Self::W | Self::NW | Self::SW => -1,
            Self::E | Self::NE | Self::SE => 1,
            Self::N | Self::S => 0,
        }
    }

    /// Vertical edge moved by this handle: -1 top, 1 bottom, 0 none.
    pub fn y_edge(self) -> i8 {
        match self {
            Self::N | Self::NW | Self::NE => -1,
            Self::S | Self::SW | Self::SE => 1,
            Self::E | Self::W => 0,
        }
    }

    pub fn is_corner(self) -> bool {
        self.x_edge() != 0 && self.y_edge() != 0
    }
}

/// Structural role of an element in the rendered tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementRole {
    /// The rendered document root.
    Document,
    Title,
    Desc,
    Illus,
    Background,
    /// The group that wraps one item.
    Item,
    ItemLabel,
    ItemDesc,
    ItemValue,
    ItemIcon,
    ItemIllus,
    ItemShape,
    /// Container for interaction-only visuals.
    TransientContainer,
    Handle(HandlePos),
    Highlight,
    Brush,
    Unknown,
}

impl ElementRole {
    pub fn scope(self) -> RoleScope {
        match self {
            Self::Title => RoleScope::TopLevel("title"),
            Self::Desc => RoleScope::TopLevel("desc"),
            Self::Illus => RoleScope::TopLevel("illus"),
            Self::Background => RoleScope::TopLevel("background"),
            Self::Item => RoleScope::Item("item"),
            Self::ItemLabel => RoleScope::Item("label"),
            Self::ItemDesc => RoleScope::Item("desc"),
            Self::ItemValue => RoleScope::Item("value"),
            Self::ItemIcon => RoleScope::Item("icon"),
            Self::ItemIllus => RoleScope::Item("illus"),
            Self::ItemShape => RoleScope::Item("shape"),
            Self::Document
            | Self::TransientContainer
            | Self::Handle(_)
            | Self::Highlight
            | Self::Brush
            | Self::Unknown => RoleScope::None,
        }
    }

    pub fn is_item_scoped(self) -> bool {
        matches!(self.scope(), RoleScope::Item(_))
    }

    /// Item data field edited through this role, for item-scoped roles.
    pub fn item_field(self) -> Option<ItemField> {
        match self {
            Self::ItemLabel => Some(ItemField::Label),
            Self::ItemDesc => Some(ItemField::Desc),
            Self::ItemValue => Some(ItemField::Value),
            Self::ItemIcon => Some(ItemField::Icon),
            Self::ItemIllus => Some(ItemField::Illus),
            _ => None,
        }
    }

    /// Top-level text field edited through this role.
    pub fn data_field(self) -> Option<DataField> {
        match self {
            Self::Title => Some(DataField::Title),
            Self::Desc => Some(DataField::Desc),
            _ => None,
        }
    }

    /// Roles whose live element carries editable text content.
    pub fn is_text(self) -> bool {
        matches!(
            self,
            Self::Title | Self::Desc | Self::ItemLabel | Self::ItemDesc | Self::ItemValue
        )
    }

    pub fn is_icon(self) -> bool {
        matches!(self, Self::ItemIcon)
    }

    /// Roles a user can select, move or restyle.
    pub fn is_editable(self) -> bool {
        !matches!(self.scope(), RoleScope::None)
    }

    /// Roles that live only in the transient overlay.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::TransientContainer | Self::Handle(_) | Self::Highlight | Self::Brush
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_roles_map_to_field_bags() {
        assert_eq!(ElementRole::ItemLabel.scope(), RoleScope::Item("label"));
        assert_eq!(ElementRole::ItemLabel.item_field(), Some(ItemField::Label));
        assert!(ElementRole::ItemShape.is_item_scoped());
        assert_eq!(ElementRole::ItemShape.item_field(), None);
    }

    #[test]
    fn top_level_roles_map_to_document_bag() {
        assert_eq!(ElementRole::Title.scope(), RoleScope::TopLevel("title"));
        assert_eq!(ElementRole::Title.data_field(), Some(DataField::Title));
        assert!(!ElementRole::Title.is_item_scoped());
    }

    #[test]
    fn overlay_roles_are_not_editable() {
        for role in [
            ElementRole::Document,
            ElementRole::TransientContainer,
            ElementRole::Handle(HandlePos::N),
            ElementRole::Highlight,
        ] {
            assert!(!role.is_editable(), "{role:?}");
        }
    }

    #[test]
    fn corner_handles_move_two_edges() {
        assert!(HandlePos::SE.is_corner());
        assert!(!HandlePos::E.is_corner());
        assert_eq!(HandlePos::NW.x_edge(), -1);
        assert_eq!(HandlePos::NW.y_edge(), -1);
    }
}
