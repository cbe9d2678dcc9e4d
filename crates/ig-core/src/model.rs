//! Document data model for infographics.
//!
//! A document is a title, a description, and a hierarchical list of items.
//! Items are addressed positionally by an [`IndexPath`]; paths are not stable
//! across insertions or removals at a shallower level.
//!
//! Styling overrides live in free-form attribute bags keyed by structural
//! role: each item carries `attributes[field]` (e.g. `attributes["label"]`)
//! and the document carries `attributes[role]` for its singleton fields
//! (e.g. `attributes["title"]`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Attribute map of a single element or field. A `null` value in a merge
/// removes the key.
pub type Attrs = Map<String, Value>;

/// Attribute bags keyed by field / role name.
pub type FieldAttrs = BTreeMap<String, Attrs>;

/// Ordered sequence of indices from the root item list down to one item.
pub type IndexPath = SmallVec<[usize; 4]>;

/// Shallow-merge `patch` into `target`. `null` values delete the key.
pub fn merge_attrs(target: &mut Attrs, patch: &Attrs) {
    for (key, value) in patch {
        if value.is_null() {
            target.remove(key);
        } else {
            target.insert(key.clone(), value.clone());
        }
    }
}

// ─── Items ───────────────────────────────────────────────────────────────

/// One record of the hierarchical item list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemDatum {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub illus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ItemDatum>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: FieldAttrs,
}

impl ItemDatum {
    pub fn labeled(label: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            ..Self::default()
        }
    }

    /// Text shown for a text-bearing field, if any.
    pub fn field_text(&self, field: ItemField) -> Option<String> {
        match field {
            ItemField::Label => self.label.clone(),
            ItemField::Desc => self.desc.clone(),
            ItemField::Value => self.value.map(|v| v.to_string()),
            ItemField::Icon => self.icon.clone(),
            ItemField::Illus => self.illus.clone(),
        }
    }
}

/// Data-bearing fields of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemField {
    Label,
    Desc,
    Value,
    Icon,
    Illus,
}

impl ItemField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::Desc => "desc",
            Self::Value => "value",
            Self::Icon => "icon",
            Self::Illus => "illus",
        }
    }
}

/// Partial item record, shallow-merged by `update_item_datum`.
///
/// Only present fields are serialized, so a patch of `{label}` renders as
/// `{"label": "..."}` in change events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub illus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ItemDatum>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<FieldAttrs>,
}

impl ItemPatch {
    pub fn label(label: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            ..Self::default()
        }
    }

    /// Build a single-field patch from edited text. `Value` must parse as a
    /// number.
    pub fn from_text(field: ItemField, text: &str) -> Result<Self, std::num::ParseFloatError> {
        let mut patch = Self::default();
        match field {
            ItemField::Label => patch.label = Some(text.to_string()),
            ItemField::Desc => patch.desc = Some(text.to_string()),
            ItemField::Value => patch.value = Some(text.trim().parse()?),
            ItemField::Icon => patch.icon = Some(text.to_string()),
            ItemField::Illus => patch.illus = Some(text.to_string()),
        }
        Ok(patch)
    }

    /// Shallow merge into `datum`: present fields replace, absent fields keep.
    pub fn apply_to(&self, datum: &mut ItemDatum) {
        if let Some(label) = &self.label {
            datum.label = Some(label.clone());
        }
        if let Some(desc) = &self.desc {
            datum.desc = Some(desc.clone());
        }
        if let Some(value) = self.value {
            datum.value = Some(value);
        }
        if let Some(icon) = &self.icon {
            datum.icon = Some(icon.clone());
        }
        if let Some(illus) = &self.illus {
            datum.illus = Some(illus.clone());
        }
        if let Some(children) = &self.children {
            datum.children = Some(children.clone());
        }
        if let Some(attributes) = &self.attributes {
            datum.attributes = attributes.clone();
        }
    }
}

// ─── Document ────────────────────────────────────────────────────────────

/// Top-level singleton text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataField {
    Title,
    Desc,
}

impl DataField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Desc => "desc",
        }
    }
}

/// The whole editable document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Data {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default)]
    pub items: Vec<ItemDatum>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: FieldAttrs,
}

impl Data {
    pub fn field(&self, field: DataField) -> Option<&str> {
        match field {
            DataField::Title => self.title.as_deref(),
            DataField::Desc => self.desc.as_deref(),
        }
    }

    pub fn set_field(&mut self, field: DataField, value: Option<String>) {
        match field {
            DataField::Title => self.title = value,
            DataField::Desc => self.desc = value,
        }
    }

    /// Item addressed by `path`, or `None` when any prefix is out of range.
    pub fn item(&self, path: &[usize]) -> Option<&ItemDatum> {
        let (&last, prefix) = path.split_last()?;
        let mut items = &self.items;
        for &i in prefix {
            items = items.get(i)?.children.as_ref()?;
        }
        items.get(last)
    }

    pub fn item_mut(&mut self, path: &[usize]) -> Option<&mut ItemDatum> {
        let (&last, prefix) = path.split_last()?;
        let mut items = &mut self.items;
        for &i in prefix {
            items = items.get_mut(i)?.children.as_mut()?;
        }
        items.get_mut(last)
    }

    /// The item list that contains the slot addressed by `path`.
    ///
    /// With `create_missing`, ancestors without a `children` list get an
    /// empty one. Ancestors themselves must exist.
    pub fn container_mut(
        &mut self,
        path: &[usize],
        create_missing: bool,
    ) -> Option<&mut Vec<ItemDatum>> {
        let (_, prefix) = path.split_last()?;
        let mut items = &mut self.items;
        for &i in prefix {
            let item = items.get_mut(i)?;
            if item.children.is_none() && create_missing {
                item.children = Some(Vec::new());
            }
            items = item.children.as_mut()?;
        }
        Some(items)
    }
}

// ─── Render options ──────────────────────────────────────────────────────

/// Render-time option set (size, padding, theme, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderOptions(pub Attrs);

impl RenderOptions {
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn width(&self) -> Option<f64> {
        self.0.get("width").and_then(Value::as_f64)
    }

    pub fn height(&self) -> Option<f64> {
        self.0.get("height").and_then(Value::as_f64)
    }

    pub fn padding(&self) -> Option<f64> {
        self.0.get("padding").and_then(Value::as_f64)
    }

    pub fn theme(&self) -> Option<&str> {
        self.0.get("theme").and_then(Value::as_str)
    }

    /// Shallow merge of a partial option set.
    pub fn merge(&mut self, patch: &RenderOptions) {
        merge_attrs(&mut self.0, &patch.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use smallvec::smallvec;

    fn nested() -> Data {
        Data {
            title: Some("Plan".into()),
            items: vec![
                ItemDatum::labeled("Item 1"),
                ItemDatum {
                    label: Some("Item 2".into()),
                    children: Some(vec![ItemDatum::labeled("Child")]),
                    ..ItemDatum::default()
                },
            ],
            ..Data::default()
        }
    }

    #[test]
    fn item_lookup_follows_children() {
        let data = nested();
        let path: IndexPath = smallvec![1, 0];
        assert_eq!(data.item(&path).unwrap().label.as_deref(), Some("Child"));
        assert!(data.item(&[0, 0]).is_none());
        assert!(data.item(&[5]).is_none());
        assert!(data.item(&[]).is_none());
    }

    #[test]
    fn container_creates_missing_children() {
        let mut data = nested();
        assert!(data.container_mut(&[0, 0], false).is_none());
        let items = data.container_mut(&[0, 0], true).unwrap();
        assert!(items.is_empty());
        assert_eq!(data.items[0].children, Some(vec![]));
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut datum = ItemDatum {
            label: Some("Item 2".into()),
            desc: Some("keep".into()),
            ..ItemDatum::default()
        };
        ItemPatch::label("Updated").apply_to(&mut datum);
        assert_eq!(datum.label.as_deref(), Some("Updated"));
        assert_eq!(datum.desc.as_deref(), Some("keep"));
        assert_eq!(
            serde_json::to_value(ItemPatch::label("Updated")).unwrap(),
            json!({ "label": "Updated" })
        );
    }

    #[test]
    fn value_patch_requires_number() {
        assert_eq!(
            ItemPatch::from_text(ItemField::Value, " 42 ").unwrap().value,
            Some(42.0)
        );
        assert!(ItemPatch::from_text(ItemField::Value, "many").is_err());
    }

    #[test]
    fn null_merge_removes_key() {
        let mut attrs = Attrs::new();
        attrs.insert("fill".into(), json!("#f00"));
        let mut patch = Attrs::new();
        patch.insert("fill".into(), Value::Null);
        patch.insert("x".into(), json!(10));
        merge_attrs(&mut attrs, &patch);
        assert_eq!(Value::Object(attrs), json!({ "x": 10 }));
    }

    #[test]
    fn options_merge_is_shallow() {
        let mut options = RenderOptions::from_value(json!({ "width": 800, "theme": "light" })).unwrap();
        options.merge(&RenderOptions::from_value(json!({ "theme": "dark" })).unwrap());
        assert_eq!(options.width(), Some(800.0));
        assert_eq!(options.theme(), Some("dark"));
    }
}
