//! Integration tests: nested item data and the rendered tree together.

use ig_core::hit::{hit_test, hit_test_rect, resolve_editable};
use ig_core::{
    Data, Element, ElementId, ElementKind, ElementRole, ElementTree, HandlePos, Rect, RoleScope,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn id(s: &str) -> ElementId {
    ElementId::intern(s)
}

fn nested_data() -> Data {
    serde_json::from_value(json!({
        "title": "Org",
        "items": [
            { "label": "Eng", "children": [
                { "label": "Platform", "value": 12 },
                { "label": "Apps", "value": 8 }
            ]},
            { "label": "Sales" }
        ],
        "attributes": { "title": { "fill": "#222" } }
    }))
    .unwrap()
}

/// svg > [title, group(Eng) > [label(Eng), group(Platform) > label(Platform)], overlay > handle]
fn nested_tree() -> ElementTree {
    let mut tree = ElementTree::new(
        Element::group("doc", ElementRole::Document).with_rect(0.0, 0.0, 600.0, 400.0),
    );
    let doc = tree.document();
    tree.append(
        doc,
        Element::text("t", ElementRole::Title, "Org").with_rect(10.0, 10.0, 200.0, 30.0),
    );
    tree.append(
        doc,
        Element::group("g0", ElementRole::Item)
            .with_indexes(&[0])
            .with_rect(10.0, 60.0, 300.0, 200.0),
    );
    tree.append(
        id("g0"),
        Element::text("g0-label", ElementRole::ItemLabel, "Eng")
            .with_indexes(&[0])
            .with_rect(20.0, 70.0, 80.0, 20.0),
    );
    tree.append(
        id("g0"),
        Element::group("g0-0", ElementRole::Item)
            .with_indexes(&[0, 0])
            .with_rect(20.0, 100.0, 120.0, 60.0),
    );
    tree.append(
        id("g0-0"),
        Element::text("g0-0-label", ElementRole::ItemLabel, "Platform")
            .with_indexes(&[0, 0])
            .with_rect(30.0, 110.0, 80.0, 20.0),
    );
    tree.append(
        doc,
        Element::new(
            id("overlay"),
            ElementRole::TransientContainer,
            ElementKind::Group,
        ),
    );
    tree.append(
        id("overlay"),
        Element::shape("h", ElementRole::Handle(HandlePos::SE))
            .with_rect(306.0, 256.0, 8.0, 8.0),
    );
    tree
}

#[test]
fn nested_paths_resolve_through_children() {
    let data = nested_data();
    assert_eq!(data.item(&[0, 1]).and_then(|i| i.label.as_deref()), Some("Apps"));
    assert_eq!(data.item(&[0, 0]).and_then(|i| i.value), Some(12.0));
    assert!(data.item(&[1, 0]).is_none());
    assert!(data.item(&[]).is_none());
    assert_eq!(data.attributes["title"]["fill"], json!("#222"));
}

#[test]
fn deepest_element_wins_hit_test() {
    let tree = nested_tree();
    assert_eq!(hit_test(&tree, 40.0, 115.0), Some(id("g0-0-label")));
    assert_eq!(hit_test(&tree, 130.0, 150.0), Some(id("g0-0")));
    assert_eq!(hit_test(&tree, 250.0, 200.0), Some(id("g0")));
    assert_eq!(hit_test(&tree, 500.0, 350.0), Some(tree.document()));
    // Handles capture the pointer even though they are overlay elements.
    assert_eq!(hit_test(&tree, 310.0, 260.0), Some(id("h")));
}

#[test]
fn rect_hits_skip_overlay_and_document() {
    let tree = nested_tree();
    let hits = hit_test_rect(&tree, Rect::new(0.0, 0.0, 600.0, 400.0));
    assert_eq!(
        hits,
        vec![id("t"), id("g0"), id("g0-label"), id("g0-0"), id("g0-0-label")]
    );
}

#[test]
fn overlay_elements_resolve_to_nothing() {
    let tree = nested_tree();
    assert_eq!(resolve_editable(&tree, id("h")), None);
    assert_eq!(resolve_editable(&tree, id("g0-0-label")), Some(id("g0-0-label")));
    assert!(tree.is_transient(id("h")));
    assert!(!tree.is_transient(id("g0-0")));
}

#[test]
fn export_omits_overlay() {
    let tree = nested_tree();
    let exported = tree.to_export_value();
    let top: Vec<&str> = exported["children"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["id"].as_str())
        .collect();
    assert_eq!(top, vec!["t", "g0"]);
    assert_eq!(exported["children"][1]["children"][1]["indexes"], json!([0, 0]));
    assert_eq!(exported["children"][0]["text"], json!("Org"));
}

#[test]
fn roles_map_to_their_attribute_bags() {
    assert_eq!(ElementRole::ItemLabel.scope(), RoleScope::Item("label"));
    assert_eq!(ElementRole::Title.scope(), RoleScope::TopLevel("title"));
    assert_eq!(ElementRole::Handle(HandlePos::N).scope(), RoleScope::None);
    assert_eq!(
        serde_json::to_value(ElementRole::ItemValue).unwrap(),
        json!("item-value")
    );
}
