//! Shared fixture: a two-item document and its rendered tree.
//!
//! ```text
//! svg (0,0 800x600)
//! ├── title        "Plan"       (20,20 200x30)
//! ├── desc         "Quarterly"  (20,60 300x20)
//! ├── item-0       [0]          (20,120 200x100)
//! │   ├── item-0-label "Item 1" (30,130 100x20)
//! │   └── item-0-value "10"     (30,160 60x20)
//! └── item-1       [1]          (300,120 200x100)
//!     └── item-1-label "Item 2" (310,130 100x20)
//! ```

#![allow(dead_code)]

use ig_core::{Data, Element, ElementId, ElementRole, ElementTree, ItemDatum, RenderOptions};
use ig_editor::{Editor, EditorConfig, EditorEvent, InputEvent, Modifiers};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn id(s: &str) -> ElementId {
    ElementId::intern(s)
}

pub fn data() -> Data {
    Data {
        title: Some("Plan".into()),
        desc: Some("Quarterly".into()),
        items: vec![
            ItemDatum {
                label: Some("Item 1".into()),
                value: Some(10.0),
                ..ItemDatum::default()
            },
            ItemDatum {
                label: Some("Item 2".into()),
                value: Some(20.0),
                ..ItemDatum::default()
            },
        ],
        ..Data::default()
    }
}

pub fn tree() -> ElementTree {
    let mut tree = ElementTree::new(
        Element::group("svg", ElementRole::Document).with_rect(0.0, 0.0, 800.0, 600.0),
    );
    let svg = tree.document();
    tree.append(
        svg,
        Element::text("title", ElementRole::Title, "Plan").with_rect(20.0, 20.0, 200.0, 30.0),
    );
    tree.append(
        svg,
        Element::text("desc", ElementRole::Desc, "Quarterly").with_rect(20.0, 60.0, 300.0, 20.0),
    );
    tree.append(
        svg,
        Element::group("item-0", ElementRole::Item)
            .with_indexes(&[0])
            .with_rect(20.0, 120.0, 200.0, 100.0),
    );
    tree.append(
        id("item-0"),
        Element::text("item-0-label", ElementRole::ItemLabel, "Item 1")
            .with_indexes(&[0])
            .with_rect(30.0, 130.0, 100.0, 20.0),
    );
    tree.append(
        id("item-0"),
        Element::text("item-0-value", ElementRole::ItemValue, "10")
            .with_indexes(&[0])
            .with_rect(30.0, 160.0, 60.0, 20.0),
    );
    tree.append(
        svg,
        Element::group("item-1", ElementRole::Item)
            .with_indexes(&[1])
            .with_rect(300.0, 120.0, 200.0, 100.0),
    );
    tree.append(
        id("item-1"),
        Element::text("item-1-label", ElementRole::ItemLabel, "Item 2")
            .with_indexes(&[1])
            .with_rect(310.0, 130.0, 100.0, 20.0),
    );
    tree
}

pub fn options() -> RenderOptions {
    RenderOptions::from_value(json!({ "width": 800, "height": 600, "theme": "light" }))
        .unwrap_or_default()
}

pub fn editor() -> Editor {
    init_logger();
    Editor::new(EditorConfig::default(), data(), options(), tree())
}

/// Record every event emitted on the editor's channel.
pub fn record(editor: &Editor) -> Rc<RefCell<Vec<EditorEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    editor
        .events()
        .subscribe_all(move |e| sink.borrow_mut().push(e.clone()));
    log
}

pub fn ctrl() -> Modifiers {
    Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    }
}

/// Full press/release/click sequence at the center of `target`.
pub async fn click(editor: &mut Editor, target: &str) {
    let target = id(target);
    let center = editor
        .state()
        .with_tree(|t| t.bounds(target))
        .map(|b| b.center())
        .unwrap_or_default();
    for event in [
        InputEvent::pointer_down(center.x, center.y, Some(target)),
        InputEvent::pointer_up(center.x, center.y, Some(target)),
        InputEvent::click(Some(target)),
    ] {
        editor.dispatch(&event).await.unwrap();
    }
}

/// Press inside the document without hitting anything, to activate it.
pub async fn activate(editor: &mut Editor) {
    let svg = editor.state().document();
    editor
        .dispatch(&InputEvent::pointer_down(790.0, 590.0, Some(svg)))
        .await
        .unwrap();
    editor
        .dispatch(&InputEvent::pointer_up(790.0, 590.0, Some(svg)))
        .await
        .unwrap();
}
