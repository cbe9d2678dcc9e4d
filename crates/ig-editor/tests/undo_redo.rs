//! Integration tests: command history over the shared document state.

mod common;

use common::*;
use ig_core::{DataField, ItemPatch, RenderOptions};
use ig_editor::{
    Command, CommandRecord, EditError, EditorEvent, UpdateElement, UpdateOptions, UpdateText,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn attrs(value: serde_json::Value) -> ig_core::Attrs {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

// ─── Symmetry ───────────────────────────────────────────────────────────

#[tokio::test]
async fn undo_all_then_redo_all_reproduces_state() {
    let editor = editor();
    let state = editor.state();
    let history = editor.history();

    let initial_data = state.data().clone();
    let initial_tree = state.with_tree(|t| t.to_export_value());
    let initial_options = state.options();

    let commands: Vec<Box<dyn Command>> = vec![
        Box::new(UpdateText::new(state, id("title"), "Roadmap").unwrap()),
        Box::new(
            UpdateElement::new(state, id("item-0"), attrs(json!({ "fill": "#f00", "opacity": 0.5 })))
                .unwrap(),
        ),
        Box::new(UpdateOptions::new(
            RenderOptions::from_value(json!({ "theme": "dark", "padding": 12 })).unwrap(),
        )),
        Box::new(UpdateText::new(state, id("item-0-value"), "42").unwrap()),
    ];
    let n = commands.len();
    for command in commands {
        history.execute(command).await.unwrap();
    }

    let applied_data = state.data().clone();
    let applied_tree = state.with_tree(|t| t.to_export_value());
    let applied_options = state.options();
    assert_eq!(applied_data.items[0].value, Some(42.0));
    assert_eq!(applied_data.items[0].attributes["item"]["fill"], json!("#f00"));

    for _ in 0..n {
        assert!(history.undo().await.unwrap().is_some());
    }
    assert_eq!(*state.data(), initial_data);
    assert_eq!(state.with_tree(|t| t.to_export_value()), initial_tree);
    assert_eq!(state.options(), initial_options);

    for _ in 0..n {
        assert!(history.redo().await.unwrap().is_some());
    }
    assert_eq!(*state.data(), applied_data);
    assert_eq!(state.with_tree(|t| t.to_export_value()), applied_tree);
    assert_eq!(state.options(), applied_options);
}

#[tokio::test]
async fn batch_undoes_in_reverse_order() {
    let editor = editor();
    let state = editor.state();
    let log = record(&editor);

    let a = UpdateText::new(state, id("title"), "A").unwrap();
    let b = UpdateText::new(state, id("desc"), "B").unwrap();
    editor
        .history()
        .execute_batch(vec![Box::new(a), Box::new(b)])
        .await
        .unwrap();
    editor.history().undo().await.unwrap();

    let updates: Vec<(DataField, Option<String>)> = log
        .borrow()
        .iter()
        .filter_map(|e| match e {
            EditorEvent::UpdateData { key, value } => Some((*key, value.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        updates,
        vec![
            (DataField::Title, Some("A".into())),
            (DataField::Desc, Some("B".into())),
            (DataField::Desc, Some("Quarterly".into())),
            (DataField::Title, Some("Plan".into())),
        ]
    );
    assert_eq!(editor.history().undo_levels(), 0);
}

#[tokio::test]
async fn execute_after_undo_clears_redo() {
    let editor = editor();
    let state = editor.state();
    let history = editor.history();

    history
        .execute(Box::new(UpdateText::new(state, id("title"), "A").unwrap()))
        .await
        .unwrap();
    history.undo().await.unwrap();
    assert!(history.can_redo());

    history
        .execute(Box::new(UpdateText::new(state, id("title"), "C").unwrap()))
        .await
        .unwrap();
    assert!(!history.can_redo());
    assert_eq!(history.redo().await.unwrap(), None);
    assert_eq!(state.data().title.as_deref(), Some("C"));
}

#[tokio::test]
async fn history_change_tracks_stack_flags() {
    let editor = editor();
    let log = record(&editor);
    let history = editor.history();

    history
        .execute(Box::new(
            UpdateText::new(editor.state(), id("title"), "A").unwrap(),
        ))
        .await
        .unwrap();
    history.undo().await.unwrap();

    let flags: Vec<(bool, bool)> = log
        .borrow()
        .iter()
        .filter_map(|e| match e {
            EditorEvent::HistoryChange { can_undo, can_redo } => Some((*can_undo, *can_redo)),
            _ => None,
        })
        .collect();
    assert_eq!(flags, vec![(true, false), (false, true)]);
}

// ─── Batch failure ──────────────────────────────────────────────────────

#[tokio::test]
async fn failed_batch_is_reported_and_not_pushed() {
    let editor = editor();
    let state = editor.state();

    let ok = UpdateText::new(state, id("title"), "Kept").unwrap();
    let bad = UpdateText::new(state, id("item-0-value"), "ten").unwrap();
    let err = editor
        .history()
        .execute_batch(vec![Box::new(ok), Box::new(bad)])
        .await
        .unwrap_err();

    match err {
        EditError::BatchFailed { index, source } => {
            assert_eq!(index, 1);
            assert!(matches!(*source, EditError::InvalidValue { field: "value", .. }));
        }
        other => panic!("expected BatchFailed, got {other:?}"),
    }
    assert!(!editor.history().can_undo());
    // Fail fast without rollback.
    assert_eq!(state.data().title.as_deref(), Some("Kept"));
}

#[tokio::test]
async fn update_on_removed_item_leaves_element_as_it_was() {
    let editor = editor();
    let state = editor.state();
    let label = id("item-1-label");
    let command = UpdateElement::new(state, label, attrs(json!({ "fill": "#f00" }))).unwrap();
    state.remove_item_datum(&[1], 1).unwrap();

    let err = editor.history().execute(Box::new(command)).await.unwrap_err();
    assert!(matches!(err, EditError::InvalidPath(_)));
    assert!(!editor.history().can_undo());
    assert_eq!(state.element(label).unwrap().attrs.get("fill"), None);
}

// ─── State manager round trips ──────────────────────────────────────────

#[test]
fn update_item_changes_one_field_and_reports_it() {
    let editor = editor();
    let state = editor.state();
    let log = record(&editor);

    state
        .update_item_datum(&[1], ItemPatch::label("Updated"))
        .unwrap();

    assert_eq!(state.data().items[1].label.as_deref(), Some("Updated"));
    assert_eq!(state.data().items[1].value, Some(20.0));
    let first = serde_json::to_value(&log.borrow()[0]).unwrap();
    assert_eq!(
        first,
        json!({
            "type": "data:update:item",
            "indexes": [1],
            "datum": { "label": "Updated" }
        })
    );
}

#[test]
fn remove_then_add_restores_items() {
    let editor = editor();
    let state = editor.state();
    let before = state.data().items.clone();

    let removed = state.remove_item_datum(&[1], 1).unwrap();
    assert_eq!(state.data().items.len(), 1);
    state.add_item_datum(&[1], removed).unwrap();

    assert_eq!(state.data().items, before);
}

#[tokio::test]
async fn serialized_history_uses_plain_ids() {
    let editor = editor();
    editor
        .history()
        .execute(Box::new(
            UpdateText::new(editor.state(), id("item-1-label"), "Two").unwrap(),
        ))
        .await
        .unwrap();

    let records = editor.history().serialize();
    assert!(matches!(&records[0], CommandRecord::UpdateText { text, .. } if text == "Two"));
    assert_eq!(
        serde_json::to_value(&records).unwrap(),
        json!([{
            "type": "update-text",
            "id": "item-1-label",
            "role": "item-label",
            "original": "Item 2",
            "text": "Two"
        }])
    );
}
