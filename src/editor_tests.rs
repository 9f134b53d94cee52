use serde_json::json;

use super::*;
use crate::document::ListKind;

fn at(path: &[usize], offset: usize) -> Point {
    Point::new(path.to_vec(), offset)
}

fn editor_at_end(markup: &str) -> DocumentEditor {
    let mut editor = DocumentEditor::from_markup(markup);
    assert!(editor.select_end());
    editor
}

#[test]
fn from_markup_builds_the_expected_tree() {
    let editor = DocumentEditor::from_markup("<p>Hello <strong>World</strong></p>");
    assert_eq!(
        serde_json::to_value(editor.children()).unwrap(),
        json!([{
            "type": "paragraph",
            "children": [
                {"type": "text", "text": "Hello "},
                {"type": "text", "text": "World", "bold": true}
            ]
        }])
    );
    assert_eq!(editor.markup(), "<p>Hello <strong>World</strong></p>");
    assert_eq!(editor.selection(), Some(&Range::collapsed(at(&[0, 0], 0))));
}

#[test]
fn markup_round_trips_through_the_editor() {
    let markup = concat!(
        "<p>a<br/>b <a href=\"https://example.com/?q=1&amp;r=2\">link</a></p>",
        "<ul><li><em>x</em></li><li><s><strong>y</strong></s></li></ul>",
        "<ol><li>z</li></ol>"
    );
    let editor = DocumentEditor::from_markup(markup);
    assert_eq!(editor.markup(), markup);
    let again = DocumentEditor::from_markup(&editor.markup());
    assert_eq!(again.children(), editor.children());
}

#[test]
fn malformed_markup_starts_empty() {
    let editor = DocumentEditor::from_markup("<p>ok</p><a href=\"x");
    assert!(editor.is_empty());
    assert!(editor.selection().is_none());
    assert_eq!(editor.markup(), "");
}

#[test]
fn construction_normalizes_the_tree() {
    let editor = DocumentEditor::new(vec![
        Node::text("loose"),
        Node::list_item(vec![Node::text("item")]),
    ]);
    assert_eq!(
        editor.children(),
        &[
            Node::paragraph(vec![Node::text("loose")]),
            Node::list(ListKind::Bulleted, vec![Node::list_item(vec![Node::text("item")])]),
        ]
    );
    assert!(!editor.can_undo());
}

#[test]
fn undo_and_redo_restore_content_and_selection() {
    let mut editor = editor_at_end("<p>hello</p>");
    assert!(editor.insert_text(" world"));
    assert_eq!(editor.markup(), "<p>hello world</p>");
    assert!(editor.can_undo());

    assert!(editor.undo());
    assert_eq!(editor.markup(), "<p>hello</p>");
    assert_eq!(editor.selection(), Some(&Range::collapsed(at(&[0, 0], 5))));
    assert!(editor.can_redo());

    assert!(editor.redo());
    assert_eq!(editor.markup(), "<p>hello world</p>");
    assert_eq!(editor.selection(), Some(&Range::collapsed(at(&[0, 0], 11))));
    assert!(!editor.redo());
}

#[test]
fn new_edits_clear_the_redo_stack() {
    let mut editor = editor_at_end("<p>a</p>");
    editor.insert_text("b");
    editor.undo();
    editor.insert_text("c");
    assert!(!editor.can_redo());
    assert_eq!(editor.markup(), "<p>ac</p>");
}

#[test]
fn history_depth_limits_undo_steps() {
    let config = EditorConfig {
        history_depth: 2,
        ..EditorConfig::default()
    };
    let mut editor = DocumentEditor::from_markup_with_config("<p></p><p>x</p>", config);
    editor.select_end();
    for ch in ["1", "2", "3"] {
        assert!(editor.insert_text(ch));
    }
    assert!(editor.undo());
    assert!(editor.undo());
    assert!(!editor.undo());
    assert_eq!(editor.markup(), "<p>x1</p>");
}

#[test]
fn failed_transaction_rolls_back() {
    let mut editor = editor_at_end("<p>abc</p>");
    let version = editor.version();
    let changed = editor.transact("failing edit", |editor| {
        editor.insert_text_at(&at(&[0, 0], 0), "x")?;
        editor.insert_node(vec![1], Node::paragraph(vec![Node::text("y")]))?;
        Err(EditorError::NoSelection)
    });
    assert!(!changed);
    assert_eq!(editor.markup(), "<p>abc</p>");
    assert_eq!(editor.selection(), Some(&Range::collapsed(at(&[0, 0], 3))));
    assert_eq!(editor.version(), version);
    assert!(!editor.can_undo());
}

#[test]
fn normalization_overflow_rolls_back() {
    let config = EditorConfig {
        normalize_limit: 1,
        ..EditorConfig::default()
    };
    let mut editor = DocumentEditor::from_markup_with_config("<p>a</p>", config);
    let changed = editor.transact("insert leaves", |editor| {
        editor.insert_node(vec![0, 1], Node::text("b"))?;
        editor.insert_node(vec![0, 2], Node::text("c"))
    });
    assert!(!changed);
    assert_eq!(editor.markup(), "<p>a</p>");
}

#[test]
fn removed_selection_moves_to_previous_leaf() {
    let mut editor = DocumentEditor::from_markup("<p>a</p><p>bc</p>");
    editor.select_point(at(&[1, 0], 1));
    assert!(editor.transact("remove", |editor| editor.remove_node(&[1]).map(|_| ())));
    assert_eq!(editor.selection(), Some(&Range::collapsed(at(&[0, 0], 1))));
}

#[test]
fn removed_first_block_moves_selection_forward() {
    let mut editor = DocumentEditor::from_markup("<p>a</p><p>bc</p>");
    assert!(editor.transact("remove", |editor| editor.remove_node(&[0]).map(|_| ())));
    assert_eq!(editor.selection(), Some(&Range::collapsed(at(&[0, 0], 0))));
    assert_eq!(editor.markup(), "<p>bc</p>");
}

#[test]
fn selection_must_resolve() {
    let mut editor = DocumentEditor::from_markup("<p>abc</p>");
    assert!(!editor.select_point(at(&[0, 0], 4)));
    assert!(!editor.select_point(at(&[0], 0)));
    assert_eq!(editor.selection(), Some(&Range::collapsed(at(&[0, 0], 0))));
    assert!(editor.select(Range::new(at(&[0, 0], 3), at(&[0, 0], 1))));
    assert_eq!(editor.selection_text(), "bc");
}

#[test]
fn replace_document_silently_resets_state() {
    let mut editor = editor_at_end("<p>old</p>");
    editor.insert_text("!");
    assert!(editor.can_undo());

    editor.replace_document_silently(vec![
        Node::paragraph(vec![Node::text("first")]),
        Node::paragraph(vec![Node::text("second")]),
    ]);
    assert_eq!(editor.markup(), "<p>first</p><p>second</p>");
    assert!(!editor.can_undo());
    assert_eq!(editor.selection(), Some(&Range::collapsed(at(&[0, 0], 0))));

    editor.replace_document_silently(Vec::new());
    assert!(editor.is_empty());
    assert!(editor.selection().is_none());
    assert!(!editor.undo());
}

#[test]
fn no_op_commands_do_not_bump_the_version() {
    let mut editor = editor_at_end("<p>abc</p>");
    let version = editor.version();
    assert!(!editor.insert_text(""));
    assert!(!editor.normalize());
    assert_eq!(editor.version(), version);
    assert!(editor.insert_text("d"));
    assert_eq!(editor.version(), version + 1);
}

#[test]
fn commands_without_selection_are_no_ops() {
    let mut editor = DocumentEditor::from_markup("<p>abc</p>");
    editor.deselect();
    assert!(!editor.insert_text("x"));
    assert!(!editor.delete_backward());
    assert!(!editor.insert_break());
    assert_eq!(editor.markup(), "<p>abc</p>");
}
