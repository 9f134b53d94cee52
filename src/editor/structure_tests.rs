use super::*;
use crate::document::{Point, Range};

fn at(path: &[usize], offset: usize) -> Point {
    Point::new(path.to_vec(), offset)
}

fn editor_with_range(markup: &str, anchor: Point, focus: Point) -> DocumentEditor {
    let mut editor = DocumentEditor::from_markup(markup);
    assert!(editor.select(Range::new(anchor, focus)));
    editor
}

#[test]
fn parses_block_formats() {
    assert_eq!("bulleted-list".parse::<BlockFormat>().unwrap(), BlockFormat::BulletedList);
    assert_eq!("numbered-list".parse::<BlockFormat>().unwrap(), BlockFormat::NumberedList);
    assert!("heading-one".parse::<BlockFormat>().is_err());
    assert_eq!(
        serde_json::to_string(&BlockFormat::NumberedList).unwrap(),
        "\"numbered-list\""
    );
    assert_eq!(BlockFormat::BulletedList.to_string(), "bulleted-list");
}

#[test]
fn toggle_block_wraps_a_paragraph_in_a_list() {
    let mut editor = DocumentEditor::from_markup("<p>item</p>");
    assert!(!editor.is_block_active(BlockFormat::BulletedList));
    assert!(editor.toggle_block(BlockFormat::BulletedList));
    assert_eq!(editor.markup(), "<ul><li>item</li></ul>");
    assert!(editor.is_block_active(BlockFormat::BulletedList));
    assert!(!editor.is_block_active(BlockFormat::NumberedList));
    assert_eq!(editor.selection(), Some(&Range::collapsed(at(&[0, 0, 0], 0))));
}

#[test]
fn toggle_block_twice_restores_the_paragraph() {
    let mut editor = DocumentEditor::from_markup("<p>item</p>");
    assert!(editor.toggle_block(BlockFormat::BulletedList));
    assert!(editor.toggle_block(BlockFormat::BulletedList));
    assert_eq!(editor.markup(), "<p>item</p>");
    assert_eq!(editor.selection(), Some(&Range::collapsed(at(&[0, 0], 0))));
}

#[test]
fn toggle_block_covers_every_selected_paragraph() {
    let mut editor = editor_with_range(
        "<p>one</p><p>two</p><p>three</p>",
        at(&[0, 0], 1),
        at(&[1, 0], 1),
    );
    assert!(editor.toggle_block(BlockFormat::NumberedList));
    assert_eq!(editor.markup(), "<ol><li>one</li><li>two</li></ol><p>three</p>");
}

#[test]
fn toggle_block_splits_the_list_around_the_selection() {
    let mut editor = editor_with_range(
        "<ul><li>a</li><li>b</li><li>c</li></ul>",
        at(&[0, 1, 0], 0),
        at(&[0, 1, 0], 1),
    );
    assert!(editor.is_block_active(BlockFormat::BulletedList));
    assert!(editor.toggle_block(BlockFormat::BulletedList));
    assert_eq!(editor.markup(), "<ul><li>a</li></ul><p>b</p><ul><li>c</li></ul>");
    assert_eq!(
        editor.selection(),
        Some(&Range::new(at(&[1, 0], 0), at(&[1, 0], 1)))
    );
}

#[test]
fn switching_list_kind_rewraps_the_items() {
    let mut editor = editor_with_range(
        "<ul><li>a</li><li>b</li></ul><p>c</p>",
        at(&[0, 0, 0], 0),
        at(&[1, 0], 1),
    );
    assert!(editor.toggle_block(BlockFormat::NumberedList));
    assert_eq!(editor.markup(), "<ol><li>a</li><li>b</li><li>c</li></ol>");
}

#[test]
fn toggle_block_on_an_empty_document_is_a_no_op() {
    let mut editor = DocumentEditor::new(Vec::new());
    assert!(!editor.is_block_active(BlockFormat::BulletedList));
    assert!(!editor.toggle_block(BlockFormat::BulletedList));
    assert!(editor.children().is_empty());
}

#[test]
fn toggle_block_ignores_a_stale_selection() {
    let mut editor = DocumentEditor::from_markup("<p>a</p><p>b</p>");
    editor.select_point(at(&[1, 0], 1));
    editor.replace_document_silently(vec![Node::paragraph(vec![Node::text("only")])]);
    editor.selection = Some(Range::collapsed(at(&[1, 0], 1)));
    assert!(!editor.is_block_active(BlockFormat::BulletedList));
    assert!(!editor.toggle_block(BlockFormat::BulletedList));
    assert_eq!(editor.markup(), "<p>only</p>");
}

#[test]
fn undo_restores_the_list() {
    let mut editor = DocumentEditor::from_markup("<ul><li>a</li></ul>");
    assert!(editor.toggle_block(BlockFormat::BulletedList));
    assert_eq!(editor.markup(), "<p>a</p>");
    assert!(editor.undo());
    assert_eq!(editor.markup(), "<ul><li>a</li></ul>");
}
