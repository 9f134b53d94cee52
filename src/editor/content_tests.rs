use serde_json::json;

use super::*;

fn at(path: &[usize], offset: usize) -> Point {
    Point::new(path.to_vec(), offset)
}

fn editor_with_cursor(markup: &str, path: &[usize], offset: usize) -> DocumentEditor {
    let mut editor = DocumentEditor::from_markup(markup);
    assert!(editor.select_point(at(path, offset)), "cursor {path:?}@{offset} does not resolve");
    editor
}

fn cursor(editor: &DocumentEditor) -> Point {
    let selection = editor.selection().expect("selection");
    assert!(selection.is_collapsed(), "expected a collapsed selection");
    selection.anchor.clone()
}

#[test]
fn char_to_byte_idx_handles_multibyte_text() {
    assert_eq!(char_to_byte_idx("héllo", 0), 0);
    assert_eq!(char_to_byte_idx("héllo", 2), 3);
    assert_eq!(char_to_byte_idx("héllo", 5), 6);
    assert_eq!(char_to_byte_idx("héllo", 9), 6);
}

#[test]
fn insert_text_at_cursor() {
    let mut editor = editor_with_cursor("<p>helo</p>", &[0, 0], 2);
    assert!(editor.insert_text("l"));
    assert_eq!(editor.markup(), "<p>hello</p>");
    assert_eq!(cursor(&editor), at(&[0, 0], 3));
}

#[test]
fn insert_text_counts_characters_not_bytes() {
    let mut editor = editor_with_cursor("<p>über</p>", &[0, 0], 1);
    assert!(editor.insert_text("ß"));
    assert!(editor.insert_text("x"));
    assert_eq!(editor.markup(), "<p>üßxber</p>");
}

#[test]
fn insert_text_replaces_expanded_selection() {
    let mut editor = DocumentEditor::from_markup("<p>hello world</p>");
    editor.select(Range::new(at(&[0, 0], 0), at(&[0, 0], 5)));
    assert!(editor.insert_text("bye"));
    assert_eq!(editor.markup(), "<p>bye world</p>");
    assert_eq!(cursor(&editor), at(&[0, 0], 3));
}

#[test]
fn typing_into_an_empty_document_creates_a_paragraph() {
    let mut editor = DocumentEditor::new(Vec::new());
    assert!(editor.insert_text("hi"));
    assert_eq!(editor.markup(), "<p>hi</p>");
}

#[test]
fn typed_text_escapes_the_end_of_a_link() {
    let mut editor =
        editor_with_cursor("<p><a href=\"https://x.test\">link</a></p>", &[0, 0, 0], 4);
    assert!(editor.insert_text("x"));
    assert_eq!(
        serde_json::to_value(editor.children()).unwrap(),
        json!([{
            "type": "paragraph",
            "children": [
                {
                    "type": "link",
                    "url": "https://x.test",
                    "children": [{"type": "text", "text": "link"}]
                },
                {"type": "text", "text": "x"}
            ]
        }])
    );
    assert_eq!(editor.markup(), "<p><a href=\"https://x.test\">link</a>x</p>");
}

#[test]
fn typed_text_inside_a_link_extends_it() {
    let mut editor = editor_with_cursor("<p><a href=\"u\">lnk</a></p>", &[0, 0, 0], 1);
    assert!(editor.insert_text("i"));
    assert_eq!(editor.markup(), "<p><a href=\"u\">link</a></p>");
}

#[test]
fn soft_break_stays_in_the_paragraph() {
    let mut editor = editor_with_cursor("<p>ab</p>", &[0, 0], 1);
    assert!(editor.insert_soft_break());
    assert_eq!(editor.children().len(), 1);
    assert_eq!(editor.markup(), "<p>a<br/>b</p>");
    assert_eq!(cursor(&editor), at(&[0, 0], 2));
}

#[test]
fn soft_break_escapes_the_end_of_a_link() {
    let mut editor = editor_with_cursor("<p>see <a href=\"u\">here</a></p>", &[0, 1, 0], 4);
    assert!(editor.insert_soft_break());
    assert_eq!(editor.markup(), "<p>see <a href=\"u\">here</a><br/></p>");
}

#[test]
fn insert_break_splits_the_paragraph() {
    let mut editor = editor_with_cursor("<p>hello world</p>", &[0, 0], 5);
    assert!(editor.insert_break());
    assert_eq!(editor.markup(), "<p>hello</p><p> world</p>");
    assert_eq!(cursor(&editor), at(&[1, 0], 0));
}

#[test]
fn insert_break_at_the_end_leaves_an_empty_paragraph() {
    let mut editor = editor_with_cursor("<p>ab</p>", &[0, 0], 2);
    assert!(editor.insert_break());
    assert_eq!(editor.markup(), "<p>ab</p><p></p>");
    assert!(editor.insert_text("c"));
    assert_eq!(editor.markup(), "<p>ab</p><p>c</p>");
}

#[test]
fn insert_break_splits_list_items() {
    let mut editor = editor_with_cursor("<ul><li>ab</li></ul>", &[0, 0, 0], 1);
    assert!(editor.insert_break());
    assert_eq!(editor.markup(), "<ul><li>a</li><li>b</li></ul>");
    assert_eq!(cursor(&editor), at(&[0, 1, 0], 0));
}

#[test]
fn delete_backward_removes_one_character() {
    let mut editor = editor_with_cursor("<p>abc</p>", &[0, 0], 3);
    assert!(editor.delete_backward());
    assert_eq!(editor.markup(), "<p>ab</p>");
    assert_eq!(cursor(&editor), at(&[0, 0], 2));
}

#[test]
fn delete_backward_at_block_start_merges_blocks() {
    let mut editor = editor_with_cursor("<p>ab</p><p>cd</p>", &[1, 0], 0);
    assert!(editor.delete_backward());
    assert_eq!(editor.markup(), "<p>abcd</p>");
    assert_eq!(cursor(&editor), at(&[0, 0], 2));
}

#[test]
fn delete_backward_pulls_a_list_item_into_the_paragraph() {
    let mut editor = editor_with_cursor("<p>ab</p><ul><li>cd</li></ul>", &[1, 0, 0], 0);
    assert!(editor.delete_backward());
    assert_eq!(editor.markup(), "<p>abcd</p>");
}

#[test]
fn delete_backward_at_document_start_is_a_no_op() {
    let mut editor = editor_with_cursor("<p>ab</p>", &[0, 0], 0);
    assert!(!editor.delete_backward());
    assert_eq!(editor.markup(), "<p>ab</p>");
}

#[test]
fn delete_backward_removes_an_emptied_link() {
    let mut editor = editor_with_cursor("<p>a<a href=\"u\">b</a></p>", &[0, 1, 0], 1);
    assert!(editor.delete_backward());
    assert_eq!(editor.markup(), "<p>a</p>");
    assert_eq!(cursor(&editor), at(&[0, 0], 1));
}

#[test]
fn delete_fragment_joins_the_edge_blocks() {
    let mut editor = DocumentEditor::from_markup("<p>hello</p><p>big</p><p>world</p>");
    editor.select(Range::new(at(&[0, 0], 2), at(&[2, 0], 3)));
    assert!(editor.delete_fragment());
    assert_eq!(editor.markup(), "<p>held</p>");
    assert_eq!(cursor(&editor), at(&[0, 0], 2));
}

#[test]
fn delete_fragment_handles_backward_selections_across_marks() {
    let mut editor = DocumentEditor::from_markup("<p>ab<strong>cd</strong>ef</p>");
    editor.select(Range::new(at(&[0, 2], 1), at(&[0, 0], 1)));
    assert!(editor.delete_fragment());
    assert_eq!(editor.markup(), "<p>af</p>");
    assert_eq!(cursor(&editor), at(&[0, 0], 1));
}

#[test]
fn delete_fragment_on_a_collapsed_selection_does_nothing() {
    let mut editor = editor_with_cursor("<p>ab</p>", &[0, 0], 1);
    assert!(!editor.delete_fragment());
}

#[test]
fn inline_insertion_lands_beside_a_link() {
    let mut editor = editor_with_cursor("<p><a href=\"u\">abcd</a></p>", &[0, 0, 0], 2);
    let inserted = editor
        .transact("insert inline", |editor| {
            editor.try_insert_inline(Node::text("X")).map(|_| ())
        });
    assert!(inserted);
    assert_eq!(editor.markup(), "<p><a href=\"u\">ab</a>X<a href=\"u\">cd</a></p>");
}
