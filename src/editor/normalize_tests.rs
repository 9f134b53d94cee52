use super::*;
use crate::document::{Mark, Marks, Point, Range};

fn bold(text: &str) -> Node {
    Node::marked_text(text, Marks::default().with(Mark::Bold, true))
}

fn paragraph(children: Vec<Node>) -> Node {
    Node::paragraph(children)
}

fn bulleted(children: Vec<Node>) -> Node {
    Node::list(ListKind::Bulleted, children)
}

#[test]
fn normalized_tree_needs_no_fix() {
    let nodes = vec![
        paragraph(vec![Node::text("a"), bold("b")]),
        bulleted(vec![Node::list_item(vec![Node::text("c")])]),
    ];
    assert_eq!(find_fix(&nodes), None);
}

#[test]
fn adjacent_leaves_with_equal_marks_merge() {
    let nodes = vec![paragraph(vec![Node::text("a"), Node::text("b")])];
    assert_eq!(find_fix(&nodes), Some(Fix::Merge(vec![0, 1])));

    let editor = DocumentEditor::new(nodes);
    assert_eq!(editor.children(), &[paragraph(vec![Node::text("ab")])]);
}

#[test]
fn leaves_with_different_marks_stay_apart() {
    let nodes = vec![paragraph(vec![Node::text("a"), bold("b")])];
    assert_eq!(find_fix(&nodes), None);
}

#[test]
fn empty_leaf_beside_text_is_removed() {
    let nodes = vec![paragraph(vec![Node::text("a"), Node::text(""), bold("b")])];
    assert_eq!(find_fix(&nodes), Some(Fix::Merge(vec![0, 1])));

    let nodes = vec![paragraph(vec![
        bold("a"),
        Node::text(""),
        Node::link("u", vec![Node::text("x")]),
    ])];
    assert_eq!(find_fix(&nodes), Some(Fix::Remove(vec![0, 1])));
}

#[test]
fn empty_leaf_between_links_survives() {
    let nodes = vec![paragraph(vec![
        Node::link("u", vec![Node::text("x")]),
        Node::text(""),
        Node::link("v", vec![Node::text("y")]),
    ])];
    assert_eq!(find_fix(&nodes), None);
}

#[test]
fn empty_link_is_removed() {
    let nodes = vec![paragraph(vec![Node::text("a"), Node::link("u", vec![Node::text("")])])];
    assert_eq!(find_fix(&nodes), Some(Fix::Remove(vec![0, 1])));

    let editor = DocumentEditor::new(nodes);
    assert_eq!(editor.markup(), "<p>a</p>");
}

#[test]
fn link_holding_a_non_text_child_is_unwrapped() {
    let inner = Node::link("v", vec![Node::text("x")]);
    let nodes = vec![paragraph(vec![Node::link("u", vec![inner.clone()])])];
    assert_eq!(find_fix(&nodes), Some(Fix::Unwrap(vec![0, 0])));

    let editor = DocumentEditor::new(nodes);
    assert_eq!(editor.children(), &[paragraph(vec![inner])]);
}

#[test]
fn childless_blocks_get_an_empty_leaf() {
    assert_eq!(
        find_fix(&[paragraph(Vec::new())]),
        Some(Fix::InsertEmptyLeaf(vec![0, 0]))
    );
    let editor = DocumentEditor::new(vec![bulleted(vec![Node::list_item(Vec::new())])]);
    assert_eq!(
        editor.children(),
        &[bulleted(vec![Node::list_item(vec![Node::text("")])])]
    );
}

#[test]
fn block_inside_a_paragraph_is_unwrapped() {
    let nodes = vec![paragraph(vec![paragraph(vec![Node::text("x")])])];
    assert_eq!(find_fix(&nodes), Some(Fix::Unwrap(vec![0, 0])));

    let editor = DocumentEditor::new(nodes);
    assert_eq!(editor.markup(), "<p>x</p>");
}

#[test]
fn paragraph_inside_a_list_becomes_an_item() {
    let nodes = vec![bulleted(vec![paragraph(vec![Node::text("x")])])];
    assert_eq!(
        find_fix(&nodes),
        Some(Fix::Set {
            path: vec![0, 0],
            properties: Node::list_item(Vec::new()),
        })
    );

    let editor = DocumentEditor::new(nodes);
    assert_eq!(editor.markup(), "<ul><li>x</li></ul>");
}

#[test]
fn list_contents_are_repaired() {
    assert_eq!(
        find_fix(&[bulleted(Vec::new()), paragraph(vec![Node::text("a")])]),
        Some(Fix::Remove(vec![0]))
    );

    let nested = vec![bulleted(vec![
        Node::list_item(vec![Node::text("a")]),
        Node::list(ListKind::Numbered, vec![Node::list_item(vec![Node::text("b")])]),
    ])];
    assert_eq!(find_fix(&nested), Some(Fix::Unwrap(vec![0, 1])));
    assert_eq!(DocumentEditor::new(nested).markup(), "<ul><li>a</li><li>b</li></ul>");

    let spaced = vec![bulleted(vec![Node::list_item(vec![Node::text("a")]), Node::text(" \n")])];
    assert_eq!(find_fix(&spaced), Some(Fix::Remove(vec![0, 1])));

    let loose = vec![bulleted(vec![Node::text("x")])];
    assert_eq!(
        find_fix(&loose),
        Some(Fix::Wrap {
            parent: vec![0],
            start: 0,
            end: 1,
            wrapper: Node::list_item(Vec::new()),
        })
    );
}

#[test]
fn root_inline_runs_are_wrapped() {
    let nodes = vec![
        Node::text("a"),
        Node::link("u", vec![Node::text("b")]),
        paragraph(vec![Node::text("c")]),
    ];
    assert_eq!(
        find_fix(&nodes),
        Some(Fix::Wrap {
            parent: Vec::new(),
            start: 0,
            end: 2,
            wrapper: Node::paragraph(Vec::new()),
        })
    );
    assert_eq!(
        DocumentEditor::new(nodes).markup(),
        "<p>a<a href=\"u\">b</a></p><p>c</p>"
    );
}

#[test]
fn root_list_items_are_wrapped_in_a_bulleted_list() {
    let nodes = vec![
        paragraph(vec![Node::text("p")]),
        Node::list_item(vec![Node::text("a")]),
        Node::list_item(vec![Node::text("b")]),
    ];
    assert_eq!(
        find_fix(&nodes),
        Some(Fix::Wrap {
            parent: Vec::new(),
            start: 1,
            end: 3,
            wrapper: bulleted(Vec::new()),
        })
    );
}

#[test]
fn whitespace_paragraph_is_kept() {
    let nodes = vec![paragraph(vec![Node::text(" ")])];
    assert_eq!(find_fix(&nodes), None);
}

#[test]
fn selection_follows_merges() {
    let mut editor = DocumentEditor::from_markup("<p>a</p>");
    assert!(editor.transact("append leaf", |editor| {
        editor.insert_node(vec![0, 1], Node::text("bc"))?;
        editor.selection = Some(Range::collapsed(Point::new(vec![0, 1], 1)));
        Ok(())
    }));
    assert_eq!(editor.children(), &[paragraph(vec![Node::text("abc")])]);
    assert_eq!(editor.selection(), Some(&Range::collapsed(Point::new(vec![0, 0], 2))));
}

#[test]
fn normalize_reports_whether_it_changed_anything() {
    let mut editor = DocumentEditor::from_markup("<p>a</p>");
    assert!(!editor.normalize());
    assert_eq!(editor.markup(), "<p>a</p>");
}
