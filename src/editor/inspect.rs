use std::cmp::Ordering;

use super::DocumentEditor;
use crate::document::path::{self, Path};
use crate::document::{
    Node, Point, Range, first_leaf_path, last_leaf_path, leaf_at, leaves, node_at,
};
use crate::error::{EditorError, Result};

pub fn is_valid_point(nodes: &[Node], point: &Point) -> bool {
    leaf_at(nodes, &point.path).is_some_and(|leaf| point.offset <= leaf.char_len())
}

pub fn is_valid_range(nodes: &[Node], range: &Range) -> bool {
    is_valid_point(nodes, &range.anchor) && is_valid_point(nodes, &range.focus)
}

/// Nearest strict ancestor of `path` matching `predicate`.
pub fn ancestor_matching(
    nodes: &[Node],
    path: &[usize],
    predicate: impl Fn(&Node) -> bool,
) -> Option<Path> {
    (1..path.len())
        .rev()
        .map(|len| &path[..len])
        .find(|candidate| node_at(nodes, candidate).is_some_and(&predicate))
        .map(<[usize]>::to_vec)
}

pub fn link_above(nodes: &[Node], path: &[usize]) -> Option<Path> {
    ancestor_matching(nodes, path, Node::is_link)
}

/// The paragraph or list item holding the leaf at `path`.
pub fn text_block_above(nodes: &[Node], path: &[usize]) -> Option<Path> {
    ancestor_matching(nodes, path, Node::is_text_block)
}

fn is_leaf_within(leaf_path: &[usize], start: &Point, end: &Point) -> bool {
    path::compare(leaf_path, &start.path) != Ordering::Less
        && path::compare(leaf_path, &end.path) != Ordering::Greater
}

/// Leaves touched by `start..end`, in document order.
pub fn leaves_in_range(nodes: &[Node], start: &Point, end: &Point) -> Vec<Path> {
    leaves(nodes)
        .into_iter()
        .filter(|(leaf_path, _)| is_leaf_within(leaf_path, start, end))
        .map(|(leaf_path, _)| leaf_path)
        .collect()
}

/// Character span of the leaf at `leaf_path` covered by `start..end`.
pub fn leaf_overlap(
    nodes: &[Node],
    leaf_path: &[usize],
    start: &Point,
    end: &Point,
) -> Option<(usize, usize)> {
    let leaf = leaf_at(nodes, leaf_path)?;
    if !is_leaf_within(leaf_path, start, end) {
        return None;
    }
    let from = if leaf_path == start.path.as_slice() {
        start.offset
    } else {
        0
    };
    let to = if leaf_path == end.path.as_slice() {
        end.offset
    } else {
        leaf.char_len()
    };
    Some((from, to.max(from)))
}

/// Leaves that carry at least one selected character. An empty leaf counts
/// only when nothing else is selected.
pub fn selected_leaves(nodes: &[Node], start: &Point, end: &Point) -> Vec<Path> {
    let touched = leaves_in_range(nodes, start, end);
    let covered: Vec<Path> = touched
        .iter()
        .filter(|leaf_path| {
            leaf_overlap(nodes, leaf_path, start, end).is_some_and(|(from, to)| from < to)
        })
        .cloned()
        .collect();
    if covered.is_empty() { touched } else { covered }
}

pub fn range_text(nodes: &[Node], start: &Point, end: &Point) -> String {
    let mut out = String::new();
    for leaf_path in leaves_in_range(nodes, start, end) {
        let (Some(leaf), Some((from, to))) = (
            leaf_at(nodes, &leaf_path),
            leaf_overlap(nodes, &leaf_path, start, end),
        ) else {
            continue;
        };
        out.extend(leaf.text.chars().skip(from).take(to - from));
    }
    out
}

/// Top-most nodes lying strictly between the leaves at `start` and `end`,
/// excluding every ancestor of either leaf.
pub fn nodes_between(nodes: &[Node], start: &[usize], end: &[usize]) -> Vec<Path> {
    let mut result = Vec::new();
    for (idx, node) in nodes.iter().enumerate() {
        collect_between(node, vec![idx], start, end, &mut result);
    }
    result
}

fn collect_between(
    node: &Node,
    node_path: Path,
    start: &[usize],
    end: &[usize],
    out: &mut Vec<Path>,
) {
    let after_start = path::compare(&node_path, start) == Ordering::Greater;
    let before_end = path::compare(&node_path, end) == Ordering::Less;
    if after_start && before_end {
        out.push(node_path);
        return;
    }
    let contains_edge = path::is_ancestor(&node_path, start) || path::is_ancestor(&node_path, end);
    if !contains_edge {
        return;
    }
    for (idx, child) in node.children().iter().enumerate() {
        collect_between(child, path::child(&node_path, idx), start, end, out);
    }
}

pub fn previous_leaf(nodes: &[Node], leaf_path: &[usize]) -> Option<Path> {
    leaves(nodes)
        .into_iter()
        .map(|(candidate, _)| candidate)
        .take_while(|candidate| path::compare(candidate, leaf_path) == Ordering::Less)
        .last()
}

/// Whether `point` sits at the very end of the node at `node_path`.
pub fn is_end_of(nodes: &[Node], point: &Point, node_path: &[usize]) -> bool {
    let Some(last) = last_leaf_path(nodes, node_path) else {
        return false;
    };
    last == point.path && leaf_at(nodes, &last).is_some_and(|leaf| leaf.char_len() == point.offset)
}

pub fn is_start_of(nodes: &[Node], point: &Point, node_path: &[usize]) -> bool {
    first_leaf_path(nodes, node_path).is_some_and(|first| first == point.path)
        && point.offset == 0
}

impl DocumentEditor {
    /// The selection's points in document order, provided the selection
    /// still resolves in the current tree.
    pub(crate) fn selection_edges(&self) -> Result<(Point, Point)> {
        let selection = self.selection.as_ref().ok_or(EditorError::NoSelection)?;
        if !is_valid_range(&self.children, selection) {
            return Err(EditorError::StaleSelection);
        }
        Ok(selection.edges())
    }

    /// The collapsed selection point, or the start of an expanded one.
    pub(crate) fn cursor(&self) -> Result<Point> {
        self.selection_edges().map(|(start, _)| start)
    }

    pub fn selection_is_valid(&self) -> bool {
        self.selection
            .as_ref()
            .is_some_and(|selection| is_valid_range(&self.children, selection))
    }

    pub(crate) fn valid_selection(&self) -> Option<&Range> {
        self.selection
            .as_ref()
            .filter(|selection| is_valid_range(&self.children, selection))
    }

    /// Plain text covered by the selection.
    pub fn selection_text(&self) -> String {
        match self.selection_edges() {
            Ok((start, end)) => range_text(&self.children, &start, &end),
            Err(_) => String::new(),
        }
    }
}
