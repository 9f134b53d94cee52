use log::debug;

use super::DocumentEditor;
use crate::document::path::{self, Path};
use crate::document::{ListKind, Node};
use crate::error::{EditorError, Result};

/// One structural repair. Fixes are found one at a time from the root down
/// and applied as primitive operations, so they are undoable and the
/// selection follows them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Fix {
    Remove(Path),
    Unwrap(Path),
    /// Merge the node into its previous sibling.
    Merge(Path),
    InsertEmptyLeaf(Path),
    Wrap {
        parent: Path,
        start: usize,
        end: usize,
        wrapper: Node,
    },
    Set {
        path: Path,
        properties: Node,
    },
}

/// First invariant violation in document order, if any.
pub(crate) fn find_fix(nodes: &[Node]) -> Option<Fix> {
    if let Some(fix) = root_fix(nodes) {
        return Some(fix);
    }
    nodes
        .iter()
        .enumerate()
        .find_map(|(idx, node)| node_fix(node, vec![idx]))
}

fn root_fix(nodes: &[Node]) -> Option<Fix> {
    let start = nodes
        .iter()
        .position(|node| node.is_inline() || matches!(node, Node::ListItem { .. }))?;
    let wrap_items = matches!(nodes[start], Node::ListItem { .. });
    let run = nodes[start..]
        .iter()
        .take_while(|node| {
            if wrap_items {
                matches!(node, Node::ListItem { .. })
            } else {
                node.is_inline()
            }
        })
        .count();
    let wrapper = if wrap_items {
        Node::list(ListKind::Bulleted, Vec::new())
    } else {
        Node::paragraph(Vec::new())
    };
    Some(Fix::Wrap {
        parent: Vec::new(),
        start,
        end: start + run,
        wrapper,
    })
}

fn node_fix(node: &Node, node_path: Path) -> Option<Fix> {
    match node {
        Node::Text(_) => None,
        Node::Paragraph { children } | Node::ListItem { children } => {
            if children.is_empty() {
                return Some(Fix::InsertEmptyLeaf(path::child(&node_path, 0)));
            }
            if let Some(idx) = children.iter().position(Node::is_block) {
                return Some(Fix::Unwrap(path::child(&node_path, idx)));
            }
            inline_fix(children, &node_path).or_else(|| children_fix(children, &node_path))
        }
        Node::List { children, .. } => {
            if children.is_empty() {
                return Some(Fix::Remove(node_path));
            }
            list_fix(children, &node_path).or_else(|| children_fix(children, &node_path))
        }
        Node::Link { children, .. } => {
            if children.iter().any(|child| !child.is_text()) {
                return Some(Fix::Unwrap(node_path));
            }
            if node.plain_text().is_empty() {
                return Some(Fix::Remove(node_path));
            }
            inline_fix(children, &node_path)
        }
    }
}

fn children_fix(children: &[Node], parent: &[usize]) -> Option<Fix> {
    children
        .iter()
        .enumerate()
        .find_map(|(idx, child)| node_fix(child, path::child(parent, idx)))
}

fn list_fix(children: &[Node], list_path: &[usize]) -> Option<Fix> {
    let has_item = children.iter().any(|child| matches!(child, Node::ListItem { .. }));
    for (idx, child) in children.iter().enumerate() {
        let child_path = path::child(list_path, idx);
        match child {
            Node::ListItem { .. } => {}
            Node::Paragraph { .. } => {
                return Some(Fix::Set {
                    path: child_path,
                    properties: Node::list_item(Vec::new()),
                });
            }
            Node::List { .. } => return Some(Fix::Unwrap(child_path)),
            Node::Text(leaf) if has_item && leaf.text.trim().is_empty() => {
                return Some(Fix::Remove(child_path));
            }
            Node::Text(_) | Node::Link { .. } => {
                return Some(Fix::Wrap {
                    parent: list_path.to_vec(),
                    start: idx,
                    end: idx + 1,
                    wrapper: Node::list_item(Vec::new()),
                });
            }
        }
    }
    None
}

// Inline siblings: equal-mark leaves merge, and an empty leaf goes away when
// it has a text neighbour to stand in for it.
fn inline_fix(children: &[Node], parent: &[usize]) -> Option<Fix> {
    for (idx, pair) in children.windows(2).enumerate() {
        if let (Node::Text(left), Node::Text(right)) = (&pair[0], &pair[1]) {
            if left.marks() == right.marks() {
                return Some(Fix::Merge(path::child(parent, idx + 1)));
            }
        }
    }
    if children.len() < 2 {
        return None;
    }
    for (idx, child) in children.iter().enumerate() {
        let Node::Text(leaf) = child else {
            continue;
        };
        if !leaf.text.is_empty() {
            continue;
        }
        let previous_is_text = idx > 0 && children[idx - 1].is_text();
        let next_is_text = children.get(idx + 1).is_some_and(Node::is_text);
        if previous_is_text || next_is_text {
            return Some(Fix::Remove(path::child(parent, idx)));
        }
    }
    None
}

impl DocumentEditor {
    /// Repairs the tree until no invariant is violated. Gives up with
    /// [`EditorError::NormalizationOverflow`] once the configured limit of
    /// fixes is spent.
    pub(crate) fn try_normalize(&mut self) -> Result<()> {
        let limit = self.config.normalize_limit;
        let mut applied = 0;
        while let Some(fix) = find_fix(&self.children) {
            if applied == limit {
                return Err(EditorError::NormalizationOverflow(limit));
            }
            self.apply_fix(fix)?;
            applied += 1;
        }
        if applied > 0 {
            debug!("normalization applied {applied} fixes");
        }
        Ok(())
    }

    fn apply_fix(&mut self, fix: Fix) -> Result<()> {
        match fix {
            Fix::Remove(target) => self.remove_node(&target).map(|_| ()),
            Fix::Unwrap(target) => self.unwrap_node(&target).map(|_| ()),
            Fix::Merge(target) => self.merge_node(&target),
            Fix::InsertEmptyLeaf(target) => self.insert_node(target, Node::text("")),
            Fix::Wrap {
                parent,
                start,
                end,
                wrapper,
            } => self.wrap_nodes(&parent, start, end, wrapper),
            Fix::Set { path, properties } => self.set_node(&path, properties),
        }
    }
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
