use crate::document::path::{self, Path};
use crate::document::{Node, Point, children_at_mut, leaf_at_mut, node_at_mut};
use crate::error::{EditorError, Result};

use super::content::char_to_byte_idx;

/// Primitive, invertible tree mutation. Every editing command is expressed as
/// a sequence of these so that selections can be carried across changes and
/// history can replay them backwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    InsertText {
        path: Path,
        offset: usize,
        text: String,
    },
    RemoveText {
        path: Path,
        offset: usize,
        text: String,
    },
    InsertNode {
        path: Path,
        node: Node,
    },
    RemoveNode {
        path: Path,
        node: Node,
    },
    /// Merges the node at `path` into its previous sibling. `position` is the
    /// previous sibling's content length before the merge, `properties` the
    /// merged node's shell.
    MergeNode {
        path: Path,
        position: usize,
        properties: Node,
    },
    /// Splits the node at `path` at `position`; the tail becomes a new next
    /// sibling built from `properties`.
    SplitNode {
        path: Path,
        position: usize,
        properties: Node,
    },
    MoveNode {
        path: Path,
        new_path: Path,
    },
    SetNode {
        path: Path,
        properties: Node,
        new_properties: Node,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Affinity {
    Forward,
    Backward,
}

impl Operation {
    pub fn inverse(&self) -> Operation {
        match self {
            Operation::InsertText { path, offset, text } => Operation::RemoveText {
                path: path.clone(),
                offset: *offset,
                text: text.clone(),
            },
            Operation::RemoveText { path, offset, text } => Operation::InsertText {
                path: path.clone(),
                offset: *offset,
                text: text.clone(),
            },
            Operation::InsertNode { path, node } => Operation::RemoveNode {
                path: path.clone(),
                node: node.clone(),
            },
            Operation::RemoveNode { path, node } => Operation::InsertNode {
                path: path.clone(),
                node: node.clone(),
            },
            Operation::MergeNode {
                path,
                position,
                properties,
            } => Operation::SplitNode {
                path: path::previous(path).unwrap_or_default(),
                position: *position,
                properties: properties.clone(),
            },
            Operation::SplitNode {
                path,
                position,
                properties,
            } => Operation::MergeNode {
                path: path::next(path),
                position: *position,
                properties: properties.clone(),
            },
            Operation::MoveNode { path, new_path } => {
                if path == new_path {
                    return self.clone();
                }
                if path::is_sibling(path, new_path) {
                    return Operation::MoveNode {
                        path: new_path.clone(),
                        new_path: path.clone(),
                    };
                }
                let inverse_path = transform_path(path, self, Affinity::Forward)
                    .unwrap_or_else(|| new_path.clone());
                let inverse_new_path = transform_path(&path::next(path), self, Affinity::Forward)
                    .unwrap_or_else(|| path.clone());
                Operation::MoveNode {
                    path: inverse_path,
                    new_path: inverse_new_path,
                }
            }
            Operation::SetNode {
                path,
                properties,
                new_properties,
            } => Operation::SetNode {
                path: path.clone(),
                properties: new_properties.clone(),
                new_properties: properties.clone(),
            },
        }
    }
}

pub fn apply_operation(nodes: &mut Vec<Node>, op: &Operation) -> Result<()> {
    match op {
        Operation::InsertText { path, offset, text } => {
            let leaf =
                leaf_at_mut(nodes, path).ok_or_else(|| EditorError::PathNotFound(path.clone()))?;
            if *offset > leaf.char_len() {
                return Err(EditorError::OffsetOutOfRange {
                    path: path.clone(),
                    offset: *offset,
                });
            }
            let byte_idx = char_to_byte_idx(&leaf.text, *offset);
            leaf.text.insert_str(byte_idx, text);
        }
        Operation::RemoveText { path, offset, text } => {
            let leaf =
                leaf_at_mut(nodes, path).ok_or_else(|| EditorError::PathNotFound(path.clone()))?;
            let end = offset + text.chars().count();
            if end > leaf.char_len() {
                return Err(EditorError::OffsetOutOfRange {
                    path: path.clone(),
                    offset: end,
                });
            }
            let start_byte = char_to_byte_idx(&leaf.text, *offset);
            let end_byte = char_to_byte_idx(&leaf.text, end);
            leaf.text.drain(start_byte..end_byte);
        }
        Operation::InsertNode { path, node } => {
            let (siblings, index) = siblings_mut(nodes, path)?;
            if index > siblings.len() {
                return Err(EditorError::invalid("insert node", path));
            }
            siblings.insert(index, node.clone());
        }
        Operation::RemoveNode { path, .. } => {
            let (siblings, index) = siblings_mut(nodes, path)?;
            if index >= siblings.len() {
                return Err(EditorError::PathNotFound(path.clone()));
            }
            siblings.remove(index);
        }
        Operation::MergeNode { path, .. } => {
            let (siblings, index) = siblings_mut(nodes, path)?;
            if index == 0 || index >= siblings.len() {
                return Err(EditorError::invalid("merge node", path));
            }
            let compatible = match (&siblings[index - 1], &siblings[index]) {
                (Node::Text(_), Node::Text(_)) => true,
                (left, right) => !left.is_text() && !right.is_text(),
            };
            if !compatible {
                return Err(EditorError::invalid("merge node", path));
            }
            let node = siblings.remove(index);
            match (&mut siblings[index - 1], node) {
                (Node::Text(left), Node::Text(right)) => left.text.push_str(&right.text),
                (left, mut right) => {
                    if let (Some(target), Some(moved)) =
                        (left.children_mut(), right.children_mut())
                    {
                        target.append(moved);
                    }
                }
            }
        }
        Operation::SplitNode {
            path,
            position,
            properties,
        } => {
            let (siblings, index) = siblings_mut(nodes, path)?;
            let Some(node) = siblings.get_mut(index) else {
                return Err(EditorError::PathNotFound(path.clone()));
            };
            if *position > node.content_len() {
                return Err(EditorError::OffsetOutOfRange {
                    path: path.clone(),
                    offset: *position,
                });
            }
            let tail = match node {
                Node::Text(leaf) => {
                    let byte_idx = char_to_byte_idx(&leaf.text, *position);
                    let right = leaf.text.split_off(byte_idx);
                    let mut tail = properties.shell();
                    if let Some(tail_leaf) = tail.as_text_mut() {
                        tail_leaf.text = right;
                    } else {
                        return Err(EditorError::invalid("split node", path));
                    }
                    tail
                }
                element => {
                    if properties.is_text() {
                        return Err(EditorError::invalid("split node", path));
                    }
                    let moved = element
                        .children_mut()
                        .map(|children| children.split_off(*position))
                        .unwrap_or_default();
                    properties.with_children(moved)
                }
            };
            siblings.insert(index + 1, tail);
        }
        Operation::MoveNode { path, new_path } => {
            if path == new_path {
                return Ok(());
            }
            if path::is_ancestor(path, new_path) {
                return Err(EditorError::invalid("move node into itself", path));
            }
            let (siblings, index) = siblings_mut(nodes, path)?;
            if index >= siblings.len() {
                return Err(EditorError::PathNotFound(path.clone()));
            }
            let node = siblings.remove(index);
            let target = transform_path(path, op, Affinity::Forward)
                .ok_or_else(|| EditorError::invalid("move node", new_path))?;
            let (siblings, index) = siblings_mut(nodes, &target)?;
            if index > siblings.len() {
                return Err(EditorError::invalid("move node", new_path));
            }
            siblings.insert(index, node);
        }
        Operation::SetNode {
            path,
            new_properties,
            ..
        } => {
            let node =
                node_at_mut(nodes, path).ok_or_else(|| EditorError::PathNotFound(path.clone()))?;
            if !node.apply_shell(new_properties) {
                return Err(EditorError::invalid("set node", path));
            }
        }
    }
    Ok(())
}

fn siblings_mut<'a>(
    nodes: &'a mut Vec<Node>,
    path: &[usize],
) -> Result<(&'a mut Vec<Node>, usize)> {
    let Some((&index, parent)) = path.split_last() else {
        return Err(EditorError::invalid("address the document root", path));
    };
    let siblings = children_at_mut(nodes, parent)
        .ok_or_else(|| EditorError::PathNotFound(path.to_vec()))?;
    Ok((siblings, index))
}

/// Where `path` ends up after `op`, or `None` when the node was removed.
pub fn transform_path(path: &[usize], op: &Operation, affinity: Affinity) -> Option<Path> {
    let mut p = path.to_vec();
    match op {
        Operation::InsertNode { path: op_path, .. } => {
            if op_path.as_slice() == path
                || path::ends_before(op_path, path)
                || path::is_ancestor(op_path, path)
            {
                p[op_path.len() - 1] += 1;
            }
        }
        Operation::RemoveNode { path: op_path, .. } => {
            if path::is_ancestor_or_equal(op_path, path) {
                return None;
            }
            if path::ends_before(op_path, path) {
                p[op_path.len() - 1] -= 1;
            }
        }
        Operation::MergeNode {
            path: op_path,
            position,
            ..
        } => {
            if op_path.as_slice() == path || path::ends_before(op_path, path) {
                p[op_path.len() - 1] -= 1;
            } else if path::is_ancestor(op_path, path) {
                p[op_path.len() - 1] -= 1;
                p[op_path.len()] += position;
            }
        }
        Operation::SplitNode {
            path: op_path,
            position,
            ..
        } => {
            if op_path.as_slice() == path {
                if affinity == Affinity::Forward {
                    p[op_path.len() - 1] += 1;
                }
            } else if path::ends_before(op_path, path) {
                p[op_path.len() - 1] += 1;
            } else if path::is_ancestor(op_path, path) && path[op_path.len()] >= *position {
                p[op_path.len() - 1] += 1;
                p[op_path.len()] -= position;
            }
        }
        Operation::MoveNode {
            path: op_path,
            new_path,
        } => {
            if op_path == new_path {
                return Some(p);
            }
            if path::is_ancestor_or_equal(op_path, path) {
                let mut moved = new_path.clone();
                if path::ends_before(op_path, new_path) && op_path.len() < new_path.len() {
                    moved[op_path.len() - 1] -= 1;
                }
                moved.extend_from_slice(&path[op_path.len()..]);
                return Some(moved);
            }
            if path::is_sibling(op_path, new_path) && path::is_ancestor_or_equal(new_path, path) {
                if path::ends_before(op_path, path) {
                    p[op_path.len() - 1] -= 1;
                } else {
                    p[op_path.len() - 1] += 1;
                }
            } else if path::ends_before(new_path, path)
                || path::is_ancestor_or_equal(new_path, path)
            {
                if path::ends_before(op_path, path) {
                    p[op_path.len() - 1] -= 1;
                }
                p[new_path.len() - 1] += 1;
            } else if path::ends_before(op_path, path) {
                p[op_path.len() - 1] -= 1;
            }
        }
        Operation::InsertText { .. }
        | Operation::RemoveText { .. }
        | Operation::SetNode { .. } => {}
    }
    Some(p)
}

/// Where `point` ends up after `op`, or `None` when its leaf was removed.
pub fn transform_point(point: &Point, op: &Operation, affinity: Affinity) -> Option<Point> {
    let mut result = point.clone();
    match op {
        Operation::InsertText { path, offset, text } => {
            if *path == point.path
                && (*offset < point.offset
                    || (*offset == point.offset && affinity == Affinity::Forward))
            {
                result.offset += text.chars().count();
            }
        }
        Operation::RemoveText { path, offset, text } => {
            if *path == point.path && *offset <= point.offset {
                result.offset -= (point.offset - offset).min(text.chars().count());
            }
        }
        Operation::MergeNode { path, position, .. } if *path == point.path => {
            result.offset += position;
            result.path = transform_path(&point.path, op, affinity)?;
        }
        Operation::SplitNode { path, position, .. } if *path == point.path => {
            if *position < point.offset
                || (*position == point.offset && affinity == Affinity::Forward)
            {
                result.offset -= position;
                result.path = transform_path(&point.path, op, Affinity::Forward)?;
            }
        }
        _ => {
            result.path = transform_path(&point.path, op, affinity)?;
        }
    }
    Some(result)
}
