use std::cmp::Ordering;
use std::mem;

use log::{debug, warn};

use crate::config::EditorConfig;
use crate::deserialize::deserialize_markup;
use crate::document::path::{self, Path};
use crate::document::{
    Marks, Node, Point, Range, first_leaf_path, last_leaf_path, leaf_at, leaves, node_at,
};
use crate::error::{EditorError, Result};
use crate::serialize::serialize_document;

mod content;
mod inspect;
mod links;
mod normalize;
pub mod operation;
mod paste;
mod structure;
mod styles;

pub use content::char_to_byte_idx;
pub use operation::{Affinity, Operation};
pub use paste::{ClipboardData, fragment_from_markup};
pub use structure::BlockFormat;

/// Operations committed together by one editing command, with the selection
/// on either side so undo and redo can put the cursor back.
#[derive(Clone, Debug)]
struct Batch {
    operations: Vec<Operation>,
    selection_before: Option<Range>,
    selection_after: Option<Range>,
}

#[derive(Clone, Debug, Default)]
struct History {
    undos: Vec<Batch>,
    redos: Vec<Batch>,
}

#[derive(Clone, Debug)]
struct PointRef {
    point: Option<Point>,
    affinity: Affinity,
}

pub struct DocumentEditor {
    children: Vec<Node>,
    selection: Option<Range>,
    marks: Option<Marks>,
    config: EditorConfig,
    history: History,
    operations: Vec<Operation>,
    point_refs: Vec<PointRef>,
    recording: bool,
    version: u64,
}

impl DocumentEditor {
    pub fn new(children: Vec<Node>) -> Self {
        Self::with_config(children, EditorConfig::default())
    }

    pub fn with_config(children: Vec<Node>, config: EditorConfig) -> Self {
        let mut editor = Self {
            children: Vec::new(),
            selection: None,
            marks: None,
            config,
            history: History::default(),
            operations: Vec::new(),
            point_refs: Vec::new(),
            recording: true,
            version: 0,
        };
        editor.replace_document_silently(children);
        editor
    }

    /// Builds an editor from stored markup. Markup that cannot be parsed
    /// yields an empty document.
    pub fn from_markup(markup: &str) -> Self {
        Self::from_markup_with_config(markup, EditorConfig::default())
    }

    pub fn from_markup_with_config(markup: &str, config: EditorConfig) -> Self {
        let children = deserialize_markup(markup).unwrap_or_else(|err| {
            warn!("failed to parse document markup, starting empty: {err}");
            Vec::new()
        });
        Self::with_config(children, config)
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn selection(&self) -> Option<&Range> {
        self.selection.as_ref()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Counter bumped whenever a command changes the document.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The current document serialized to markup.
    pub fn markup(&self) -> String {
        serialize_document(&self.children)
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn select(&mut self, range: Range) -> bool {
        if !inspect::is_valid_range(&self.children, &range) {
            warn!("ignoring selection that does not resolve: {range:?}");
            return false;
        }
        self.selection = Some(range);
        self.marks = None;
        true
    }

    pub fn select_point(&mut self, point: Point) -> bool {
        self.select(Range::collapsed(point))
    }

    pub fn deselect(&mut self) {
        self.selection = None;
        self.marks = None;
    }

    pub fn select_start(&mut self) -> bool {
        let Some(point) = self.start_point() else {
            return false;
        };
        self.select_point(point)
    }

    pub fn select_end(&mut self) -> bool {
        let Some(point) = self.end_point() else {
            return false;
        };
        self.select_point(point)
    }

    pub fn select_all(&mut self) -> bool {
        let (Some(start), Some(end)) = (self.start_point(), self.end_point()) else {
            return false;
        };
        self.select(Range::new(start, end))
    }

    fn start_point(&self) -> Option<Point> {
        if self.children.is_empty() {
            return None;
        }
        let path = first_leaf_path(&self.children, &[0])?;
        Some(Point::new(path, 0))
    }

    fn end_point(&self) -> Option<Point> {
        let last = self.children.len().checked_sub(1)?;
        let path = last_leaf_path(&self.children, &[last])?;
        let offset = leaf_at(&self.children, &path)?.char_len();
        Some(Point::new(path, offset))
    }

    /// Replaces the whole document without recording history: the selection
    /// is dropped, every top-level node removed, `nodes` inserted and
    /// normalized, and the cursor placed at the start of a non-empty result.
    pub fn replace_document_silently(&mut self, nodes: Vec<Node>) {
        self.recording = false;
        let replaced = self.transact("replace document", |editor| {
            editor.selection = None;
            editor.marks = None;
            for idx in (0..editor.children.len()).rev() {
                editor.remove_node(&[idx])?;
            }
            for (idx, node) in nodes.into_iter().enumerate() {
                editor.insert_node(vec![idx], node)?;
            }
            Ok(())
        });
        self.recording = true;
        self.history = History::default();
        if !self.children.is_empty() {
            self.select_start();
        }
        debug!(
            "document replaced (changed: {replaced}, {} top-level nodes)",
            self.children.len()
        );
    }

    /// Runs the normalization pass on its own.
    pub fn normalize(&mut self) -> bool {
        self.transact("normalize", |_| Ok(()))
    }

    pub fn can_undo(&self) -> bool {
        !self.history.undos.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.history.redos.is_empty()
    }

    pub fn undo(&mut self) -> bool {
        let Some(batch) = self.history.undos.pop() else {
            return false;
        };
        let inverse: Vec<Operation> =
            batch.operations.iter().rev().map(Operation::inverse).collect();
        if !self.replay("undo", &inverse, batch.selection_before.clone()) {
            return false;
        }
        debug!("undid {} operations", batch.operations.len());
        self.history.redos.push(batch);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(batch) = self.history.redos.pop() else {
            return false;
        };
        if !self.replay("redo", &batch.operations, batch.selection_after.clone()) {
            return false;
        }
        debug!("redid {} operations", batch.operations.len());
        self.history.undos.push(batch);
        true
    }

    fn replay(&mut self, action: &str, operations: &[Operation], selection: Option<Range>) -> bool {
        let selection_before = self.selection.clone();
        let outcome = operations.iter().try_for_each(|op| self.apply(op.clone()));
        let applied = mem::take(&mut self.operations);
        self.point_refs.clear();
        if let Err(err) = outcome {
            warn!("{action} failed, history discarded: {err}");
            self.rollback(&applied);
            self.selection = selection_before;
            self.history = History::default();
            return false;
        }
        self.selection = selection.filter(|range| inspect::is_valid_range(&self.children, range));
        self.marks = None;
        self.version += 1;
        true
    }

    /// Runs `f` as one undoable step followed by normalization. A failure
    /// anywhere rolls back every operation applied so far and leaves the
    /// document and selection as they were. Returns whether the document
    /// changed.
    pub(crate) fn transact(
        &mut self,
        action: &str,
        f: impl FnOnce(&mut Self) -> Result<()>,
    ) -> bool {
        let selection_before = self.selection.clone();
        let marks_before = self.marks;
        let outcome = f(self).and_then(|()| self.try_normalize());
        self.point_refs.clear();
        let operations = mem::take(&mut self.operations);
        if let Err(err) = outcome {
            warn!("{action} failed and was rolled back: {err}");
            self.rollback(&operations);
            self.selection = selection_before;
            self.marks = marks_before;
            return false;
        }
        if self.selection != selection_before {
            self.marks = None;
        }
        if operations.is_empty() {
            return false;
        }
        self.version += 1;
        if self.recording {
            self.push_history(Batch {
                operations,
                selection_before,
                selection_after: self.selection.clone(),
            });
        }
        true
    }

    fn push_history(&mut self, batch: Batch) {
        self.history.redos.clear();
        self.history.undos.push(batch);
        let depth = self.config.history_depth;
        if self.history.undos.len() > depth {
            let excess = self.history.undos.len() - depth;
            self.history.undos.drain(..excess);
        }
    }

    fn rollback(&mut self, operations: &[Operation]) {
        for op in operations.iter().rev() {
            if let Err(err) = operation::apply_operation(&mut self.children, &op.inverse()) {
                warn!("rollback stopped at {op:?}: {err}");
                break;
            }
        }
    }

    /// Applies one primitive operation and carries the selection and every
    /// tracked point across it.
    pub(crate) fn apply(&mut self, op: Operation) -> Result<()> {
        operation::apply_operation(&mut self.children, &op)?;
        self.transform_selection(&op);
        for tracked in &mut self.point_refs {
            if let Some(point) = &tracked.point {
                tracked.point = operation::transform_point(point, &op, tracked.affinity);
            }
        }
        self.operations.push(op);
        Ok(())
    }

    fn transform_selection(&mut self, op: &Operation) {
        let Some(selection) = self.selection.take() else {
            return;
        };
        let anchor = self.transform_selection_point(&selection.anchor, op);
        let focus = self.transform_selection_point(&selection.focus, op);
        self.selection = match (anchor, focus) {
            (Some(anchor), Some(focus)) => Some(Range::new(anchor, focus)),
            _ => None,
        };
    }

    fn transform_selection_point(&self, point: &Point, op: &Operation) -> Option<Point> {
        if let Some(point) = operation::transform_point(point, op, Affinity::Forward) {
            return Some(point);
        }
        let Operation::RemoveNode { path, .. } = op else {
            return None;
        };
        self.relocate_after_removal(path)
    }

    // Picks the leaf a selection point falls back to once the node holding it
    // is gone: the closest leaf before the removed path, unless the leaf after
    // it shares more of its ancestry.
    fn relocate_after_removal(&self, removed: &[usize]) -> Option<Point> {
        let mut previous = None;
        let mut next = None;
        for (leaf_path, leaf) in leaves(&self.children) {
            if path::compare(&leaf_path, removed) == Ordering::Less {
                previous = Some((leaf_path, leaf.char_len()));
            } else {
                next = Some(leaf_path);
                break;
            }
        }
        let prefer_next = match (&previous, &next) {
            (Some((previous_path, _)), Some(next_path)) => {
                if next_path.as_slice() == removed {
                    removed.last() == Some(&0)
                } else {
                    path::common_len(previous_path, removed) < path::common_len(next_path, removed)
                }
            }
            _ => false,
        };
        match (previous, next) {
            (Some((path, offset)), _) if !prefer_next => Some(Point::new(path, offset)),
            (_, Some(path)) => Some(Point::new(path, 0)),
            _ => None,
        }
    }

    pub(crate) fn point_ref(&mut self, point: Point, affinity: Affinity) -> usize {
        self.point_refs.push(PointRef {
            point: Some(point),
            affinity,
        });
        self.point_refs.len() - 1
    }

    pub(crate) fn point_ref_value(&self, id: usize) -> Result<Point> {
        self.point_refs
            .get(id)
            .and_then(|tracked| tracked.point.clone())
            .ok_or(EditorError::StaleSelection)
    }

    pub(crate) fn insert_node(&mut self, path: Path, node: Node) -> Result<()> {
        self.apply(Operation::InsertNode { path, node })
    }

    pub(crate) fn remove_node(&mut self, path: &[usize]) -> Result<Node> {
        let node = node_at(&self.children, path)
            .cloned()
            .ok_or_else(|| EditorError::PathNotFound(path.to_vec()))?;
        self.apply(Operation::RemoveNode {
            path: path.to_vec(),
            node: node.clone(),
        })?;
        Ok(node)
    }

    pub(crate) fn insert_text_at(&mut self, point: &Point, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.apply(Operation::InsertText {
            path: point.path.clone(),
            offset: point.offset,
            text: text.to_string(),
        })
    }

    /// Removes the characters `start..end` of the leaf at `path`.
    pub(crate) fn remove_text(&mut self, path: &[usize], start: usize, end: usize) -> Result<()> {
        if start >= end {
            return Ok(());
        }
        let leaf = leaf_at(&self.children, path)
            .ok_or_else(|| EditorError::PathNotFound(path.to_vec()))?;
        let text: String = leaf.text.chars().skip(start).take(end - start).collect();
        if text.chars().count() != end - start {
            return Err(EditorError::OffsetOutOfRange {
                path: path.to_vec(),
                offset: end,
            });
        }
        self.apply(Operation::RemoveText {
            path: path.to_vec(),
            offset: start,
            text,
        })
    }

    pub(crate) fn split_node(&mut self, path: &[usize], position: usize) -> Result<()> {
        let node = node_at(&self.children, path)
            .ok_or_else(|| EditorError::PathNotFound(path.to_vec()))?;
        let properties = node.shell();
        self.apply(Operation::SplitNode {
            path: path.to_vec(),
            position,
            properties,
        })
    }

    /// Merges the node at `path` into its previous sibling.
    pub(crate) fn merge_node(&mut self, path: &[usize]) -> Result<()> {
        let previous = path::previous(path)
            .ok_or_else(|| EditorError::invalid("merge the first child", path))?;
        let position = node_at(&self.children, &previous)
            .map(Node::content_len)
            .ok_or_else(|| EditorError::PathNotFound(previous.clone()))?;
        let properties = node_at(&self.children, path)
            .map(Node::shell)
            .ok_or_else(|| EditorError::PathNotFound(path.to_vec()))?;
        self.apply(Operation::MergeNode {
            path: path.to_vec(),
            position,
            properties,
        })
    }

    pub(crate) fn move_node(&mut self, path: &[usize], new_path: Path) -> Result<()> {
        self.apply(Operation::MoveNode {
            path: path.to_vec(),
            new_path,
        })
    }

    pub(crate) fn set_node(&mut self, path: &[usize], new_properties: Node) -> Result<()> {
        let properties = node_at(&self.children, path)
            .map(Node::shell)
            .ok_or_else(|| EditorError::PathNotFound(path.to_vec()))?;
        if properties == new_properties.shell() {
            return Ok(());
        }
        self.apply(Operation::SetNode {
            path: path.to_vec(),
            properties,
            new_properties: new_properties.shell(),
        })
    }

    /// Lifts the children of the node at `path` into its parent and removes
    /// it. Returns the number of lifted children, which now start at `path`.
    pub(crate) fn unwrap_node(&mut self, path: &[usize]) -> Result<usize> {
        let count = node_at(&self.children, path)
            .map(|node| node.children().len())
            .ok_or_else(|| EditorError::PathNotFound(path.to_vec()))?;
        for idx in (0..count).rev() {
            self.move_node(&path::child(path, idx), path::next(path))?;
        }
        self.remove_node(path)?;
        Ok(count)
    }

    /// Wraps the children `start..end` of `parent` into `wrapper`.
    pub(crate) fn wrap_nodes(
        &mut self,
        parent: &[usize],
        start: usize,
        end: usize,
        wrapper: Node,
    ) -> Result<()> {
        let wrapper_path = path::child(parent, start);
        self.insert_node(wrapper_path.clone(), wrapper.shell())?;
        for idx in 0..end.saturating_sub(start) {
            self.move_node(&path::child(parent, start + 1), path::child(&wrapper_path, idx))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod tests;
