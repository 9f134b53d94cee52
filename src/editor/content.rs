use super::{Affinity, DocumentEditor, inspect};
use crate::document::path::{self, Path};
use crate::document::{Node, Point, Range, last_leaf_path, leaf_at, node_at};
use crate::error::{EditorError, Result};

pub fn char_to_byte_idx(text: &str, char_idx: usize) -> usize {
    if char_idx == 0 {
        return 0;
    }
    for (count, (byte_idx, _)) in text.char_indices().enumerate() {
        if count == char_idx {
            return byte_idx;
        }
    }
    text.len()
}

impl DocumentEditor {
    /// Inserts `text` at the selection, replacing expanded content first.
    /// Pending marks are applied to the inserted text.
    pub fn insert_text(&mut self, text: &str) -> bool {
        self.transact("insert text", |editor| editor.try_insert_text(text))
    }

    /// Inserts a line break inside the current block.
    pub fn insert_soft_break(&mut self) -> bool {
        self.transact("insert soft break", |editor| editor.try_insert_text("\n"))
    }

    /// Splits the current paragraph or list item at the selection.
    pub fn insert_break(&mut self) -> bool {
        self.transact("insert break", |editor| editor.try_insert_break())
    }

    pub fn delete_backward(&mut self) -> bool {
        self.transact("delete backward", |editor| editor.try_delete_backward())
    }

    /// Removes the selected content and collapses the selection to its start.
    pub fn delete_fragment(&mut self) -> bool {
        self.transact("delete fragment", |editor| editor.try_delete_fragment())
    }

    pub(crate) fn ensure_editable(&mut self) -> Result<()> {
        if !self.children.is_empty() {
            return Ok(());
        }
        self.insert_node(vec![0], Node::paragraph(vec![Node::text("")]))?;
        self.selection = Some(Range::collapsed(Point::new(vec![0, 0], 0)));
        Ok(())
    }

    pub(crate) fn try_insert_text(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.ensure_editable()?;
        let (start, end) = self.selection_edges()?;
        if start != end {
            self.try_delete_fragment()?;
        }
        self.try_escape_if_at_end_of_link()?;
        let point = self.cursor()?;
        let pending = self.marks.take();
        if let Some(marks) = pending {
            let leaf_marks = leaf_at(&self.children, &point.path).map(|leaf| leaf.marks());
            if leaf_marks != Some(marks) {
                let at = self.split_leaf_for_insert(&point)?;
                self.insert_node(at.clone(), Node::marked_text(text, marks))?;
                let offset = text.chars().count();
                self.selection = Some(Range::collapsed(Point::new(at, offset)));
                return Ok(());
            }
        }
        self.insert_text_at(&point, text)
    }

    /// Makes room for a new inline sibling at `point`, splitting its leaf when
    /// the point is inside the text. Returns the path the new node goes to.
    pub(crate) fn split_leaf_for_insert(&mut self, point: &Point) -> Result<Path> {
        let len = leaf_at(&self.children, &point.path)
            .map(|leaf| leaf.char_len())
            .ok_or_else(|| EditorError::PathNotFound(point.path.clone()))?;
        if point.offset == 0 {
            return Ok(point.path.clone());
        }
        if point.offset < len {
            self.split_node(&point.path, point.offset)?;
        }
        Ok(path::next(&point.path))
    }

    /// Splits the leaf at `point` and each of its ancestors deeper than
    /// `height`. Returns the path of the new node at depth `height + 1`.
    pub(crate) fn split_at_point(&mut self, point: &Point, height: usize) -> Result<Path> {
        if point.path.len() <= height {
            return Err(EditorError::invalid("split above the point", &point.path));
        }
        let mut current = point.path.clone();
        let mut position = point.offset;
        while current.len() > height {
            self.split_node(&current, position)?;
            position = current.last().map_or(0, |idx| idx + 1);
            current.pop();
        }
        Ok(path::next(&point.path[..=height]))
    }

    pub(crate) fn try_insert_break(&mut self) -> Result<()> {
        self.ensure_editable()?;
        let (start, end) = self.selection_edges()?;
        if start != end {
            self.try_delete_fragment()?;
        }
        self.try_escape_if_at_end_of_link()?;
        let point = self.cursor()?;
        let block = inspect::text_block_above(&self.children, &point.path)
            .ok_or_else(|| EditorError::invalid("split outside a block", &point.path))?;
        self.split_at_point(&point, block.len() - 1)?;
        Ok(())
    }

    pub(crate) fn try_delete_backward(&mut self) -> Result<()> {
        let (start, end) = self.selection_edges()?;
        if start != end {
            return self.try_delete_fragment();
        }
        if start.offset > 0 {
            return self.remove_text(&start.path, start.offset - 1, start.offset);
        }
        let block = inspect::text_block_above(&self.children, &start.path)
            .ok_or_else(|| EditorError::invalid("delete outside a block", &start.path))?;
        let mut previous = inspect::previous_leaf(&self.children, &start.path);
        loop {
            let Some(leaf_path) = previous else {
                return Ok(());
            };
            if !path::is_ancestor(&block, &leaf_path) {
                let target = inspect::text_block_above(&self.children, &leaf_path)
                    .ok_or_else(|| EditorError::invalid("merge into a non-block", &leaf_path))?;
                return self.merge_block_into(&target, &block);
            }
            let len = leaf_at(&self.children, &leaf_path).map_or(0, |leaf| leaf.char_len());
            if len > 0 {
                return self.remove_text(&leaf_path, len - 1, len);
            }
            previous = inspect::previous_leaf(&self.children, &leaf_path);
        }
    }

    /// Moves every child of the text block `source` to the end of `target`,
    /// which must precede it, then removes `source` and any ancestor left
    /// empty.
    pub(crate) fn merge_block_into(&mut self, target: &[usize], source: &[usize]) -> Result<()> {
        let count = node_at(&self.children, source)
            .map(|node| node.children().len())
            .ok_or_else(|| EditorError::PathNotFound(source.to_vec()))?;
        let offset = node_at(&self.children, target)
            .map(|node| node.children().len())
            .ok_or_else(|| EditorError::PathNotFound(target.to_vec()))?;
        for idx in 0..count {
            self.move_node(&path::child(source, 0), path::child(target, offset + idx))?;
        }
        let mut current = source.to_vec();
        loop {
            self.remove_node(&current)?;
            let parent = path::parent(&current);
            let parent_is_empty = node_at(&self.children, &parent)
                .is_some_and(|node| node.children().is_empty());
            if parent.is_empty() || !parent_is_empty {
                return Ok(());
            }
            current = parent;
        }
    }

    pub(crate) fn try_delete_fragment(&mut self) -> Result<()> {
        let (start, end) = self.selection_edges()?;
        if start == end {
            return Ok(());
        }
        if start.path == end.path {
            self.remove_text(&start.path, start.offset, end.offset)?;
            self.selection = Some(Range::collapsed(start));
            return Ok(());
        }
        let start_block = inspect::text_block_above(&self.children, &start.path)
            .ok_or_else(|| EditorError::invalid("delete outside a block", &start.path))?;
        let end_ref = self.point_ref(end.clone(), Affinity::Backward);

        let start_len = leaf_at(&self.children, &start.path).map_or(0, |leaf| leaf.char_len());
        self.remove_text(&start.path, start.offset, start_len)?;
        self.remove_text(&end.path, 0, end.offset)?;
        for between in inspect::nodes_between(&self.children, &start.path, &end.path)
            .iter()
            .rev()
        {
            self.remove_node(between)?;
        }

        let end = self.point_ref_value(end_ref)?;
        let end_block = inspect::text_block_above(&self.children, &end.path)
            .ok_or_else(|| EditorError::invalid("delete outside a block", &end.path))?;
        if end_block != start_block {
            self.merge_block_into(&start_block, &end_block)?;
        }
        self.selection = Some(Range::collapsed(start));
        Ok(())
    }

    /// Inserts an inline node at the collapsed selection and returns its path.
    /// Inside a link the node lands next to the link, never inside it.
    pub(crate) fn try_insert_inline(&mut self, node: Node) -> Result<Path> {
        let point = self.cursor()?;
        if let Some(link) = inspect::link_above(&self.children, &point.path) {
            if inspect::is_start_of(&self.children, &point, &link) {
                self.insert_node(link.clone(), node)?;
                return Ok(link);
            }
            if !inspect::is_end_of(&self.children, &point, &link) {
                self.split_link_at(&point)?;
            }
            let after = path::next(&link);
            self.insert_node(after.clone(), node)?;
            return Ok(after);
        }
        let at = self.split_leaf_for_insert(&point)?;
        self.insert_node(at.clone(), node)?;
        Ok(at)
    }

    /// Splits the link holding `point` in two so the point falls on the
    /// boundary. Does nothing outside a link or at either end of one.
    pub(crate) fn split_link_at(&mut self, point: &Point) -> Result<()> {
        let Some(link) = inspect::link_above(&self.children, &point.path) else {
            return Ok(());
        };
        if inspect::is_start_of(&self.children, point, &link)
            || inspect::is_end_of(&self.children, point, &link)
        {
            return Ok(());
        }
        let leaf_index = point.path[link.len()];
        self.split_node(&point.path, point.offset)?;
        self.split_node(&link, leaf_index + 1)
    }

    /// Collapses the selection right after the inline node at `inline`,
    /// adding an empty leaf there when no text follows it.
    pub(crate) fn select_after_inline(&mut self, inline: &[usize]) -> Result<()> {
        let after = path::next(inline);
        let next_is_text = node_at(&self.children, &after).is_some_and(Node::is_text);
        if !next_is_text {
            self.insert_node(after.clone(), Node::text(""))?;
        }
        self.selection = Some(Range::collapsed(Point::new(after, 0)));
        Ok(())
    }

    pub(crate) fn end_of(&self, node_path: &[usize]) -> Option<Point> {
        let leaf_path = last_leaf_path(&self.children, node_path)?;
        let offset = leaf_at(&self.children, &leaf_path)?.char_len();
        Some(Point::new(leaf_path, offset))
    }
}

#[cfg(test)]
#[path = "content_tests.rs"]
mod tests;
