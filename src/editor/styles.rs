use std::str::FromStr;

use super::{Affinity, DocumentEditor, inspect};
use crate::document::{Mark, Marks, Node, Point, Range, leaf_at};
use crate::error::{EditorError, Result};

impl FromStr for Mark {
    type Err = EditorError;

    fn from_str(format: &str) -> Result<Self> {
        match format {
            "bold" => Ok(Mark::Bold),
            "italic" => Ok(Mark::Italic),
            "strike" | "strikethrough" => Ok(Mark::Strike),
            other => Err(EditorError::UnknownFormat(other.to_string())),
        }
    }
}

pub(crate) fn mark_label(mark: Mark) -> &'static str {
    match mark {
        Mark::Bold => "bold",
        Mark::Italic => "italic",
        Mark::Strike => "strike",
    }
}

impl DocumentEditor {
    /// Marks in effect at the selection: the pending marks when set, the
    /// cursor leaf's marks for a collapsed selection, and the marks shared by
    /// every selected leaf otherwise.
    pub fn marks(&self) -> Marks {
        if let Some(marks) = self.marks {
            return marks;
        }
        let Ok((start, end)) = self.selection_edges() else {
            return Marks::default();
        };
        if start == end {
            return leaf_at(&self.children, &start.path)
                .map_or_else(Marks::default, |leaf| leaf.marks());
        }
        inspect::selected_leaves(&self.children, &start, &end)
            .iter()
            .filter_map(|leaf_path| leaf_at(&self.children, leaf_path))
            .map(|leaf| leaf.marks())
            .reduce(Marks::intersection)
            .unwrap_or_default()
    }

    pub fn is_mark_active(&self, mark: Mark) -> bool {
        if self.children.is_empty() || !self.selection_is_valid() {
            return false;
        }
        self.marks().contains(mark)
    }

    /// Flips `mark` over the selection. On a collapsed selection the change
    /// is kept as a pending mark for the next inserted text and the document
    /// is left alone. Returns whether anything changed.
    pub fn toggle_mark(&mut self, mark: Mark) -> bool {
        if self.children.is_empty() || !self.selection_is_valid() {
            return false;
        }
        let enabled = !self.is_mark_active(mark);
        if self.selection.as_ref().is_some_and(Range::is_collapsed) {
            self.marks = Some(self.marks().with(mark, enabled));
            return true;
        }
        self.transact(mark_label(mark), |editor| editor.try_set_mark(mark, enabled))
    }

    pub(crate) fn try_set_mark(&mut self, mark: Mark, enabled: bool) -> Result<()> {
        let backward = self.selection.as_ref().is_some_and(Range::is_backward);
        let (start, end) = self.selection_edges()?;
        let start_ref = self.point_ref(start.clone(), Affinity::Forward);
        let end_ref = self.point_ref(end.clone(), Affinity::Backward);

        self.split_leaf_inside(&end)?;
        let start = self.point_ref_value(start_ref)?;
        self.split_leaf_inside(&start)?;

        let start = self.point_ref_value(start_ref)?;
        let end = self.point_ref_value(end_ref)?;
        for leaf_path in inspect::selected_leaves(&self.children, &start, &end) {
            let Some(leaf) = leaf_at(&self.children, &leaf_path) else {
                continue;
            };
            let marks = leaf.marks().with(mark, enabled);
            self.set_node(&leaf_path, Node::marked_text("", marks))?;
        }

        let range = if backward {
            Range::new(end, start)
        } else {
            Range::new(start, end)
        };
        self.selection = Some(range);
        Ok(())
    }

    fn split_leaf_inside(&mut self, point: &Point) -> Result<()> {
        let len = leaf_at(&self.children, &point.path)
            .map(|leaf| leaf.char_len())
            .ok_or_else(|| EditorError::PathNotFound(point.path.clone()))?;
        if point.offset > 0 && point.offset < len {
            self.split_node(&point.path, point.offset)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "style_tests.rs"]
mod tests;
