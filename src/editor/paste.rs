use log::{debug, warn};

use super::{DocumentEditor, inspect};
use crate::deserialize::deserialize_markup;
use crate::document::path;
use crate::document::{Node, Point, Range, node_at};
use crate::error::{EditorError, Result};
use crate::markup::MarkupError;

/// The two representations a paste event may carry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClipboardData {
    pub html: Option<String>,
    pub text: Option<String>,
}

impl ClipboardData {
    pub fn html(html: impl Into<String>) -> Self {
        Self {
            html: Some(html.into()),
            text: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            html: None,
            text: Some(text.into()),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Turns pasted markup into the blocks to insert. Paragraphs without visible
/// text are dropped, so blank lines copied from other editors collapse.
pub fn fragment_from_markup(html: &str) -> Result<Vec<Node>, MarkupError> {
    let blocks = deserialize_markup(html)?;
    Ok(blocks
        .into_iter()
        .filter(|block| !is_textless_paragraph(block))
        .filter(|block| !is_break_only_paragraph(block))
        .collect())
}

fn is_textless_paragraph(node: &Node) -> bool {
    let Node::Paragraph { children } = node else {
        return false;
    };
    !children.iter().any(Node::is_link) && node.plain_text().trim().is_empty()
}

fn is_break_only_paragraph(node: &Node) -> bool {
    let Node::Paragraph { children } = node else {
        return false;
    };
    children
        .iter()
        .all(|child| matches!(child, Node::Text(leaf) if leaf.text.trim().is_empty()))
}

impl DocumentEditor {
    /// Pastes clipboard content at the selection, preferring markup over
    /// plain text. Markup that fails to parse falls back to the text.
    pub fn insert_data(&mut self, data: &ClipboardData) -> bool {
        if let Some(html) = data.html.as_deref().filter(|html| !html.trim().is_empty()) {
            match fragment_from_markup(html) {
                Ok(fragment) => return self.insert_fragment(fragment),
                Err(err) => warn!("pasted markup could not be parsed, using plain text: {err}"),
            }
        }
        match data.text.as_deref() {
            Some(text) => self.insert_plain_text(text),
            None => false,
        }
    }

    /// Inserts `fragment` at the selection, merging its first and last
    /// paragraphs into the blocks around the cursor. An empty fragment leaves
    /// the document and selection untouched.
    pub fn insert_fragment(&mut self, fragment: Vec<Node>) -> bool {
        if fragment.is_empty() {
            debug!("nothing to paste");
            return false;
        }
        self.transact("insert fragment", |editor| editor.try_insert_fragment(fragment))
    }

    /// Inserts each line of `text` with a soft break between lines.
    pub fn insert_plain_text(&mut self, text: &str) -> bool {
        self.transact("insert plain text", |editor| {
            for (idx, line) in text.split('\n').enumerate() {
                if idx > 0 {
                    editor.try_insert_text("\n")?;
                }
                editor.try_insert_text(line.strip_suffix('\r').unwrap_or(line))?;
            }
            Ok(())
        })
    }

    fn try_insert_fragment(&mut self, mut blocks: Vec<Node>) -> Result<()> {
        if self.children.is_empty() {
            let count = blocks.len();
            for (idx, block) in blocks.into_iter().enumerate() {
                self.insert_node(vec![idx], block)?;
            }
            let end = self
                .end_of(&[count - 1])
                .ok_or_else(|| EditorError::invalid("select pasted content", &[count - 1]))?;
            self.selection = Some(Range::collapsed(end));
            return Ok(());
        }

        let (start, end) = self.selection_edges()?;
        if start != end {
            self.try_delete_fragment()?;
        }
        let mut point = self.cursor()?;
        if let Some(link) = inspect::link_above(&self.children, &point.path) {
            self.select_after_inline(&link)?;
            point = self.cursor()?;
        }
        let block = inspect::text_block_above(&self.children, &point.path)
            .ok_or_else(|| EditorError::invalid("paste outside a block", &point.path))?;

        if blocks.len() == 1 && blocks[0].is_text_block() {
            let inlines = take_children(blocks.remove(0));
            return self.insert_inlines(&point, inlines);
        }

        let mut insert_at = self.split_at_point(&point, block.len() - 1)?;
        let last = match blocks.last() {
            Some(node) if blocks.len() > 1 && node.is_text_block() => blocks.pop(),
            _ => None,
        };
        if blocks.first().is_some_and(Node::is_text_block) {
            let inlines = take_children(blocks.remove(0));
            let offset = node_at(&self.children, &block).map_or(0, |node| node.children().len());
            for (idx, inline) in inlines.into_iter().enumerate() {
                self.insert_node(path::child(&block, offset + idx), inline)?;
            }
        }
        for middle in blocks {
            self.insert_node(insert_at.clone(), middle)?;
            insert_at = path::next(&insert_at);
        }

        let cursor = match last {
            Some(last) => {
                let inlines = take_children(last);
                let count = inlines.len();
                for (idx, inline) in inlines.into_iter().enumerate() {
                    self.insert_node(path::child(&insert_at, idx), inline)?;
                }
                count
                    .checked_sub(1)
                    .and_then(|idx| self.end_of(&path::child(&insert_at, idx)))
            }
            None => path::previous(&insert_at).and_then(|previous| self.end_of(&previous)),
        };
        let cursor =
            cursor.ok_or_else(|| EditorError::invalid("select pasted content", &insert_at))?;
        self.selection = Some(Range::collapsed(cursor));
        Ok(())
    }

    fn insert_inlines(&mut self, point: &Point, inlines: Vec<Node>) -> Result<()> {
        let count = inlines.len();
        if count == 0 {
            return Ok(());
        }
        let at = self.split_leaf_for_insert(point)?;
        let parent = path::parent(&at);
        let first = at.last().copied().unwrap_or(0);
        for (idx, inline) in inlines.into_iter().enumerate() {
            self.insert_node(path::child(&parent, first + idx), inline)?;
        }
        let last = path::child(&parent, first + count - 1);
        let cursor = self
            .end_of(&last)
            .ok_or_else(|| EditorError::invalid("select pasted content", &last))?;
        self.selection = Some(Range::collapsed(cursor));
        Ok(())
    }
}

fn take_children(node: Node) -> Vec<Node> {
    match node {
        Node::Text(_) => vec![node],
        Node::Paragraph { children }
        | Node::List { children, .. }
        | Node::ListItem { children }
        | Node::Link { children, .. } => children,
    }
}

#[cfg(test)]
#[path = "paste_tests.rs"]
mod tests;
