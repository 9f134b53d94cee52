use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Affinity, DocumentEditor};
use crate::document::{ListKind, Node};
use crate::error::{EditorError, Result};

/// Block formats the toolbar can toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockFormat {
    BulletedList,
    NumberedList,
}

impl BlockFormat {
    pub fn list_kind(self) -> ListKind {
        match self {
            BlockFormat::BulletedList => ListKind::Bulleted,
            BlockFormat::NumberedList => ListKind::Numbered,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BlockFormat::BulletedList => "bulleted-list",
            BlockFormat::NumberedList => "numbered-list",
        }
    }
}

impl fmt::Display for BlockFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockFormat {
    type Err = EditorError;

    fn from_str(format: &str) -> Result<Self> {
        match format {
            "bulleted-list" => Ok(BlockFormat::BulletedList),
            "numbered-list" => Ok(BlockFormat::NumberedList),
            other => Err(EditorError::UnknownFormat(other.to_string())),
        }
    }
}

impl DocumentEditor {
    /// True when a list of `format`'s kind intersects the selection.
    pub fn is_block_active(&self, format: BlockFormat) -> bool {
        if self.children.is_empty() {
            return false;
        }
        let Ok((start, end)) = self.selection_edges() else {
            return false;
        };
        let kind = format.list_kind();
        self.children[start.path[0]..=end.path[0]]
            .iter()
            .any(|node| matches!(node, Node::List { kind: found, .. } if *found == kind))
    }

    /// Turns the selected blocks into a list of `format`'s kind, or back into
    /// paragraphs when that list is already active. Lists around the
    /// selection are split so items outside it keep their wrapper.
    pub fn toggle_block(&mut self, format: BlockFormat) -> bool {
        if self.children.is_empty() || !self.selection_is_valid() {
            return false;
        }
        let active = self.is_block_active(format);
        self.transact(format.as_str(), |editor| editor.try_toggle_block(format, active))
    }

    fn try_toggle_block(&mut self, format: BlockFormat, active: bool) -> Result<()> {
        let (start, end) = self.selection_edges()?;
        let start_ref = self.point_ref(start.clone(), Affinity::Forward);
        let end_ref = self.point_ref(end.clone(), Affinity::Backward);
        let first = start.path[0];
        let last = end.path[0];

        for idx in (first..=last).rev() {
            let Some(Node::List { children, .. }) = self.children.get(idx) else {
                continue;
            };
            let len = children.len();
            let lo = if idx == first { start.path.get(1).copied().unwrap_or(0) } else { 0 };
            let hi = if idx == last {
                end.path.get(1).copied().unwrap_or(len.saturating_sub(1))
            } else {
                len.saturating_sub(1)
            };
            if hi + 1 < len {
                self.split_node(&[idx], hi + 1)?;
            }
            let middle = if lo > 0 {
                self.split_node(&[idx], lo)?;
                idx + 1
            } else {
                idx
            };
            self.unwrap_node(&[middle])?;
        }

        let first = self.point_ref_value(start_ref)?.path[0];
        let last = self.point_ref_value(end_ref)?.path[0];
        let properties = if active {
            Node::paragraph(Vec::new())
        } else {
            Node::list_item(Vec::new())
        };
        for idx in first..=last {
            if self.children.get(idx).is_some_and(Node::is_text_block) {
                self.set_node(&[idx], properties.clone())?;
            }
        }
        if !active {
            self.wrap_nodes(&[], first, last + 1, Node::list(format.list_kind(), Vec::new()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "structure_tests.rs"]
mod tests;
