use super::{Affinity, DocumentEditor, inspect};
use crate::document::path::Path;
use crate::document::{Node, Point, Range, leaves, node_at};
use crate::error::Result;

impl DocumentEditor {
    /// True for a collapsed selection inside a link.
    pub fn is_link_active(&self) -> bool {
        self.collapsed_link().is_some()
    }

    fn collapsed_link(&self) -> Option<Path> {
        let selection = self.valid_selection()?;
        if selection.is_expanded() {
            return None;
        }
        inspect::link_above(&self.children, &selection.anchor.path)
    }

    /// The selected text, or the whole text of the link holding a collapsed
    /// selection.
    pub fn selected_text(&self) -> String {
        let Some(selection) = self.valid_selection() else {
            return String::new();
        };
        if selection.is_expanded() {
            return self.selection_text();
        }
        self.collapsed_link()
            .and_then(|link| node_at(&self.children, &link))
            .map(Node::plain_text)
            .unwrap_or_default()
    }

    pub fn link_url(&self) -> String {
        match self.collapsed_link().and_then(|link| node_at(&self.children, &link)) {
            Some(Node::Link { url, .. }) => url.clone(),
            _ => String::new(),
        }
    }

    /// Removes the link around a collapsed selection, or every link touched
    /// by an expanded one, keeping their text in place.
    pub fn unwrap_link(&mut self) -> bool {
        self.transact("unwrap link", |editor| {
            let (start, end) = editor.selection_edges()?;
            let links: Vec<Path> = if start == end {
                inspect::link_above(&editor.children, &start.path).into_iter().collect()
            } else {
                editor.links_touching(&start, &end)
            };
            for link in links.iter().rev() {
                editor.unwrap_node(link)?;
            }
            Ok(())
        })
    }

    /// Inserts a link to `url`, or replaces the one at the selection. The
    /// link text is `text`, else the selected text, else `url`. The cursor
    /// ends up right after the link.
    pub fn upsert_link(&mut self, text: &str, url: &str) -> bool {
        let selected = self.selected_text();
        let content = [text, selected.as_str(), url]
            .into_iter()
            .map(str::trim)
            .find(|candidate| !candidate.is_empty())
            .map(str::to_string);
        let Some(content) = content else {
            return false;
        };
        if !self.selection_is_valid() {
            return false;
        }
        let link = Node::link(url, vec![Node::text(content)]);
        self.transact("upsert link", |editor| editor.try_upsert_link(link))
    }

    fn try_upsert_link(&mut self, link: Node) -> Result<()> {
        let (start, end) = self.selection_edges()?;
        if start != end {
            if !self.links_overlapping(&start, &end).is_empty() {
                self.unwrap_links_in_range()?;
            }
            self.try_delete_fragment()?;
            let at = self.try_insert_inline(link)?;
            return self.select_after_inline(&at);
        }
        if let Some(existing) = inspect::link_above(&self.children, &start.path) {
            self.remove_node(&existing)?;
            self.insert_node(existing.clone(), link)?;
            return self.select_after_inline(&existing);
        }
        let at = self.try_insert_inline(link)?;
        self.select_after_inline(&at)
    }

    /// Splits links at the selection edges and unwraps the parts inside the
    /// selection, so only the selected portion loses its link.
    fn unwrap_links_in_range(&mut self) -> Result<()> {
        let (start, end) = self.selection_edges()?;
        let start_ref = self.point_ref(start, Affinity::Forward);
        let end_ref = self.point_ref(end.clone(), Affinity::Backward);
        self.split_link_at(&end)?;
        let start = self.point_ref_value(start_ref)?;
        self.split_link_at(&start)?;

        let start = self.point_ref_value(start_ref)?;
        let end = self.point_ref_value(end_ref)?;
        for link in self.links_overlapping(&start, &end).iter().rev() {
            self.unwrap_node(link)?;
        }
        let start = self.point_ref_value(start_ref)?;
        let end = self.point_ref_value(end_ref)?;
        self.selection = Some(Range::new(start, end));
        Ok(())
    }

    /// Links with at least one selected character.
    fn links_overlapping(&self, start: &Point, end: &Point) -> Vec<Path> {
        let mut links: Vec<Path> = Vec::new();
        for (leaf_path, _) in leaves(&self.children) {
            let Some(link) = inspect::link_above(&self.children, &leaf_path) else {
                continue;
            };
            let selected = inspect::leaf_overlap(&self.children, &leaf_path, start, end)
                .is_some_and(|(from, to)| from < to);
            if selected && links.last() != Some(&link) {
                links.push(link);
            }
        }
        links
    }

    fn links_touching(&self, start: &Point, end: &Point) -> Vec<Path> {
        let mut links: Vec<Path> = Vec::new();
        for leaf_path in inspect::leaves_in_range(&self.children, start, end) {
            if let Some(link) = inspect::link_above(&self.children, &leaf_path) {
                if links.last() != Some(&link) {
                    links.push(link);
                }
            }
        }
        links
    }

    /// Moves a collapsed cursor sitting at the end of a link to just after
    /// the link, so typed text does not extend it. Returns whether the
    /// cursor moved.
    pub fn escape_if_at_end_of_link(&mut self) -> bool {
        let before = self.selection.clone();
        self.transact("escape link", |editor| editor.try_escape_if_at_end_of_link());
        self.selection != before
    }

    pub(crate) fn try_escape_if_at_end_of_link(&mut self) -> Result<()> {
        let Some(selection) = self.valid_selection() else {
            return Ok(());
        };
        if selection.is_expanded() {
            return Ok(());
        }
        let point = selection.anchor.clone();
        let Some(link) = inspect::link_above(&self.children, &point.path) else {
            return Ok(());
        };
        if !inspect::is_end_of(&self.children, &point, &link) {
            return Ok(());
        }
        self.select_after_inline(&link)
    }
}

#[cfg(test)]
#[path = "link_tests.rs"]
mod tests;
