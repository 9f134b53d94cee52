use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

pub mod path;

pub use path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mark {
    Bold,
    Italic,
    Strike,
}

impl Mark {
    pub const ALL: [Mark; 3] = [Mark::Bold, Mark::Italic, Mark::Strike];
}

/// The set of marks carried by a text leaf.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Marks {
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
}

impl Marks {
    pub fn contains(&self, mark: Mark) -> bool {
        match mark {
            Mark::Bold => self.bold,
            Mark::Italic => self.italic,
            Mark::Strike => self.strike,
        }
    }

    pub fn with(mut self, mark: Mark, enabled: bool) -> Self {
        match mark {
            Mark::Bold => self.bold = enabled,
            Mark::Italic => self.italic = enabled,
            Mark::Strike => self.strike = enabled,
        }
        self
    }

    pub fn union(self, other: Marks) -> Self {
        Marks {
            bold: self.bold || other.bold,
            italic: self.italic || other.italic,
            strike: self.strike || other.strike,
        }
    }

    pub fn intersection(self, other: Marks) -> Self {
        Marks {
            bold: self.bold && other.bold,
            italic: self.italic && other.italic,
            strike: self.strike && other.strike,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.bold || self.italic || self.strike)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextLeaf {
    pub text: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strike: bool,
}

impl TextLeaf {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_marks(mut self, marks: Marks) -> Self {
        self.set_marks(marks);
        self
    }

    pub fn marks(&self) -> Marks {
        Marks {
            bold: self.bold,
            italic: self.italic,
            strike: self.strike,
        }
    }

    pub fn set_marks(&mut self, marks: Marks) {
        self.bold = marks.bold;
        self.italic = marks.italic;
        self.strike = marks.strike;
    }

    pub fn has_mark(&self, mark: Mark) -> bool {
        self.marks().contains(mark)
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListKind {
    Bulleted,
    Numbered,
}

/// A node of the document tree.
///
/// `Paragraph` and `ListItem` hold inline content (`Text` and `Link`),
/// `List` holds list items and `Link` holds text leaves only. The
/// normalization pass restores those constraints after every mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Node {
    Text(TextLeaf),
    Paragraph { children: Vec<Node> },
    List { kind: ListKind, children: Vec<Node> },
    ListItem { children: Vec<Node> },
    Link { url: String, children: Vec<Node> },
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(TextLeaf::new(text))
    }

    pub fn marked_text(text: impl Into<String>, marks: Marks) -> Self {
        Node::Text(TextLeaf::new(text).with_marks(marks))
    }

    pub fn paragraph(children: Vec<Node>) -> Self {
        Node::Paragraph { children }
    }

    pub fn list(kind: ListKind, children: Vec<Node>) -> Self {
        Node::List { kind, children }
    }

    pub fn list_item(children: Vec<Node>) -> Self {
        Node::ListItem { children }
    }

    pub fn link(url: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Link {
            url: url.into(),
            children,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Text(_) => &[],
            Node::Paragraph { children }
            | Node::List { children, .. }
            | Node::ListItem { children }
            | Node::Link { children, .. } => children,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Text(_) => None,
            Node::Paragraph { children }
            | Node::List { children, .. }
            | Node::ListItem { children }
            | Node::Link { children, .. } => Some(children),
        }
    }

    pub fn as_text(&self) -> Option<&TextLeaf> {
        match self {
            Node::Text(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextLeaf> {
        match self {
            Node::Text(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn is_link(&self) -> bool {
        matches!(self, Node::Link { .. })
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Node::Text(_) | Node::Link { .. })
    }

    pub fn is_block(&self) -> bool {
        !self.is_inline()
    }

    /// Blocks whose children are inline content.
    pub fn is_text_block(&self) -> bool {
        matches!(self, Node::Paragraph { .. } | Node::ListItem { .. })
    }

    /// Concatenated text of every leaf below this node.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(leaf) => out.push_str(&leaf.text),
            _ => {
                for child in self.children() {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Number of characters for a leaf, number of children otherwise.
    pub fn content_len(&self) -> usize {
        match self {
            Node::Text(leaf) => leaf.char_len(),
            _ => self.children().len(),
        }
    }

    /// The node's own properties without its content: an empty leaf with the
    /// same marks, or the same element kind with no children.
    pub fn shell(&self) -> Node {
        match self {
            Node::Text(leaf) => Node::Text(TextLeaf::new("").with_marks(leaf.marks())),
            other => other.with_children(Vec::new()),
        }
    }

    pub(crate) fn with_children(&self, children: Vec<Node>) -> Node {
        match self {
            Node::Text(leaf) => Node::Text(leaf.clone()),
            Node::Paragraph { .. } => Node::Paragraph { children },
            Node::List { kind, .. } => Node::List {
                kind: *kind,
                children,
            },
            Node::ListItem { .. } => Node::ListItem { children },
            Node::Link { url, .. } => Node::Link {
                url: url.clone(),
                children,
            },
        }
    }

    /// Replaces the node's properties with those of `shell`, keeping its
    /// content. Leaves only accept leaf shells and elements only element shells.
    pub(crate) fn apply_shell(&mut self, shell: &Node) -> bool {
        if let Node::Text(leaf) = self {
            let Node::Text(props) = shell else {
                return false;
            };
            leaf.set_marks(props.marks());
            return true;
        }
        if shell.is_text() {
            return false;
        }
        let children = self.children_mut().map(std::mem::take).unwrap_or_default();
        *self = shell.with_children(children);
        true
    }
}

pub fn node_at<'a>(nodes: &'a [Node], path: &[usize]) -> Option<&'a Node> {
    let (first, rest) = path.split_first()?;
    let mut node = nodes.get(*first)?;
    for idx in rest {
        node = node.children().get(*idx)?;
    }
    Some(node)
}

pub fn node_at_mut<'a>(nodes: &'a mut [Node], path: &[usize]) -> Option<&'a mut Node> {
    let (first, rest) = path.split_first()?;
    let mut node = nodes.get_mut(*first)?;
    for idx in rest {
        node = node.children_mut()?.get_mut(*idx)?;
    }
    Some(node)
}

/// Children of the node at `parent`; the empty path addresses the document.
pub fn children_at_mut<'a>(
    nodes: &'a mut Vec<Node>,
    parent: &[usize],
) -> Option<&'a mut Vec<Node>> {
    if parent.is_empty() {
        return Some(nodes);
    }
    node_at_mut(nodes, parent)?.children_mut()
}

pub fn leaf_at<'a>(nodes: &'a [Node], path: &[usize]) -> Option<&'a TextLeaf> {
    node_at(nodes, path)?.as_text()
}

pub fn leaf_at_mut<'a>(nodes: &'a mut [Node], path: &[usize]) -> Option<&'a mut TextLeaf> {
    node_at_mut(nodes, path)?.as_text_mut()
}

/// Every leaf in document order with its path.
pub fn leaves(nodes: &[Node]) -> Vec<(Path, &TextLeaf)> {
    let mut result = Vec::new();
    for (idx, node) in nodes.iter().enumerate() {
        collect_leaves(node, vec![idx], &mut result);
    }
    result
}

fn collect_leaves<'a>(node: &'a Node, path: Path, out: &mut Vec<(Path, &'a TextLeaf)>) {
    match node {
        Node::Text(leaf) => out.push((path, leaf)),
        _ => {
            for (idx, child) in node.children().iter().enumerate() {
                collect_leaves(child, path::child(&path, idx), out);
            }
        }
    }
}

/// Path of the first leaf at or below `path`.
pub fn first_leaf_path(nodes: &[Node], path: &[usize]) -> Option<Path> {
    let mut current = path.to_vec();
    let mut node = node_at(nodes, path)?;
    while !node.is_text() {
        node = node.children().first()?;
        current.push(0);
    }
    Some(current)
}

/// Path of the last leaf at or below `path`.
pub fn last_leaf_path(nodes: &[Node], path: &[usize]) -> Option<Path> {
    let mut current = path.to_vec();
    let mut node = node_at(nodes, path)?;
    while !node.is_text() {
        let count = node.children().len();
        node = node.children().last()?;
        current.push(count - 1);
    }
    Some(current)
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: Path, offset: usize) -> Self {
        Self { path, offset }
    }

    pub fn compare(&self, other: &Point) -> Ordering {
        match path::compare(&self.path, &other.path) {
            Ordering::Equal => self.offset.cmp(&other.offset),
            ordering => ordering,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub anchor: Point,
    pub focus: Point,
}

impl Range {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_expanded(&self) -> bool {
        !self.is_collapsed()
    }

    pub fn is_backward(&self) -> bool {
        self.anchor.compare(&self.focus) == Ordering::Greater
    }

    /// The range's points in document order.
    pub fn edges(&self) -> (Point, Point) {
        if self.is_backward() {
            (self.focus.clone(), self.anchor.clone())
        } else {
            (self.anchor.clone(), self.focus.clone())
        }
    }
}
