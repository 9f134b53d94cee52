use crate::document::{ListKind, Mark, Marks, Node};
use crate::markup::{self, Element, MarkupError, MarkupNode};

/// A deserialized node plus whether it came from an explicit `<br>`. The
/// flag only lives until the parent element has filtered its children.
struct Item {
    node: Node,
    hard_break: bool,
}

impl Item {
    fn node(node: Node) -> Self {
        Self {
            node,
            hard_break: false,
        }
    }
}

/// Parses a markup string into top-level blocks.
pub fn deserialize_markup(input: &str) -> Result<Vec<Node>, MarkupError> {
    let tree = markup::parse(input)?;
    let root = tree.find_element("body").unwrap_or(&tree);
    Ok(into_blocks(deserialize(root)))
}

/// Converts a parsed markup tree into document nodes. The result is a raw
/// node sequence; see [`into_blocks`] for shaping it into a document.
pub fn deserialize(markup: &MarkupNode) -> Vec<Node> {
    merge_leaves(into_nodes(items(markup)))
}

/// Joins adjacent leaves that carry the same marks, at every level.
fn merge_leaves(nodes: Vec<Node>) -> Vec<Node> {
    let mut merged: Vec<Node> = Vec::with_capacity(nodes.len());
    for mut node in nodes {
        if let Some(children) = node.children_mut() {
            *children = merge_leaves(std::mem::take(children));
        }
        if let (Some(Node::Text(previous)), Node::Text(leaf)) = (merged.last_mut(), &node)
            && previous.marks() == leaf.marks()
        {
            previous.text.push_str(&leaf.text);
            continue;
        }
        merged.push(node);
    }
    merged
}

fn items(markup: &MarkupNode) -> Vec<Item> {
    match markup {
        MarkupNode::Text(text) if is_structural_whitespace(text) => Vec::new(),
        MarkupNode::Text(text) => vec![Item::node(Node::text(text.clone()))],
        MarkupNode::Comment(_) => Vec::new(),
        MarkupNode::Document(children) => child_items(children),
        MarkupNode::Element(element) => element_items(element),
    }
}

fn child_items(children: &[MarkupNode]) -> Vec<Item> {
    children
        .iter()
        .flat_map(items)
        .filter(|item| {
            item.hard_break
                || !matches!(&item.node, Node::Text(leaf) if is_structural_whitespace(&leaf.text))
        })
        .collect()
}

fn element_items(element: &Element) -> Vec<Item> {
    if element.tag == "br" {
        return vec![Item {
            node: Node::text("\n"),
            hard_break: true,
        }];
    }

    let children = child_items(&element.children);
    let mut result = match element.tag.as_str() {
        "p" => paragraph(children),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let bold = Marks::default().with(Mark::Bold, true);
            let mut children = children;
            for item in &mut children {
                apply_marks(&mut item.node, bold);
            }
            paragraph(children)
        }
        "ul" => vec![Item::node(Node::list(ListKind::Bulleted, nodes_or_empty_leaf(children)))],
        "ol" => vec![Item::node(Node::list(ListKind::Numbered, nodes_or_empty_leaf(children)))],
        "li" => vec![Item::node(Node::list_item(nodes_or_empty_leaf(children)))],
        "a" if children.is_empty() => Vec::new(),
        "a" => {
            let url = element.attribute("href").unwrap_or_default();
            vec![Item::node(Node::link(url, into_nodes(children)))]
        }
        // body, div, span, formatting tags and anything unknown pass their
        // children through unwrapped.
        _ => children,
    };

    let marks = element_marks(element);
    if !marks.is_empty() {
        for item in &mut result {
            apply_marks(&mut item.node, marks);
        }
    }
    result
}

fn paragraph(children: Vec<Item>) -> Vec<Item> {
    if !children.iter().any(is_paragraph_content) {
        return Vec::new();
    }
    vec![Item::node(Node::paragraph(into_nodes(children)))]
}

// A lone space is meaningful content; longer whitespace runs are not.
fn is_paragraph_content(item: &Item) -> bool {
    match &item.node {
        Node::Text(leaf) => {
            item.hard_break || leaf.text == " " || !leaf.text.trim().is_empty()
        }
        _ => true,
    }
}

fn into_nodes(items: Vec<Item>) -> Vec<Node> {
    items.into_iter().map(|item| item.node).collect()
}

fn nodes_or_empty_leaf(items: Vec<Item>) -> Vec<Node> {
    if items.is_empty() {
        return vec![Node::text("")];
    }
    into_nodes(items)
}

// Styles add marks on top of the tag's own; they never take one away.
fn element_marks(element: &Element) -> Marks {
    let tag = element.tag.as_str();
    let bold = matches!(tag, "strong" | "b")
        || element.style("font-weight").is_some_and(is_bold_weight);
    let italic = matches!(tag, "em" | "i")
        || element.style("font-style").is_some_and(|style| {
            matches!(style.to_ascii_lowercase().as_str(), "italic" | "oblique")
        });
    let decoration = element
        .style("text-decoration-line")
        .or_else(|| element.style("text-decoration"));
    let strike = matches!(tag, "s" | "strike" | "del")
        || decoration.is_some_and(|value| value.to_ascii_lowercase().contains("line-through"));
    Marks {
        bold,
        italic,
        strike,
    }
}

fn is_bold_weight(weight: &str) -> bool {
    match weight.to_ascii_lowercase().as_str() {
        "bold" | "bolder" => true,
        numeric => numeric.parse::<u32>().is_ok_and(|value| value >= 700),
    }
}

fn apply_marks(node: &mut Node, marks: Marks) {
    match node {
        Node::Text(leaf) => leaf.set_marks(leaf.marks().union(marks)),
        _ => {
            if let Some(children) = node.children_mut() {
                for child in children {
                    apply_marks(child, marks);
                }
            }
        }
    }
}

fn is_structural_whitespace(text: &str) -> bool {
    text.chars().all(|ch| matches!(ch, '\n' | '\r' | '\t'))
}

/// Shapes a raw node sequence into top-level blocks: runs of loose inline
/// nodes become a paragraph unless they hold only whitespace, and stray list
/// items are collected into a bulleted list.
pub fn into_blocks(nodes: Vec<Node>) -> Vec<Node> {
    let mut blocks = Vec::new();
    let mut inline_run = Vec::new();
    let mut item_run = Vec::new();

    for node in nodes {
        match node {
            Node::Text(_) | Node::Link { .. } => {
                flush_items(&mut item_run, &mut blocks);
                inline_run.push(node);
            }
            Node::ListItem { .. } => {
                flush_inlines(&mut inline_run, &mut blocks);
                item_run.push(node);
            }
            block => {
                flush_inlines(&mut inline_run, &mut blocks);
                flush_items(&mut item_run, &mut blocks);
                blocks.push(block);
            }
        }
    }
    flush_inlines(&mut inline_run, &mut blocks);
    flush_items(&mut item_run, &mut blocks);
    blocks
}

fn flush_inlines(run: &mut Vec<Node>, blocks: &mut Vec<Node>) {
    if run.is_empty() {
        return;
    }
    let whitespace_only = run
        .iter()
        .all(|node| matches!(node, Node::Text(leaf) if leaf.text.trim().is_empty()));
    let run = std::mem::take(run);
    if !whitespace_only {
        blocks.push(Node::paragraph(run));
    }
}

fn flush_items(run: &mut Vec<Node>, blocks: &mut Vec<Node>) {
    if !run.is_empty() {
        blocks.push(Node::list(ListKind::Bulleted, std::mem::take(run)));
    }
}
