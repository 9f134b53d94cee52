use std::fmt::{self, Write};

use log::warn;

use crate::document::{ListKind, Node, TextLeaf};

const LINE_BREAK: &str = "<br/>";

/// Serializes every top-level block and concatenates the results.
pub fn serialize_document(nodes: &[Node]) -> String {
    nodes.iter().map(serialize).collect()
}

/// Serializes a single node. A node that fails to serialize contributes an
/// empty string so that its siblings and ancestors are still written.
pub fn serialize(node: &Node) -> String {
    let mut out = String::new();
    match write_node(node, &mut out) {
        Ok(()) => out,
        Err(err) => {
            warn!("failed to serialize {} node: {err}", node_label(node));
            String::new()
        }
    }
}

fn write_node(node: &Node, out: &mut String) -> fmt::Result {
    match node {
        Node::Text(leaf) => write_leaf(leaf, out),
        Node::Paragraph { children } => write_element(out, "p", None, children),
        Node::List { kind, children } => {
            let tag = match kind {
                ListKind::Bulleted => "ul",
                ListKind::Numbered => "ol",
            };
            write_element(out, tag, None, children)
        }
        Node::ListItem { children } => write_element(out, "li", None, children),
        Node::Link { url, children } => write_element(out, "a", Some(url.as_str()), children),
    }
}

fn write_element(
    out: &mut String,
    tag: &str,
    href: Option<&str>,
    children: &[Node],
) -> fmt::Result {
    match href {
        Some(url) => write!(out, "<{tag} href=\"{}\">", escape(url))?,
        None => write!(out, "<{tag}>")?,
    }
    for child in children {
        out.push_str(&serialize(child));
    }
    write!(out, "</{tag}>")
}

// Nesting order is strike(italic(bold(text))); stored content depends on it.
fn write_leaf(leaf: &TextLeaf, out: &mut String) -> fmt::Result {
    let mut html = escape(&leaf.text);
    if leaf.bold {
        html = format!("<strong>{html}</strong>");
    }
    if leaf.italic {
        html = format!("<em>{html}</em>");
    }
    if leaf.strike {
        html = format!("<s>{html}</s>");
    }
    out.write_str(&html.replace('\n', LINE_BREAK))
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn node_label(node: &Node) -> &'static str {
    match node {
        Node::Text(_) => "text",
        Node::Paragraph { .. } => "paragraph",
        Node::List { .. } => "list",
        Node::ListItem { .. } => "list-item",
        Node::Link { .. } => "link",
    }
}
