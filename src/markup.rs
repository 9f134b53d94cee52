//! Lenient parser for the markup dialect the editor stores and receives from
//! the clipboard.
//!
//! The parser builds a plain element/text tree. It recovers from everything
//! browsers routinely emit (unclosed `p`/`li`, stray end tags, missing end
//! tags at the end of input) and only fails on input that cannot be tokenized
//! at all, such as a tag or comment that never terminates.
//!
//! Lexing is split in two `logos` lexers: one for the document level and one
//! for the inside of start tags.

use std::iter::Peekable;

use logos::{Lexer, Logos};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("unterminated tag starting at byte {offset}")]
    UnterminatedTag { offset: usize },

    #[error("unterminated comment starting at byte {offset}")]
    UnterminatedComment { offset: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarkupNode {
    Document(Vec<MarkupNode>),
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name.
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<MarkupNode>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Value of a declaration in the inline `style` attribute.
    pub fn style(&self, property: &str) -> Option<&str> {
        let style = self.attribute("style")?;
        style
            .split(';')
            .filter_map(|declaration| declaration.split_once(':'))
            .filter(|(name, _)| name.trim().eq_ignore_ascii_case(property))
            .map(|(_, value)| value.trim())
            .last()
    }
}

impl MarkupNode {
    pub fn children(&self) -> &[MarkupNode] {
        match self {
            MarkupNode::Document(children) => children,
            MarkupNode::Element(element) => &element.children,
            MarkupNode::Text(_) | MarkupNode::Comment(_) => &[],
        }
    }

    /// First element with the given tag in depth-first order.
    pub fn find_element(&self, tag: &str) -> Option<&MarkupNode> {
        if let MarkupNode::Element(element) = self
            && element.tag == tag
        {
            return Some(self);
        }
        self.children()
            .iter()
            .find_map(|child| child.find_element(tag))
    }
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "title", "textarea"];

const CLOSES_PARAGRAPH: &[&str] = &[
    "p", "div", "ul", "ol", "li", "h1", "h2", "h3", "h4", "h5", "h6", "table", "blockquote",
    "pre", "hr",
];

/// Top-level tokens. Every variant starts with at most two fixed characters so
/// the lexer never backs out of a longer match; callbacks consume the rest.
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
enum Token<'src> {
    #[token("<!", directive)]
    #[token("<?", directive)]
    Directive(Directive<'src>),

    #[token("</", end_tag)]
    EndTag(&'src str),

    #[regex("<[a-zA-Z]", start_tag)]
    StartTag(StartTag),

    /// A '<' that does not open a tag.
    #[token("<")]
    LessThan,

    #[regex("[^<]+")]
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Directive<'src> {
    Comment(&'src str),
    Declaration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StartTag {
    element: Element,
    self_closing: bool,
}

/// Tokens inside a start tag, after the `<`.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum TagToken<'src> {
    #[token(">")]
    Close,

    #[token("/>")]
    SelfClose,

    #[token("/")]
    Slash,

    #[token("=")]
    Equals,

    #[token("\"", quoted)]
    #[token("'", quoted)]
    Quoted(&'src str),

    #[regex(r#"[^ \t\r\n\f=/>"']+"#)]
    Word(&'src str),
}

fn directive<'src>(lex: &mut Lexer<'src, Token<'src>>) -> Option<Directive<'src>> {
    let remainder = lex.remainder();
    if lex.slice() == "<!" && remainder.starts_with("--") {
        let len = remainder[2..].find("-->")?;
        lex.bump(len + 5);
        return Some(Directive::Comment(&remainder[2..2 + len]));
    }
    let len = remainder.find('>')?;
    lex.bump(len + 1);
    Some(Directive::Declaration)
}

fn end_tag<'src>(lex: &mut Lexer<'src, Token<'src>>) -> Option<&'src str> {
    let remainder = lex.remainder();
    let len = remainder.find('>')?;
    lex.bump(len + 1);
    Some(remainder[..len].trim())
}

fn start_tag<'src>(lex: &mut Lexer<'src, Token<'src>>) -> Option<StartTag> {
    // The pattern already consumed the first letter of the name.
    let name_start = lex.span().start + 1;
    let (tag, len) = scan_start_tag(&lex.source()[name_start..])?;
    lex.bump(len - 1);
    Some(tag)
}

fn quoted<'src>(lex: &mut Lexer<'src, TagToken<'src>>) -> Option<&'src str> {
    let quote = lex.slice();
    let remainder = lex.remainder();
    let len = remainder.find(quote)?;
    lex.bump(len + 1);
    Some(&remainder[..len])
}

/// Reads a start tag from its name up to the closing `>`. Returns the tag and
/// the number of bytes it spans, or `None` when the input ends first.
fn scan_start_tag(input: &str) -> Option<(StartTag, usize)> {
    let mut tokens = TagToken::lexer(input).spanned().peekable();
    let Some((Ok(TagToken::Word(name)), _)) = tokens.next() else {
        return None;
    };
    let mut element = Element::new(name.to_ascii_lowercase());
    let mut pending: Option<String> = None;

    while let Some((token, span)) = tokens.next() {
        let self_closing = match token.ok()? {
            TagToken::Close => false,
            TagToken::SelfClose => true,
            TagToken::Slash | TagToken::Quoted(_) => continue,
            TagToken::Word(word) => {
                if let Some(attribute) = pending.replace(word.to_ascii_lowercase()) {
                    element.attributes.push((attribute, String::new()));
                }
                continue;
            }
            TagToken::Equals => {
                let value = attribute_value(&mut tokens, input);
                if let Some(attribute) = pending.take() {
                    element.attributes.push((attribute, value));
                }
                continue;
            }
        };
        if let Some(attribute) = pending.take() {
            element.attributes.push((attribute, String::new()));
        }
        return Some((StartTag { element, self_closing }, span.end));
    }
    None
}

type Spanned<'src> = (Result<TagToken<'src>, ()>, std::ops::Range<usize>);

/// Value after an `=`. Unquoted values run until whitespace or the tag end,
/// so they may contain slashes.
fn attribute_value<'src>(
    tokens: &mut Peekable<impl Iterator<Item = Spanned<'src>>>,
    input: &str,
) -> String {
    let (start, mut end) = match tokens.peek() {
        Some((Ok(TagToken::Quoted(value)), _)) => {
            let value = decode_entities(value);
            tokens.next();
            return value;
        }
        Some((Ok(TagToken::Word(_)), span)) => (span.start, span.end),
        _ => return String::new(),
    };
    tokens.next();
    while let Some((Ok(TagToken::Word(_) | TagToken::Slash), span)) = tokens.peek() {
        if span.start != end {
            break;
        }
        end = span.end;
        tokens.next();
    }
    decode_entities(&input[start..end])
}

pub fn parse(input: &str) -> Result<MarkupNode, MarkupError> {
    let mut builder = TreeBuilder::default();
    let mut lexer = Token::lexer(input);
    while let Some(token) = lexer.next() {
        match token {
            Ok(Token::Text) => builder.append_text(&decode_entities(lexer.slice())),
            Ok(Token::LessThan) => builder.append_text("<"),
            Ok(Token::Directive(Directive::Comment(body))) => {
                builder.append(MarkupNode::Comment(body.to_string()));
            }
            Ok(Token::Directive(Directive::Declaration)) => {}
            Ok(Token::EndTag(name)) => builder.close(&name.to_ascii_lowercase()),
            Ok(Token::StartTag(StartTag { element, self_closing })) => {
                let raw = !self_closing && RAW_TEXT_ELEMENTS.contains(&element.tag.as_str());
                let tag = element.tag.clone();
                builder.open(element, self_closing);
                if raw {
                    raw_text(&mut lexer, &tag, &mut builder);
                }
            }
            Err(()) => return Err(lex_error(&lexer)),
        }
    }
    Ok(builder.finish())
}

fn lex_error<'src>(lexer: &Lexer<'src, Token<'src>>) -> MarkupError {
    let offset = lexer.span().start;
    if lexer.slice() == "<!" && lexer.remainder().starts_with("--") {
        MarkupError::UnterminatedComment { offset }
    } else {
        MarkupError::UnterminatedTag { offset }
    }
}

/// Consumes everything up to the matching end tag as a single text node.
fn raw_text<'src>(lexer: &mut Lexer<'src, Token<'src>>, tag: &str, builder: &mut TreeBuilder) {
    let remainder = lexer.remainder();
    let closing = format!("</{tag}");
    let len = remainder
        .to_ascii_lowercase()
        .find(&closing)
        .unwrap_or(remainder.len());
    builder.append_text(&remainder[..len]);
    lexer.bump(len);
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Element>,
    root: Vec<MarkupNode>,
}

impl TreeBuilder {
    fn finish(mut self) -> MarkupNode {
        while !self.stack.is_empty() {
            self.pop();
        }
        MarkupNode::Document(self.root)
    }

    fn open(&mut self, element: Element, self_closing: bool) {
        if CLOSES_PARAGRAPH.contains(&element.tag.as_str())
            && self.stack.last().is_some_and(|open| open.tag == "p")
        {
            self.pop();
        }
        if element.tag == "li" {
            self.close_open_list_item();
        }

        if self_closing || VOID_ELEMENTS.contains(&element.tag.as_str()) {
            self.append(MarkupNode::Element(element));
        } else {
            self.stack.push(element);
        }
    }

    fn close_open_list_item(&mut self) {
        let open_item = self
            .stack
            .iter()
            .rposition(|open| matches!(open.tag.as_str(), "li" | "ul" | "ol"))
            .filter(|&idx| self.stack[idx].tag == "li");
        if let Some(idx) = open_item {
            while self.stack.len() > idx {
                self.pop();
            }
        }
    }

    fn close(&mut self, tag: &str) {
        let Some(idx) = self.stack.iter().rposition(|open| open.tag == tag) else {
            return;
        };
        while self.stack.len() > idx {
            self.pop();
        }
    }

    fn pop(&mut self) {
        if let Some(element) = self.stack.pop() {
            self.append(MarkupNode::Element(element));
        }
    }

    fn append(&mut self, node: MarkupNode) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root.push(node),
        }
    }

    fn append_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let siblings = match self.stack.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.root,
        };
        if let Some(MarkupNode::Text(previous)) = siblings.last_mut() {
            previous.push_str(text);
        } else {
            siblings.push(MarkupNode::Text(text.to_string()));
        }
    }
}

/// Resolves character references. Unknown references stay literal.
pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];
        let decoded = rest
            .find(';')
            .filter(|&end| end <= 12)
            .and_then(|end| decode_reference(&rest[1..end]).map(|ch| (ch, end)));
        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}
