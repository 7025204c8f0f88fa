//! Minimal fragment parser and single-root normalizer.
//!
//! # Responsibilities
//! - Split a markup fragment into its top-level nodes
//! - Stamp identity attributes onto a sole top-level element in place
//! - Otherwise wrap every top-level node in one synthetic element
//!
//! # Design Decisions
//! - Not a DOM: only top-level boundaries and the root start tag are
//!   located, everything else is carried through byte-for-byte
//! - Lenient like browsers: unclosed elements run to the end of input,
//!   stray close tags are plain text
//! - Void elements, self-closing tags and raw-text elements (`script`,
//!   `style`, ...) are recognised so their content cannot unbalance nesting

use std::ops::Range;

/// Attribute carrying the registered component name.
pub const COMPONENT_ATTR: &str = "data-component";
/// Attribute carrying the per-render instance token.
pub const INSTANCE_ATTR: &str = "data-component-id";
/// Marker attribute set on synthetic wrappers.
pub const WRAPPER_ATTR: &str = "data-wrapper";

const WRAPPER_TAG: &str = "div";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// A top-level node, as a byte range into the source fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element {
        /// Lowercased tag name.
        name: String,
        span: Range<usize>,
        /// Offset inside the start tag where attributes can be appended.
        attrs_at: usize,
    },
    Text(Range<usize>),
    /// Comments, doctypes and processing instructions.
    Comment(Range<usize>),
}

impl Node {
    pub fn span(&self) -> &Range<usize> {
        match self {
            Node::Element { span, .. } | Node::Text(span) | Node::Comment(span) => span,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element { .. })
    }
}

/// A fragment split into its top-level nodes.
#[derive(Debug)]
pub struct ParsedFragment<'a> {
    source: &'a str,
    nodes: Vec<Node>,
}

impl<'a> ParsedFragment<'a> {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn source_of(&self, node: &Node) -> &'a str {
        &self.source[node.span().clone()]
    }

    pub fn element_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_element()).count()
    }

    /// Insertion offset of the root start tag, if exactly one top-level
    /// element exists.
    fn sole_root(&self) -> Option<usize> {
        let mut elements = self.nodes.iter().filter_map(|n| match n {
            Node::Element { attrs_at, .. } => Some(*attrs_at),
            _ => None,
        });
        match (elements.next(), elements.next()) {
            (Some(at), None) => Some(at),
            _ => None,
        }
    }
}

/// Identity attributes applied to a rendered fragment.
#[derive(Debug, Clone, Copy)]
pub struct Stamp<'a> {
    pub component: &'a str,
    pub instance: &'a str,
}

impl Stamp<'_> {
    fn attributes(&self) -> String {
        format!(
            " {COMPONENT_ATTR}=\"{}\" {INSTANCE_ATTR}=\"{}\"",
            escape_attr(self.component),
            escape_attr(self.instance)
        )
    }
}

/// Output of [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub markup: String,
    /// True when a synthetic wrapper was introduced.
    pub wrapped: bool,
}

/// Guarantee exactly one top-level element carrying the identity stamp.
pub fn normalize(source: &str, stamp: Stamp<'_>) -> Normalized {
    let parsed = parse(source);
    let attrs = stamp.attributes();

    match parsed.sole_root() {
        Some(at) => {
            let mut markup = String::with_capacity(source.len() + attrs.len());
            markup.push_str(&source[..at]);
            markup.push_str(&attrs);
            markup.push_str(&source[at..]);
            Normalized { markup, wrapped: false }
        }
        None => Normalized {
            markup: format!(
                "<{WRAPPER_TAG}{attrs} {WRAPPER_ATTR}=\"true\">{source}</{WRAPPER_TAG}>"
            ),
            wrapped: true,
        },
    }
}

/// Split a fragment into top-level nodes.
pub fn parse(source: &str) -> ParsedFragment<'_> {
    let mut nodes = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while let Some(offset) = source[pos..].find('<') {
        let at = pos + offset;
        let rest = &source[at..];

        let node = if rest.starts_with("<!--") {
            let end = find_from(source, at + 4, "-->").map_or(source.len(), |i| i + 3);
            Some(Node::Comment(at..end))
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            let end = find_from(source, at, ">").map_or(source.len(), |i| i + 1);
            Some(Node::Comment(at..end))
        } else {
            scan_start_tag(source, at).map(|tag| {
                let end = element_end(source, &tag);
                Node::Element {
                    name: tag.name,
                    span: at..end,
                    attrs_at: tag.attrs_at,
                }
            })
        };

        match node {
            Some(node) => {
                if text_start < at {
                    nodes.push(Node::Text(text_start..at));
                }
                pos = node.span().end;
                text_start = pos;
                nodes.push(node);
            }
            None => pos = at + 1,
        }
    }

    if text_start < source.len() {
        nodes.push(Node::Text(text_start..source.len()));
    }

    ParsedFragment { source, nodes }
}

#[derive(Debug)]
struct StartTag {
    name: String,
    attrs_at: usize,
    end: usize,
    self_closing: bool,
}

impl StartTag {
    fn is_void(&self) -> bool {
        self.self_closing || VOID_ELEMENTS.contains(&self.name.as_str())
    }

    fn is_raw_text(&self) -> bool {
        RAW_TEXT_ELEMENTS.contains(&self.name.as_str())
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b':' | b'_' | b'.')
}

fn read_name(source: &str, from: usize) -> (String, usize) {
    let bytes = source.as_bytes();
    let mut pos = from;
    while pos < bytes.len() && is_name_byte(bytes[pos]) {
        pos += 1;
    }
    (source[from..pos].to_ascii_lowercase(), pos)
}

/// Where the scanner is inside a start tag's attribute list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrState {
    Between,
    /// Just after `=`, before the value starts.
    BeforeValue,
    Quoted(u8),
    /// `/` is an ordinary value byte here, so `/>` does not self-close.
    Unquoted,
}

/// Parse a start tag beginning at `at` (which holds `<`).
fn scan_start_tag(source: &str, at: usize) -> Option<StartTag> {
    let bytes = source.as_bytes();
    if !bytes.get(at + 1)?.is_ascii_alphabetic() {
        return None;
    }

    let (name, name_end) = read_name(source, at + 1);
    let mut state = AttrState::Between;
    let mut pos = name_end;

    while pos < bytes.len() {
        let b = bytes[pos];
        state = match state {
            AttrState::Quoted(q) if b == q => AttrState::Between,
            AttrState::Quoted(q) => AttrState::Quoted(q),
            AttrState::BeforeValue if b == b'"' || b == b'\'' => AttrState::Quoted(b),
            AttrState::BeforeValue if b.is_ascii_whitespace() => AttrState::BeforeValue,
            AttrState::Unquoted if b.is_ascii_whitespace() => AttrState::Between,
            AttrState::Between if b == b'=' => AttrState::BeforeValue,
            _ if b == b'>' => {
                let self_closing =
                    state == AttrState::Between && pos > name_end && bytes[pos - 1] == b'/';
                let mut attrs_at = if self_closing { pos - 1 } else { pos };
                if state == AttrState::Between {
                    while attrs_at > name_end && bytes[attrs_at - 1].is_ascii_whitespace() {
                        attrs_at -= 1;
                    }
                }
                return Some(StartTag {
                    name,
                    attrs_at,
                    end: pos + 1,
                    self_closing,
                });
            }
            AttrState::BeforeValue | AttrState::Unquoted => AttrState::Unquoted,
            AttrState::Between => AttrState::Between,
        };
        pos += 1;
    }
    None
}

/// Offset just past the element opened by `tag`.
fn element_end(source: &str, tag: &StartTag) -> usize {
    if tag.is_void() {
        return tag.end;
    }
    if tag.is_raw_text() {
        return raw_text_end(source, tag.end, &tag.name);
    }

    let mut open = vec![tag.name.clone()];
    let mut pos = tag.end;

    while let Some(offset) = source[pos..].find('<') {
        let at = pos + offset;
        let rest = &source[at..];

        if rest.starts_with("<!--") {
            pos = find_from(source, at + 4, "-->").map_or(source.len(), |i| i + 3);
        } else if rest.starts_with("</") {
            let (name, name_end) = read_name(source, at + 2);
            let close_end = find_from(source, name_end, ">").map_or(source.len(), |i| i + 1);
            if let Some(depth) = open.iter().rposition(|n| *n == name) {
                open.truncate(depth);
                if open.is_empty() {
                    return close_end;
                }
            }
            pos = close_end;
        } else if let Some(inner) = scan_start_tag(source, at) {
            pos = if inner.is_void() {
                inner.end
            } else if inner.is_raw_text() {
                raw_text_end(source, inner.end, &inner.name)
            } else {
                open.push(inner.name);
                inner.end
            };
        } else {
            pos = at + 1;
        }
    }

    source.len()
}

fn raw_text_end(source: &str, from: usize, name: &str) -> usize {
    // ASCII lowercasing keeps byte offsets stable.
    let lowered = source[from..].to_ascii_lowercase();
    match lowered.find(&format!("</{name}")) {
        Some(offset) => {
            find_from(source, from + offset, ">").map_or(source.len(), |i| i + 1)
        }
        None => source.len(),
    }
}

fn find_from(source: &str, from: usize, needle: &str) -> Option<usize> {
    source.get(from..)?.find(needle).map(|i| from + i)
}

/// Escape a value for use inside a double-quoted attribute.
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
