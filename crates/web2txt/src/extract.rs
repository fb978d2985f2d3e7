//! HTML to text fragment extraction
//!
//! Markup is parsed leniently with `scraper` (html5ever), converted into a
//! small closed node model, pruned of non-content subtrees, and walked in
//! document order.
//!
//! Line-break policy: the elements in [`BLOCK_ELEMENTS`] are surrounded by
//! block boundaries, `<br>` is a hard line break, the elements in
//! [`SEPARATED_ELEMENTS`] are kept apart by a space, everything else is
//! inline. This is a reading-order heuristic, not a rendering of CSS layout.

use scraper::{ElementRef, Html};
use tracing::debug;

/// Elements whose whole subtree is dropped before extraction
pub const REMOVED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "iframe", "svg", "object",
];

/// Elements that start and end a line of text
pub const BLOCK_ELEMENTS: &[&str] = &[
    "p",
    "div",
    "li",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "tr",
    "title",
    "ul",
    "ol",
    "table",
    "blockquote",
    "pre",
    "hr",
    "section",
    "article",
    "header",
    "footer",
    "main",
    "nav",
    "aside",
    "dl",
];

/// Inline elements whose text must not run into its neighbours
pub const SEPARATED_ELEMENTS: &[&str] = &[
    "td", "th", "dt", "dd", "a", "caption", "figcaption", "label", "button", "option",
    "summary", "img",
];

/// Elements whose text keeps its line structure
const PREFORMATTED_ELEMENTS: &[&str] = &["pre", "textarea"];

/// Parsed document node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element { name: String, children: Vec<Node> },
    Text(String),
    Comment(String),
}

impl Node {
    fn element(name: &str, children: Vec<Node>) -> Self {
        Node::Element {
            name: name.to_string(),
            children,
        }
    }
}

/// One unit of extracted output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Text of a single DOM text node, unmodified
    Text { text: String, preformatted: bool },
    /// Start or end of a block element
    BlockBoundary,
    /// Explicit `<br>`
    LineBreak,
    /// Start or end of a cell, link or similar; at most one space
    Separator,
}

/// Ordered fragments of a document's visible text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    fragments: Vec<Fragment>,
}

impl ExtractedText {
    /// Wrap already-extracted text as a single preformatted fragment
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            fragments: vec![Fragment::Text {
                text: text.into(),
                preformatted: true,
            }],
        }
    }

    /// Fragments in document order
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// True if no fragment carries any text
    pub fn is_empty(&self) -> bool {
        !self
            .fragments
            .iter()
            .any(|f| matches!(f, Fragment::Text { text, .. } if !text.is_empty()))
    }

    /// Iterate over the raw text of all text fragments
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.fragments.iter().filter_map(|f| match f {
            Fragment::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl From<Vec<Fragment>> for ExtractedText {
    fn from(fragments: Vec<Fragment>) -> Self {
        Self { fragments }
    }
}

/// Extract visible text fragments from an HTML document
///
/// Never fails: malformed markup is repaired by the parser.
pub fn extract(html: &str) -> ExtractedText {
    let root = parse_document(html);
    let mut fragments = Vec::new();
    if let Some(root) = prune(root) {
        visit(&root, false, &mut fragments);
    }
    ExtractedText { fragments }
}

/// Parse markup into the node model, rooted at the `<html>` element
pub fn parse_document(html: &str) -> Node {
    let document = Html::parse_document(html);
    if !document.errors.is_empty() {
        debug!(
            errors = document.errors.len(),
            "Recovered from malformed markup"
        );
    }
    convert(document.root_element())
}

fn convert(element: ElementRef<'_>) -> Node {
    let children = element
        .children()
        .filter_map(|child| match child.value() {
            scraper::Node::Text(text) => Some(Node::Text(String::from(&**text))),
            scraper::Node::Comment(comment) => Some(Node::Comment(String::from(&**comment))),
            scraper::Node::Element(_) => ElementRef::wrap(child).map(convert),
            _ => None,
        })
        .collect();
    Node::element(element.value().name(), children)
}

/// Drop comments and non-content subtrees
pub fn prune(node: Node) -> Option<Node> {
    match node {
        Node::Comment(_) => None,
        Node::Text(_) => Some(node),
        Node::Element { name, children } => {
            if REMOVED_ELEMENTS.contains(&name.as_str()) {
                return None;
            }
            let children = children.into_iter().filter_map(prune).collect();
            Some(Node::Element { name, children })
        }
    }
}

fn visit(node: &Node, preformatted: bool, out: &mut Vec<Fragment>) {
    match node {
        Node::Text(text) => out.push(Fragment::Text {
            text: text.clone(),
            preformatted,
        }),
        Node::Comment(_) => {}
        Node::Element { name, children } => {
            let name = name.as_str();
            if name == "br" {
                out.push(Fragment::LineBreak);
                return;
            }

            let boundary = if BLOCK_ELEMENTS.contains(&name) {
                Some(Fragment::BlockBoundary)
            } else if SEPARATED_ELEMENTS.contains(&name) {
                Some(Fragment::Separator)
            } else {
                None
            };
            let preformatted = preformatted || PREFORMATTED_ELEMENTS.contains(&name);

            if let Some(ref marker) = boundary {
                out.push(marker.clone());
            }
            for child in children {
                visit(child, preformatted, out);
            }
            if let Some(marker) = boundary {
                out.push(marker);
            }
        }
    }
}
