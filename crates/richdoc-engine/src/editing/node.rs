use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Block kind tag carried by an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Paragraph,
    CodeBlock,
    BlockQuote,
}

impl ElementKind {
    /// Stable string name of the kind, matching its serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Paragraph => "paragraph",
            ElementKind::CodeBlock => "code-block",
            ElementKind::BlockQuote => "block-quote",
        }
    }
}

/// Boolean character-level mark carried by a text run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Bold,
    Italic,
    Code,
}

/// Optional style attributes on an element
pub type AttrMap = BTreeMap<String, String>;

/// Leaf node holding literal text and its active marks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub content: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub marks: BTreeSet<Mark>,
}

impl TextRun {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            marks: BTreeSet::new(),
        }
    }

    pub fn with_marks(content: impl Into<String>, marks: impl IntoIterator<Item = Mark>) -> Self {
        Self {
            content: content.into(),
            marks: marks.into_iter().collect(),
        }
    }

    /// Length of the content in characters. Selection offsets count
    /// characters, not bytes.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn has_mark(&self, mark: Mark) -> bool {
        self.marks.contains(&mark)
    }
}

/// Interior node carrying a kind tag and ordered children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub kind: ElementKind,
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: AttrMap,
}

impl Element {
    pub fn new(kind: ElementKind, children: Vec<Node>) -> Self {
        Self {
            kind,
            children,
            attrs: AttrMap::new(),
        }
    }

    /// Paragraph holding a single unmarked text run
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(ElementKind::Paragraph, vec![Node::text(text)])
    }
}

/// A node in the document tree: an element or a text run leaf.
///
/// Leaves are always text runs; elements never hold raw text directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Node {
    Element(Element),
    Text(TextRun),
}

impl Node {
    pub fn text(content: impl Into<String>) -> Self {
        Node::Text(TextRun::new(content))
    }

    pub fn element(kind: ElementKind, children: Vec<Node>) -> Self {
        Node::Element(Element::new(kind, children))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextRun> {
        match self {
            Node::Element(_) => None,
            Node::Text(run) => Some(run),
        }
    }

    /// True for elements that directly hold text runs — the targets of block
    /// kind changes. Container elements holding further elements are not
    /// block-level.
    pub fn is_block_level(&self) -> bool {
        match self {
            Node::Element(el) => el.children.iter().all(|child| child.is_text()),
            Node::Text(_) => false,
        }
    }
}
