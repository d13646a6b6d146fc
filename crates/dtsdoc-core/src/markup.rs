//! Tolerant HTML model for documentation pages.
//!
//! Markup is tokenized into a flat, document-ordered sequence of [`Node`]s.
//! Element extents are resolved once after tokenizing, so an [`Element`] is
//! just an index into that sequence plus the index one past its last
//! descendant. Unclosed elements end where an enclosing element closes and
//! stray close tags are ignored, which is enough for generator output that
//! is mostly, but not always, well formed.
//!
//! ```rust
//! use dtsdoc_core::markup::Markup;
//!
//! let markup = Markup::parse(r#"<h1 class="page-title">Class: Marker</h1><p>Hi &amp; bye</p>"#);
//! let title = markup.find(|e| e.is("h1") && e.has_class("page-title")).unwrap();
//! assert_eq!(title.normalized_text(), "Class: Marker");
//! assert_eq!(markup.find(|e| e.is("p")).unwrap().text(), "Hi & bye");
//! ```

use std::sync::LazyLock;

use regex::Regex;

/// Elements that never have content or a close tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is skipped entirely.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static TAG_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(/?)([A-Za-z][A-Za-z0-9:_-]*)").unwrap());

/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#).unwrap()
});

/// One token of the markup stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An opening (or self-closing) tag.
    Open {
        /// Lower-cased tag name.
        tag: String,
        /// Attributes in source order, names lower-cased, values decoded.
        attrs: Vec<(String, String)>,
        /// Written as `<tag/>` or a void element.
        self_closing: bool,
    },
    /// A closing tag.
    Close {
        /// Lower-cased tag name.
        tag: String,
    },
    /// Character data with entities decoded.
    Text(String),
}

/// A parsed document: the node sequence plus resolved element extents.
#[derive(Debug, Clone)]
pub struct Markup {
    nodes: Vec<Node>,
    /// For an `Open` node at `i`, one past its last descendant (and past its
    /// close tag when it has one). For any other node, `i + 1`.
    ends: Vec<usize>,
}

impl Markup {
    /// Tokenize `input`. Never fails; malformed regions degrade to text.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let nodes = tokenize(input);
        let ends = resolve_extents(&nodes);
        Self { nodes, ends }
    }

    /// The token sequence.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document produced no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The element opened at node `index`, if that node is an opening tag.
    #[must_use]
    pub fn element(&self, index: usize) -> Option<Element<'_>> {
        matches!(self.nodes.get(index), Some(Node::Open { .. })).then_some(Element {
            markup: self,
            index,
        })
    }

    /// All elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = Element<'_>> {
        (0..self.nodes.len()).filter_map(|i| self.element(i))
    }

    /// First element matching `pred`.
    pub fn find<'a>(&'a self, pred: impl Fn(&Element<'a>) -> bool) -> Option<Element<'a>> {
        self.elements().find(|e| pred(e))
    }

    /// All elements matching `pred`, in document order.
    pub fn find_all<'a>(&'a self, pred: impl Fn(&Element<'a>) -> bool) -> Vec<Element<'a>> {
        self.elements().filter(|e| pred(e)).collect()
    }

    /// First element matching `pred` whose opening tag lies strictly after
    /// node `from` and before node `bound`.
    pub fn find_following<'a>(
        &'a self,
        from: usize,
        bound: usize,
        pred: impl Fn(&Element<'a>) -> bool,
    ) -> Option<Element<'a>> {
        let bound = bound.min(self.nodes.len());
        (from.saturating_add(1)..bound)
            .filter_map(|i| self.element(i))
            .find(|e| pred(e))
    }

    fn text_between(&self, start: usize, end: usize) -> String {
        self.nodes[start..end]
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// A view of one element inside a [`Markup`].
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    markup: &'a Markup,
    index: usize,
}

impl<'a> Element<'a> {
    /// Node index of the opening tag.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Node index one past the element's last descendant.
    #[must_use]
    pub fn end(&self) -> usize {
        self.markup.ends[self.index]
    }

    fn open(&self) -> (&'a str, &'a [(String, String)]) {
        let markup: &'a Markup = self.markup;
        match &markup.nodes[self.index] {
            Node::Open { tag, attrs, .. } => (tag.as_str(), attrs.as_slice()),
            _ => ("", &[]),
        }
    }

    /// Lower-cased tag name.
    #[must_use]
    pub fn tag(&self) -> &'a str {
        self.open().0
    }

    /// Whether this element's tag is `tag` (compare lower-case).
    #[must_use]
    pub fn is(&self, tag: &str) -> bool {
        self.tag() == tag
    }

    /// Attribute value by lower-case name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.open()
            .1
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether the `class` attribute lists `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Concatenated text of all descendants, verbatim.
    #[must_use]
    pub fn text(&self) -> String {
        self.markup.text_between(self.index + 1, self.end())
    }

    /// Descendant text with whitespace runs collapsed and ends trimmed.
    #[must_use]
    pub fn normalized_text(&self) -> String {
        collapse_whitespace(&self.text())
    }

    /// Descendant elements in document order.
    pub fn descendants(&self) -> impl Iterator<Item = Element<'a>> + 'a {
        let markup = self.markup;
        (self.index + 1..self.end()).filter_map(move |i| markup.element(i))
    }

    /// First descendant matching `pred`.
    pub fn find(&self, pred: impl Fn(&Element<'a>) -> bool) -> Option<Element<'a>> {
        self.descendants().find(|e| pred(e))
    }

    /// Direct child elements in document order.
    #[must_use]
    pub fn children(&self) -> Vec<Element<'a>> {
        let markup: &'a Markup = self.markup;
        let mut children = Vec::new();
        let mut i = self.index + 1;
        let end = self.end();
        while i < end {
            if let Some(child) = markup.element(i) {
                children.push(child);
                i = child.end().max(i + 1);
            } else {
                i += 1;
            }
        }
        children
    }

    /// The next element at the same depth, skipping text.
    #[must_use]
    pub fn next_sibling(&self) -> Option<Element<'a>> {
        let markup: &'a Markup = self.markup;
        let mut i = self.end();
        while let Some(node) = markup.nodes.get(i) {
            match node {
                Node::Text(_) => i += 1,
                Node::Open { .. } => return markup.element(i),
                Node::Close { .. } => return None,
            }
        }
        None
    }
}

/// Collapse whitespace runs to single spaces and trim.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

fn tokenize(input: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut pos = 0;
    let mut text_start = 0;

    let flush = |nodes: &mut Vec<Node>, from: usize, to: usize| {
        if from < to {
            nodes.push(Node::Text(decode(&input[from..to])));
        }
    };

    while let Some(offset) = input[pos..].find('<') {
        let lt = pos + offset;
        let after = &input[lt + 1..];

        if after.starts_with("!--") {
            flush(&mut nodes, text_start, lt);
            let end = after.find("-->").map_or(input.len(), |e| lt + 1 + e + 3);
            pos = end;
            text_start = end;
            continue;
        }

        if after.starts_with('!') || after.starts_with('?') {
            flush(&mut nodes, text_start, lt);
            let end = after.find('>').map_or(input.len(), |e| lt + 1 + e + 1);
            pos = end;
            text_start = end;
            continue;
        }

        let Some(caps) = TAG_NAME_RE.captures(after) else {
            // A bare '<' in text.
            pos = lt + 1;
            continue;
        };
        let name_end = caps.get(0).map_or(0, |m| m.end());
        let Some(close_offset) = find_tag_end(&after[name_end..]) else {
            pos = lt + 1;
            continue;
        };

        flush(&mut nodes, text_start, lt);

        let is_close = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let tag = caps
            .get(2)
            .map_or_else(String::new, |m| m.as_str().to_ascii_lowercase());
        let attr_src = &after[name_end..name_end + close_offset];
        let tag_end = lt + 1 + name_end + close_offset + 1;

        if is_close {
            nodes.push(Node::Close { tag });
            pos = tag_end;
            text_start = tag_end;
            continue;
        }

        let self_closing =
            attr_src.trim_end().ends_with('/') || VOID_ELEMENTS.contains(&tag.as_str());
        let attrs = parse_attrs(attr_src);
        let raw_text = RAW_TEXT_ELEMENTS.contains(&tag.as_str()) && !self_closing;
        nodes.push(Node::Open {
            tag: tag.clone(),
            attrs,
            self_closing,
        });

        pos = tag_end;
        if raw_text {
            let needle = format!("</{tag}");
            pos = input[tag_end..]
                .to_ascii_lowercase()
                .find(&needle)
                .map_or(input.len(), |e| tag_end + e);
        }
        text_start = pos;
    }

    flush(&mut nodes, text_start, input.len());
    nodes
}

/// Offset of the `>` that ends a tag, ignoring any inside quoted values.
fn find_tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {},
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(i),
            (None, '<') => return None,
            _ => {},
        }
    }
    None
}

fn parse_attrs(src: &str) -> Vec<(String, String)> {
    ATTR_RE
        .captures_iter(src)
        .filter_map(|cap| {
            let name = cap.get(1)?.as_str().to_ascii_lowercase();
            let value = cap
                .get(2)
                .or_else(|| cap.get(3))
                .or_else(|| cap.get(4))
                .map_or_else(String::new, |m| decode(m.as_str()));
            Some((name, value))
        })
        .collect()
}

fn resolve_extents(nodes: &[Node]) -> Vec<usize> {
    let mut ends: Vec<usize> = (1..=nodes.len()).collect();
    let mut open: Vec<(&str, usize)> = Vec::new();

    for (i, node) in nodes.iter().enumerate() {
        match node {
            Node::Open {
                tag, self_closing, ..
            } if !self_closing => open.push((tag.as_str(), i)),
            Node::Close { tag } => {
                if let Some(pos) = open.iter().rposition(|(t, _)| t == tag) {
                    // Anything opened after the match closes implicitly here.
                    for &(_, child) in &open[pos + 1..] {
                        ends[child] = i;
                    }
                    ends[open[pos].1] = i + 1;
                    open.truncate(pos);
                }
            },
            _ => {},
        }
    }

    for (_, index) in open {
        ends[index] = nodes.len();
    }
    ends
}
