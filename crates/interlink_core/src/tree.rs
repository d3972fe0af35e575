//! Markdown syntax tree helpers shared by the AST matcher and rewriter.
//!
//! A text node is *linkable* when it is a plain `Text` node that is not
//! inside a link, heading, image or raw `<a>…</a>` element.
//!
//! A node's value is not always its source slice: backslash escapes and
//! character references are decoded, and continuation-line indentation is
//! dropped. [`segments`] aligns the two as runs that appear verbatim in
//! both, so source offsets of a match can be carried into the value.
//! Escapes and references themselves are never linked.

use crate::EngineError;
use markdown::mdast::{Node, Text};
use markdown::{ParseOptions, to_mdast};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static ANCHOR_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^<a\b[^>]*[^/]>$|^<a>$").expect("valid anchor open regex"));

static ANCHOR_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^</a\s*>$").expect("valid anchor close regex"));

/// Source constructs whose decoded value differs from their text: a
/// backslash escape, a character reference, or a line break with the
/// indentation and container markers of the next line.
static INLINE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<escape>\\[!-/:-@\[-`{-~])|(?P<reference>&(?:#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{1,31});)|[ \t]*\r?\n[ \t>]*",
    )
    .expect("valid inline token regex")
});

/// A run of a text node that appears verbatim in both source and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment {
    /// Absolute source range.
    pub source: Range<usize>,
    /// Start of the run in the node value.
    pub value: usize,
    /// Only a line break separates this run from the previous one.
    pub joined: bool,
}

impl Segment {
    /// Value offset of the source offset `at`. `end` selects whether `at`
    /// closes a range (and may sit on the run's end) or opens one.
    pub fn value_offset(&self, at: usize, end: bool) -> Option<usize> {
        let inside = if end {
            self.source.start < at && at <= self.source.end
        } else {
            self.source.start <= at && at < self.source.end
        };
        inside.then(|| self.value + at - self.source.start)
    }
}

/// Parse a document body (frontmatter already removed) into mdast.
pub fn parse(source: &str) -> Result<Node, EngineError> {
    to_mdast(source, &ParseOptions::gfm()).map_err(|err| EngineError::Parse(err.to_string()))
}

/// Node types whose subtree never receives links.
pub(crate) fn is_opaque(node: &Node) -> bool {
    matches!(
        node,
        Node::Heading(_)
            | Node::Link(_)
            | Node::LinkReference(_)
            | Node::Image(_)
            | Node::ImageReference(_)
            | Node::Definition(_)
            | Node::Code(_)
            | Node::InlineCode(_)
            | Node::Html(_)
            | Node::Math(_)
            | Node::InlineMath(_)
            | Node::Yaml(_)
            | Node::Toml(_)
            | Node::MdxjsEsm(_)
            | Node::MdxJsxFlowElement(_)
            | Node::MdxJsxTextElement(_)
            | Node::MdxFlowExpression(_)
            | Node::MdxTextExpression(_)
    )
}

/// Track raw `<a>` elements among siblings: returns the new nesting depth
/// after seeing `node`.
pub(crate) fn anchor_depth(node: &Node, depth: usize) -> usize {
    match node {
        Node::Html(html) if ANCHOR_OPEN.is_match(html.value.trim()) => depth + 1,
        Node::Html(html) if ANCHOR_CLOSE.is_match(html.value.trim()) => depth.saturating_sub(1),
        _ => depth,
    }
}

/// Align a text node with its source slice.
///
/// Runs are returned in order. Alignment stops at the first run the value
/// does not contain where expected; everything after it is left out.
pub(crate) fn segments(text: &Text, source: &str) -> Vec<Segment> {
    let Some(position) = text.position.as_ref() else {
        return Vec::new();
    };
    let base = position.start.offset;
    let Some(slice) = source.get(base..position.end.offset) else {
        return Vec::new();
    };

    let mut aligner = Aligner {
        slice,
        value: &text.value,
        base,
        cursor: 0,
        resync: false,
        join: false,
        segments: Vec::new(),
    };

    let mut last = 0;
    for token in INLINE_TOKEN.captures_iter(slice) {
        let Some(whole) = token.get(0) else {
            continue;
        };
        if !aligner.literal(last..whole.start()) {
            return aligner.segments;
        }
        last = whole.end();

        if token.name("escape").is_some() {
            // `\%` decodes to exactly `%`
            if aligner.advance(&whole.as_str()[1..]).is_none() {
                return aligner.segments;
            }
            aligner.join = false;
        } else if token.name("reference").is_some() {
            aligner.resync = true;
            aligner.join = false;
        } else {
            aligner.resync = true;
        }
    }
    aligner.literal(last..slice.len());
    aligner.segments
}

struct Aligner<'a> {
    slice: &'a str,
    value: &'a str,
    base: usize,
    /// Position in `value`.
    cursor: usize,
    /// The previous token decoded to an unknown length; search instead of
    /// expecting the next run right at the cursor.
    resync: bool,
    /// The next run continues the previous one across a line break.
    join: bool,
    segments: Vec<Segment>,
}

impl Aligner<'_> {
    /// Move past `run` in the value, returning where it starts.
    fn advance(&mut self, run: &str) -> Option<usize> {
        let rest = self.value.get(self.cursor..)?;
        let offset = if self.resync {
            rest.find(run)?
        } else {
            rest.starts_with(run).then_some(0)?
        };
        let start = self.cursor + offset;
        self.cursor = start + run.len();
        self.resync = false;
        Some(start)
    }

    /// Record `slice[range]` as a verbatim run.
    fn literal(&mut self, range: Range<usize>) -> bool {
        if range.is_empty() {
            return true;
        }
        let slice = self.slice;
        let Some(value) = self.advance(&slice[range.clone()]) else {
            return false;
        };
        self.segments.push(Segment {
            source: self.base + range.start..self.base + range.end,
            value,
            joined: self.join,
        });
        self.join = true;
        true
    }
}

/// Linkable source ranges of one text node: its runs, merged across line
/// breaks and split at escapes and character references.
fn text_ranges(text: &Text, source: &str, ranges: &mut Vec<Range<usize>>) {
    let mut current: Option<Range<usize>> = None;
    for segment in segments(text, source) {
        if segment.joined
            && let Some(range) = current.as_mut()
        {
            range.end = segment.source.end;
            continue;
        }
        ranges.extend(current.replace(segment.source));
    }
    ranges.extend(current);
}

/// Source ranges of every linkable text run, in document order.
pub fn linkable_ranges(tree: &Node, source: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    collect_ranges(tree, source, &mut ranges);
    ranges
}

fn collect_ranges(node: &Node, source: &str, ranges: &mut Vec<Range<usize>>) {
    let Some(children) = node.children() else {
        return;
    };

    let mut depth = 0;
    for child in children {
        depth = anchor_depth(child, depth);
        if depth > 0 || is_opaque(child) {
            continue;
        }
        match child {
            Node::Text(text) => text_ranges(text, source, ranges),
            _ => collect_ranges(child, source, ranges),
        }
    }
}
