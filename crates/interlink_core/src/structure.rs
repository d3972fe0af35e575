//! Structural spans of raw markdown text.
//!
//! Byte ranges a link must never be injected into: fenced and indented code,
//! headings, existing links, HTML tags and blocks, MDX statements and bare
//! URLs. Used by the raw-text matcher
//! (the AST matcher gets the same guarantee from node types) and by the
//! cleanup pass, which leaves code untouched.

use regex::Regex;
use std::sync::LazyLock;

/// Kind of a protected range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    /// Fenced or indented code block, fences included.
    CodeBlock,
    /// Inline code span, backticks included.
    CodeSpan,
    /// ATX or setext heading, whole lines.
    Heading,
    /// Markdown link, image, reference link or link definition.
    Link,
    /// HTML tag, comment, complete `<a>` element or HTML block.
    Html,
    /// MDX `import` / `export` line.
    Statement,
    /// Autolink or bare URL.
    Url,
}

impl SpanKind {
    #[inline]
    pub const fn is_code(self) -> bool {
        matches!(self, Self::CodeBlock | Self::CodeSpan)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub kind: SpanKind,
}

impl Span {
    #[inline]
    pub const fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

static INLINE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"!?\[[^\]\n]*(?:\n[^\]\n]+)*\]\([^)\n]*\)"#).expect("valid inline link regex")
});

static REFERENCE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!?\[[^\]\n]+\]\[[^\]\n]*\]").expect("valid reference link regex"));

static LINK_DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^ {0,3}\[[^\]\n]+\]:[ \t]*\S.*$").expect("valid link definition regex")
});

static ANCHOR_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b[^>]*>.*?</a\s*>").expect("valid anchor regex"));

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->|</?[A-Za-z][A-Za-z0-9-]*(?:\s[^<>]*)?/?>").expect("valid tag regex")
});

static MDX_STATEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:import|export)\s.*$").expect("valid statement regex"));

static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(?:https?|mailto|ftp):[^>\s]*>|\bhttps?://[^\s)\]>]+").expect("valid url regex")
});

/// All protected spans of one text, sorted by start offset.
#[derive(Debug, Clone, Default)]
pub struct Spans {
    spans: Vec<Span>,
}

impl Spans {
    /// Scan `text` for every protected construct.
    pub fn scan(text: &str) -> Self {
        let mut spans = Vec::new();

        scan_lines(text, &mut spans);
        let fences: Vec<Span> = spans
            .iter()
            .filter(|span| span.kind == SpanKind::CodeBlock)
            .copied()
            .collect();
        scan_code_spans(text, &fences, &mut spans);

        let patterns: [(&Regex, SpanKind); 7] = [
            (&INLINE_LINK, SpanKind::Link),
            (&REFERENCE_LINK, SpanKind::Link),
            (&LINK_DEFINITION, SpanKind::Link),
            (&ANCHOR_ELEMENT, SpanKind::Html),
            (&HTML_TAG, SpanKind::Html),
            (&MDX_STATEMENT, SpanKind::Statement),
            (&URL, SpanKind::Url),
        ];
        for (pattern, kind) in patterns {
            spans.extend(pattern.find_iter(text).map(|m| Span {
                start: m.start(),
                end: m.end(),
                kind,
            }));
        }

        spans.sort_by_key(|span| (span.start, span.end));
        Self { spans }
    }

    /// Whether `start..end` touches any protected span.
    pub fn intersects(&self, start: usize, end: usize) -> bool {
        self.spans.iter().any(|span| span.overlaps(start, end))
    }

    /// Whether `start..end` touches code.
    pub fn in_code(&self, start: usize, end: usize) -> bool {
        self.spans
            .iter()
            .any(|span| span.kind.is_code() && span.overlaps(start, end))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Span> {
        self.spans.iter()
    }
}

// ============================================================================
// Block-level scanning
// ============================================================================

/// Open code fence: marker character and run length.
struct Fence {
    marker: u8,
    len: usize,
    start: usize,
}

/// Open HTML block. `close` is set for blocks that end at a closing token
/// rather than at the next blank line.
struct HtmlBlock {
    start: usize,
    close: Option<&'static str>,
}

static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}(?:[-*+]|\d{1,9}[.)])(?:[ \t]|$)").expect("valid list item regex"));

static HTML_RAW_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^<(script|pre|style|textarea)(?:[\s>]|$)").expect("valid raw html regex"));

static HTML_BLOCK_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^</?(?:address|article|aside|base|basefont|blockquote|body|caption|center|col|colgroup",
        r"|dd|details|dialog|dir|div|dl|dt|fieldset|figcaption|figure|footer|form|frame|frameset",
        r"|h[1-6]|head|header|hr|html|iframe|legend|li|link|main|menu|menuitem|nav|noframes|ol",
        r"|optgroup|option|p|param|search|section|summary|table|tbody|td|tfoot|th|thead|title|tr",
        r"|track|ul)(?:[\s/>]|$)",
    ))
    .expect("valid html block regex")
});

static HTML_LONE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:<[A-Za-z][A-Za-z0-9-]*(?:\s[^<>]*)?/?>|</[A-Za-z][A-Za-z0-9-]*\s*>)\s*$")
        .expect("valid lone tag regex")
});

/// Code blocks, headings and HTML blocks, line by line.
fn scan_lines(text: &str, spans: &mut Vec<Span>) {
    let mut fence: Option<Fence> = None;
    let mut html: Option<HtmlBlock> = None;
    // Indented code seen so far; trailing blank lines excluded
    let mut indented: Option<(usize, usize)> = None;
    let mut in_list = false;
    // Current paragraph, when it could be a setext heading title
    let mut paragraph_line: Option<(usize, usize)> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let start = offset;
        let end = offset + line.len();
        offset = end;

        let content = line.trim_end_matches(['\n', '\r']);
        let indent = content.len() - content.trim_start_matches(' ').len();
        let columns = indent_columns(content);
        let trimmed = &content[indent..];
        let blank = content.trim().is_empty();

        if let Some(open) = &fence {
            if indent <= 3 && closes_fence(trimmed, open) {
                spans.push(Span {
                    start: open.start,
                    end,
                    kind: SpanKind::CodeBlock,
                });
                fence = None;
            }
            continue;
        }

        if let Some(block) = &html {
            match block.close {
                Some(close) if content.to_ascii_lowercase().contains(close) => {
                    push_html(spans, block.start, end);
                    html = None;
                }
                None if blank => {
                    push_html(spans, block.start, start);
                    html = None;
                }
                _ => {}
            }
            continue;
        }

        if let Some((code_start, code_end)) = indented {
            if blank {
                continue;
            }
            if columns >= 4 {
                indented = Some((code_start, end));
                continue;
            }
            spans.push(Span {
                start: code_start,
                end: code_end,
                kind: SpanKind::CodeBlock,
            });
            indented = None;
        }

        if blank {
            paragraph_line = None;
            continue;
        }

        if columns >= 4 {
            // Paragraph continuation or list item content
            if paragraph_line.is_none() && !in_list {
                indented = Some((start, end));
            } else {
                paragraph_line = Some((paragraph_line.map_or(start, |(from, _)| from), end));
            }
            continue;
        }

        if LIST_ITEM.is_match(content) {
            in_list = true;
        } else if columns == 0 && paragraph_line.is_none() {
            in_list = false;
        }

        if let Some((marker, len)) = fence_marker(trimmed) {
            fence = Some(Fence { marker, len, start });
            paragraph_line = None;
            continue;
        }

        if is_atx_heading(trimmed) {
            spans.push(Span {
                start,
                end,
                kind: SpanKind::Heading,
            });
            paragraph_line = None;
            continue;
        }

        if is_setext_underline(trimmed)
            && let Some((title_start, _)) = paragraph_line
        {
            spans.push(Span {
                start: title_start,
                end,
                kind: SpanKind::Heading,
            });
            paragraph_line = None;
            continue;
        }

        if let Some(close) = html_block_start(trimmed, paragraph_line.is_some()) {
            match close {
                Some(close) if content.to_ascii_lowercase().contains(close) => push_html(spans, start, end),
                _ => html = Some(HtmlBlock { start, close }),
            }
            paragraph_line = None;
            continue;
        }

        paragraph_line = Some((paragraph_line.map_or(start, |(from, _)| from), end));
    }

    // Open blocks run to the end of the document
    if let Some(open) = fence {
        spans.push(Span {
            start: open.start,
            end: text.len(),
            kind: SpanKind::CodeBlock,
        });
    }
    if let Some((start, end)) = indented {
        spans.push(Span {
            start,
            end,
            kind: SpanKind::CodeBlock,
        });
    }
    if let Some(block) = html {
        push_html(spans, block.start, text.len());
    }
}

fn push_html(spans: &mut Vec<Span>, start: usize, end: usize) {
    spans.push(Span {
        start,
        end,
        kind: SpanKind::Html,
    });
}

/// Width of the leading whitespace, tabs advancing to the next stop of 4.
fn indent_columns(line: &str) -> usize {
    let mut columns = 0;
    for byte in line.bytes() {
        match byte {
            b' ' => columns += 1,
            b'\t' => columns += 4 - columns % 4,
            _ => break,
        }
    }
    columns
}

/// Whether `line` opens an HTML block, and the token that closes it when
/// the block does not end at a blank line. A lone tag cannot interrupt a
/// paragraph.
fn html_block_start(line: &str, in_paragraph: bool) -> Option<Option<&'static str>> {
    if let Some(caps) = HTML_RAW_OPEN.captures(line) {
        let close = match caps[1].to_ascii_lowercase().as_str() {
            "script" => "</script>",
            "pre" => "</pre>",
            "style" => "</style>",
            _ => "</textarea>",
        };
        return Some(Some(close));
    }
    if line.starts_with("<!--") {
        return Some(Some("-->"));
    }
    if HTML_BLOCK_OPEN.is_match(line) || (!in_paragraph && HTML_LONE_TAG.is_match(line)) {
        return Some(None);
    }
    None
}

fn fence_marker(line: &str) -> Option<(u8, usize)> {
    let marker = *line.as_bytes().first()?;
    if marker != b'`' && marker != b'~' {
        return None;
    }
    let len = line.bytes().take_while(|&b| b == marker).count();
    // Backtick fences cannot have backticks in their info string
    let info_ok = marker == b'~' || !line[len..].contains('`');
    (len >= 3 && info_ok).then_some((marker, len))
}

fn closes_fence(line: &str, open: &Fence) -> bool {
    let len = line.bytes().take_while(|&b| b == open.marker).count();
    len >= open.len && line[len..].trim().is_empty()
}

fn is_atx_heading(line: &str) -> bool {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    (1..=6).contains(&hashes)
        && line[hashes..]
            .chars()
            .next()
            .is_none_or(|c| c == ' ' || c == '\t')
}

fn is_setext_underline(line: &str) -> bool {
    let line = line.trim_end();
    let Some(first) = line.bytes().next() else {
        return false;
    };
    (first == b'=' || first == b'-') && line.bytes().all(|b| b == first)
}

// ============================================================================
// Inline code
// ============================================================================

/// Inline code spans: a run of N backticks closed by the next run of exactly
/// N backticks. Unmatched runs are literal.
fn scan_code_spans(text: &str, fences: &[Span], spans: &mut Vec<Span>) {
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if let Some(fence) = fences.iter().find(|f| f.start <= i && i < f.end) {
            i = fence.end;
            continue;
        }
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }

        let open_len = run_len(bytes, i);
        let mut j = i + open_len;
        let mut close = None;
        while j < bytes.len() {
            if fences.iter().any(|f| f.start <= j && j < f.end) {
                break;
            }
            if bytes[j] == b'`' {
                let len = run_len(bytes, j);
                if len == open_len {
                    close = Some(j + len);
                    break;
                }
                j += len;
            } else {
                j += 1;
            }
        }

        match close {
            Some(end) => {
                spans.push(Span {
                    start: i,
                    end,
                    kind: SpanKind::CodeSpan,
                });
                i = end;
            }
            None => i += open_len,
        }
    }
}

#[inline]
fn run_len(bytes: &[u8], from: usize) -> usize {
    bytes[from..].iter().take_while(|&&b| b == b'`').count()
}
