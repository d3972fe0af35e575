//! Cleanup Pass: remove previously injected links so a refresh can re-run.
//!
//! A link is removed, keeping its visible text, when it is a markdown link
//! (not an image) or an HTML `<a>` element whose href points at a known
//! document:
//!
//! | href | removed when |
//! |------|--------------|
//! | `/{prefix}/{id}/`, `/{prefix}/{id}` | `id` is in the corpus |
//! | `/{id}/`, `/{id}` (legacy, no prefix) | `id` is in the corpus |
//! | anything else | never |
//!
//! Links inside code are left alone. The pass runs to a fixpoint, so
//! `strip(strip(x)) == strip(x)`.

use crate::structure::Spans;
use crate::{CorpusIndex, LinkPolicy};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// `(!)?[text](href "title")`
static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(!?)\[([^\[\]]*)\]\(\s*<?([^()\s<>]+)>?(?:\s+(?:"[^"]*"|'[^']*'))?\s*\)"#)
        .expect("valid markdown link regex")
});

/// `<a … href="…" …>text</a>`
static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a\s*>"#)
        .expect("valid anchor regex")
});

/// Stripped body and the number of links removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stripped {
    pub text: String,
    pub removed: usize,
}

/// Remove every injected link from `text`.
pub fn strip(text: &str, index: &CorpusIndex, policy: &LinkPolicy) -> Stripped {
    let mut current = text.to_owned();
    let mut removed = 0;

    loop {
        let (next, markdown) = strip_pattern(&current, &MARKDOWN_LINK, index, policy, |caps| {
            (caps.get(1).is_some_and(|bang| bang.is_empty())).then(|| (3, 2))
        });
        let (next, anchors) = strip_pattern(&next, &ANCHOR, index, policy, |_| Some((1, 2)));

        if markdown + anchors == 0 {
            break;
        }
        removed += markdown + anchors;
        current = next;
    }

    Stripped {
        text: current,
        removed,
    }
}

/// Whether `href` points at a document of the corpus.
pub fn is_corpus_href(href: &str, index: &CorpusIndex, policy: &LinkPolicy) -> bool {
    policy
        .target_of(href)
        .or_else(|| policy.legacy_target_of(href))
        .is_some_and(|id| index.contains(id))
}

/// Hrefs of every markdown link and `<a>` element outside code, with their
/// byte offsets, in document order.
pub(crate) fn link_hrefs(text: &str) -> Vec<(usize, &str)> {
    let spans = Spans::scan(text);
    let markdown = MARKDOWN_LINK
        .captures_iter(text)
        .filter(|caps| caps.get(1).is_some_and(|bang| bang.is_empty()))
        .filter_map(|caps| Some((caps.get(0)?, caps.get(3)?)));
    let anchors = ANCHOR
        .captures_iter(text)
        .filter_map(|caps| Some((caps.get(0)?, caps.get(1)?)));

    let mut hrefs: Vec<_> = markdown
        .chain(anchors)
        .filter(|(whole, _)| !spans.in_code(whole.start(), whole.end()))
        .map(|(whole, href)| (whole.start(), href.as_str()))
        .collect();
    hrefs.sort_by_key(|(offset, _)| *offset);
    hrefs
}

/// One replacement pass of `pattern`. `groups` picks the `(href, text)`
/// capture groups of a match, or `None` to keep the match.
fn strip_pattern(
    text: &str,
    pattern: &Regex,
    index: &CorpusIndex,
    policy: &LinkPolicy,
    groups: impl Fn(&Captures) -> Option<(usize, usize)>,
) -> (String, usize) {
    let spans = Spans::scan(text);
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut count = 0;

    for caps in pattern.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let Some((href_group, text_group)) = groups(&caps) else {
            continue;
        };
        let (Some(href), Some(visible)) = (caps.get(href_group), caps.get(text_group)) else {
            continue;
        };
        if spans.in_code(whole.start(), whole.end()) || !is_corpus_href(href.as_str(), index, policy) {
            continue;
        }

        out.push_str(&text[last..whole.start()]);
        out.push_str(visible.as_str());
        last = whole.end();
        count += 1;
    }

    out.push_str(&text[last..]);
    (out, count)
}
