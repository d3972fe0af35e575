//! Link-Candidate Matcher.
//!
//! Scans a document for every occurrence of every keyword phrase, in matcher
//! order (longest phrase first, then document order), and drops occurrences
//! that can never become links:
//!
//! | Filter | Scope |
//! |--------|-------|
//! | unknown target | phrase |
//! | self link, draft, scheduled, temporal order | phrase |
//! | inside code / heading / link / HTML | occurrence (raw text only) |
//!
//! The AST variant needs no structural filter: it only scans linkable text
//! nodes (see [`crate::tree`]).

use crate::policy::Rejection;
use crate::structure::Spans;
use crate::{CorpusIndex, KeywordMap, LinkPolicy, tree};
use markdown::mdast::Node;
use std::ops::Range;

/// A phrase occurrence eligible for linking. Offsets are byte offsets into
/// the text the matcher was given.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LinkCandidate {
    pub phrase: String,
    pub target: String,
    pub start: usize,
    pub end: usize,
    /// Verbatim source text, original casing preserved.
    pub matched_text: String,
}

impl LinkCandidate {
    #[inline]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Why an occurrence was not turned into a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(rename_all = "kebab-case")
)]
pub enum SkipKind {
    BrokenTarget,
    SelfLink,
    DraftTarget,
    ScheduledTarget,
    TemporalOrder,
    InsideStructure,
}

impl SkipKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BrokenTarget => "broken-target",
            Self::SelfLink => "self-link",
            Self::DraftTarget => "draft-target",
            Self::ScheduledTarget => "scheduled-target",
            Self::TemporalOrder => "temporal-order",
            Self::InsideStructure => "inside-structure",
        }
    }
}

impl From<&Rejection> for SkipKind {
    fn from(rejection: &Rejection) -> Self {
        match rejection {
            Rejection::SelfLink => Self::SelfLink,
            Rejection::DraftTarget => Self::DraftTarget,
            Rejection::ScheduledTarget(_) => Self::ScheduledTarget,
            Rejection::TemporalOrder { .. } => Self::TemporalOrder,
        }
    }
}

/// A skipped phrase (target-level filters, reported once at the first
/// occurrence) or a skipped occurrence (structural filter).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SkipReason {
    pub phrase: String,
    pub target: String,
    pub kind: SkipKind,
    pub offset: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Candidates in matcher order.
    pub candidates: Vec<LinkCandidate>,
    pub skipped: Vec<SkipReason>,
}

/// Raw-text matcher.
pub fn match_text(
    doc_id: &str,
    text: &str,
    map: &KeywordMap,
    index: &CorpusIndex,
    policy: &LinkPolicy,
) -> MatchOutcome {
    let spans = Spans::scan(text);
    let whole = [0..text.len()];
    collect(doc_id, text, &whole, Some(&spans), map, index, policy)
}

/// AST matcher: only linkable text nodes of `tree` are scanned. `tree` must
/// have been parsed from `source`.
///
/// The tree is parsed without MDX syntax, so `import`/`export` lines and
/// JSX tags surface as plain text; structural spans still filter those.
pub fn match_tree(
    doc_id: &str,
    source: &str,
    tree: &Node,
    map: &KeywordMap,
    index: &CorpusIndex,
    policy: &LinkPolicy,
) -> MatchOutcome {
    let regions = tree::linkable_ranges(tree, source);
    let spans = Spans::scan(source);
    collect(doc_id, source, &regions, Some(&spans), map, index, policy)
}

fn collect(
    doc_id: &str,
    text: &str,
    regions: &[Range<usize>],
    spans: Option<&Spans>,
    map: &KeywordMap,
    index: &CorpusIndex,
    policy: &LinkPolicy,
) -> MatchOutcome {
    let source_time = index.get(doc_id).and_then(|meta| meta.publish_time);
    let mut outcome = MatchOutcome::default();

    for entry in map.entries() {
        let mut occurrences = regions
            .iter()
            .flat_map(|region| {
                entry
                    .pattern()
                    .find_iter(&text[region.clone()])
                    .map(move |m| (region.start + m.start(), region.start + m.end()))
            })
            .peekable();

        let Some(&(first, _)) = occurrences.peek() else {
            continue;
        };

        let skip = |kind| SkipReason {
            phrase: entry.phrase.clone(),
            target: entry.target.clone(),
            kind,
            offset: first,
        };

        let Some(target) = index.get(&entry.target) else {
            outcome.skipped.push(skip(SkipKind::BrokenTarget));
            continue;
        };
        if let Err(rejection) = policy.admits(doc_id, source_time, target) {
            outcome.skipped.push(skip(SkipKind::from(&rejection)));
            continue;
        }

        for (start, end) in occurrences {
            if spans.is_some_and(|spans| spans.intersects(start, end)) {
                outcome.skipped.push(SkipReason {
                    offset: start,
                    ..skip(SkipKind::InsideStructure)
                });
                continue;
            }
            outcome.candidates.push(LinkCandidate {
                phrase: entry.phrase.clone(),
                target: entry.target.clone(),
                start,
                end,
                matched_text: text[start..end].to_owned(),
            });
        }
    }

    outcome
}
