//! Validator: audit link invariants of rewritten documents.
//!
//! Only links under the route prefix are inspected. Links to external sites
//! or other sections of the host site are the author's business.

use crate::cleanup::link_hrefs;
use crate::{CorpusIndex, LinkPolicy};
use rustc_hash::FxHashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(rename_all = "kebab-case")
)]
pub enum ViolationKind {
    /// Link to an id missing from the corpus.
    BrokenTarget,
    SelfLink,
    /// More internal links than the per-document budget.
    Budget,
    /// Link against the active temporal mode.
    TemporalOrder,
    /// Same target linked more than once.
    DuplicateTarget,
    /// Link to a draft while drafts are not linkable.
    DraftTarget,
    /// Live document linking to a target published after `not_after`.
    ScheduledTarget,
}

impl ViolationKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BrokenTarget => "broken-target",
            Self::SelfLink => "self-link",
            Self::Budget => "budget",
            Self::TemporalOrder => "temporal-order",
            Self::DuplicateTarget => "duplicate-target",
            Self::DraftTarget => "draft-target",
            Self::ScheduledTarget => "scheduled-target",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Violation {
    pub document_id: String,
    pub kind: ViolationKind,
    pub detail: String,
}

/// Check the internal links of one document body.
pub fn validate_document(
    doc_id: &str,
    text: &str,
    index: &CorpusIndex,
    policy: &LinkPolicy,
) -> Vec<Violation> {
    let source = index.get(doc_id);
    let source_time = source.and_then(|meta| meta.publish_time);
    // Live by the `not_after` instant: not a draft and not scheduled past it
    let live = policy.not_after.map(|limit| {
        (limit, source.is_none_or(|meta| !meta.is_draft) && source_time.is_none_or(|time| time <= limit))
    });
    let mut violations = Vec::new();
    let mut seen = FxHashSet::default();
    let mut count = 0;

    let mut report = |kind, detail: String| {
        violations.push(Violation {
            document_id: doc_id.to_owned(),
            kind,
            detail,
        });
    };

    for (offset, href) in link_hrefs(text) {
        let Some(target) = policy.target_of(href) else {
            continue;
        };

        if !seen.insert(target) {
            report(
                ViolationKind::DuplicateTarget,
                format!("`{href}` at byte {offset} repeats an earlier link to `{target}`"),
            );
        }

        let Some(meta) = index.get(target) else {
            report(
                ViolationKind::BrokenTarget,
                format!("`{href}` at byte {offset} points to unknown document `{target}`"),
            );
            continue;
        };
        count += 1;

        if target == doc_id {
            report(ViolationKind::SelfLink, format!("`{href}` at byte {offset} links to itself"));
        }
        if meta.is_draft && !policy.allow_drafts {
            report(
                ViolationKind::DraftTarget,
                format!("`{href}` at byte {offset} links to draft `{target}`"),
            );
        }
        if let Some((limit, true)) = live
            && let Some(published) = meta.publish_time
            && published > limit
        {
            report(
                ViolationKind::ScheduledTarget,
                format!(
                    "`{href}` at byte {offset} links to `{target}`, scheduled for {}",
                    published.date_naive()
                ),
            );
        }
        if !policy.temporal.allows(source_time, meta.publish_time)
            && let (Some(source), Some(published)) = (source_time, meta.publish_time)
        {
            report(
                ViolationKind::TemporalOrder,
                format!(
                    "`{href}` at byte {offset}: source published {}, target published {}",
                    source.date_naive(),
                    published.date_naive()
                ),
            );
        }
    }

    if count > policy.max_links {
        report(
            ViolationKind::Budget,
            format!("{count} internal links, at most {} allowed", policy.max_links),
        );
    }

    violations
}

/// Check every `(id, body)` pair. Violations are grouped by document, in
/// input order.
pub fn validate_corpus<S>(docs: &[(S, S)], index: &CorpusIndex, policy: &LinkPolicy) -> Vec<Violation>
where
    S: AsRef<str> + Sync,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        docs.par_iter()
            .flat_map_iter(|(id, body)| validate_document(id.as_ref(), body.as_ref(), index, policy))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        docs.iter()
            .flat_map(|(id, body)| validate_document(id.as_ref(), body.as_ref(), index, policy))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DocumentMeta, TemporalMode};
    use chrono::{TimeZone, Utc};

    fn corpus() -> CorpusIndex {
        CorpusIndex::new([
            DocumentMeta::new("doc-a").published(Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap()),
            DocumentMeta::new("doc-b").published(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()),
            DocumentMeta::new("doc-c").published(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
            DocumentMeta::new("doc-d").draft(true),
        ])
        .0
    }

    fn kinds(text: &str, policy: &LinkPolicy) -> Vec<ViolationKind> {
        validate_document("doc-c", text, &corpus(), policy)
            .into_iter()
            .map(|v| v.kind)
            .collect()
    }

    // ------------------------------------------------------------------------
    // per-link checks
    // ------------------------------------------------------------------------

    #[test]
    fn test_clean_document_has_no_violations() {
        let text = "A [budget](/articles/doc-a/) and [fund](/articles/doc-b/).";
        assert!(kinds(text, &LinkPolicy::default()).is_empty());
    }

    #[test]
    fn test_broken_self_and_draft_targets() {
        let text = "[x](/articles/gone/) [y](/articles/doc-c/) <a href=\"/articles/doc-d/\">z</a>";
        assert_eq!(
            kinds(text, &LinkPolicy::default()),
            vec![
                ViolationKind::BrokenTarget,
                ViolationKind::SelfLink,
                ViolationKind::DraftTarget
            ]
        );
    }

    #[test]
    fn test_duplicate_target() {
        let text = "[a](/articles/doc-a/) then [again](/articles/doc-a)";
        assert_eq!(kinds(text, &LinkPolicy::default()), vec![ViolationKind::DuplicateTarget]);
    }

    #[test]
    fn test_temporal_order_only_when_active() {
        let text = "[fund](/articles/doc-b/)";
        assert!(kinds(text, &LinkPolicy::default()).is_empty());

        let policy = LinkPolicy {
            temporal: TemporalMode::NoForward,
            ..LinkPolicy::default()
        };
        assert_eq!(kinds(text, &policy), vec![ViolationKind::TemporalOrder]);
    }

    #[test]
    fn test_scheduled_target_from_live_document() {
        let text = "[fund](/articles/doc-b/) [budget](/articles/doc-a/)";
        let policy = LinkPolicy {
            not_after: Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()),
            ..LinkPolicy::default()
        };
        let violations = validate_document("doc-c", text, &corpus(), &policy);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::ScheduledTarget);
        assert!(violations[0].detail.contains("2025-06-01"));

        // doc-c is itself scheduled past the limit
        let policy = LinkPolicy {
            not_after: Some(Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap()),
            ..LinkPolicy::default()
        };
        assert!(kinds(text, &policy).is_empty());
    }

    #[test]
    fn test_ignores_external_and_code_links() {
        let text = "[x](https://x.io) [y](/about/) `[z](/articles/gone/)`";
        assert!(kinds(text, &LinkPolicy::default()).is_empty());
    }

    // ------------------------------------------------------------------------
    // budget
    // ------------------------------------------------------------------------

    #[test]
    fn test_budget_exceeded() {
        let policy = LinkPolicy {
            max_links: 1,
            ..LinkPolicy::default()
        };
        let text = "[a](/articles/doc-a/) [b](/articles/doc-b/)";
        let violations = validate_document("doc-c", text, &corpus(), &policy);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::Budget);
        assert!(violations[0].detail.starts_with("2 internal links"));
    }

    #[test]
    fn test_budget_counts_resolved_links_only() {
        let policy = LinkPolicy {
            max_links: 3,
            allow_drafts: true,
            ..LinkPolicy::default()
        };
        let text = "[x](/articles/gone/) [a](/articles/doc-a/) [b](/articles/doc-b/) [d](/articles/doc-d/)";
        assert_eq!(kinds(text, &policy), vec![ViolationKind::BrokenTarget]);
    }

    #[test]
    fn test_validate_corpus_keeps_document_order() {
        let docs = vec![
            ("doc-a".to_string(), "[x](/articles/gone/)".to_string()),
            ("doc-b".to_string(), "clean".to_string()),
            ("doc-c".to_string(), "[y](/articles/doc-c/)".to_string()),
        ];
        let violations = validate_corpus(&docs, &corpus(), &LinkPolicy::default());
        let ids: Vec<_> = violations.iter().map(|v| v.document_id.as_str()).collect();
        assert_eq!(ids, vec!["doc-a", "doc-c"]);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ViolationKind::TemporalOrder.to_string(), "temporal-order");
    }
}
