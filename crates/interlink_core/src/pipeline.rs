//! Per-document pipeline.
//!
//! ```text
//! Clean ──► Matched ──► Selected ──► Rewritten ──► Validated
//! ```
//!
//! Stages always run in this order and none is skipped. The link budget is
//! local to one call, so an [`Engine`] can be shared by any number of
//! worker threads.

use crate::cleanup::{self, Stripped};
use crate::matcher::{self, MatchOutcome, SkipReason};
use crate::rewrite::{ast, text};
use crate::selector::{self, Decisions};
use crate::validate::{self, Violation};
use crate::{CorpusIndex, EngineError, KeywordMap, LinkPolicy, tree};
use markdown::mdast::Node;

/// How the selected decisions are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum RewriterKind {
    /// Match and split inside the parsed mdast tree.
    #[default]
    Ast,
    /// Match raw text filtered by structural spans and splice directly.
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Clean,
    Matched,
    Selected,
    Rewritten,
    Validated,
}

impl Stage {
    const fn next(self) -> Self {
        match self {
            Self::Clean => Self::Matched,
            Self::Matched => Self::Selected,
            Self::Selected => Self::Rewritten,
            Self::Rewritten | Self::Validated => Self::Validated,
        }
    }

    fn advance(&mut self, to: Self) {
        debug_assert_eq!(self.next(), to, "pipeline stage skipped");
        *self = to;
    }
}

/// Result of [`Engine::refresh`].
#[derive(Debug, Clone)]
pub struct Refreshed {
    pub stage: Stage,
    /// New document body.
    pub body: String,
    /// Links present in `body`, in offset order.
    pub decisions: Decisions,
    pub skipped: Vec<SkipReason>,
    /// Previously injected links removed by cleanup.
    pub removed: usize,
    /// Decisions the AST rewriter refused to apply.
    pub refused: Vec<EngineError>,
    pub violations: Vec<Violation>,
}

impl Refreshed {
    #[inline]
    pub fn changed(&self, original: &str) -> bool {
        self.body != original
    }
}

/// Result of [`Engine::plan`]: what a refresh would do, without rewriting.
#[derive(Debug, Clone)]
pub struct Plan {
    pub stage: Stage,
    pub removed: usize,
    /// Number of candidates before selection.
    pub candidates: usize,
    pub decisions: Decisions,
    pub skipped: Vec<SkipReason>,
}

/// Read-only link injection engine for one run.
#[derive(Debug)]
pub struct Engine {
    map: KeywordMap,
    index: CorpusIndex,
    policy: LinkPolicy,
    rewriter: RewriterKind,
}

impl Engine {
    pub fn new(
        map: KeywordMap,
        index: CorpusIndex,
        policy: LinkPolicy,
        rewriter: RewriterKind,
    ) -> Result<Self, EngineError> {
        policy.validate()?;
        Ok(Self {
            map,
            index,
            policy,
            rewriter,
        })
    }

    pub fn map(&self) -> &KeywordMap {
        &self.map
    }

    pub fn index(&self) -> &CorpusIndex {
        &self.index
    }

    pub fn policy(&self) -> &LinkPolicy {
        &self.policy
    }

    pub fn rewriter(&self) -> RewriterKind {
        self.rewriter
    }

    /// Strip previously injected links from `body` and inject fresh ones.
    ///
    /// Fails only when the AST rewriter cannot parse the document; the
    /// caller must then leave the document untouched.
    pub fn refresh(&self, doc_id: &str, body: &str) -> Result<Refreshed, EngineError> {
        let mut stage = Stage::Clean;
        let Stripped { text: clean, removed } = self.strip(body);

        let (outcome, tree) = self.find(doc_id, &clean)?;
        stage.advance(Stage::Matched);

        let selected = selector::select(outcome.candidates, self.policy.max_links);
        stage.advance(Stage::Selected);

        let (decisions, refused) = match tree {
            Some(tree) => {
                let out = ast::rewrite(tree, &clean, &selected, &self.policy);
                (out.applied, out.refused)
            }
            None => (selected, Vec::new()),
        };
        let body = text::rewrite(&clean, &decisions, &self.policy);
        stage.advance(Stage::Rewritten);

        let violations = validate::validate_document(doc_id, &body, &self.index, &self.policy);
        stage.advance(Stage::Validated);

        Ok(Refreshed {
            stage,
            body,
            decisions,
            skipped: outcome.skipped,
            removed,
            refused,
            violations,
        })
    }

    /// Dry run: cleanup in memory, match and select.
    pub fn plan(&self, doc_id: &str, body: &str) -> Result<Plan, EngineError> {
        let mut stage = Stage::Clean;
        let Stripped { text: clean, removed } = self.strip(body);

        let (outcome, _) = self.find(doc_id, &clean)?;
        stage.advance(Stage::Matched);

        let candidates = outcome.candidates.len();
        let decisions = selector::select(outcome.candidates, self.policy.max_links);
        stage.advance(Stage::Selected);

        Ok(Plan {
            stage,
            removed,
            candidates,
            decisions,
            skipped: outcome.skipped,
        })
    }

    /// Cleanup pass alone.
    pub fn strip(&self, body: &str) -> Stripped {
        cleanup::strip(body, &self.index, &self.policy)
    }

    /// Validator alone.
    pub fn validate(&self, doc_id: &str, body: &str) -> Vec<Violation> {
        validate::validate_document(doc_id, body, &self.index, &self.policy)
    }

    fn find(&self, doc_id: &str, clean: &str) -> Result<(MatchOutcome, Option<Node>), EngineError> {
        match self.rewriter {
            RewriterKind::Text => {
                let outcome = matcher::match_text(doc_id, clean, &self.map, &self.index, &self.policy);
                Ok((outcome, None))
            }
            RewriterKind::Ast => {
                let tree = tree::parse(clean)?;
                let outcome =
                    matcher::match_tree(doc_id, clean, &tree, &self.map, &self.index, &self.policy);
                Ok((outcome, Some(tree)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DocumentMeta, TemporalMode, ViolationKind};
    use chrono::{TimeZone, Utc};

    const BODY: &str = "Track your budget categories and build an emergency fund.";

    fn engine(rewriter: RewriterKind, policy: LinkPolicy) -> Engine {
        let (map, _) = KeywordMap::build([
            ("budget categories", "doc-A"),
            ("emergency fund", "doc-B"),
            ("debt", "doc-D"),
            ("debt snowball", "doc-E"),
            ("spending plan", "doc-F"),
            ("net income", "doc-G"),
        ]);
        let (index, _) = CorpusIndex::new([
            DocumentMeta::new("doc-A").published(Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap()),
            DocumentMeta::new("doc-B").published(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()),
            DocumentMeta::new("doc-C").published(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
            DocumentMeta::new("doc-D"),
            DocumentMeta::new("doc-E"),
            DocumentMeta::new("doc-F"),
            DocumentMeta::new("doc-G"),
        ]);
        Engine::new(map, index, policy, rewriter).unwrap()
    }

    fn both() -> [Engine; 2] {
        [
            engine(RewriterKind::Ast, LinkPolicy::default()),
            engine(RewriterKind::Text, LinkPolicy::default()),
        ]
    }

    fn targets(decisions: &Decisions) -> Vec<&str> {
        decisions.iter().map(|d| d.target.as_str()).collect()
    }

    // ------------------------------------------------------------------------
    // scenarios
    // ------------------------------------------------------------------------

    #[test]
    fn test_two_links_injected() {
        for engine in both() {
            let out = engine.refresh("doc-C", BODY).unwrap();
            assert_eq!(
                out.body,
                "Track your [budget categories](/articles/doc-A/) and build an [emergency fund](/articles/doc-B/)."
            );
            assert_eq!(out.decisions.len(), 2);
            assert_eq!(out.stage, Stage::Validated);
            assert!(out.violations.is_empty());
        }
    }

    #[test]
    fn test_no_forward_drops_later_target() {
        let policy = LinkPolicy {
            temporal: TemporalMode::NoForward,
            ..LinkPolicy::default()
        };
        for rewriter in [RewriterKind::Ast, RewriterKind::Text] {
            let out = engine(rewriter, policy.clone()).refresh("doc-C", BODY).unwrap();
            assert_eq!(targets(&out.decisions), vec!["doc-A"]);
            assert!(!out.body.contains("/articles/doc-B/"));
        }
    }

    // ------------------------------------------------------------------------
    // invariants
    // ------------------------------------------------------------------------

    #[test]
    fn test_refresh_is_idempotent() {
        let body = "Old [budget categories](/articles/doc-A/) link.\n\nA debt snowball beats debt. Build an emergency fund.\n";
        for engine in both() {
            let first = engine.refresh("doc-C", body).unwrap();
            let second = engine.refresh("doc-C", &first.body).unwrap();
            assert_eq!(first.body, second.body);
            assert_eq!(second.removed, first.decisions.len());
        }
    }

    #[test]
    fn test_budget_respected() {
        let body = "budget categories, emergency fund, debt snowball, spending plan and net income";
        for engine in both() {
            let out = engine.refresh("doc-C", body).unwrap();
            assert_eq!(out.decisions.len(), 3);
            assert_eq!(out.body.matches("](/articles/").count(), 3);
        }
    }

    #[test]
    fn test_no_self_link() {
        for engine in both() {
            let out = engine.refresh("doc-A", BODY).unwrap();
            assert_eq!(targets(&out.decisions), vec!["doc-B"]);
        }
    }

    #[test]
    fn test_each_target_linked_once() {
        let body = "An emergency fund first. Then another emergency fund.";
        for engine in both() {
            let out = engine.refresh("doc-C", body).unwrap();
            assert_eq!(out.decisions.len(), 1);
            assert_eq!(out.decisions[0].start, 3);
        }
    }

    #[test]
    fn test_longest_match_wins() {
        for engine in both() {
            let out = engine.refresh("doc-C", "Start a debt snowball today.").unwrap();
            assert_eq!(out.body, "Start a [debt snowball](/articles/doc-E/) today.");
        }
    }

    #[test]
    fn test_headings_and_code_untouched() {
        let body = "# Your emergency fund\n\n`emergency fund`\n\nBuild an emergency fund.\n";
        for engine in both() {
            let out = engine.refresh("doc-C", body).unwrap();
            assert_eq!(
                out.body,
                "# Your emergency fund\n\n`emergency fund`\n\nBuild an [emergency fund](/articles/doc-B/).\n"
            );
        }
    }

    #[test]
    fn test_existing_author_link_not_nested() {
        let body = "See [my emergency fund notes](https://x.io) and an emergency fund.";
        for engine in both() {
            let out = engine.refresh("doc-C", body).unwrap();
            assert!(out.body.starts_with("See [my emergency fund notes](https://x.io)"));
            assert!(out.body.ends_with("an [emergency fund](/articles/doc-B/)."));
        }
    }

    #[test]
    fn test_rewriters_agree_around_escapes_and_continuations() {
        let cases = [
            (
                "Save 50\\% and build an emergency fund.",
                "Save 50\\% and build an [emergency fund](/articles/doc-B/).",
            ),
            (
                "Tom &amp; Jerry build an emergency fund.",
                "Tom &amp; Jerry build an [emergency fund](/articles/doc-B/).",
            ),
            (
                "Build an emergency fund\n  and keep going.",
                "Build an [emergency fund](/articles/doc-B/)\n  and keep going.",
            ),
        ];
        for (body, expected) in cases {
            for engine in both() {
                let out = engine.refresh("doc-C", body).unwrap();
                assert_eq!(out.body, expected, "{:?}", engine.rewriter());
                assert!(out.refused.is_empty());
            }
        }
    }

    #[test]
    fn test_indented_code_and_html_blocks_untouched() {
        let bodies = [
            "Intro paragraph.\n\n    let emergency fund = 1;\n\nDone.\n",
            "<div>\nemergency fund\n</div>\n",
        ];
        for body in bodies {
            for engine in both() {
                let out = engine.refresh("doc-C", body).unwrap();
                assert_eq!(out.body, body, "{:?}", engine.rewriter());
                assert!(out.decisions.is_empty());
            }
        }
    }

    // ------------------------------------------------------------------------
    // plan / strip / validate
    // ------------------------------------------------------------------------

    #[test]
    fn test_plan_does_not_rewrite() {
        let engine = engine(RewriterKind::Ast, LinkPolicy::default());
        let body = "[emergency fund](/articles/doc-B/) and budget categories";
        let plan = engine.plan("doc-C", body).unwrap();

        assert_eq!(plan.stage, Stage::Selected);
        assert_eq!(plan.removed, 1);
        assert_eq!(plan.candidates, 2);
        assert_eq!(targets(&plan.decisions), vec!["doc-B", "doc-A"]);
    }

    #[test]
    fn test_validate_reports_broken_link() {
        let engine = engine(RewriterKind::Text, LinkPolicy::default());
        let violations = engine.validate("doc-C", "[x](/articles/missing/)");
        assert_eq!(violations[0].kind, ViolationKind::BrokenTarget);
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let (map, _) = KeywordMap::build(Vec::<(&str, &str)>::new());
        let policy = LinkPolicy {
            route_prefix: String::new(),
            ..LinkPolicy::default()
        };
        let err = Engine::new(map, CorpusIndex::default(), policy, RewriterKind::Ast).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_stage_order() {
        assert!(Stage::Clean < Stage::Matched);
        assert!(Stage::Rewritten < Stage::Validated);
        assert_eq!(Stage::Selected.next(), Stage::Rewritten);
    }
}
