//! AST rewriter over mdast.
//!
//! Each decision must fall inside one linkable text run. That node is split
//! into `[prefix, link(matched), suffix]`; several decisions in one node are
//! applied highest offset first. Anything else in the tree is left as is,
//! and a link node is never created below another link.
//!
//! Decisions carry source offsets. A text node's value may differ from its
//! source (escapes, character references, continuation indentation), so
//! offsets are carried into the value through [`tree::segments`].

use crate::selector::Decisions;
use crate::tree::{self, Segment, anchor_depth, is_opaque};
use crate::{EngineError, LinkDecision, LinkPolicy};
use markdown::mdast::{Link, Node, Text};
use std::cmp::Reverse;

/// Result of an AST rewrite.
#[derive(Debug, Clone)]
pub struct AstRewrite {
    pub tree: Node,
    /// Decisions that became link nodes, in offset order.
    pub applied: Decisions,
    /// Decisions refused with [`EngineError::StructuralCorruptionRisk`].
    pub refused: Vec<EngineError>,
}

/// Apply `decisions` to `tree`, which must have been parsed from `source`.
pub fn rewrite(mut tree: Node, source: &str, decisions: &[LinkDecision], policy: &LinkPolicy) -> AstRewrite {
    let mut rewriter = Rewriter {
        source,
        policy,
        pending: decisions.to_vec(),
        applied: Decisions::new(),
    };

    if let Some(children) = tree.children_mut() {
        rewriter.children(children);
    }

    let Rewriter {
        pending, mut applied, ..
    } = rewriter;
    applied.sort_by_key(|decision| decision.start);
    let refused = pending.into_iter().map(refuse).collect();

    AstRewrite {
        tree,
        applied,
        refused,
    }
}

/// Targets of every link node in `tree` that points into the corpus.
pub fn link_targets<'a>(tree: &'a Node, policy: &LinkPolicy) -> Vec<&'a str> {
    let mut targets = Vec::new();
    collect_targets(tree, policy, &mut targets);
    targets
}

fn collect_targets<'a>(node: &'a Node, policy: &LinkPolicy, targets: &mut Vec<&'a str>) {
    if let Node::Link(link) = node
        && let Some(target) = policy.target_of(&link.url)
    {
        targets.push(target);
    }
    for child in node.children().into_iter().flatten() {
        collect_targets(child, policy, targets);
    }
}

fn refuse(decision: LinkDecision) -> EngineError {
    EngineError::StructuralCorruptionRisk {
        text: decision.matched_text,
        start: decision.start,
        end: decision.end,
    }
}

struct Rewriter<'a> {
    source: &'a str,
    policy: &'a LinkPolicy,
    pending: Vec<LinkDecision>,
    applied: Decisions,
}

impl Rewriter<'_> {
    fn children(&mut self, children: &mut Vec<Node>) {
        let mut depth = 0;
        let mut i = 0;

        while i < children.len() && !self.pending.is_empty() {
            depth = anchor_depth(&children[i], depth);
            if depth > 0 || is_opaque(&children[i]) {
                i += 1;
                continue;
            }

            if let Node::Text(text) = &children[i] {
                if let Some(parts) = self.split_text(text) {
                    let count = parts.len();
                    children.splice(i..=i, parts);
                    i += count;
                    continue;
                }
            } else if let Some(grandchildren) = children[i].children_mut() {
                self.children(grandchildren);
            }
            i += 1;
        }
    }

    /// Split one text node at every pending decision it fully contains.
    ///
    /// Returns `None` when the node is left unchanged. Decisions taken from
    /// `pending` that cannot be applied are pushed back so they end up
    /// refused.
    fn split_text(&mut self, text: &Text) -> Option<Vec<Node>> {
        let position = text.position.as_ref()?;
        let (node_start, node_end) = (position.start.offset, position.end.offset);

        let (mut inside, outside): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|d| node_start <= d.start && d.end <= node_end);
        self.pending = outside;
        if inside.is_empty() {
            return None;
        }
        inside.sort_by_key(|d| Reverse(d.start));

        let segments = tree::segments(text, self.source);
        let mut rest = text.value.clone();
        let mut parts = Vec::new();

        for decision in inside {
            let Some(range) = value_range(&segments, &decision).filter(|range| {
                range.end <= rest.len() && rest.is_char_boundary(range.start) && rest.is_char_boundary(range.end)
            }) else {
                self.pending.push(decision);
                continue;
            };

            let suffix = rest.split_off(range.end);
            let matched = rest.split_off(range.start);
            if !suffix.is_empty() {
                parts.push(text_node(suffix));
            }
            parts.push(link_node(matched, self.policy.href(&decision.target)));
            self.applied.push(decision);
        }

        if parts.is_empty() {
            return None;
        }
        if !rest.is_empty() {
            parts.push(text_node(rest));
        }
        parts.reverse();
        Some(parts)
    }
}

/// Value range of a decision. Both ends must sit in verbatim runs, and only
/// line breaks may lie between them.
fn value_range(segments: &[Segment], decision: &LinkDecision) -> Option<std::ops::Range<usize>> {
    let from = segments.iter().find_map(|s| s.value_offset(decision.start, false))?;
    let to = segments.iter().find_map(|s| s.value_offset(decision.end, true))?;
    let crosses_token = segments
        .iter()
        .any(|s| !s.joined && decision.start < s.source.start && s.source.start < decision.end);
    (from < to && !crosses_token).then_some(from..to)
}

fn text_node(value: String) -> Node {
    Node::Text(Text {
        value,
        position: None,
    })
}

fn link_node(matched: String, url: String) -> Node {
    Node::Link(Link {
        children: vec![text_node(matched)],
        position: None,
        url,
        title: None,
    })
}
