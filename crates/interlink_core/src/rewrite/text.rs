//! Raw-text rewriter: `matched` → `[matched](/{prefix}/{target}/)`.

use crate::{LinkDecision, LinkPolicy};
use std::cmp::Reverse;

/// Apply `decisions` to `text`.
///
/// A decision whose range no longer holds its matched text (stale offsets)
/// is ignored rather than splicing into the wrong place.
pub fn rewrite(text: &str, decisions: &[LinkDecision], policy: &LinkPolicy) -> String {
    let mut ordered: Vec<&LinkDecision> = decisions
        .iter()
        .filter(|d| text.get(d.start..d.end) == Some(d.matched_text.as_str()))
        .collect();
    ordered.sort_by_key(|d| Reverse(d.start));

    let mut out = text.to_owned();
    for decision in ordered {
        let link = format!("[{}]({})", decision.matched_text, policy.href(&decision.target));
        out.replace_range(decision.start..decision.end, &link);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(text: &str, needle: &str, target: &str) -> LinkDecision {
        let start = text.find(needle).unwrap();
        LinkDecision {
            phrase: needle.to_lowercase(),
            target: target.into(),
            start,
            end: start + needle.len(),
            matched_text: needle.into(),
        }
    }

    #[test]
    fn test_rewrite_multiple_decisions() {
        let text = "Track your budget categories and build an emergency fund.";
        let decisions = [
            decision(text, "budget categories", "doc-a"),
            decision(text, "emergency fund", "doc-b"),
        ];
        assert_eq!(
            rewrite(text, &decisions, &LinkPolicy::default()),
            "Track your [budget categories](/articles/doc-a/) and build an [emergency fund](/articles/doc-b/)."
        );
    }

    #[test]
    fn test_rewrite_order_independent() {
        let text = "alpha beta";
        let forward = [decision(text, "alpha", "a"), decision(text, "beta", "b")];
        let backward = [decision(text, "beta", "b"), decision(text, "alpha", "a")];
        let policy = LinkPolicy::default();
        assert_eq!(rewrite(text, &forward, &policy), rewrite(text, &backward, &policy));
    }

    #[test]
    fn test_rewrite_keeps_original_casing() {
        let text = "An Emergency Fund.";
        let decisions = [decision(text, "Emergency Fund", "doc-b")];
        assert_eq!(
            rewrite(text, &decisions, &LinkPolicy::default()),
            "An [Emergency Fund](/articles/doc-b/)."
        );
    }

    #[test]
    fn test_stale_decision_ignored() {
        let text = "budget";
        let mut stale = decision(text, "budget", "a");
        stale.matched_text = "savings".into();
        assert_eq!(rewrite(text, &[stale], &LinkPolicy::default()), "budget");
    }

    #[test]
    fn test_no_decisions_is_identity() {
        assert_eq!(rewrite("plain", &[], &LinkPolicy::default()), "plain");
    }
}
