//! Link Selector: greedy first-fit under the per-document budget.
//!
//! Candidates are visited in matcher order. One is accepted when its target
//! is not used yet and it does not overlap an accepted one; selection stops
//! at the budget. Same map + same document ⇒ same decisions.

use crate::LinkCandidate;
use smallvec::SmallVec;

/// Accepted decisions of one document. Budgets are small, so this rarely
/// spills to the heap.
pub type Decisions = SmallVec<[LinkDecision; 4]>;

/// An accepted candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LinkDecision {
    pub phrase: String,
    pub target: String,
    pub start: usize,
    pub end: usize,
    pub matched_text: String,
}

impl LinkDecision {
    #[inline]
    pub const fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

impl From<LinkCandidate> for LinkDecision {
    fn from(candidate: LinkCandidate) -> Self {
        Self {
            phrase: candidate.phrase,
            target: candidate.target,
            start: candidate.start,
            end: candidate.end,
            matched_text: candidate.matched_text,
        }
    }
}

/// Select at most `max_links` candidates. The result is ordered by offset.
pub fn select(candidates: impl IntoIterator<Item = LinkCandidate>, max_links: usize) -> Decisions {
    let mut accepted = Decisions::new();

    for candidate in candidates {
        if accepted.len() >= max_links {
            break;
        }
        let conflicts = accepted.iter().any(|decision| {
            decision.target == candidate.target || decision.overlaps(candidate.start, candidate.end)
        });
        if !conflicts {
            accepted.push(candidate.into());
        }
    }

    accepted.sort_by_key(|decision| decision.start);
    accepted
}
