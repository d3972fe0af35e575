//! `[linking]` section configuration.
//!
//! Run-wide link policy: budget, URL prefix, draft and temporal rules.

use super::defaults;
use chrono::{DateTime, Utc};
use educe::Educe;
use interlink_core::{LinkPolicy, RewriterKind, TemporalMode};
use serde::Deserialize;

/// Upper bound accepted for `max_links`.
pub const MAX_LINKS_LIMIT: usize = 100;

/// `[linking]` section in interlink.toml.
///
/// # Example
/// ```toml
/// [linking]
/// max_links = 3
/// route_prefix = "articles"   # links look like /articles/{id}/
/// temporal = "no-forward"     # off | no-forward | future
/// rewriter = "ast"            # ast | text
/// ```
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct LinkingConfig {
    /// Maximum injected links per document.
    #[serde(default = "defaults::linking::max_links")]
    #[educe(Default = defaults::linking::max_links())]
    pub max_links: usize,

    /// First path segment of injected links.
    #[serde(default = "defaults::linking::route_prefix")]
    #[educe(Default = defaults::linking::route_prefix())]
    pub route_prefix: String,

    /// Link to draft documents too.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub allow_drafts: bool,

    /// Temporal ordering rule, one per run.
    #[serde(default = "defaults::linking::temporal")]
    #[educe(Default = defaults::linking::temporal())]
    pub temporal: TemporalMode,

    /// Never link to documents scheduled after the start of the run.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub exclude_scheduled: bool,

    #[serde(default = "defaults::linking::rewriter")]
    #[educe(Default = defaults::linking::rewriter())]
    pub rewriter: RewriterKind,
}

impl LinkingConfig {
    /// Policy for a run started at `now`.
    pub fn policy(&self, now: DateTime<Utc>) -> LinkPolicy {
        LinkPolicy {
            max_links: self.max_links,
            route_prefix: self.route_prefix.clone(),
            allow_drafts: self.allow_drafts,
            temporal: self.temporal,
            not_after: self.exclude_scheduled.then_some(now),
        }
    }
}
