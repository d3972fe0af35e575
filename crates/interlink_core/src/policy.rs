//! Link policy: budget, URL convention, draft and temporal rules.
//!
//! One policy value is fixed for a whole run and shared by every document,
//! so two temporal modes can never be mixed within one corpus pass.

use crate::{DocumentMeta, EngineError};
use chrono::{DateTime, Utc};

/// Temporal ordering rule between a linking document and its target.
///
/// Pairs where either side has no publish time are always exempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum TemporalMode {
    /// No temporal filtering.
    #[default]
    Off,
    /// Source must be published no earlier than its target.
    NoForward,
    /// Source must be published no later than its target.
    Future,
}

impl TemporalMode {
    /// Whether a link from a document published at `source` to one published
    /// at `target` is allowed under this mode.
    pub fn allows(self, source: Option<DateTime<Utc>>, target: Option<DateTime<Utc>>) -> bool {
        match (self, source, target) {
            (Self::Off, _, _) | (_, None, _) | (_, _, None) => true,
            (Self::NoForward, Some(source), Some(target)) => source >= target,
            (Self::Future, Some(source), Some(target)) => source <= target,
        }
    }

    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Off)
    }
}

/// Why a target is not admissible for a given source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    SelfLink,
    DraftTarget,
    /// Target is scheduled after the policy's `not_after` instant.
    ScheduledTarget(DateTime<Utc>),
    TemporalOrder {
        source: DateTime<Utc>,
        target: DateTime<Utc>,
    },
}

/// Run-wide linking rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPolicy {
    /// Maximum injected links per document.
    pub max_links: usize,
    /// First path segment of internal links, `articles` → `/articles/{id}/`.
    pub route_prefix: String,
    /// Whether draft documents are valid link targets.
    pub allow_drafts: bool,
    pub temporal: TemporalMode,
    /// Targets published after this instant are never linked.
    pub not_after: Option<DateTime<Utc>>,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self {
            max_links: Self::DEFAULT_MAX_LINKS,
            route_prefix: "articles".into(),
            allow_drafts: false,
            temporal: TemporalMode::Off,
            not_after: None,
        }
    }
}

impl LinkPolicy {
    pub const DEFAULT_MAX_LINKS: usize = 3;

    /// Reject configurations no run can proceed with.
    pub fn validate(&self) -> Result<(), EngineError> {
        let prefix = self.prefix();
        if prefix.is_empty() {
            return Err(EngineError::InvalidConfig("route prefix must not be empty".into()));
        }
        if prefix
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '"' | '\'' | '<' | '>' | '#' | '?'))
        {
            return Err(EngineError::InvalidConfig(format!(
                "route prefix `{prefix}` contains characters not allowed in a link path"
            )));
        }
        Ok(())
    }

    /// Route prefix without surrounding slashes.
    #[inline]
    pub fn prefix(&self) -> &str {
        self.route_prefix.trim_matches('/')
    }

    /// Link URL for a target: `/{prefix}/{target}/`. The trailing slash is
    /// significant for the host site's routing.
    pub fn href(&self, target: &str) -> String {
        format!("/{}/{}/", self.prefix(), target)
    }

    /// Extract the document id from an internal href of the form
    /// `/{prefix}/{id}` or `/{prefix}/{id}/`, ignoring any fragment or query.
    pub fn target_of<'a>(&self, href: &'a str) -> Option<&'a str> {
        let path = strip_suffixes(href).strip_prefix('/')?;
        let rest = path.strip_prefix(self.prefix())?.strip_prefix('/')?;
        single_segment(rest)
    }

    /// Extract the id from a prefix-less legacy href, `/{id}` or `/{id}/`.
    pub fn legacy_target_of<'a>(&self, href: &'a str) -> Option<&'a str> {
        let path = strip_suffixes(href).strip_prefix('/')?;
        single_segment(path)
    }

    /// Decide whether `source_id` (published at `source_time`) may link to
    /// `target`.
    pub fn admits(
        &self,
        source_id: &str,
        source_time: Option<DateTime<Utc>>,
        target: &DocumentMeta,
    ) -> Result<(), Rejection> {
        if target.id == source_id {
            return Err(Rejection::SelfLink);
        }
        if target.is_draft && !self.allow_drafts {
            return Err(Rejection::DraftTarget);
        }
        if let (Some(limit), Some(published)) = (self.not_after, target.publish_time)
            && published > limit
        {
            return Err(Rejection::ScheduledTarget(published));
        }
        if !self.temporal.allows(source_time, target.publish_time) {
            // `allows` only fails when both times are present
            if let (Some(source), Some(target)) = (source_time, target.publish_time) {
                return Err(Rejection::TemporalOrder { source, target });
            }
        }
        Ok(())
    }
}

fn strip_suffixes(href: &str) -> &str {
    href.split(['#', '?']).next().unwrap_or(href)
}

/// `id` or `id/`, where `id` is a non-empty single path segment.
fn single_segment(path: &str) -> Option<&str> {
    let id = path.strip_suffix('/').unwrap_or(path);
    (!id.is_empty() && !id.contains('/')).then_some(id)
}
