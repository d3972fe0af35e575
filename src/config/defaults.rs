//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [corpus] Section Defaults
// ============================================================================

pub mod corpus {
    use std::path::PathBuf;

    pub fn content() -> PathBuf {
        "src/content/articles".into()
    }

    pub fn extensions() -> Vec<String> {
        vec!["md".into(), "mdx".into()]
    }

    pub fn publish_fields() -> Vec<String> {
        vec!["publishedTime".into(), "pubDate".into()]
    }

    pub fn draft_fields() -> Vec<String> {
        vec!["isDraft".into(), "draft".into()]
    }
}

// ============================================================================
// [linking] Section Defaults
// ============================================================================

pub mod linking {
    use interlink_core::{LinkPolicy, RewriterKind, TemporalMode};

    pub fn max_links() -> usize {
        LinkPolicy::DEFAULT_MAX_LINKS
    }

    pub fn route_prefix() -> String {
        "articles".into()
    }

    pub fn temporal() -> TemporalMode {
        TemporalMode::Off
    }

    pub fn rewriter() -> RewriterKind {
        RewriterKind::Ast
    }
}
