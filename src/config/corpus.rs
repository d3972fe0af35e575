//! `[corpus]` section configuration.
//!
//! Where documents live and which frontmatter fields carry their metadata.

use super::defaults;
use educe::Educe;
use serde::Deserialize;
use std::path::PathBuf;

/// `[corpus]` section in interlink.toml.
///
/// # Example
/// ```toml
/// [corpus]
/// content = "src/content/articles"
/// extensions = ["md", "mdx"]
/// publish_fields = ["publishedTime", "pubDate"]
/// draft_fields = ["isDraft", "draft"]
/// ```
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct CorpusConfig {
    /// Document root, relative to the project root.
    #[serde(default = "defaults::corpus::content")]
    #[educe(Default = defaults::corpus::content())]
    pub content: PathBuf,

    /// File extensions treated as documents (without the dot).
    #[serde(default = "defaults::corpus::extensions")]
    #[educe(Default = defaults::corpus::extensions())]
    pub extensions: Vec<String>,

    /// Frontmatter keys holding the publish time, first present wins.
    #[serde(default = "defaults::corpus::publish_fields")]
    #[educe(Default = defaults::corpus::publish_fields())]
    pub publish_fields: Vec<String>,

    /// Frontmatter keys holding the draft flag, first present wins.
    #[serde(default = "defaults::corpus::draft_fields")]
    #[educe(Default = defaults::corpus::draft_fields())]
    pub draft_fields: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::super::InterlinkConfig;
    use std::path::PathBuf;

    #[test]
    fn test_corpus_config_defaults() {
        let config: InterlinkConfig = toml::from_str("").unwrap();

        assert_eq!(config.corpus.content, PathBuf::from("src/content/articles"));
        assert_eq!(config.corpus.extensions, vec!["md", "mdx"]);
        assert_eq!(config.corpus.publish_fields, vec!["publishedTime", "pubDate"]);
        assert_eq!(config.corpus.draft_fields, vec!["isDraft", "draft"]);
    }

    #[test]
    fn test_corpus_config_custom() {
        let config = r#"
            [corpus]
            content = "posts"
            extensions = ["md"]
            publish_fields = ["date"]
        "#;
        let config: InterlinkConfig = toml::from_str(config).unwrap();

        assert_eq!(config.corpus.content, PathBuf::from("posts"));
        assert_eq!(config.corpus.extensions, vec!["md"]);
        assert_eq!(config.corpus.publish_fields, vec!["date"]);
        assert_eq!(config.corpus.draft_fields, vec!["isDraft", "draft"]);
    }

    #[test]
    fn test_unknown_field_rejection() {
        let config = r#"
            [corpus]
            output = "dist"
        "#;
        let result: Result<InterlinkConfig, _> = toml::from_str(config);
        assert!(result.is_err());
    }
}
