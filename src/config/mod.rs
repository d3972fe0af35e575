//! Project configuration management for `interlink.toml`.
//!
//! # Sections
//!
//! | Section        | Purpose                                          |
//! |----------------|--------------------------------------------------|
//! | `[corpus]`     | Document root, extensions, frontmatter fields    |
//! | `[linking]`    | Link budget, URL prefix, draft/temporal rules    |
//! | `[keywords]`   | Keyword map files and inline phrases             |
//!
//! # Example
//!
//! ```toml
//! [corpus]
//! content = "src/content/articles"
//!
//! [linking]
//! max_links = 3
//! temporal = "no-forward"
//!
//! [keywords]
//! files = ["keywords/finance.toml"]
//!
//! [keywords.phrases]
//! "emergency fund" = "doc-b"
//! ```

mod corpus;
pub mod defaults;
mod error;
mod keywords;
mod linking;

pub use corpus::CorpusConfig;
pub use error::ConfigError;
pub use keywords::{KeywordsConfig, PhraseTable};
pub use linking::{LinkingConfig, MAX_LINKS_LIMIT};

use crate::cli::Cli;
use educe::Educe;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing interlink.toml
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct InterlinkConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root (set after loading)
    #[serde(skip)]
    #[educe(Default = PathBuf::from("./"))]
    pub root: PathBuf,

    #[serde(default)]
    pub corpus: CorpusConfig,

    #[serde(default)]
    pub linking: LinkingConfig,

    #[serde(default)]
    pub keywords: KeywordsConfig,
}

impl InterlinkConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli.root.clone().unwrap_or_else(|| self.root.clone());
        let root = Self::normalize_path(&root);

        Self::update_option(&mut self.corpus.content, cli.content.as_ref());

        if let Some(args) = cli.link_args() {
            Self::update_option(&mut self.linking.max_links, args.max_links.as_ref());
            Self::update_option(&mut self.linking.allow_drafts, args.allow_drafts.as_ref());
            if let Some(temporal) = args.temporal {
                self.linking.temporal = temporal.into();
            }
            if let Some(rewriter) = args.rewriter {
                self.linking.rewriter = rewriter.into();
            }
        }

        self.config_path = Self::normalize_path(&root.join(&cli.config));
        self.corpus.content = Self::resolve(&root, &self.corpus.content);
        self.keywords.files = self
            .keywords
            .files
            .iter()
            .map(|file| Self::resolve(&root, file))
            .collect();
        self.root = root;
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Expand `~` and make `path` absolute against `root`.
    fn resolve(root: &Path, path: &Path) -> PathBuf {
        let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned());
        if expanded.is_relative() {
            Self::normalize_path(&root.join(expanded))
        } else {
            Self::normalize_path(&expanded)
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration before any document is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.linking.max_links > MAX_LINKS_LIMIT {
            return Err(ConfigError::Validation(format!(
                "[linking.max_links] must be at most {MAX_LINKS_LIMIT}, got {}",
                self.linking.max_links
            )));
        }

        let prefix = self.linking.route_prefix.trim_matches('/');
        if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::Validation(format!(
                "[linking.route_prefix] `{}` is not a usable path segment",
                self.linking.route_prefix
            )));
        }

        if self.corpus.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "[corpus.extensions] must have at least one element".into(),
            ));
        }

        if !self.corpus.content.is_dir() {
            return Err(ConfigError::Validation(format!(
                "[corpus.content] `{}` is not a directory",
                self.corpus.content.display()
            )));
        }

        for file in &self.keywords.files {
            if !file.is_file() {
                return Err(ConfigError::Validation(format!(
                    "[keywords.files] `{}` not found",
                    file.display()
                )));
            }
        }

        Ok(())
    }

    /// Every phrase table of the run, inline phrases first, then files in
    /// listed order.
    pub fn phrase_tables(&self) -> Result<Vec<(String, PhraseTable)>, ConfigError> {
        let mut tables = vec![("[keywords.phrases]".to_owned(), self.keywords.phrases.clone())];
        for file in &self.keywords.files {
            tables.push((file.display().to_string(), PhraseTable::from_path(file)?));
        }
        Ok(tables)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use interlink_core::{RewriterKind, TemporalMode};

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/content/articles")).unwrap();
        dir
    }

    fn cli(root: &Path, args: &[&str]) -> Cli {
        let root = root.to_str().unwrap();
        let mut argv = vec!["interlink", "--root", root];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = InterlinkConfig::default();

        assert_eq!(config.root, PathBuf::from("./"));
        assert_eq!(config.config_path, PathBuf::new());
        assert_eq!(config.linking.max_links, 3);
        assert!(config.keywords.files.is_empty());
        assert!(config.keywords.phrases.0.is_empty());
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let result = InterlinkConfig::from_str("[linking\nmax_links = 3");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_unknown_top_level_field_rejection() {
        let result = InterlinkConfig::from_str("[build]\noutput = \"public\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_update_with_cli_paths_and_overrides() {
        let dir = project();
        let mut config = InterlinkConfig::from_str(
            r#"
            [linking]
            max_links = 4
            [keywords]
            files = ["keywords.toml"]
            "#,
        )
        .unwrap();

        let cli = cli(dir.path(), &["refresh", "--temporal", "future", "--rewriter", "text"]);
        config.update_with_cli(&cli);

        let root = dir.path().canonicalize().unwrap();
        assert_eq!(config.root, root);
        assert_eq!(config.config_path, root.join("interlink.toml"));
        assert_eq!(config.corpus.content, root.join("src/content/articles"));
        assert_eq!(config.keywords.files, vec![root.join("keywords.toml")]);
        assert_eq!(config.linking.max_links, 4);
        assert_eq!(config.linking.temporal, TemporalMode::Future);
        assert_eq!(config.linking.rewriter, RewriterKind::Text);
    }

    #[test]
    fn test_cli_content_override() {
        let dir = project();
        fs::create_dir(dir.path().join("posts")).unwrap();
        let mut config = InterlinkConfig::default();
        config.update_with_cli(&cli(dir.path(), &["--content", "posts", "strip"]));

        assert_eq!(config.corpus.content, dir.path().canonicalize().unwrap().join("posts"));
        assert!(config.validate().is_ok());
    }

    // ------------------------------------------------------------------------
    // validation
    // ------------------------------------------------------------------------

    #[test]
    fn test_validate_budget_limit() {
        let dir = project();
        let mut config = InterlinkConfig::default();
        config.update_with_cli(&cli(dir.path(), &["refresh", "--max-links", "101"]));

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_links"));
    }

    #[test]
    fn test_validate_missing_content_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = InterlinkConfig::default();
        config.update_with_cli(&cli(dir.path(), &["check"]));

        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_missing_keyword_file() {
        let dir = project();
        let mut config = InterlinkConfig::from_str("[keywords]\nfiles = [\"nope.toml\"]").unwrap();
        config.update_with_cli(&cli(dir.path(), &["refresh"]));

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn test_validate_route_prefix() {
        let dir = project();
        let mut config = InterlinkConfig::from_str("[linking]\nroute_prefix = \"/\"").unwrap();
        config.update_with_cli(&cli(dir.path(), &["check"]));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_phrase_tables_inline_first() {
        let dir = project();
        fs::write(dir.path().join("finance.toml"), "budget = \"doc-x\"\n").unwrap();
        let mut config = InterlinkConfig::from_str(
            r#"
            [keywords]
            files = ["finance.toml"]
            [keywords.phrases]
            budget = "doc-a"
            "#,
        )
        .unwrap();
        config.update_with_cli(&cli(dir.path(), &["refresh"]));

        let tables = config.phrase_tables().unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].0, "[keywords.phrases]");
        assert_eq!(tables[0].1.0, vec![("budget".to_string(), "doc-a".to_string())]);
        assert_eq!(tables[1].1.0, vec![("budget".to_string(), "doc-x".to_string())]);
    }
}
