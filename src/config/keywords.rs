//! `[keywords]` section configuration and keyword map files.
//!
//! Phrases come from two places, merged in this order with the first
//! mapping of a phrase winning:
//!
//! 1. `[keywords.phrases]` inline in interlink.toml
//! 2. each file of `keywords.files`, in listed order
//!
//! A keyword file is a flat `phrase → target id` table, either TOML
//! (`"emergency fund" = "doc-b"`) or a JSON object.

use super::error::ConfigError;
use educe::Educe;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

/// `[keywords]` section in interlink.toml.
///
/// # Example
/// ```toml
/// [keywords]
/// files = ["keywords/finance.toml", "keywords/garden.json"]
///
/// [keywords.phrases]
/// "emergency fund" = "doc-b"
/// ```
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct KeywordsConfig {
    /// Keyword map files, relative to the project root.
    #[serde(default)]
    pub files: Vec<PathBuf>,

    /// Inline phrases.
    #[serde(default)]
    pub phrases: PhraseTable,
}

/// `phrase → target` pairs in authoring order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhraseTable(pub Vec<(String, String)>);

impl PhraseTable {
    /// Load a keyword map file, format chosen by extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => serde_json::from_str(&content)
                .map_err(|err| ConfigError::Json(path.to_path_buf(), err)),
            _ => Err(ConfigError::Validation(format!(
                "keyword file `{}` must be .toml or .json",
                path.display()
            ))),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(phrase, target)| (phrase.as_str(), target.as_str()))
    }
}

// ============================================================================
// Order-preserving deserialization
// ============================================================================

impl<'de> Deserialize<'de> for PhraseTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PhraseVisitor;

        impl<'de> Visitor<'de> for PhraseVisitor {
            type Value = PhraseTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a table of phrase = \"target-id\" entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((phrase, target)) = map.next_entry::<String, String>()? {
                    entries.push((phrase, target));
                }
                Ok(PhraseTable(entries))
            }
        }

        deserializer.deserialize_map(PhraseVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::super::InterlinkConfig;
    use super::*;
    use std::io::Write;

    fn phrases(table: &PhraseTable) -> Vec<(&str, &str)> {
        table.iter().collect()
    }

    #[test]
    fn test_inline_phrases_keep_order() {
        let config = r#"
            [keywords.phrases]
            "spending plan" = "doc-f"
            "budget" = "doc-a"
            "emergency fund" = "doc-b"
        "#;
        let config: InterlinkConfig = toml::from_str(config).unwrap();

        assert_eq!(
            phrases(&config.keywords.phrases),
            vec![("spending plan", "doc-f"), ("budget", "doc-a"), ("emergency fund", "doc-b")]
        );
    }

    #[test]
    fn test_non_string_target_rejected() {
        let result: Result<InterlinkConfig, _> = toml::from_str("[keywords.phrases]\nbudget = 3");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_path_toml_and_json() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("finance.toml");
        let mut file = fs::File::create(&toml_path).unwrap();
        writeln!(file, "\"debt snowball\" = \"doc-e\"\n\"debt\" = \"doc-d\"").unwrap();

        let json_path = dir.path().join("garden.json");
        fs::write(&json_path, r#"{"raised beds": "doc-r", "compost": "doc-c"}"#).unwrap();

        let table = PhraseTable::from_path(&toml_path).unwrap();
        assert_eq!(phrases(&table), vec![("debt snowball", "doc-e"), ("debt", "doc-d")]);

        let table = PhraseTable::from_path(&json_path).unwrap();
        assert_eq!(phrases(&table), vec![("raised beds", "doc-r"), ("compost", "doc-c")]);
    }

    #[test]
    fn test_from_path_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = PhraseTable::from_path(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(..))));

        let yaml = dir.path().join("words.yaml");
        fs::write(&yaml, "budget: doc-a").unwrap();
        assert!(matches!(PhraseTable::from_path(&yaml), Err(ConfigError::Validation(_))));

        let json = dir.path().join("broken.json");
        fs::write(&json, "[\"budget\"]").unwrap();
        assert!(matches!(PhraseTable::from_path(&json), Err(ConfigError::Json(..))));
    }

    #[test]
    fn test_json_table_keeps_order() {
        let table: PhraseTable = serde_json::from_str(r#"{"b": "doc-b", "a": "doc-a"}"#).unwrap();
        assert_eq!(phrases(&table), vec![("b", "doc-b"), ("a", "doc-a")]);
    }
}
