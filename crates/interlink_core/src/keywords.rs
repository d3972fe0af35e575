//! Keyword Map: authored `phrase → target id` table.
//!
//! Phrases are matched case-insensitively on word boundaries. Each phrase is
//! compiled once when the map is built; entries are stored in matcher order
//! (longest phrase first, authoring order on ties) so a short phrase never
//! pre-empts a longer one that contains it.

use crate::EngineError;
use regex::{Regex, RegexBuilder};
use rustc_hash::FxHashSet;

/// Whitespace inside a phrase matches horizontal whitespace with at most one
/// line break, so a phrase wrapped by the author's editor still matches but
/// never spans a paragraph break.
const GAP: &str = r"(?:[ \t]+|[ \t]*\r?\n[ \t]*)";

/// Upper bound for a single compiled phrase.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// One compiled keyword map entry.
#[derive(Debug, Clone)]
pub struct KeywordEntry {
    /// Phrase as authored (trimmed).
    pub phrase: String,
    /// Document id the phrase links to.
    pub target: String,
    pattern: Regex,
}

impl KeywordEntry {
    /// Compiled case-insensitive, whole-word pattern for this phrase.
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Phrase length in characters, the primary matcher ordering key.
    fn char_len(&self) -> usize {
        self.phrase.chars().count()
    }
}

/// Read-only keyword map for one run.
#[derive(Debug, Clone, Default)]
pub struct KeywordMap {
    entries: Vec<KeywordEntry>,
}

impl KeywordMap {
    /// Build a map from `(phrase, target)` pairs in authoring order.
    ///
    /// Rejected entries (empty or uncompilable phrases, duplicates) are
    /// returned alongside the map; they never abort the build.
    pub fn build<I, P, T>(entries: I) -> (Self, Vec<EngineError>)
    where
        I: IntoIterator<Item = (P, T)>,
        P: AsRef<str>,
        T: AsRef<str>,
    {
        let mut builder = KeywordMapBuilder::default();
        let rejected = entries
            .into_iter()
            .filter_map(|(phrase, target)| builder.insert(phrase.as_ref(), target.as_ref()).err())
            .collect();
        (builder.finish(), rejected)
    }

    /// Entries in matcher order.
    pub fn entries(&self) -> &[KeywordEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Incremental builder, used to merge several authored maps (one per
/// content theme) into a single run map. The first mapping of a phrase wins
/// across all inserted maps.
#[derive(Debug, Default)]
pub struct KeywordMapBuilder {
    seen: FxHashSet<String>,
    entries: Vec<KeywordEntry>,
}

impl KeywordMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one authored entry.
    pub fn insert(&mut self, phrase: &str, target: &str) -> Result<(), EngineError> {
        let phrase = phrase.trim();
        let key = normalize(phrase);

        if self.seen.contains(&key) {
            return Err(EngineError::DuplicatePhrase {
                phrase: phrase.to_owned(),
                target: target.to_owned(),
            });
        }

        let pattern = compile_phrase(phrase).map_err(|reason| EngineError::PhraseCompile {
            phrase: phrase.to_owned(),
            reason,
        })?;

        self.seen.insert(key);
        self.entries.push(KeywordEntry {
            phrase: phrase.to_owned(),
            target: target.trim().to_owned(),
            pattern,
        });
        Ok(())
    }

    /// Finish the map, sorting entries longest phrase first.
    pub fn finish(mut self) -> KeywordMap {
        // Stable: equal lengths keep authoring order
        self.entries.sort_by_key(|entry| std::cmp::Reverse(entry.char_len()));
        KeywordMap {
            entries: self.entries,
        }
    }
}

/// Case and whitespace folded form used for duplicate detection.
fn normalize(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[inline]
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Compile a phrase into a case-insensitive, whole-word pattern.
///
/// The phrase is escaped word by word, so authored metacharacters
/// (`401(k)`, `C++`, `$5`) are literal. A `\b` anchor is only emitted on a
/// side that starts or ends with a word character; `\bC\+\+\b` would never
/// match `C++ code`.
fn compile_phrase(phrase: &str) -> Result<Regex, String> {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    if words.is_empty() {
        return Err("empty phrase".into());
    }

    let body = words
        .iter()
        .map(|word| regex::escape(word))
        .collect::<Vec<_>>()
        .join(GAP);

    let leading = if phrase.chars().next().is_some_and(is_word_char) {
        r"\b"
    } else {
        ""
    };
    let trailing = if phrase.chars().last().is_some_and(is_word_char) {
        r"\b"
    } else {
        ""
    };

    RegexBuilder::new(&format!("{leading}{body}{trailing}"))
        .case_insensitive(true)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
        .map_err(|err| err.to_string())
}
