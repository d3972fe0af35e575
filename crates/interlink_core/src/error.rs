//! Engine error types.
//!
//! Every variant except [`EngineError::InvalidConfig`] is scoped to a single
//! phrase, candidate or document. Callers log them and keep going.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("phrase `{phrase}` cannot be compiled: {reason}")]
    PhraseCompile { phrase: String, reason: String },

    #[error("phrase `{phrase}` is already mapped, later entry for `{target}` ignored")]
    DuplicatePhrase { phrase: String, target: String },

    #[error("document id `{0}` appears more than once, later entry ignored")]
    DuplicateDocument(String),

    #[error("target `{target}` of phrase `{phrase}` is not a known document")]
    BrokenTarget { phrase: String, target: String },

    #[error("refusing to link `{text}` at {start}..{end}: not inside a plain text node")]
    StructuralCorruptionRisk {
        text: String,
        start: usize,
        end: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("markdown parse error: {0}")]
    Parse(String),
}
