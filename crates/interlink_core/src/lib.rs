//! Keyword-driven internal link injection for markdown documents.
//!
//! The engine is pure and synchronous: it never touches the filesystem and
//! never logs. Callers own I/O, build the read-only [`KeywordMap`] and
//! [`CorpusIndex`] once per run, then hand each document body to an
//! [`Engine`].
//!
//! # Per-document flow
//!
//! ```text
//! body ──► cleanup::strip ──► matcher ──► selector::select ──► rewrite ──► validate
//!          (Clean)            (Matched)   (Selected)           (Rewritten) (Validated)
//! ```
//!
//! # Example
//!
//! ```
//! use interlink_core::{CorpusIndex, DocumentMeta, Engine, KeywordMap, LinkPolicy, RewriterKind};
//!
//! let (map, rejected) = KeywordMap::build([("emergency fund", "doc-b")]);
//! assert!(rejected.is_empty());
//! let (index, _) = CorpusIndex::new([
//!     DocumentMeta::new("doc-b"),
//!     DocumentMeta::new("doc-c"),
//! ]);
//!
//! let engine = Engine::new(map, index, LinkPolicy::default(), RewriterKind::Text).unwrap();
//! let out = engine.refresh("doc-c", "Build an emergency fund.").unwrap();
//! assert_eq!(out.body, "Build an [emergency fund](/articles/doc-b/).");
//! ```

pub mod cleanup;
mod error;
pub mod index;
pub mod keywords;
pub mod matcher;
pub mod pipeline;
pub mod policy;
pub mod rewrite;
pub mod selector;
pub mod structure;
pub mod tree;
pub mod validate;

pub use error::EngineError;
pub use index::{CorpusIndex, DocumentMeta};
pub use keywords::{KeywordEntry, KeywordMap, KeywordMapBuilder};
pub use matcher::{LinkCandidate, MatchOutcome, SkipKind, SkipReason};
pub use pipeline::{Engine, Plan, Refreshed, RewriterKind, Stage};
pub use policy::{LinkPolicy, TemporalMode};
pub use selector::{Decisions, LinkDecision};
pub use validate::{Violation, ViolationKind};
