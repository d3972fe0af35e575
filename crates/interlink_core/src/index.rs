//! Corpus Index: id → metadata snapshot, built once per run.

use crate::EngineError;
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;

/// Metadata the engine needs about one document. The body is not part of
/// the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMeta {
    /// Stable slug, also the link target key.
    pub id: String,
    /// Absent means the document is exempt from temporal filtering.
    pub publish_time: Option<DateTime<Utc>>,
    pub is_draft: bool,
}

impl DocumentMeta {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            publish_time: None,
            is_draft: false,
        }
    }

    pub fn published(mut self, time: DateTime<Utc>) -> Self {
        self.publish_time = Some(time);
        self
    }

    pub fn draft(mut self, is_draft: bool) -> Self {
        self.is_draft = is_draft;
        self
    }
}

/// Read-only index of every document in the corpus.
///
/// Must be fully built before any document is processed; it is shared by
/// reference across workers afterwards.
#[derive(Debug, Clone, Default)]
pub struct CorpusIndex {
    docs: FxHashMap<String, DocumentMeta>,
}

impl CorpusIndex {
    /// Build the index. A repeated id keeps its first entry; the repeats are
    /// returned as [`EngineError::DuplicateDocument`].
    pub fn new(metas: impl IntoIterator<Item = DocumentMeta>) -> (Self, Vec<EngineError>) {
        let mut docs = FxHashMap::default();
        let mut duplicates = Vec::new();

        for meta in metas {
            if docs.contains_key(&meta.id) {
                duplicates.push(EngineError::DuplicateDocument(meta.id));
                continue;
            }
            docs.insert(meta.id.clone(), meta);
        }

        (Self { docs }, duplicates)
    }

    #[inline]
    pub fn get(&self, id: &str) -> Option<&DocumentMeta> {
        self.docs.get(id)
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.docs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_index_lookup() {
        let published = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let (index, duplicates) = CorpusIndex::new([
            DocumentMeta::new("doc-a").published(published),
            DocumentMeta::new("doc-b").draft(true),
        ]);

        assert!(duplicates.is_empty());
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("doc-a").unwrap().publish_time, Some(published));
        assert!(index.get("doc-b").unwrap().is_draft);
        assert!(!index.contains("doc-c"));
    }

    #[test]
    fn test_duplicate_ids_first_wins() {
        let (index, duplicates) = CorpusIndex::new([
            DocumentMeta::new("doc-a"),
            DocumentMeta::new("doc-a").draft(true),
        ]);

        assert_eq!(index.len(), 1);
        assert!(!index.get("doc-a").unwrap().is_draft);
        assert_eq!(duplicates, vec![EngineError::DuplicateDocument("doc-a".into())]);
    }

    #[test]
    fn test_empty_index() {
        let (index, _) = CorpusIndex::new(Vec::new());
        assert!(index.is_empty());
        assert!(!index.contains("doc-a"));
    }
}
