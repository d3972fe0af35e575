//! Document storage.
//!
//! The engine never touches the filesystem; everything it reads or writes
//! goes through a [`CorpusStore`]. [`FsStore`] is the content-collection
//! layout used by Astro-style sites:
//!
//! ```text
//! src/content/articles/
//! ├── emergency-fund/
//! │   └── index.mdx        id = "emergency-fund"
//! └── debt-snowball.md     id = "debt-snowball"
//! ```
//!
//! [`Corpus::load`] reads every document once, before any document is
//! processed, and builds the [`CorpusIndex`] from their frontmatter.

pub mod frontmatter;

use crate::config::CorpusConfig;
use crate::log;
use anyhow::{Context, Result, bail};
use interlink_core::{CorpusIndex, DocumentMeta};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// One document, split into the frontmatter (kept verbatim) and the body
/// the engine rewrites.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub path: PathBuf,
    pub meta: DocumentMeta,
    pub frontmatter: String,
    pub body: String,
}

/// Storage collaborator of a run.
pub trait CorpusStore: Sync {
    /// Paths of every document, in a stable order.
    fn list_documents(&self) -> Result<Vec<PathBuf>>;

    /// Read and split one document.
    fn read_document(&self, path: &Path) -> Result<Document>;

    /// Persist a new body for `doc`, keeping its frontmatter. Returns whether
    /// anything was written.
    fn write_body(&self, doc: &Document, body: &str) -> Result<bool>;
}

// ============================================================================
// Filesystem store
// ============================================================================

/// Files to ignore during directory traversal
const IGNORED_FILES: &[&str] = &[".DS_Store"];

pub struct FsStore {
    root: PathBuf,
    extensions: Vec<String>,
    publish_fields: Vec<String>,
    draft_fields: Vec<String>,
}

impl FsStore {
    pub fn new(config: &CorpusConfig) -> Self {
        Self {
            root: config.content.clone(),
            extensions: config.extensions.clone(),
            publish_fields: config.publish_fields.clone(),
            draft_fields: config.draft_fields.clone(),
        }
    }

    fn is_document(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|wanted| wanted == ext))
    }
}

impl CorpusStore for FsStore {
    fn list_documents(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            bail!("content directory `{}` not found", self.root.display());
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.with_context(|| format!("failed to read `{}`", self.root.display()))?;
            let name = entry.file_name().to_str().unwrap_or_default();
            if entry.file_type().is_file() && !IGNORED_FILES.contains(&name) && self.is_document(entry.path()) {
                paths.push(entry.into_path());
            }
        }
        Ok(paths)
    }

    fn read_document(&self, path: &Path) -> Result<Document> {
        let source =
            fs::read_to_string(path).with_context(|| format!("failed to read `{}`", path.display()))?;
        let id = document_id(path)
            .with_context(|| format!("cannot derive a document id from `{}`", path.display()))?;

        let (raw, body) = frontmatter::split(&source);
        let metadata = frontmatter::metadata(raw, &self.publish_fields, &self.draft_fields)
            .with_context(|| format!("bad frontmatter in `{}`", path.display()))?;

        let mut meta = DocumentMeta::new(id.clone()).draft(metadata.is_draft);
        meta.publish_time = metadata.publish_time;

        Ok(Document {
            id,
            path: path.to_path_buf(),
            meta,
            frontmatter: raw.to_owned(),
            body: body.to_owned(),
        })
    }

    fn write_body(&self, doc: &Document, body: &str) -> Result<bool> {
        if body == doc.body {
            return Ok(false);
        }
        let mut content = String::with_capacity(doc.frontmatter.len() + body.len());
        content.push_str(&doc.frontmatter);
        content.push_str(body);
        fs::write(&doc.path, content).with_context(|| format!("failed to write `{}`", doc.path.display()))?;
        Ok(true)
    }
}

/// `dir/index.mdx` → `dir`, anything else → file stem.
fn document_id(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let id = if stem == "index" {
        path.parent()?.file_name()?.to_str()?
    } else {
        stem
    };
    Some(id.to_owned())
}

// ============================================================================
// Corpus snapshot
// ============================================================================

/// A document that could not be loaded or processed.
#[derive(Debug)]
pub struct Failure {
    pub path: PathBuf,
    pub error: anyhow::Error,
}

/// Every readable document of the run plus its index.
pub struct Corpus {
    pub documents: Vec<Document>,
    pub index: CorpusIndex,
    pub failures: Vec<Failure>,
}

impl Corpus {
    /// Read all documents in parallel and build the index.
    ///
    /// Unreadable documents are isolated into `failures`. For duplicate ids
    /// the first path wins; later ones are logged and left out.
    pub fn load(store: &dyn CorpusStore) -> Result<Self> {
        let paths = store.list_documents()?;

        let results: Vec<_> = paths
            .par_iter()
            .map(|path| store.read_document(path).map_err(|error| Failure { path: path.clone(), error }))
            .collect();

        let mut documents = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(doc) => documents.push(doc),
                Err(failure) => {
                    log!("error"; "{:#}", failure.error);
                    failures.push(failure);
                }
            }
        }

        let (index, duplicates) = CorpusIndex::new(documents.iter().map(|doc| doc.meta.clone()));
        for duplicate in &duplicates {
            log!("warn"; "{duplicate}");
        }
        let mut seen = FxHashSet::default();
        documents.retain(|doc| seen.insert(doc.id.clone()));

        Ok(Self {
            documents,
            index,
            failures,
        })
    }
}
