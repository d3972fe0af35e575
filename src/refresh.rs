//! `refresh`: strip previously injected links, inject fresh ones, write
//! changed documents back and validate the whole corpus.
//!
//! # Architecture
//!
//! ```text
//! refresh_corpus()
//!     │
//!     ├── documents.par_iter() ──► refresh_document()
//!     │       │                      ├── Engine::refresh   (clean → … → validated)
//!     │       │                      └── CorpusStore::write_body (only if changed)
//!     │       └── cancelled? leave the document untouched
//!     │
//!     └── corpus-wide validation ──► report
//! ```

use crate::cli::Format;
use crate::corpus::{CorpusStore, Document};
use crate::log;
use crate::logger::ProgressBar;
use crate::report::{Report, ReportEntry};
use crate::session::{Session, cancel_flag};
use anyhow::Result;
use interlink_core::{Engine, Refreshed};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

enum Outcome {
    Done { written: bool, refreshed: Refreshed },
    Failed(anyhow::Error),
    Cancelled,
}

/// Refresh every document. Returns `false` when a document failed or the
/// corpus has link violations afterwards.
pub fn refresh_corpus(session: &Session, format: Format) -> Result<bool> {
    let cancel = cancel_flag()?;
    let report = run(session, &cancel);
    report.emit("refresh", format)?;
    Ok(report.summary.failed == 0 && report.summary.violations == 0)
}

fn run(session: &Session, cancel: &AtomicBool) -> Report {
    let documents = &session.documents;
    log!(
        "refresh";
        "{} documents, {} phrases, {:?} rewriter",
        documents.len(), session.engine.map().len(), session.engine.rewriter()
    );

    let progress = ProgressBar::new("refresh", documents.len());
    let outcomes: Vec<Outcome> = documents
        .par_iter()
        .map(|doc| {
            let outcome = refresh_document(&session.engine, &session.store, doc, cancel);
            progress.inc();
            outcome
        })
        .collect();
    progress.finish();

    let mut report = Report::default();
    report.push_failures(&session.failures);

    for (doc, outcome) in documents.iter().zip(outcomes) {
        match outcome {
            Outcome::Done { written, refreshed } => {
                report.summary.processed += 1;
                report.summary.changed += usize::from(written);
                report.summary.links_removed += refreshed.removed;
                report.summary.record_links(refreshed.decisions.len());
                for refused in &refreshed.refused {
                    report.push(ReportEntry::new(&doc.id, "refused", refused.to_string()));
                }
                report.push_violations(refreshed.violations);
            }
            Outcome::Failed(err) => {
                report.summary.failed += 1;
                report.push(ReportEntry::new(&doc.id, "failed", format!("{err:#}")));
                report.push_violations(session.engine.validate(&doc.id, &doc.body));
            }
            Outcome::Cancelled => {
                report.summary.skipped += 1;
                report.push(ReportEntry::new(&doc.id, "skipped", "cancelled before processing"));
                report.push_violations(session.engine.validate(&doc.id, &doc.body));
            }
        }
    }

    report
}

fn refresh_document(
    engine: &Engine,
    store: &dyn CorpusStore,
    doc: &Document,
    cancel: &AtomicBool,
) -> Outcome {
    if cancel.load(Ordering::Relaxed) {
        return Outcome::Cancelled;
    }

    let result = engine
        .refresh(&doc.id, &doc.body)
        .map_err(anyhow::Error::from)
        .and_then(|refreshed| {
            let written = store.write_body(doc, &refreshed.body)?;
            Ok(Outcome::Done { written, refreshed })
        });

    result.unwrap_or_else(|err| {
        log!("error"; "{}: {:#}", doc.path.display(), err);
        Outcome::Failed(err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::config::InterlinkConfig;
    use clap::Parser;
    use std::{fs, path::Path};

    fn project(config: &str, docs: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("interlink.toml"), config).unwrap();
        for (rel, content) in docs {
            let path = dir.path().join("src/content/articles").join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    fn session(root: &Path, args: &[&str]) -> Session {
        let root_arg = root.to_str().unwrap();
        let mut argv = vec!["interlink", "--root", root_arg];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).unwrap();

        let mut config = InterlinkConfig::from_path(&root.join("interlink.toml")).unwrap();
        config.update_with_cli(&cli);
        config.validate().unwrap();
        Session::open(&config, true).unwrap()
    }

    fn read(root: &Path, rel: &str) -> String {
        fs::read_to_string(root.join("src/content/articles").join(rel)).unwrap()
    }

    const CONFIG: &str = r#"
        [keywords.phrases]
        "budget categories" = "doc-a"
        "emergency fund" = "doc-b"
    "#;

    fn corpus() -> Vec<(&'static str, &'static str)> {
        vec![
            ("doc-a/index.mdx", "---\npublishedTime: 2024-10-01\n---\nAbout budget categories.\n"),
            ("doc-b/index.mdx", "---\npublishedTime: 2025-06-01\n---\nAbout the emergency fund.\n"),
            (
                "doc-c/index.mdx",
                "---\npublishedTime: 2025-01-01\n---\nTrack your budget categories and build an emergency fund.\n",
            ),
        ]
    }

    #[test]
    fn test_refresh_writes_links_and_keeps_frontmatter() {
        let dir = project(CONFIG, &corpus());
        let session = session(dir.path(), &["refresh"]);
        let report = run(&session, &AtomicBool::new(false));

        assert_eq!(
            read(dir.path(), "doc-c/index.mdx"),
            "---\npublishedTime: 2025-01-01\n---\nTrack your [budget categories](/articles/doc-a/) and build an [emergency fund](/articles/doc-b/).\n"
        );
        // doc-a and doc-b only mention themselves
        assert_eq!(read(dir.path(), "doc-a/index.mdx"), corpus()[0].1);
        assert_eq!(report.summary.processed, 3);
        assert_eq!(report.summary.changed, 1);
        assert_eq!(report.summary.links_added, 2);
        assert_eq!(report.summary.distribution.get(&0), Some(&2));
        assert_eq!(report.summary.violations, 0);
    }

    #[test]
    fn test_refresh_twice_is_stable() {
        let dir = project(CONFIG, &corpus());
        run(&session(dir.path(), &["refresh"]), &AtomicBool::new(false));
        let first = read(dir.path(), "doc-c/index.mdx");

        let report = run(&session(dir.path(), &["refresh"]), &AtomicBool::new(false));
        assert_eq!(read(dir.path(), "doc-c/index.mdx"), first);
        assert_eq!(report.summary.changed, 0);
        assert_eq!(report.summary.links_removed, 2);
    }

    #[test]
    fn test_refresh_no_forward_override() {
        let dir = project(CONFIG, &corpus());
        let session = session(dir.path(), &["refresh", "--temporal", "no-forward"]);
        run(&session, &AtomicBool::new(false));

        let body = read(dir.path(), "doc-c/index.mdx");
        assert!(body.contains("[budget categories](/articles/doc-a/)"));
        assert!(!body.contains("/articles/doc-b/"));
    }

    #[test]
    fn test_cancelled_run_leaves_documents_untouched() {
        let dir = project(CONFIG, &corpus());
        let session = session(dir.path(), &["refresh"]);
        let report = run(&session, &AtomicBool::new(true));

        assert_eq!(read(dir.path(), "doc-c/index.mdx"), corpus()[2].1);
        assert_eq!(report.summary.skipped, 3);
        assert_eq!(report.summary.processed, 0);
    }

    #[test]
    fn test_unreadable_document_reported_as_failed() {
        let mut docs = corpus();
        docs.push(("doc-d/index.mdx", "---\npublishedTime: whenever\n---\nBody.\n"));
        let dir = project(CONFIG, &docs);
        let report = run(&session(dir.path(), &["refresh"]), &AtomicBool::new(false));

        assert_eq!(report.summary.failed, 1);
        assert!(report.entries.iter().any(|e| e.kind == "failed"));
    }
}
