//! `strip`: remove every injected internal link and write the documents
//! back. External links, images and code are left as they are.

use crate::cli::Format;
use crate::corpus::{CorpusStore, Document};
use crate::log;
use crate::logger::ProgressBar;
use crate::report::{Report, ReportEntry};
use crate::session::{Session, cancel_flag};
use anyhow::Result;
use interlink_core::Engine;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

enum Outcome {
    Done { written: bool, removed: usize },
    Failed(anyhow::Error),
    Cancelled,
}

/// Returns `false` when a document could not be stripped.
pub fn strip_corpus(session: &Session, format: Format) -> Result<bool> {
    let cancel = cancel_flag()?;
    let report = run(session, &cancel);
    report.emit("strip", format)?;
    Ok(report.summary.failed == 0)
}

fn run(session: &Session, cancel: &AtomicBool) -> Report {
    let documents = &session.documents;
    log!("strip"; "{} documents", documents.len());

    let progress = ProgressBar::new("strip", documents.len());
    let outcomes: Vec<Outcome> = documents
        .par_iter()
        .map(|doc| {
            let outcome = strip_document(&session.engine, &session.store, doc, cancel);
            progress.inc();
            outcome
        })
        .collect();
    progress.finish();

    let mut report = Report::default();
    report.push_failures(&session.failures);

    for (doc, outcome) in documents.iter().zip(outcomes) {
        match outcome {
            Outcome::Done { written, removed } => {
                report.summary.processed += 1;
                report.summary.changed += usize::from(written);
                report.summary.links_removed += removed;
                if removed > 0 {
                    report.push(ReportEntry::new(&doc.id, "stripped", format!("{removed} links")));
                }
            }
            Outcome::Failed(err) => {
                report.summary.failed += 1;
                report.push(ReportEntry::new(&doc.id, "failed", format!("{err:#}")));
            }
            Outcome::Cancelled => {
                report.summary.skipped += 1;
                report.push(ReportEntry::new(&doc.id, "skipped", "cancelled before processing"));
            }
        }
    }

    report
}

fn strip_document(engine: &Engine, store: &dyn CorpusStore, doc: &Document, cancel: &AtomicBool) -> Outcome {
    if cancel.load(Ordering::Relaxed) {
        return Outcome::Cancelled;
    }

    let stripped = engine.strip(&doc.body);
    match store.write_body(doc, &stripped.text) {
        Ok(written) => Outcome::Done {
            written,
            removed: stripped.removed,
        },
        Err(err) => {
            log!("error"; "{}: {:#}", doc.path.display(), err);
            Outcome::Failed(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InterlinkConfig;
    use std::fs;

    fn session(dir: &std::path::Path) -> Session {
        let mut config = InterlinkConfig::default();
        config.corpus.content = dir.to_path_buf();
        Session::open(&config, false).unwrap()
    }

    #[test]
    fn test_strip_removes_internal_links_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("doc-a.md"), "A").unwrap();
        fs::write(
            dir.path().join("doc-c.md"),
            "---\ntitle: C\n---\nRead [this](/articles/doc-a/) or [that](https://example.com).\n",
        )
        .unwrap();

        let report = run(&session(dir.path()), &AtomicBool::new(false));

        assert_eq!(
            fs::read_to_string(dir.path().join("doc-c.md")).unwrap(),
            "---\ntitle: C\n---\nRead this or [that](https://example.com).\n"
        );
        assert_eq!(report.summary.changed, 1);
        assert_eq!(report.summary.links_removed, 1);
        assert_eq!(report.entries, vec![ReportEntry::new("doc-c", "stripped", "1 links")]);
    }

    #[test]
    fn test_strip_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let source = "See [a](/articles/doc-a/).";
        fs::write(dir.path().join("doc-a.md"), "A").unwrap();
        fs::write(dir.path().join("doc-b.md"), source).unwrap();

        let report = run(&session(dir.path()), &AtomicBool::new(true));
        assert_eq!(fs::read_to_string(dir.path().join("doc-b.md")).unwrap(), source);
        assert_eq!(report.summary.skipped, 2);
    }
}
