//! `check`: validate internal links across the corpus without writing.

use crate::cli::Format;
use crate::log;
use crate::report::Report;
use crate::session::Session;
use anyhow::Result;
use interlink_core::validate::validate_corpus;

/// Returns `false` when any violation was found.
pub fn check_corpus(session: &Session, format: Format) -> Result<bool> {
    let report = run(session);
    report.emit("check", format)?;
    Ok(report.summary.violations == 0)
}

fn run(session: &Session) -> Report {
    let engine = &session.engine;
    log!(
        "check";
        "{} documents, temporal mode {:?}",
        session.documents.len(), engine.policy().temporal
    );

    let pairs: Vec<(&str, &str)> = session
        .documents
        .iter()
        .map(|doc| (doc.id.as_str(), doc.body.as_str()))
        .collect();
    let violations = validate_corpus(&pairs, engine.index(), engine.policy());

    let mut report = Report::default();
    report.push_failures(&session.failures);
    report.summary.processed = pairs.len();
    report.push_violations(violations);
    report
}
