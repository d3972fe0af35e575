//! `dry-run`: show the links a refresh would inject and why other phrase
//! occurrences are skipped. Nothing is written.

use crate::cli::Format;
use crate::log;
use crate::logger::ProgressBar;
use crate::report::{Report, ReportEntry};
use crate::session::Session;
use anyhow::Result;
use interlink_core::{EngineError, Plan};
use rayon::prelude::*;

/// Returns `false` when a document could not be planned.
pub fn plan_corpus(session: &Session, format: Format) -> Result<bool> {
    let report = run(session);
    report.emit("plan", format)?;
    Ok(report.summary.failed == 0)
}

fn run(session: &Session) -> Report {
    let engine = &session.engine;
    log!("plan"; "{} documents, {} phrases", session.documents.len(), engine.map().len());

    let progress = ProgressBar::new("plan", session.documents.len());
    let plans: Vec<Result<Plan, EngineError>> = session
        .documents
        .par_iter()
        .map(|doc| {
            let plan = engine.plan(&doc.id, &doc.body);
            progress.inc();
            plan
        })
        .collect();
    progress.finish();

    let mut report = Report::default();
    report.push_failures(&session.failures);

    for (doc, plan) in session.documents.iter().zip(plans) {
        let plan = match plan {
            Ok(plan) => plan,
            Err(err) => {
                report.summary.failed += 1;
                report.push(ReportEntry::new(&doc.id, "failed", err.to_string()));
                continue;
            }
        };

        report.summary.processed += 1;
        report.summary.links_removed += plan.removed;
        report.summary.record_links(plan.decisions.len());

        for decision in &plan.decisions {
            let detail = format!(
                "`{}` at byte {} → {}",
                decision.matched_text,
                decision.start,
                engine.policy().href(&decision.target)
            );
            report.push(ReportEntry::new(&doc.id, "link", detail));
        }
        for skip in &plan.skipped {
            let detail = format!("`{}` → {} at byte {}", skip.phrase, skip.target, skip.offset);
            report.push(ReportEntry::new(&doc.id, skip.kind.as_str(), detail));
        }

        // candidates dropped by the selector
        report.summary.skipped += plan.candidates - plan.decisions.len();
    }

    report
}
