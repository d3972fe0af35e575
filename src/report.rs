//! Run reports: per-document entries plus a summary, printed as colored
//! console lines or as one JSON document on stdout.

use crate::cli::Format;
use crate::corpus::Failure;
use crate::log;
use anyhow::Result;
use colored::Colorize;
use interlink_core::Violation;
use serde::Serialize;
use std::{collections::BTreeMap, io::Write};

/// One reportable fact about one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub document_id: String,
    pub kind: &'static str,
    pub detail: String,
}

impl ReportEntry {
    pub fn new(document_id: impl Into<String>, kind: &'static str, detail: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            kind,
            detail: detail.into(),
        }
    }

    pub fn violation(violation: Violation) -> Self {
        Self::new(violation.document_id, violation.kind.as_str(), violation.detail)
    }

    pub fn failure(failure: &Failure) -> Self {
        Self::new(failure.path.display().to_string(), "failed", format!("{:#}", failure.error))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub processed: usize,
    pub changed: usize,
    pub links_removed: usize,
    pub links_added: usize,
    /// Number of documents carrying `n` injected links, keyed by `n`.
    pub distribution: BTreeMap<usize, usize>,
    pub violations: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Summary {
    /// Count one document carrying `links` links.
    pub fn record_links(&mut self, links: usize) {
        self.links_added += links;
        *self.distribution.entry(links).or_default() += 1;
    }
}

#[derive(Debug, Default, Serialize)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
    pub summary: Summary,
}

impl Report {
    pub fn push(&mut self, entry: ReportEntry) {
        self.entries.push(entry);
    }

    pub fn push_violations(&mut self, violations: Vec<Violation>) {
        self.summary.violations += violations.len();
        self.entries.extend(violations.into_iter().map(ReportEntry::violation));
    }

    /// Record documents that failed to load.
    pub fn push_failures(&mut self, failures: &[Failure]) {
        self.summary.failed += failures.len();
        self.entries.extend(failures.iter().map(ReportEntry::failure));
    }

    /// Print the report of `mode` in the requested format.
    pub fn emit(&self, mode: &str, format: Format) -> Result<()> {
        match format {
            Format::Json => {
                let mut out = std::io::stdout().lock();
                serde_json::to_writer_pretty(&mut out, self)?;
                writeln!(out)?;
            }
            Format::Human => {
                let mut out = std::io::stdout().lock();
                for entry in &self.entries {
                    writeln!(
                        out,
                        "{} {} {}",
                        entry.document_id.bold(),
                        colorize_kind(entry.kind),
                        entry.detail
                    )?;
                }
                drop(out);
                self.log_summary(mode);
            }
        }
        Ok(())
    }

    fn log_summary(&self, mode: &str) {
        let s = &self.summary;
        log!(
            mode;
            "{} processed, {} changed, {} links removed, {} links added",
            s.processed, s.changed, s.links_removed, s.links_added
        );
        if !s.distribution.is_empty() {
            log!(mode; "links per document: {}", format_distribution(&s.distribution));
        }
        if s.violations + s.failed + s.skipped > 0 {
            log!(
                mode;
                "{} violations, {} failed, {} skipped",
                s.violations, s.failed, s.skipped
            );
        }
    }
}

/// `0 links: 2, 3 links: 5`
fn format_distribution(distribution: &BTreeMap<usize, usize>) -> String {
    distribution
        .iter()
        .map(|(links, docs)| {
            let unit = if *links == 1 { "link" } else { "links" };
            format!("{links} {unit}: {docs}")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn colorize_kind(kind: &str) -> colored::ColoredString {
    let label = format!("{kind:<16}");
    match kind {
        "link" => label.green(),
        "stripped" | "removed" => label.cyan(),
        "failed" | "refused" => label.bright_red(),
        kind if kind.ends_with("target") || kind == "self-link" || kind == "budget" => label.red(),
        _ => label.dimmed(),
    }
}
