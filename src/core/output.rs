//! Public output types shared by the rename and propagation phases.
//!
//! These are serialized into the CLI's JSON response and are part of the
//! library API.

use serde::Serialize;

/// A single item (bundle or file) that failed and was skipped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFailure {
    pub item: String,
    pub error: String,
}

/// A file deliberately left untouched, with the reason.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedItem {
    pub item: String,
    pub reason: String,
}

/// Counts reported at the end of each phase. Only successes are counted as
/// updated.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseSummary {
    pub scanned: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl PhaseSummary {
    pub fn line(&self, noun: &str, dry_run: bool) -> String {
        let verb = if dry_run { "would update" } else { "updated" };
        let mut line = format!(
            "{} {} of {} {}",
            verb, self.updated, self.scanned, noun
        );
        if self.skipped > 0 {
            line.push_str(&format!(", {} skipped", self.skipped));
        }
        if self.failed > 0 {
            line.push_str(&format!(", {} failed", self.failed));
        }
        line
    }
}
