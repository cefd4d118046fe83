//! JSON data propagation: rewrite string values that name a renamed asset.
//!
//! Only scalar string values (object values and array elements) that exactly
//! equal a mapping key are replaced. Keys, numbers, and structure are never
//! touched, and a document without matches is left byte-for-byte unchanged.
//! Malformed documents get one repair attempt (see [`repair`]).

pub mod repair;

pub use repair::{AdjacencyRule, Repairer, ValueKind};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::mapping::MappingStore;
use crate::output::{ItemFailure, PhaseSummary, SkippedItem};
use crate::paths;
use crate::utils::io;
use crate::walk::{self, WalkFilter};

/// Serialize with an explicit indent width. Non-ASCII is kept verbatim and
/// the output ends with a newline.
pub fn to_pretty_string<T: Serialize + ?Sized>(value: &T, indent: usize) -> Result<String> {
    let indent = " ".repeat(indent);
    let mut buf = Vec::new();
    let mut ser =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(indent.as_bytes()));
    value
        .serialize(&mut ser)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize JSON".to_string())))?;

    let mut text = String::from_utf8(buf)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize JSON".to_string())))?;
    text.push('\n');
    Ok(text)
}

// ============================================================================
// Parsing
// ============================================================================

/// A document after the strict parse and, if needed, one repair attempt.
#[derive(Debug)]
pub enum Parsed {
    Valid(Value),
    Repaired { value: Value, text: String },
    Invalid { error: String },
}

/// Parse strictly; only on failure run the repairer and parse once more.
pub fn parse_with_repair(content: &str, repairer: &Repairer) -> Parsed {
    let strict_error = match serde_json::from_str::<Value>(content) {
        Ok(value) => return Parsed::Valid(value),
        Err(e) => e,
    };

    let text = repairer.repair(content);
    match serde_json::from_str::<Value>(&text) {
        Ok(value) => Parsed::Repaired { value, text },
        Err(_) => Parsed::Invalid {
            error: strict_error.to_string(),
        },
    }
}

// ============================================================================
// Substitution
// ============================================================================

/// One replaced string value, addressed by JSON pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Substitution {
    pub pointer: String,
    pub from: String,
    pub to: String,
}

/// Replace every string value that exactly equals a mapping key. A root
/// that is itself a string is left alone.
pub fn substitute(value: &mut Value, mapping: &MappingStore) -> Vec<Substitution> {
    let mut found = Vec::new();
    substitute_container(value, "", mapping, &mut found);
    found
}

fn substitute_container(
    value: &mut Value,
    pointer: &str,
    mapping: &MappingStore,
    found: &mut Vec<Substitution>,
) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                let child_pointer = format!("{}/{}", pointer, escape_pointer(key));
                substitute_child(child, child_pointer, mapping, found);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter_mut().enumerate() {
                let child_pointer = format!("{}/{}", pointer, index);
                substitute_child(child, child_pointer, mapping, found);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }
}

fn substitute_child(
    child: &mut Value,
    pointer: String,
    mapping: &MappingStore,
    found: &mut Vec<Substitution>,
) {
    if let Value::String(s) = child {
        if let Some(new) = mapping.get(s).filter(|new| *new != s.as_str()) {
            found.push(Substitution {
                pointer,
                from: s.clone(),
                to: new.to_string(),
            });
            *s = new.to_string();
        }
    } else {
        substitute_container(child, &pointer, mapping, found);
    }
}

fn escape_pointer(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

// ============================================================================
// Per-file patching
// ============================================================================

/// What happened to one JSON file.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PatchOutcome {
    /// Parsed, nothing matched; file untouched.
    Unchanged,
    /// Values replaced; file rewritten.
    Updated {
        substitutions: Vec<Substitution>,
        repaired: bool,
    },
    /// Repaired but nothing matched; the repaired text was written back.
    Repaired,
    /// Still malformed after repair; file untouched.
    Unrepairable { error: String },
}

impl PatchOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, PatchOutcome::Updated { .. } | PatchOutcome::Repaired)
    }
}

pub struct JsonPatcher<'a> {
    mapping: &'a MappingStore,
    repairer: Repairer,
    indent: usize,
}

impl<'a> JsonPatcher<'a> {
    pub fn new(mapping: &'a MappingStore, rules: &[AdjacencyRule], indent: usize) -> Result<Self> {
        Ok(Self {
            mapping,
            repairer: Repairer::new(rules)?,
            indent,
        })
    }

    /// Compute the outcome for `content` and the text to write, if any.
    pub fn patch_text(&self, content: &str) -> Result<(PatchOutcome, Option<String>)> {
        let (mut value, repaired_text) = match parse_with_repair(content, &self.repairer) {
            Parsed::Valid(value) => (value, None),
            Parsed::Repaired { value, text } => (value, Some(text)),
            Parsed::Invalid { error } => return Ok((PatchOutcome::Unrepairable { error }, None)),
        };

        let substitutions = substitute(&mut value, self.mapping);
        if !substitutions.is_empty() {
            let text = to_pretty_string(&value, self.indent)?;
            let outcome = PatchOutcome::Updated {
                substitutions,
                repaired: repaired_text.is_some(),
            };
            return Ok((outcome, Some(text)));
        }

        match repaired_text {
            Some(text) => Ok((PatchOutcome::Repaired, Some(text))),
            None => Ok((PatchOutcome::Unchanged, None)),
        }
    }

    /// Patch one file in place. Nothing is written in dry-run mode.
    pub fn patch_file(&self, path: &Path, dry_run: bool) -> Result<PatchOutcome> {
        let content = io::read_file(path, &format!("read {}", path.display()))?;
        let (outcome, new_content) = self.patch_text(&content)?;

        if let (Some(text), false) = (new_content, dry_run) {
            io::write_file_atomic(path, &text, &format!("write {}", path.display()))?;
        }

        Ok(outcome)
    }

    /// Patch every `.json` file under `root`, skipping `exclude` (the
    /// mapping files themselves). Per-file failures are logged and reported.
    pub fn patch_tree(
        &self,
        root: &Path,
        skip_dirs: &[String],
        exclude: &[PathBuf],
        dry_run: bool,
    ) -> DataReport {
        let extensions = vec!["json".to_string()];
        let filter = WalkFilter {
            skip_dirs,
            extensions: &extensions,
            include_hidden: false,
        };
        let excluded: Vec<PathBuf> = exclude.iter().map(|p| canonical(p)).collect();

        let mut report = DataReport::new(dry_run);
        for file in walk::collect_files(root, &filter) {
            if excluded.contains(&canonical(&file)) {
                continue;
            }
            report.record(paths::relative(&file, root), self.patch_file(&file, dry_run));
        }

        report.log_summary();
        report
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

// ============================================================================
// Reports
// ============================================================================

/// A JSON file that was (or would be) rewritten.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataChange {
    pub file: String,
    pub replacements: usize,
    pub repaired: bool,
    pub substitutions: Vec<Substitution>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataReport {
    pub summary: PhaseSummary,
    pub replacements: usize,
    pub changes: Vec<DataChange>,
    pub skipped: Vec<SkippedItem>,
    pub failures: Vec<ItemFailure>,
    pub applied: bool,
}

impl DataReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            summary: PhaseSummary::default(),
            replacements: 0,
            changes: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
            applied: !dry_run,
        }
    }

    pub fn record(&mut self, file: String, result: Result<PatchOutcome>) {
        self.summary.scanned += 1;

        match result {
            Ok(PatchOutcome::Unchanged) => self.summary.unchanged += 1,
            Ok(PatchOutcome::Updated {
                substitutions,
                repaired,
            }) => {
                self.summary.updated += 1;
                self.replacements += substitutions.len();
                self.changes.push(DataChange {
                    file,
                    replacements: substitutions.len(),
                    repaired,
                    substitutions,
                });
            }
            Ok(PatchOutcome::Repaired) => {
                self.summary.updated += 1;
                self.changes.push(DataChange {
                    file,
                    replacements: 0,
                    repaired: true,
                    substitutions: Vec::new(),
                });
            }
            Ok(PatchOutcome::Unrepairable { error }) => {
                log_status!("json", "Skipping {}: still invalid after repair: {}", file, error);
                self.summary.skipped += 1;
                self.skipped.push(SkippedItem {
                    item: file,
                    reason: error,
                });
            }
            Err(e) => {
                log_status!("json", "Failed {}: {}", file, e);
                self.summary.failed += 1;
                self.failures.push(ItemFailure {
                    item: file,
                    error: e.to_string(),
                });
            }
        }
    }

    pub fn log_summary(&self) {
        log_status!(
            "json",
            "{} ({} replacements)",
            self.summary.line("JSON files", !self.applied),
            self.replacements
        );
    }
}

// ============================================================================
// Standalone repair
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStatus {
    AlreadyValid,
    Repaired,
    Unrepairable,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    pub file: String,
    pub status: RepairStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub applied: bool,
}

/// Run only the structural repair on one file.
pub fn repair_file(path: &Path, rules: &[AdjacencyRule], dry_run: bool) -> Result<RepairReport> {
    let repairer = Repairer::new(rules)?;
    let content = io::read_file(path, &format!("read {}", path.display()))?;
    let file = path.display().to_string();

    let report = match parse_with_repair(&content, &repairer) {
        Parsed::Valid(_) => RepairReport {
            file,
            status: RepairStatus::AlreadyValid,
            error: None,
            applied: false,
        },
        Parsed::Repaired { text, .. } => {
            if !dry_run {
                io::write_file_atomic(path, &text, &format!("write {}", path.display()))?;
            }
            RepairReport {
                file,
                status: RepairStatus::Repaired,
                error: None,
                applied: !dry_run,
            }
        }
        Parsed::Invalid { error } => RepairReport {
            file,
            status: RepairStatus::Unrepairable,
            error: Some(error),
            applied: false,
        },
    };

    Ok(report)
}
