//! Rewrite image-name string literals in Objective-C and Swift sources.
//!
//! For each mapped old name, a family of regexes covers the platform's
//! image-loading idioms plus a bare quoted literal. All matches are found on
//! the original text; each one claims the byte span of the name, so a later
//! overlapping match (another idiom, or a chained mapping whose new name is
//! also a key) is skipped. Replacements are then applied back to front.

use regex::Regex;
use serde::Serialize;
use std::path::Path;

use crate::error::{Error, Result};
use crate::mapping::MappingStore;
use crate::output::{ItemFailure, PhaseSummary};
use crate::paths;
use crate::utils::io;
use crate::walk::{self, WalkFilter};

// ============================================================================
// Types
// ============================================================================

/// Source dialect, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    ObjC,
    Swift,
}

impl Dialect {
    pub fn for_path(path: &Path) -> Self {
        let is_swift = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("swift"));
        if is_swift {
            Dialect::Swift
        } else {
            Dialect::ObjC
        }
    }
}

/// A literal form an image name can appear in. `NAME` in the pattern is
/// replaced by the escaped old name inside a `name` capture group.
struct Idiom {
    label: &'static str,
    dialect: Option<Dialect>,
    pattern: &'static str,
}

// Most specific first; the bare literal must stay last.
const IDIOMS: &[Idiom] = &[
    Idiom {
        label: "setBackgroundImage",
        dialect: Some(Dialect::ObjC),
        pattern: r#"setBackgroundImage:\s*\[\s*UIImage\s+imageNamed:\s*@"NAME"\s*\]"#,
    },
    Idiom {
        label: "setImage",
        dialect: Some(Dialect::ObjC),
        pattern: r#"setImage:\s*\[\s*UIImage\s+imageNamed:\s*@"NAME"\s*\]"#,
    },
    Idiom {
        label: "imageNamed",
        dialect: Some(Dialect::ObjC),
        pattern: r#"\[\s*UIImage\s+imageNamed:\s*@"NAME"\s*\]"#,
    },
    Idiom {
        label: "ImageNamed",
        dialect: Some(Dialect::ObjC),
        pattern: r#"ImageNamed\(\s*@"NAME"\s*\)"#,
    },
    Idiom {
        label: "objc-literal",
        dialect: Some(Dialect::ObjC),
        pattern: r#"@"NAME""#,
    },
    Idiom {
        label: "UIImage(named:)",
        dialect: Some(Dialect::Swift),
        pattern: r#"UIImage\(\s*named:\s*"NAME"\s*\)"#,
    },
    Idiom {
        label: "UIImage.init(named:)",
        dialect: Some(Dialect::Swift),
        pattern: r#"UIImage\.init\(\s*named:\s*"NAME"\s*\)"#,
    },
    Idiom {
        label: "literal",
        dialect: None,
        pattern: r#""NAME""#,
    },
];

struct CompiledIdiom {
    label: &'static str,
    dialect: Option<Dialect>,
    regex: Regex,
}

struct CompiledName<'a> {
    old: &'a str,
    new: &'a str,
    idioms: Vec<CompiledIdiom>,
}

/// One claimed span in a file's original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub start: usize,
    pub end: usize,
    pub old: String,
    pub new: String,
    pub idiom: &'static str,
}

/// A single reference found in the codebase.
#[derive(Debug, Clone, Serialize)]
pub struct Reference {
    /// File path relative to root.
    pub file: String,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed, in characters).
    pub column: usize,
    pub matched: String,
    pub replacement: String,
    pub idiom: String,
    /// The full line content for context.
    pub context: String,
}

/// An edit to apply to a file's content.
#[derive(Debug, Clone, Serialize)]
pub struct FileEdit {
    /// File path relative to root.
    pub file: String,
    /// Number of replacements in this file.
    pub replacements: usize,
    /// New content after all replacements.
    #[serde(skip)]
    pub new_content: String,
}

/// The full result of a code propagation pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeReport {
    pub summary: PhaseSummary,
    pub references: Vec<Reference>,
    pub edits: Vec<FileEdit>,
    pub failures: Vec<ItemFailure>,
    pub total_references: usize,
    /// Whether changes were written to disk.
    pub applied: bool,
}

// ============================================================================
// Rewriter
// ============================================================================

pub struct ReferenceRewriter<'a> {
    names: Vec<CompiledName<'a>>,
}

impl<'a> ReferenceRewriter<'a> {
    /// Compile the idiom table for every mapped name, in mapping order.
    pub fn new(mapping: &'a MappingStore) -> Result<Self> {
        let names = mapping
            .iter()
            .filter(|(old, new)| old != new)
            .map(|(old, new)| {
                Ok(CompiledName {
                    old,
                    new,
                    idioms: compile_idioms(old)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { names })
    }

    /// Find every claimable occurrence, sorted by offset.
    pub fn find_in_text(&self, content: &str, dialect: Dialect) -> Vec<Replacement> {
        let mut claimed: Vec<Replacement> = Vec::new();

        for name in &self.names {
            for idiom in &name.idioms {
                if idiom.dialect.is_some_and(|d| d != dialect) {
                    continue;
                }
                for caps in idiom.regex.captures_iter(content) {
                    let Some(span) = caps.name("name") else {
                        continue;
                    };
                    let (start, end) = (span.start(), span.end());
                    if claimed.iter().any(|r| start < r.end && end > r.start) {
                        continue;
                    }
                    claimed.push(Replacement {
                        start,
                        end,
                        old: name.old.to_string(),
                        new: name.new.to_string(),
                        idiom: idiom.label,
                    });
                }
            }
        }

        claimed.sort_by_key(|r| r.start);
        claimed
    }

    /// Rewritten content plus the replacements made, in offset order.
    pub fn rewrite_text(&self, content: &str, dialect: Dialect) -> (String, Vec<Replacement>) {
        let replacements = self.find_in_text(content, dialect);

        let mut new_content = content.to_string();
        for r in replacements.iter().rev() {
            new_content.replace_range(r.start..r.end, &r.new);
        }

        (new_content, replacements)
    }

    /// Rewrite every matching source file under `root`. Each file is read
    /// once and written at most once; per-file failures are logged and the
    /// walk continues.
    pub fn rewrite_tree(&self, root: &Path, filter: &WalkFilter, dry_run: bool) -> CodeReport {
        let mut report = CodeReport {
            summary: PhaseSummary::default(),
            references: Vec::new(),
            edits: Vec::new(),
            failures: Vec::new(),
            total_references: 0,
            applied: !dry_run,
        };

        for path in walk::collect_files(root, filter) {
            let relative = paths::relative(&path, root);
            report.summary.scanned += 1;

            match self.rewrite_file(&path, &relative, dry_run) {
                Ok(None) => report.summary.unchanged += 1,
                Ok(Some((edit, references))) => {
                    report.summary.updated += 1;
                    report.references.extend(references);
                    report.edits.push(edit);
                }
                Err(e) => {
                    log_status!("code", "Failed {}: {}", relative, e);
                    report.summary.failed += 1;
                    report.failures.push(ItemFailure {
                        item: relative,
                        error: e.to_string(),
                    });
                }
            }
        }

        report.total_references = report.references.len();
        log_status!(
            "code",
            "{} ({} references)",
            report.summary.line("source files", dry_run),
            report.total_references
        );
        report
    }

    fn rewrite_file(
        &self,
        path: &Path,
        relative: &str,
        dry_run: bool,
    ) -> Result<Option<(FileEdit, Vec<Reference>)>> {
        let content = io::read_file(path, &format!("read {}", path.display()))?;
        let (new_content, replacements) = self.rewrite_text(&content, Dialect::for_path(path));
        if replacements.is_empty() {
            return Ok(None);
        }

        let references = replacements
            .iter()
            .map(|r| to_reference(relative, &content, r))
            .collect();

        if !dry_run {
            io::write_file_atomic(path, &new_content, &format!("write {}", path.display()))?;
        }

        Ok(Some((
            FileEdit {
                file: relative.to_string(),
                replacements: replacements.len(),
                new_content,
            },
            references,
        )))
    }
}

fn compile_idioms(old: &str) -> Result<Vec<CompiledIdiom>> {
    let name = format!("(?P<name>{})", regex::escape(old));
    IDIOMS
        .iter()
        .map(|idiom| {
            let regex = Regex::new(&idiom.pattern.replace("NAME", &name)).map_err(|e| {
                Error::validation_invalid_argument(
                    "mapping",
                    format!("cannot build pattern for '{}': {}", old, e),
                    Some(old.to_string()),
                )
            })?;
            Ok(CompiledIdiom {
                label: idiom.label,
                dialect: idiom.dialect,
                regex,
            })
        })
        .collect()
}

fn to_reference(file: &str, content: &str, r: &Replacement) -> Reference {
    let line_start = content[..r.start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = content[r.start..]
        .find('\n')
        .map_or(content.len(), |i| r.start + i);

    Reference {
        file: file.to_string(),
        line: content[..r.start].matches('\n').count() + 1,
        column: content[line_start..r.start].chars().count() + 1,
        matched: r.old.clone(),
        replacement: r.new.clone(),
        idiom: r.idiom.to_string(),
        context: content[line_start..line_end].trim_end_matches('\r').to_string(),
    }
}
