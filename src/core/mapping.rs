//! The authoritative old-name → new-name table.
//!
//! Two persisted forms:
//! - a JSON object (`{"old": "new", ...}`), insertion ordered
//! - a numbered report (`" 1:  old → new"` per line plus a total line)
//!
//! Either can be loaded back; `load` picks the parser from the file extension.

use indexmap::IndexMap;
use std::path::Path;

use crate::error::{Error, MappingInvalidDetails, Result};
use crate::utils::io;

const ARROW: &str = "→";
const REPORT_TITLE: &str = "Image rename mapping report";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingStore {
    entries: IndexMap<String, String>,
}

/// A mapping parsed from disk plus the lines that were dropped on the way.
#[derive(Debug, Clone, Default)]
pub struct LoadedMapping {
    pub mapping: MappingStore,
    pub diagnostics: Vec<String>,
}

impl MappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rename. The first write for an old name wins; a second one is
    /// a logic error and is rejected.
    pub fn record(&mut self, old: &str, new: &str) -> Result<()> {
        if let Some(existing) = self.entries.get(old) {
            return Err(Error::mapping_duplicate_key(old, existing.clone(), new));
        }
        self.entries.insert(old.to_string(), new.to_string());
        Ok(())
    }

    pub fn get(&self, old: &str) -> Option<&str> {
        self.entries.get(old).map(String::as_str)
    }

    pub fn contains(&self, old: &str) -> bool {
        self.entries.contains_key(old)
    }

    /// Pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The new → old table, for rolling references back. When several old
    /// names share a new name, the first one wins.
    pub fn invert(&self) -> Self {
        let mut entries = IndexMap::new();
        for (old, new) in &self.entries {
            entries.entry(new.clone()).or_insert_with(|| old.clone());
        }
        Self { entries }
    }

    // ------------------------------------------------------------------------
    // Structured form
    // ------------------------------------------------------------------------

    pub fn to_json(&self) -> Result<String> {
        crate::json_patch::to_pretty_string(&self.entries, 4)
    }

    pub fn from_json(content: &str) -> std::result::Result<Self, serde_json::Error> {
        let entries: IndexMap<String, String> = serde_json::from_str(content)?;
        Ok(Self { entries })
    }

    // ------------------------------------------------------------------------
    // Report form
    // ------------------------------------------------------------------------

    pub fn to_report(&self) -> String {
        let mut out = String::new();
        out.push_str(REPORT_TITLE);
        out.push('\n');
        out.push_str(&"=".repeat(40));
        out.push_str("\n\n");
        for (i, (old, new)) in self.entries.iter().enumerate() {
            out.push_str(&format!("{:2}:  {} {} {}\n", i + 1, old, ARROW, new));
        }
        out.push_str(&format!("\nTotal: {} images\n", self.entries.len()));
        out
    }

    /// Parse the report form. Lines that are not exactly one `old → new` pair
    /// are dropped with a diagnostic instead of failing the load.
    pub fn from_report(content: &str) -> LoadedMapping {
        let mut loaded = LoadedMapping::default();

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || is_report_chrome(line) {
                continue;
            }

            let line_no = index + 1;
            let parts: Vec<&str> = line.split(ARROW).collect();
            if parts.len() != 2 {
                loaded.diagnostics.push(format!(
                    "line {}: expected one '{}' delimiter, found {}",
                    line_no,
                    ARROW,
                    parts.len() - 1
                ));
                continue;
            }

            let old = strip_line_number(parts[0].trim());
            let new = parts[1].trim();
            if old.is_empty() || new.is_empty() {
                loaded
                    .diagnostics
                    .push(format!("line {}: empty name in '{}'", line_no, line));
                continue;
            }

            if let Err(e) = loaded.mapping.record(old, new) {
                loaded
                    .diagnostics
                    .push(format!("line {}: {}, keeping first entry", line_no, e.message));
            }
        }

        loaded
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Write both persisted forms.
    pub fn save(&self, json_path: &Path, report_path: &Path) -> Result<()> {
        io::write_file_atomic(
            json_path,
            &self.to_json()?,
            &format!("write {}", json_path.display()),
        )?;
        io::write_file_atomic(
            report_path,
            &self.to_report(),
            &format!("write {}", report_path.display()),
        )?;
        Ok(())
    }

    /// Load from either form, chosen by extension (`.txt` is a report).
    /// A missing file, an unparseable JSON file, or an empty result is fatal.
    pub fn load(path: &Path) -> Result<LoadedMapping> {
        if !path.is_file() {
            return Err(Error::mapping_not_found(path.display().to_string()));
        }

        let content = io::read_file(path, &format!("read {}", path.display()))?;

        let loaded = if is_report_path(path) {
            Self::from_report(&content)
        } else {
            let mapping = Self::from_json(&content)
                .map_err(|e| invalid_json(path, &content, &e))?;
            LoadedMapping {
                mapping,
                diagnostics: Vec::new(),
            }
        };

        if loaded.mapping.is_empty() {
            return Err(Error::mapping_empty(path.display().to_string()));
        }

        Ok(loaded)
    }
}

/// Title, rule and total lines: no arrow and no `<digits>:` prefix. This
/// covers reports written in any language.
/// Whether `path` holds the report form (`.txt`) rather than JSON.
pub fn is_report_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"))
}

fn is_report_chrome(line: &str) -> bool {
    !line.contains(ARROW) && strip_line_number(line) == line
}

/// Strip a `<digits>:` prefix; anything else is left alone.
fn strip_line_number(old: &str) -> &str {
    let Some((number, rest)) = old.split_once(':') else {
        return old;
    };
    let number = number.trim();
    if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) {
        rest.trim()
    } else {
        old
    }
}

fn invalid_json(path: &Path, content: &str, err: &serde_json::Error) -> Error {
    let line = err.line();
    let lines: Vec<&str> = content.lines().collect();
    let excerpt = if line == 0 || lines.is_empty() {
        Vec::new()
    } else {
        let start = line.saturating_sub(3);
        let end = (line + 2).min(lines.len());
        (start..end)
            .map(|i| {
                let marker = if i + 1 == line { ">>>" } else { "   " };
                format!("{} {:3}: {}", marker, i + 1, lines[i])
            })
            .collect()
    };

    Error::mapping_invalid(MappingInvalidDetails {
        path: path.display().to_string(),
        error: err.to_string(),
        line: (line > 0).then_some(line),
        column: (line > 0).then_some(err.column()),
        excerpt,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MappingStore {
        let mut mapping = MappingStore::new();
        mapping.record("icon_home", "project_icon_home").unwrap();
        mapping.record("bg_splash", "project_bg_splash").unwrap();
        mapping.record("图标", "project_图标").unwrap();
        mapping
    }

    #[test]
    fn record_rejects_second_write() {
        let mut mapping = MappingStore::new();
        mapping.record("a", "x").unwrap();
        let err = mapping.record("a", "y").unwrap_err();
        assert_eq!(err.code.as_str(), "mapping.duplicate_key");
        assert_eq!(mapping.get("a"), Some("x"));
    }

    #[test]
    fn iteration_keeps_insertion_order() {
        let mapping = sample();
        let names: Vec<&str> = mapping.iter().map(|(old, _)| old).collect();
        assert_eq!(names, vec!["icon_home", "bg_splash", "图标"]);
    }

    #[test]
    fn json_round_trip() {
        let mapping = sample();
        let json = mapping.to_json().unwrap();
        assert!(json.contains("图标"), "non-ASCII must not be escaped: {}", json);
        assert_eq!(MappingStore::from_json(&json).unwrap(), mapping);
    }

    #[test]
    fn report_round_trip() {
        let mapping = sample();
        let report = mapping.to_report();
        assert!(report.contains(" 1:  icon_home → project_icon_home\n"));
        assert!(report.ends_with("Total: 3 images\n"));

        let loaded = MappingStore::from_report(&report);
        assert_eq!(loaded.mapping, mapping);
        assert!(loaded.diagnostics.is_empty(), "{:?}", loaded.diagnostics);
    }

    #[test]
    fn report_tolerates_whitespace_and_missing_numbers() {
        let loaded = MappingStore::from_report("  3:icon_a   →   new_a  \nicon_b → new_b\n");
        assert_eq!(loaded.mapping.get("icon_a"), Some("new_a"));
        assert_eq!(loaded.mapping.get("icon_b"), Some("new_b"));
    }

    #[test]
    fn report_drops_malformed_lines_with_diagnostics() {
        let content = " 1:  a → b\n 2:  c → d → e\n 3:  just text\n 4:  → f\n 5:  a → z\n";
        let loaded = MappingStore::from_report(content);

        assert_eq!(loaded.mapping.len(), 1);
        assert_eq!(loaded.mapping.get("a"), Some("b"));
        assert_eq!(loaded.diagnostics.len(), 4);
        assert!(loaded.diagnostics[0].starts_with("line 2"));
        assert!(loaded.diagnostics[3].contains("keeping first entry"));
    }

    #[test]
    fn report_headers_in_other_languages_are_not_diagnosed() {
        let content = "图片重命名映射关系报告\n========================================\n\n 1:  图标 → p_icon\n 2:  bg → p_bg\n\n总计: 2 个图片\n";
        let loaded = MappingStore::from_report(content);

        assert_eq!(loaded.mapping.len(), 2);
        assert_eq!(loaded.mapping.get("图标"), Some("p_icon"));
        assert!(loaded.diagnostics.is_empty(), "{:?}", loaded.diagnostics);
    }

    #[test]
    fn invert_swaps_pairs() {
        let inverted = sample().invert();
        assert_eq!(inverted.get("project_icon_home"), Some("icon_home"));
        assert_eq!(inverted.len(), 3);
    }

    #[test]
    fn save_then_load_both_forms() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("image_mapping.json");
        let report = dir.path().join("rename_report_project.txt");
        let mapping = sample();

        mapping.save(&json, &report).unwrap();

        assert_eq!(MappingStore::load(&json).unwrap().mapping, mapping);
        assert_eq!(MappingStore::load(&report).unwrap().mapping, mapping);
    }

    #[test]
    fn load_missing_file_is_fatal() {
        let err = MappingStore::load(Path::new("/nonexistent/image_mapping.json")).unwrap_err();
        assert_eq!(err.code.as_str(), "mapping.not_found");
    }

    #[test]
    fn load_empty_mapping_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image_mapping.json");
        std::fs::write(&path, "{}").unwrap();

        let err = MappingStore::load(&path).unwrap_err();
        assert_eq!(err.code.as_str(), "mapping.empty");
    }

    #[test]
    fn load_invalid_json_reports_location() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image_mapping.json");
        std::fs::write(&path, "{\n  \"a\": \"b\"\n  \"c\": \"d\"\n}\n").unwrap();

        let err = MappingStore::load(&path).unwrap_err();
        assert_eq!(err.code.as_str(), "mapping.invalid");
        assert_eq!(err.details["line"], 3);
        assert!(!err.details["excerpt"].as_array().unwrap().is_empty());
    }
}
