//! Directory walking shared by the rename and propagation phases.
//!
//! Entries are visited in sorted order so repeated runs see bundles and files
//! in the same sequence.

use glob_match::glob_match;
use std::fs;
use std::path::{Path, PathBuf};

/// Which files a walk collects.
#[derive(Debug, Clone)]
pub struct WalkFilter<'a> {
    /// Directory-name glob patterns never descended into.
    pub skip_dirs: &'a [String],
    /// Lower-case extensions (without the dot) to collect.
    pub extensions: &'a [String],
    /// Collect files whose name starts with '.'.
    pub include_hidden: bool,
}

impl WalkFilter<'_> {
    fn skips_dir(&self, name: &str) -> bool {
        self.skip_dirs.iter().any(|pattern| glob_match(pattern, name))
    }

    fn accepts_file(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if !self.include_hidden && name.starts_with('.') {
            return false;
        }
        has_extension(path, self.extensions)
    }
}

/// Case-insensitive extension check against a list of bare extensions.
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
}

/// Recursively collect files under `root` accepted by `filter`.
pub fn collect_files(root: &Path, filter: &WalkFilter) -> Vec<PathBuf> {
    let mut files = Vec::new();
    walk_recursive(root, filter, &mut files);
    files
}

fn walk_recursive(dir: &Path, filter: &WalkFilter, files: &mut Vec<PathBuf>) {
    for path in sorted_entries(dir) {
        if path.is_dir() {
            let name = file_name(&path);
            if filter.skips_dir(&name) {
                continue;
            }
            walk_recursive(&path, filter, files);
        } else if filter.accepts_file(&path) {
            files.push(path);
        }
    }
}

/// Find every directory under `root` whose name ends with `suffix`.
/// Matching directories are not descended into.
pub fn find_bundles(root: &Path, suffix: &str) -> Vec<PathBuf> {
    let mut bundles = Vec::new();
    find_bundles_recursive(root, suffix, &mut bundles);
    bundles
}

fn find_bundles_recursive(dir: &Path, suffix: &str, bundles: &mut Vec<PathBuf>) {
    for path in sorted_entries(dir) {
        if !path.is_dir() {
            continue;
        }
        if file_name(&path).ends_with(suffix) {
            bundles.push(path);
        } else {
            find_bundles_recursive(&path, suffix, bundles);
        }
    }
}

/// Plain files directly inside `dir`, sorted by name.
pub fn list_files(dir: &Path) -> Vec<PathBuf> {
    sorted_entries(dir)
        .into_iter()
        .filter(|p| p.is_file())
        .collect()
}

fn sorted_entries(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
    paths.sort();
    paths
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn collect_skips_vendored_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("App/Views")).unwrap();
        fs::create_dir_all(root.join("Pods/Lib")).unwrap();
        fs::create_dir_all(root.join("App/Assets.xcassets")).unwrap();
        fs::write(root.join("App/Views/Home.swift"), "").unwrap();
        fs::write(root.join("App/Main.M"), "").unwrap();
        fs::write(root.join("Pods/Lib/Vendored.swift"), "").unwrap();
        fs::write(root.join("App/Assets.xcassets/Inner.swift"), "").unwrap();
        fs::write(root.join("App/notes.txt"), "").unwrap();

        let skip = strings(&["Pods", "*.xcassets"]);
        let exts = strings(&["m", "swift"]);
        let filter = WalkFilter {
            skip_dirs: &skip,
            extensions: &exts,
            include_hidden: false,
        };

        let files: Vec<String> = collect_files(root, &filter)
            .iter()
            .map(|p| crate::paths::relative(p, root))
            .collect();

        assert_eq!(files, vec!["App/Main.M", "App/Views/Home.swift"]);
    }

    #[test]
    fn collect_skips_hidden_files_unless_asked() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".config.json"), "{}").unwrap();
        fs::write(dir.path().join("data.json"), "{}").unwrap();

        let exts = strings(&["json"]);
        let mut filter = WalkFilter {
            skip_dirs: &[],
            extensions: &exts,
            include_hidden: false,
        };
        assert_eq!(collect_files(dir.path(), &filter).len(), 1);

        filter.include_hidden = true;
        assert_eq!(collect_files(dir.path(), &filter).len(), 2);
    }

    #[test]
    fn find_bundles_stops_at_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("Icons/b.imageset")).unwrap();
        fs::create_dir_all(root.join("a.imageset/nested.imageset")).unwrap();
        fs::create_dir_all(root.join("AppIcon.appiconset")).unwrap();

        let bundles: Vec<String> = find_bundles(root, ".imageset")
            .iter()
            .map(|p| crate::paths::relative(p, root))
            .collect();

        assert_eq!(bundles, vec!["Icons/b.imageset", "a.imageset"]);
    }
}
