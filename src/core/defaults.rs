use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::json_patch::{AdjacencyRule, ValueKind};
use crate::utils::io;

/// Root configuration structure for config.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RenameConfig {
    #[serde(default)]
    pub defaults: Defaults,
}

/// All configurable defaults that can be overridden via config.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default = "default_assets")]
    pub assets: AssetsConfig,

    #[serde(default = "default_naming")]
    pub naming: NamingConfig,

    #[serde(default = "default_propagation")]
    pub propagation: PropagationConfig,

    #[serde(default = "default_mapping")]
    pub mapping: MappingConfig,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            assets: default_assets(),
            naming: default_naming(),
            propagation: default_propagation(),
            mapping: default_mapping(),
        }
    }
}

/// Asset catalog layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    #[serde(default = "default_bundle_suffix")]
    pub bundle_suffix: String,

    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,

    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    #[serde(default = "default_manifest_indent")]
    pub manifest_indent: usize,
}

/// Identifier generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    #[serde(default = "default_project_name")]
    pub project_name: String,

    #[serde(default = "default_random_name_length")]
    pub random_name_length: usize,

    #[serde(default = "default_random_max_attempts")]
    pub random_max_attempts: usize,
}

/// Reference propagation across the project tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropagationConfig {
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,

    /// Directory names (glob patterns) never descended into.
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,

    #[serde(default = "default_data_indent")]
    pub data_indent: usize,

    #[serde(default = "default_repair_rules")]
    pub repair_rules: Vec<AdjacencyRule>,
}

/// Mapping persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    #[serde(default = "default_mapping_file")]
    pub mapping_file: String,

    #[serde(default = "default_report_file")]
    pub report_file: String,
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_assets() -> AssetsConfig {
    AssetsConfig {
        bundle_suffix: default_bundle_suffix(),
        manifest_file: default_manifest_file(),
        image_extensions: default_image_extensions(),
        manifest_indent: default_manifest_indent(),
    }
}

fn default_bundle_suffix() -> String {
    ".imageset".to_string()
}

fn default_manifest_file() -> String {
    "Contents.json".to_string()
}

fn default_image_extensions() -> Vec<String> {
    vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()]
}

fn default_manifest_indent() -> usize {
    2
}

fn default_naming() -> NamingConfig {
    NamingConfig {
        project_name: default_project_name(),
        random_name_length: default_random_name_length(),
        random_max_attempts: default_random_max_attempts(),
    }
}

fn default_project_name() -> String {
    "project".to_string()
}

fn default_random_name_length() -> usize {
    8
}

fn default_random_max_attempts() -> usize {
    10_000
}

fn default_propagation() -> PropagationConfig {
    PropagationConfig {
        source_extensions: default_source_extensions(),
        skip_dirs: default_skip_dirs(),
        data_indent: default_data_indent(),
        repair_rules: default_repair_rules(),
    }
}

fn default_source_extensions() -> Vec<String> {
    vec![
        "m".to_string(),
        "mm".to_string(),
        "h".to_string(),
        "swift".to_string(),
    ]
}

fn default_skip_dirs() -> Vec<String> {
    vec![
        "Pods".to_string(),
        "Carthage".to_string(),
        "DerivedData".to_string(),
        "node_modules".to_string(),
        ".git".to_string(),
        "*.xcassets".to_string(),
    ]
}

fn default_data_indent() -> usize {
    4
}

/// Field adjacencies known to lose their separating comma in generated
/// character data files.
fn default_repair_rules() -> Vec<AdjacencyRule> {
    let strings = [
        ("name", "big"),
        ("big", "small"),
        ("small", "photo"),
        ("photo", "motto"),
        ("motto", "character"),
        ("character", "introduction"),
    ];
    let numbers = [("aichat", "id"), ("id", "name")];

    strings
        .iter()
        .map(|(after, before)| AdjacencyRule::new(after, before, ValueKind::String))
        .chain(
            numbers
                .iter()
                .map(|(after, before)| AdjacencyRule::new(after, before, ValueKind::Number)),
        )
        .collect()
}

fn default_mapping() -> MappingConfig {
    MappingConfig {
        mapping_file: default_mapping_file(),
        report_file: default_report_file(),
    }
}

fn default_mapping_file() -> String {
    "image_mapping.json".to_string()
}

fn default_report_file() -> String {
    "rename_report_project.txt".to_string()
}

// =============================================================================
// Loading functions
// =============================================================================

/// Load defaults from an explicit config file. A missing file yields the
/// built-in defaults; an unparseable one is an error.
pub fn load_defaults_from(path: &Path) -> crate::Result<Defaults> {
    if !path.exists() {
        return Ok(Defaults::default());
    }

    let content = io::read_file(path, &format!("read {}", path.display()))?;

    let config: RenameConfig = serde_json::from_str(&content)
        .map_err(|e| crate::Error::config_invalid_json(path.display().to_string(), e))?;

    validate(&config.defaults)?;
    Ok(config.defaults)
}

fn validate(defaults: &Defaults) -> crate::Result<()> {
    if defaults.naming.random_name_length == 0 {
        return Err(crate::Error::config_invalid_value(
            "naming.random_name_length",
            Some("0".to_string()),
            "must be at least 1",
        ));
    }
    if defaults.assets.bundle_suffix.is_empty() {
        return Err(crate::Error::config_invalid_value(
            "assets.bundle_suffix",
            None,
            "cannot be empty",
        ));
    }
    Ok(())
}

/// Write a config file (creates parent directories).
pub fn save_config(path: &Path, config: &RenameConfig) -> crate::Result<()> {
    if let Some(parent) = path.parent() {
        io::create_dir_all(parent)?;
    }

    let content = crate::json_patch::to_pretty_string(config, 2)?;
    io::write_file_atomic(path, &content, &format!("write {}", path.display()))
}

/// Delete a config file (reset to defaults). Returns whether it existed.
pub fn reset_config(path: &Path) -> crate::Result<bool> {
    if path.exists() {
        io::remove_file(path)?;
        Ok(true)
    } else {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_file_yields_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let defaults = load_defaults_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(defaults.assets.bundle_suffix, ".imageset");
        assert_eq!(defaults.naming.random_name_length, 8);
        assert_eq!(defaults.propagation.repair_rules.len(), 8);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"defaults": {"naming": {"random_name_length": 12}}}"#,
        )
        .unwrap();

        let defaults = load_defaults_from(&path).unwrap();
        assert_eq!(defaults.naming.random_name_length, 12);
        assert_eq!(defaults.naming.project_name, "project");
        assert_eq!(defaults.mapping.mapping_file, "image_mapping.json");
    }

    #[test]
    fn invalid_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_defaults_from(&path).unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_json");
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.json");

        save_config(&path, &RenameConfig::default()).unwrap();
        let defaults = load_defaults_from(&path).unwrap();
        assert_eq!(defaults.propagation.repair_rules.len(), 8);
        assert_eq!(defaults.propagation.skip_dirs, default_skip_dirs());

        assert!(reset_config(&path).unwrap());
        assert!(!reset_config(&path).unwrap());
    }

    #[test]
    fn zero_name_length_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"defaults": {"naming": {"random_name_length": 0}}}"#,
        )
        .unwrap();

        let err = load_defaults_from(&path).unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_value");
    }
}
