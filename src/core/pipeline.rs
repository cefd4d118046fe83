//! Phase driver: rename bundles, persist the mapping, then propagate it.
//!
//! The mapping is built with `&mut` during relocation and only borrowed
//! shared afterwards, so propagation can never observe a half-built table.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::assets::{AssetRelocator, RelocationReport};
use crate::defaults::Defaults;
use crate::error::{Error, Result};
use crate::json_patch::{DataReport, JsonPatcher, PatchOutcome};
use crate::mapping::{self, LoadedMapping, MappingStore};
use crate::naming::{NameGenerator, NamingMode};
use crate::refactor::{CodeReport, ReferenceRewriter};
use crate::walk::WalkFilter;

/// Which propagation phases run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    All,
    Code,
    Data,
}

impl Scope {
    fn code(self) -> bool {
        matches!(self, Scope::All | Scope::Code)
    }

    fn data(self) -> bool {
        matches!(self, Scope::All | Scope::Data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStepStatus {
    Success,
    PartialSuccess,
    Skipped,
}

/// Where the mapping lives on disk.
#[derive(Debug, Clone)]
pub struct MappingFiles {
    pub json: PathBuf,
    pub report: PathBuf,
}

impl MappingFiles {
    /// `json` as given; the report defaults to the configured name next to it.
    pub fn resolve(json: Option<PathBuf>, report: Option<PathBuf>, defaults: &Defaults) -> Self {
        let json = json.unwrap_or_else(|| PathBuf::from(&defaults.mapping.mapping_file));
        let report = report.unwrap_or_else(|| {
            json.parent()
                .unwrap_or_else(|| Path::new(""))
                .join(&defaults.mapping.report_file)
        });
        Self { json, report }
    }

    /// Both forms belonging to an existing mapping file, whichever one
    /// `path` is. A report's JSON sibling uses the configured file name.
    pub fn around(path: &Path, defaults: &Defaults) -> Self {
        if mapping::is_report_path(path) {
            let dir = path.parent().unwrap_or_else(|| Path::new(""));
            Self {
                json: dir.join(&defaults.mapping.mapping_file),
                report: path.to_path_buf(),
            }
        } else {
            Self::resolve(Some(path.to_path_buf()), None, defaults)
        }
    }

    fn all(&self) -> Vec<PathBuf> {
        vec![self.json.clone(), self.report.clone()]
    }
}

// ============================================================================
// Propagation
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<DataReport>,
}

impl PropagationResult {
    pub fn status(&self) -> PipelineStepStatus {
        let failed = self.code.as_ref().is_some_and(|c| !c.failures.is_empty())
            || self.data.as_ref().is_some_and(|d| !d.failures.is_empty());
        if failed {
            PipelineStepStatus::PartialSuccess
        } else {
            PipelineStepStatus::Success
        }
    }
}

/// Rewrite source references and JSON values under `root`.
pub fn propagate(
    mapping: &MappingStore,
    root: &Path,
    defaults: &Defaults,
    scope: Scope,
    exclude: &[PathBuf],
    dry_run: bool,
) -> Result<PropagationResult> {
    let propagation = &defaults.propagation;

    let code = if scope.code() {
        let rewriter = ReferenceRewriter::new(mapping)?;
        let filter = WalkFilter {
            skip_dirs: &propagation.skip_dirs,
            extensions: &propagation.source_extensions,
            include_hidden: false,
        };
        Some(rewriter.rewrite_tree(root, &filter, dry_run))
    } else {
        None
    };

    let data = if scope.data() {
        let patcher = JsonPatcher::new(mapping, &propagation.repair_rules, propagation.data_indent)?;
        Some(patcher.patch_tree(root, &propagation.skip_dirs, exclude, dry_run))
    } else {
        None
    };

    Ok(PropagationResult { code, data })
}

/// Load a mapping file, logging dropped report lines.
pub fn load_mapping(path: &Path, invert: bool) -> Result<LoadedMapping> {
    let mut loaded = MappingStore::load(path)?;
    for diagnostic in &loaded.diagnostics {
        log_status!("mapping", "{}: {}", path.display(), diagnostic);
    }
    if invert {
        loaded.mapping = loaded.mapping.invert();
    }
    log_status!("mapping", "Loaded {} mapping(s) from {}", loaded.mapping.len(), path.display());
    Ok(loaded)
}

// ============================================================================
// Rename
// ============================================================================

#[derive(Debug, Clone)]
pub struct RenameOptions {
    pub assets: PathBuf,
    pub project_root: Option<PathBuf>,
    pub naming: NamingMode,
    pub seed: Option<u64>,
    pub files: MappingFiles,
    pub dry_run: bool,
    /// Skip relocation and replay the saved mapping against the project.
    pub json_only: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameResult {
    pub status: PipelineStepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets: Option<RelocationReport>,
    pub mapping_file: String,
    pub report_file: String,
    pub mapping_saved: bool,
    pub mappings: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub propagation: Option<PropagationResult>,
}

pub fn run_rename(options: &RenameOptions, defaults: &Defaults) -> Result<RenameResult> {
    let files = &options.files;
    if options.json_only && options.project_root.is_none() {
        return Err(Error::validation_missing_argument(vec![
            "--project-root".to_string()
        ]));
    }

    let (mapping, assets, diagnostics, saved) = if options.json_only {
        let loaded = load_mapping(&files.json, false)?;
        (loaded.mapping, None, loaded.diagnostics, false)
    } else {
        let mut names = match options.seed {
            Some(seed) => NameGenerator::with_seed(options.naming.clone(), seed)?,
            None => NameGenerator::new(options.naming.clone())?,
        };
        let mut mapping = MappingStore::new();
        let report = AssetRelocator::new(&options.assets, &defaults.assets).run(
            &mut mapping,
            &mut names,
            options.dry_run,
        );

        let saved = !options.dry_run;
        if saved {
            mapping.save(&files.json, &files.report)?;
            log_status!(
                "mapping",
                "Saved {} mapping(s) to {} and {}",
                mapping.len(),
                files.json.display(),
                files.report.display()
            );
        }
        (mapping, Some(report), Vec::new(), saved)
    };

    let propagation = match &options.project_root {
        Some(root) if !mapping.is_empty() => Some(propagate(
            &mapping,
            root,
            defaults,
            Scope::All,
            &files.all(),
            options.dry_run,
        )?),
        _ => None,
    };

    let assets_failed = assets.as_ref().is_some_and(|a| !a.failures.is_empty());
    let status = match &propagation {
        _ if assets_failed => PipelineStepStatus::PartialSuccess,
        Some(p) => p.status(),
        None => PipelineStepStatus::Success,
    };

    Ok(RenameResult {
        status,
        assets,
        mapping_file: files.json.display().to_string(),
        report_file: files.report.display().to_string(),
        mapping_saved: saved,
        mappings: mapping.len(),
        diagnostics,
        propagation,
    })
}

// ============================================================================
// Standalone propagation
// ============================================================================

#[derive(Debug, Clone)]
pub enum PropagateTarget {
    Tree(PathBuf),
    JsonFile(PathBuf),
}

#[derive(Debug, Clone)]
pub struct PropagateOptions {
    pub mapping_file: PathBuf,
    pub target: PropagateTarget,
    pub scope: Scope,
    pub invert: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagateResult {
    pub status: PipelineStepStatus,
    pub mapping_file: String,
    pub mappings: usize,
    pub inverted: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub propagation: Option<PropagationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PatchOutcome>,
    pub applied: bool,
}

pub fn run_propagate(options: &PropagateOptions, defaults: &Defaults) -> Result<PropagateResult> {
    let loaded = load_mapping(&options.mapping_file, options.invert)?;
    let mapping = &loaded.mapping;

    let mut result = PropagateResult {
        status: PipelineStepStatus::Success,
        mapping_file: options.mapping_file.display().to_string(),
        mappings: mapping.len(),
        inverted: options.invert,
        diagnostics: loaded.diagnostics.clone(),
        propagation: None,
        file: None,
        applied: !options.dry_run,
    };

    match &options.target {
        PropagateTarget::Tree(root) => {
            let propagation = propagate(
                mapping,
                root,
                defaults,
                options.scope,
                &MappingFiles::around(&options.mapping_file, defaults).all(),
                options.dry_run,
            )?;
            result.status = propagation.status();
            result.propagation = Some(propagation);
        }
        PropagateTarget::JsonFile(path) => {
            let propagation = &defaults.propagation;
            let patcher =
                JsonPatcher::new(mapping, &propagation.repair_rules, propagation.data_indent)?;
            let outcome = patcher.patch_file(path, options.dry_run)?;
            if let PatchOutcome::Unrepairable { error } = &outcome {
                log_status!("json", "Skipping {}: still invalid after repair: {}", path.display(), error);
                result.status = PipelineStepStatus::Skipped;
            }
            result.file = Some(outcome);
        }
    }

    Ok(result)
}

// ============================================================================
// Resolution repair
// ============================================================================

/// Normalize density suffixes and manifests without renaming any bundle.
pub fn run_fix_resolution(assets: &Path, defaults: &Defaults, dry_run: bool) -> Result<RelocationReport> {
    let mut names = NameGenerator::new(NamingMode::Preserve)?;
    let mut mapping = MappingStore::new();
    Ok(AssetRelocator::new(assets, &defaults.assets).run(&mut mapping, &mut names, dry_run))
}
