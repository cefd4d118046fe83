//! Physical rename of image bundles inside an asset catalog.
//!
//! Every bundle gets a [`BundlePlan`] from one planning function; dry-run
//! describes the plans, a real run applies them. Per bundle the order is
//! directory rename, then member files, then the manifest.

pub mod manifest;
pub mod scale;

pub use manifest::ManifestEdit;
pub use scale::Scale;

use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::defaults::AssetsConfig;
use crate::error::{Error, Result};
use crate::mapping::MappingStore;
use crate::naming::NameGenerator;
use crate::output::{ItemFailure, PhaseSummary};
use crate::paths;
use crate::utils::io;
use crate::walk;

// ============================================================================
// Plans
// ============================================================================

/// A filesystem step inside a bundle. Names are relative to the bundle
/// directory after its rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FileOp {
    Rename { from: String, to: String },
    Copy { from: String, to: String },
    Remove { file: String },
}

impl FileOp {
    fn apply(&self, dir: &Path) -> Result<()> {
        match self {
            FileOp::Rename { from, to } => io::rename_path(&dir.join(from), &dir.join(to)),
            FileOp::Copy { from, to } => io::copy_file(&dir.join(from), &dir.join(to)),
            FileOp::Remove { file } => io::remove_file(&dir.join(file)),
        }
    }

    fn describe(&self) -> String {
        match self {
            FileOp::Rename { from, to } => format!("rename {} → {}", from, to),
            FileOp::Copy { from, to } => format!("copy {} → {}", from, to),
            FileOp::Remove { file } => format!("remove {}", file),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestPlan {
    pub file: String,
    pub edits: Vec<ManifestEdit>,
    #[serde(skip)]
    pub updated: Value,
}

/// Everything that will happen to one bundle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundlePlan {
    /// Bundle path relative to the asset root, before the rename.
    pub bundle: String,
    pub old_name: String,
    pub new_name: String,
    pub recovered: bool,
    pub file_ops: Vec<FileOp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<ManifestPlan>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip)]
    source: PathBuf,
    #[serde(skip)]
    target: PathBuf,
}

impl BundlePlan {
    pub fn renames_dir(&self) -> bool {
        self.source != self.target
    }

    pub fn is_noop(&self) -> bool {
        !self.renames_dir() && self.file_ops.is_empty() && self.manifest.is_none()
    }

    /// Human-readable preview, one step per line.
    pub fn describe(&self) -> String {
        let mut lines = vec![if self.renames_dir() {
            format!("{} → {}", walk::file_name(&self.source), walk::file_name(&self.target))
        } else {
            walk::file_name(&self.source)
        }];

        for op in &self.file_ops {
            lines.push(format!("  {}", op.describe()));
        }
        if let Some(manifest) = &self.manifest {
            for edit in &manifest.edits {
                let change = match &edit.to {
                    Some(to) => format!("{} → {}", edit.from, to),
                    None => format!("drop {}", edit.from),
                };
                lines.push(format!(
                    "  {} [{}] {}",
                    manifest.file,
                    edit.scale.as_manifest(),
                    change
                ));
            }
        }
        for warning in &self.warnings {
            lines.push(format!("  warning: {}", warning));
        }
        lines.join("\n")
    }

    pub fn rename_dir(&self) -> Result<()> {
        if self.renames_dir() {
            io::rename_path(&self.source, &self.target)?;
        }
        Ok(())
    }

    /// Member files, then the manifest. Expects `rename_dir` to have run.
    pub fn apply_contents(&self, indent: usize) -> Result<()> {
        for op in &self.file_ops {
            op.apply(&self.target)?;
        }
        if let Some(manifest) = &self.manifest {
            let path = self.target.join(&manifest.file);
            let content = crate::json_patch::to_pretty_string(&manifest.updated, indent)?;
            io::write_file_atomic(&path, &content, &format!("write {}", path.display()))?;
        }
        Ok(())
    }
}

// ============================================================================
// Report
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelocationReport {
    pub summary: PhaseSummary,
    pub plans: Vec<BundlePlan>,
    pub failures: Vec<ItemFailure>,
    pub warnings: Vec<String>,
    pub applied: bool,
}

// ============================================================================
// Relocator
// ============================================================================

pub struct AssetRelocator<'a> {
    root: PathBuf,
    config: &'a AssetsConfig,
}

impl<'a> AssetRelocator<'a> {
    pub fn new(root: &Path, config: &'a AssetsConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
        }
    }

    pub fn bundles(&self) -> Vec<PathBuf> {
        walk::find_bundles(&self.root, &self.config.bundle_suffix)
    }

    fn base_name(&self, bundle: &Path) -> String {
        let name = walk::file_name(bundle);
        name.strip_suffix(self.config.bundle_suffix.as_str())
            .unwrap_or(&name)
            .to_string()
    }

    /// Rename every bundle. Mapping pairs are recorded as bundles are
    /// renamed; in dry-run every planned pair is recorded and nothing is
    /// written.
    pub fn run(
        &self,
        mapping: &mut MappingStore,
        names: &mut NameGenerator,
        dry_run: bool,
    ) -> RelocationReport {
        let bundles = self.bundles();
        for bundle in &bundles {
            names.reserve(&self.base_name(bundle));
        }

        let mut report = RelocationReport {
            summary: PhaseSummary::default(),
            plans: Vec::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
            applied: !dry_run,
        };

        for bundle in &bundles {
            let relative = paths::relative(bundle, &self.root);
            report.summary.scanned += 1;

            match self.process(bundle, mapping, names, dry_run) {
                Ok(plan) => {
                    for warning in &plan.warnings {
                        log_status!("assets", "{}: {}", relative, warning);
                        report.warnings.push(format!("{}: {}", relative, warning));
                    }
                    if plan.is_noop() {
                        report.summary.unchanged += 1;
                    } else {
                        if dry_run {
                            log_status!("assets", "{}", plan.describe());
                        }
                        report.summary.updated += 1;
                        report.plans.push(plan);
                    }
                }
                Err(e) => {
                    log_status!("assets", "Failed {}: {}", relative, e);
                    report.summary.failed += 1;
                    report.failures.push(ItemFailure {
                        item: relative,
                        error: e.to_string(),
                    });
                }
            }
        }

        log_status!("assets", "{}", report.summary.line("bundles", dry_run));
        report
    }

    fn process(
        &self,
        bundle: &Path,
        mapping: &mut MappingStore,
        names: &mut NameGenerator,
        dry_run: bool,
    ) -> Result<BundlePlan> {
        let old_name = self.base_name(bundle);
        let new_name = match mapping.get(&old_name) {
            Some(recorded) => recorded.to_string(),
            None => names.next(&old_name)?,
        };

        let plan = self.plan(bundle, &old_name, &new_name)?;

        if dry_run {
            record_once(mapping, &old_name, &new_name)?;
            return Ok(plan);
        }

        plan.rename_dir()?;
        record_once(mapping, &old_name, &new_name)?;
        plan.apply_contents(self.config.manifest_indent)?;
        Ok(plan)
    }

    /// Compute the plan for one bundle without touching the filesystem.
    pub fn plan(&self, bundle: &Path, old_name: &str, new_name: &str) -> Result<BundlePlan> {
        let dir_name = format!("{}{}", new_name, self.config.bundle_suffix);
        let target = bundle.with_file_name(&dir_name);
        if target != bundle && target.exists() {
            return Err(Error::internal_io(
                format!("Target already exists: {}", target.display()),
                Some(format!("rename {}", walk::file_name(bundle))),
            ));
        }

        let images: Vec<String> = walk::list_files(bundle)
            .iter()
            .filter(|p| walk::has_extension(p, &self.config.image_extensions))
            .map(|p| walk::file_name(p))
            .collect();

        let mut warnings = Vec::new();
        let recovered = needs_recovery(&images, old_name);
        let file_ops = if recovered {
            recovery_ops(&images[0], new_name)
        } else {
            member_ops(&images, new_name, &mut warnings)
        };

        let manifest_path = bundle.join(&self.config.manifest_file);
        let manifest = match manifest::read(&manifest_path) {
            Ok(Some(mut value)) => {
                let edits = manifest::plan_edits(&value, new_name, recovered);
                if edits.is_empty() {
                    None
                } else {
                    manifest::apply_edits(&mut value, &edits);
                    Some(ManifestPlan {
                        file: self.config.manifest_file.clone(),
                        edits,
                        updated: value,
                    })
                }
            }
            Ok(None) => None,
            Err(e) => {
                warnings.push(format!("{} left unchanged: {}", self.config.manifest_file, e));
                None
            }
        };

        Ok(BundlePlan {
            bundle: paths::relative(bundle, &self.root),
            old_name: old_name.to_string(),
            new_name: new_name.to_string(),
            recovered,
            file_ops,
            manifest,
            warnings,
            source: bundle.to_path_buf(),
            target,
        })
    }
}

fn record_once(mapping: &mut MappingStore, old: &str, new: &str) -> Result<()> {
    if old != new && !mapping.contains(old) {
        mapping.record(old, new)?;
    }
    Ok(())
}

fn split_name(file: &str) -> (&str, &str) {
    match file.rfind('.') {
        Some(dot) if dot > 0 => (&file[..dot], &file[dot..]),
        _ => (file, ""),
    }
}

/// A lone 1x image named after the bundle is expanded into @2x and @3x.
fn needs_recovery(images: &[String], old_name: &str) -> bool {
    let [only] = images else {
        return false;
    };
    let (stem, _) = split_name(only);
    let (base, scale) = Scale::split_stem(stem);
    scale == Scale::One && base == old_name
}

fn recovery_ops(original: &str, new_name: &str) -> Vec<FileOp> {
    let (_, ext) = split_name(original);
    let mut ops: Vec<FileOp> = [Scale::Two, Scale::Three]
        .iter()
        .map(|scale| FileOp::Copy {
            from: original.to_string(),
            to: format!("{}{}{}", new_name, scale.suffix(), ext),
        })
        .collect();
    ops.push(FileOp::Remove {
        file: original.to_string(),
    });
    ops
}

/// Rename each image to `new_name + suffix + ext`. Files already carrying
/// their target name claim it first; a second file aimed at a claimed target
/// stays where it is.
fn member_ops(images: &[String], new_name: &str, warnings: &mut Vec<String>) -> Vec<FileOp> {
    let target_of = |file: &str| {
        let (stem, ext) = split_name(file);
        let (_, scale) = Scale::split_stem(stem);
        format!("{}{}{}", new_name, scale.suffix(), ext)
    };

    let mut claimed: HashSet<String> = images
        .iter()
        .filter(|file| target_of(file) == **file)
        .cloned()
        .collect();

    let mut ops = Vec::new();
    for file in images {
        let target = target_of(file);
        if target == *file {
            continue;
        }
        if !claimed.insert(target.clone()) {
            warnings.push(format!("{} not renamed: {} is already taken", file, target));
            continue;
        }
        ops.push(FileOp::Rename {
            from: file.clone(),
            to: target,
        });
    }
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::Defaults;
    use crate::naming::NamingMode;
    use serde_json::json;
    use std::fs;

    fn write_bundle(root: &Path, name: &str, files: &[&str], manifest: Option<Value>) -> PathBuf {
        let dir = root.join(format!("{}.imageset", name));
        fs::create_dir_all(&dir).unwrap();
        for file in files {
            fs::write(dir.join(file), file.as_bytes()).unwrap();
        }
        if let Some(manifest) = manifest {
            fs::write(dir.join("Contents.json"), serde_json::to_string_pretty(&manifest).unwrap())
                .unwrap();
        }
        dir
    }

    fn entry(filename: Option<&str>, scale: &str) -> Value {
        match filename {
            Some(f) => json!({"idiom": "universal", "filename": f, "scale": scale}),
            None => json!({"idiom": "universal", "scale": scale}),
        }
    }

    fn read_json(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    fn snapshot(root: &Path) -> Vec<(String, Vec<u8>)> {
        fn visit(dir: &Path, root: &Path, out: &mut Vec<(String, Vec<u8>)>) {
            let mut entries: Vec<PathBuf> =
                fs::read_dir(dir).unwrap().map(|e| e.unwrap().path()).collect();
            entries.sort();
            for path in entries {
                if path.is_dir() {
                    out.push((paths::relative(&path, root), Vec::new()));
                    visit(&path, root, out);
                } else {
                    out.push((paths::relative(&path, root), fs::read(&path).unwrap()));
                }
            }
        }
        let mut out = Vec::new();
        visit(root, root, &mut out);
        out
    }

    #[test]
    fn renames_bundle_files_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_bundle(
            root,
            "icon_home",
            &["icon_home@2x.png", "icon_home@3x.png"],
            Some(json!({
                "images": [
                    entry(None, "1x"),
                    entry(Some("icon_home@2x.png"), "2x"),
                    entry(Some("icon_home@3x.png"), "3x")
                ],
                "info": {"author": "xcode", "version": 1}
            })),
        );

        let config = Defaults::default().assets;
        let mut mapping = MappingStore::new();
        let mut names = NameGenerator::prefixed("project").unwrap();

        let report = AssetRelocator::new(root, &config).run(&mut mapping, &mut names, false);

        assert!(report.failures.is_empty(), "{:?}", report.failures);
        assert_eq!(mapping.get("icon_home"), Some("project_icon_home"));
        let bundle = root.join("project_icon_home.imageset");
        assert!(bundle.join("project_icon_home@2x.png").is_file());
        assert!(bundle.join("project_icon_home@3x.png").is_file());
        assert!(!root.join("icon_home.imageset").exists());

        let manifest = read_json(&bundle.join("Contents.json"));
        assert_eq!(manifest["images"][1]["filename"], "project_icon_home@2x.png");
        assert_eq!(manifest["images"][2]["filename"], "project_icon_home@3x.png");
        assert!(manifest["images"][0].get("filename").is_none());
    }

    #[test]
    fn lone_1x_image_is_expanded_to_2x_and_3x() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let bundle = write_bundle(
            root,
            "logo",
            &["logo.png"],
            Some(json!({
                "images": [
                    entry(Some("logo.png"), "1x"),
                    entry(Some("logo.png"), "2x"),
                    entry(Some("logo.png"), "3x")
                ]
            })),
        );

        let config = Defaults::default().assets;
        let mut mapping = MappingStore::new();
        let mut names = NameGenerator::new(NamingMode::Preserve).unwrap();

        let report = AssetRelocator::new(root, &config).run(&mut mapping, &mut names, false);

        assert_eq!(report.summary.updated, 1);
        assert!(report.plans[0].recovered);
        assert!(mapping.is_empty());
        assert!(!bundle.join("logo.png").exists());
        assert_eq!(fs::read(bundle.join("logo@2x.png")).unwrap(), b"logo.png");
        assert_eq!(fs::read(bundle.join("logo@3x.png")).unwrap(), b"logo.png");

        let manifest = read_json(&bundle.join("Contents.json"));
        assert!(manifest["images"][0].get("filename").is_none());
        assert_eq!(manifest["images"][1]["filename"], "logo@2x.png");
        assert_eq!(manifest["images"][2]["filename"], "logo@3x.png");
    }

    #[test]
    fn matching_manifest_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let bundle = write_bundle(root, "p_a", &["p_a@2x.png"], None);
        let manifest = "{\"images\":[{\"filename\":\"p_a@2x.png\",\"scale\":\"2x\"}]}";
        fs::write(bundle.join("Contents.json"), manifest).unwrap();

        let config = Defaults::default().assets;
        let mut mapping = MappingStore::new();
        let mut names = NameGenerator::prefixed("p").unwrap();

        let report = AssetRelocator::new(root, &config).run(&mut mapping, &mut names, false);

        assert_eq!(report.summary.unchanged, 1);
        assert!(mapping.is_empty());
        assert_eq!(fs::read_to_string(bundle.join("Contents.json")).unwrap(), manifest);
    }

    #[test]
    fn dry_run_matches_real_run_without_writing() {
        let build = |root: &Path| {
            write_bundle(root, "a", &["a@2x.png"], Some(json!({"images": [entry(Some("a@2x.png"), "2x")]})));
            write_bundle(&root.join("Group"), "b", &["b.png"], None);
            write_bundle(root, "c", &["c@3x.jpg", "notes.txt"], None);
        };
        let config = Defaults::default().assets;
        let mode = NamingMode::Random {
            length: 8,
            max_attempts: 100,
        };

        let preview_dir = tempfile::tempdir().unwrap();
        build(preview_dir.path());
        let before = snapshot(preview_dir.path());
        let mut preview_mapping = MappingStore::new();
        let mut names = NameGenerator::with_seed(mode.clone(), 11).unwrap();
        let preview = AssetRelocator::new(preview_dir.path(), &config).run(
            &mut preview_mapping,
            &mut names,
            true,
        );
        assert!(!preview.applied);
        assert_eq!(snapshot(preview_dir.path()), before);

        let real_dir = tempfile::tempdir().unwrap();
        build(real_dir.path());
        let mut real_mapping = MappingStore::new();
        let mut names = NameGenerator::with_seed(mode, 11).unwrap();
        AssetRelocator::new(real_dir.path(), &config).run(&mut real_mapping, &mut names, false);

        assert_eq!(preview_mapping.len(), 3);
        assert_eq!(preview_mapping, real_mapping);
    }

    #[test]
    fn same_named_bundles_share_one_new_name() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_bundle(&root.join("A"), "icon", &["icon@2x.png"], None);
        write_bundle(&root.join("B"), "icon", &["icon@2x.png"], None);

        let config = Defaults::default().assets;
        let mut mapping = MappingStore::new();
        let mode = NamingMode::Random {
            length: 6,
            max_attempts: 100,
        };
        let mut names = NameGenerator::with_seed(mode, 5).unwrap();

        let report = AssetRelocator::new(root, &config).run(&mut mapping, &mut names, false);

        assert!(report.failures.is_empty(), "{:?}", report.failures);
        assert_eq!(mapping.len(), 1);
        let new_name = mapping.get("icon").unwrap();
        assert!(root.join("A").join(format!("{}.imageset", new_name)).is_dir());
        assert!(root.join("B").join(format!("{}.imageset", new_name)).is_dir());
    }

    #[test]
    fn failing_bundle_does_not_stop_the_walk() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_bundle(root, "a", &["a@2x.png"], None);
        write_bundle(root, "b", &["b@2x.png"], None);
        // Occupies b's target name.
        fs::create_dir_all(root.join("p_b.imageset")).unwrap();

        let config = Defaults::default().assets;
        let mut mapping = MappingStore::new();
        let mut names = NameGenerator::prefixed("p").unwrap();

        let report = AssetRelocator::new(root, &config).run(&mut mapping, &mut names, false);

        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.failures[0].item, "b.imageset");
        assert_eq!(report.summary.updated, 1);
        assert_eq!(mapping.get("a"), Some("p_a"));
        assert!(!mapping.contains("b"));
        assert!(root.join("b.imageset/b@2x.png").is_file());
        assert!(root.join("p_a.imageset/p_a@2x.png").is_file());
    }

    #[test]
    fn colliding_members_warn_and_stay() {
        let images = vec!["a.png".to_string(), "b.png".to_string(), "new.png".to_string()];
        let mut warnings = Vec::new();

        let ops = member_ops(&images, "new", &mut warnings);

        assert!(ops.is_empty());
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn describe_lists_every_step() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let bundle = write_bundle(
            root,
            "logo",
            &["logo.png"],
            Some(json!({"images": [entry(Some("logo.png"), "2x")]})),
        );
        let config = Defaults::default().assets;

        let plan = AssetRelocator::new(root, &config)
            .plan(&bundle, "logo", "p_logo")
            .unwrap();

        assert_eq!(
            plan.describe(),
            "logo.imageset → p_logo.imageset\n  copy logo.png → p_logo@2x.png\n  copy logo.png → p_logo@3x.png\n  remove logo.png\n  Contents.json [2x] logo.png → p_logo@2x.png"
        );
    }
}
