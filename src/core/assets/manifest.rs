//! Bundle manifest (`Contents.json`) planning and rewriting.
//!
//! Only the `filename` of `images[]` entries that carry both `filename` and
//! `scale` is ever changed; every other field and the key order survive.

use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use super::scale::Scale;
use crate::error::{Error, Result};
use crate::utils::io;

const FALLBACK_EXTENSION: &str = ".png";

/// A planned change to one `images[]` entry. `to: None` drops the filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEdit {
    pub index: usize,
    pub scale: Scale,
    pub from: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

/// Read a manifest, or `None` when the bundle has none.
pub fn read(path: &Path) -> Result<Option<Value>> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = io::read_file(path, &format!("read {}", path.display()))?;
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| Error::internal_json(e.to_string(), Some(format!("parse {}", path.display()))))
}

/// Edits that make every declared filename `new_base + suffix + ext`. With
/// `drop_one_x`, 1x entries lose their filename instead (no 1x file remains).
pub fn plan_edits(manifest: &Value, new_base: &str, drop_one_x: bool) -> Vec<ManifestEdit> {
    let Some(images) = manifest.get("images").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut edits = Vec::new();
    for (index, entry) in images.iter().enumerate() {
        let Some(filename) = entry.get("filename").and_then(Value::as_str) else {
            continue;
        };
        let Some(scale) = entry
            .get("scale")
            .and_then(Value::as_str)
            .and_then(Scale::from_manifest)
        else {
            continue;
        };

        let to = if drop_one_x && scale == Scale::One {
            None
        } else {
            let expected = format!("{}{}{}", new_base, scale.suffix(), extension_of(filename));
            if expected == filename {
                continue;
            }
            Some(expected)
        };

        edits.push(ManifestEdit {
            index,
            scale,
            from: filename.to_string(),
            to,
        });
    }
    edits
}

pub fn apply_edits(manifest: &mut Value, edits: &[ManifestEdit]) {
    let Some(images) = manifest.get_mut("images").and_then(Value::as_array_mut) else {
        return;
    };

    for edit in edits {
        let Some(entry) = images.get_mut(edit.index).and_then(Value::as_object_mut) else {
            continue;
        };
        match &edit.to {
            Some(name) => {
                entry.insert("filename".to_string(), Value::String(name.clone()));
            }
            None => {
                entry.shift_remove("filename");
            }
        }
    }
}

/// `.ext` of a filename, `.png` when it has none.
fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}
