//! File I/O primitives with consistent error handling.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Read file contents with standardized error handling.
pub fn read_file(path: &Path, operation: &str) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| Error::internal_io(e.to_string(), Some(operation.to_string())))
}

/// Write content to file atomically (write to .tmp, then rename).
///
/// Readers always see either the old content or the new content, never a
/// partial write.
pub fn write_file_atomic(path: &Path, content: &str, operation: &str) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        Error::internal_io(
            format!("Invalid path: {}", path.display()),
            Some(operation.to_string()),
        )
    })?;

    let filename = path.file_name().ok_or_else(|| {
        Error::internal_io(
            format!("Invalid path: {}", path.display()),
            Some(operation.to_string()),
        )
    })?;

    let tmp_path = parent.join(format!("{}.tmp", filename.to_string_lossy()));

    fs::write(&tmp_path, content).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("{} (write temp)", operation)))
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        Error::internal_io(e.to_string(), Some(format!("{} (rename)", operation)))
    })?;

    Ok(())
}

/// Rename a file or directory, refusing to overwrite an existing target.
pub fn rename_path(from: &Path, to: &Path) -> Result<()> {
    if to.exists() {
        return Err(Error::internal_io(
            format!("Target already exists: {}", to.display()),
            Some(format!("rename {} → {}", from.display(), to.display())),
        ));
    }

    fs::rename(from, to).map_err(|e| {
        Error::internal_io(
            e.to_string(),
            Some(format!("rename {} → {}", from.display(), to.display())),
        )
    })
}

/// Copy a file byte-for-byte.
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to).map(|_| ()).map_err(|e| {
        Error::internal_io(
            e.to_string(),
            Some(format!("copy {} → {}", from.display(), to.display())),
        )
    })
}

/// Create a directory and any missing parents.
pub fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("create {}", path.display()))))
}

/// Remove a single file.
pub fn remove_file(path: &Path) -> Result<()> {
    fs::remove_file(path)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("delete {}", path.display()))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn read_file_succeeds_for_existing_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "test content").unwrap();

        let content = read_file(temp.path(), "test read").unwrap();
        assert!(content.contains("test content"));
    }

    #[test]
    fn read_file_returns_error_for_missing_file() {
        let result = read_file(Path::new("/nonexistent/path.txt"), "test read");
        let err = result.unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
    }

    #[test]
    fn write_file_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "old").unwrap();

        write_file_atomic(&path, "new content", "test write").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new content");
        assert!(!dir.path().join("data.json.tmp").exists());
    }

    #[test]
    fn rename_path_refuses_existing_target() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        fs::write(&a, "a").unwrap();
        fs::write(&b, "b").unwrap();

        assert!(rename_path(&a, &b).is_err());
        assert_eq!(fs::read_to_string(&b).unwrap(), "b");
        assert!(a.exists());
    }

    #[test]
    fn copy_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        fs::write(&a, [1u8, 2, 3]).unwrap();

        copy_file(&a, &b).unwrap();
        remove_file(&a).unwrap();

        assert!(!a.exists());
        assert_eq!(fs::read(&b).unwrap(), vec![1u8, 2, 3]);
    }
}
