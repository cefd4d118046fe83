use crate::error::{Error, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Base config directory (~/.config/asset-rename/, %APPDATA%\asset-rename on Windows)
pub fn config_dir() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected(
                "APPDATA environment variable not set on Windows".to_string(),
            )
        })?;
        Ok(PathBuf::from(appdata).join("asset-rename"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected(
                "HOME environment variable not set on Unix-like system".to_string(),
            )
        })?;
        Ok(PathBuf::from(home).join(".config").join("asset-rename"))
    }
}

/// Global config.json path
pub fn config_json() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.json"))
}

/// Expand `~` in a user-supplied path.
pub fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

/// Expand a user-supplied path and require that it exists.
pub fn existing(field: &str, path: &str) -> Result<PathBuf> {
    let expanded = expand(path);
    if !expanded.exists() {
        return Err(Error::path_not_found(field, path));
    }
    Ok(expanded)
}

/// Path relative to `root` for display, falling back to the full path.
pub fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}
