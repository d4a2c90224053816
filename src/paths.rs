use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_DIR: &str = "genvid-tui";

pub fn data_root() -> Result<PathBuf> {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .context("unable to determine user data directory")
}

/// Location of `file` inside the per-user application directory.
pub fn scoped_path(file: &str) -> Result<PathBuf> {
    Ok(data_root()?.join(APP_DIR).join(file))
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating data directory {}", parent.display()))?;
    }
    Ok(())
}

pub fn write_json<T: serde::Serialize>(path: &Path, value: &T, what: &str) -> Result<()> {
    ensure_parent_dir(path)?;
    let payload =
        serde_json::to_string_pretty(value).with_context(|| format!("failed serializing {what}"))?;
    let staging = staging_path(path);
    fs::write(&staging, payload)
        .with_context(|| format!("failed writing {what} at {}", staging.display()))?;
    fs::rename(&staging, path)
        .with_context(|| format!("failed replacing {what} at {}", path.display()))?;
    Ok(())
}

/// Sibling file that receives a full payload before it replaces `path`.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading {what} at {}", path.display()))?;
    serde_json::from_str::<T>(&raw)
        .with_context(|| format!("failed parsing {what} at {}", path.display()))
}
