//! Executable resolution.
//!
//! Maps a name or path to an absolute path of an existing executable file.
//! Nothing is cached: every call looks at the filesystem again.

use crate::error::{ExecError, Result};
use crate::logging::RESOLVE_TARGET;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Resolve `name` against the process PATH.
pub fn resolve_executable(name: &str) -> Result<PathBuf> {
    let path_var = std::env::var_os("PATH");
    resolve_with(name, path_var.as_deref(), &[])
}

/// Resolve `name` against `extra_dirs` followed by the entries of `path_var`.
///
/// - absolute paths are validated and returned unchanged
/// - relative paths with a directory component are checked against the
///   current directory
/// - bare names are searched for, first match wins
pub fn resolve_with(name: &str, path_var: Option<&OsStr>, extra_dirs: &[PathBuf]) -> Result<PathBuf> {
    let candidate = Path::new(name);

    if candidate.is_absolute() {
        return check_explicit(name, candidate.to_path_buf());
    }

    if candidate.components().count() > 1 {
        let cwd = std::env::current_dir().map_err(|e| {
            ExecError::not_found(name, Vec::new()).with_source(e)
        })?;
        return check_explicit(name, cwd.join(candidate));
    }

    let mut searched = Vec::new();
    let path_dirs = path_var
        .map(|value| std::env::split_paths(value).collect::<Vec<_>>())
        .unwrap_or_default();

    for dir in extra_dirs.iter().cloned().chain(path_dirs) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        let full = dir.join(name);
        if is_executable(&full) {
            tracing::debug!(target: RESOLVE_TARGET, name, path = %full.display(), "found executable");
            return Ok(full);
        }
        searched.push(dir);
    }

    tracing::debug!(target: RESOLVE_TARGET, name, searched = searched.len(), "executable not found");
    Err(ExecError::not_found(name, searched))
}

fn check_explicit(name: &str, path: PathBuf) -> Result<PathBuf> {
    let parent = || path.parent().map(Path::to_path_buf).into_iter().collect::<Vec<_>>();

    let metadata = match std::fs::metadata(&path) {
        Ok(metadata) => metadata,
        Err(_) => return Err(ExecError::not_found(name, Vec::new())),
    };

    if !metadata.is_file() {
        return Err(ExecError::not_found(name, parent()));
    }

    if !has_execute_bit(&metadata) {
        return Err(ExecError::permission_denied(name, parent(), file_mode(&metadata)));
    }

    tracing::debug!(target: RESOLVE_TARGET, path = %path.display(), "using explicit executable path");
    Ok(path)
}

/// True if `path` is a regular file with at least one execute bit set.
pub fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && has_execute_bit(&m))
        .unwrap_or(false)
}

#[cfg(unix)]
fn has_execute_bit(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn has_execute_bit(_metadata: &std::fs::Metadata) -> bool {
    true
}

#[cfg(unix)]
fn file_mode(metadata: &std::fs::Metadata) -> Option<String> {
    use std::os::unix::fs::PermissionsExt;
    Some(format!("{:o}", metadata.permissions().mode() & 0o7777))
}

#[cfg(not(unix))]
fn file_mode(_metadata: &std::fs::Metadata) -> Option<String> {
    None
}
