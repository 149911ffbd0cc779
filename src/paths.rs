//! Dylib reference resolution.

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};

/// Placeholders that [`resolve_dylib_path`] expands against the referencing
/// binary's directory.
const PLACEHOLDERS: &[&str] = &["@loader_path", "@rpath"];

/// Resolve a `@loader_path/...` or `@rpath/...` reference to a real path.
///
/// The remainder after the placeholder is joined to the directory containing
/// `referrer`. If that file exists the joined path is returned, otherwise the
/// reference comes back unchanged. Absolute paths and anything else without a
/// `<placeholder>/<rest>` shape are also returned unchanged.
#[must_use]
pub fn resolve_dylib_path(reference: &str, referrer: &Path) -> String {
    let Some((head, rest)) = reference.split_once('/') else {
        return reference.to_string();
    };
    if PLACEHOLDERS.contains(&head) {
        // A leading `/` in the remainder must not make the join absolute
        let candidate = parent_dir(referrer).join(rest.trim_start_matches('/'));
        if candidate.exists() {
            return candidate.to_string_lossy().into_owned();
        }
    }
    reference.to_string()
}

/// Compute the `@loader_path/...` reference that `binary` should use for `target`.
///
/// Both paths are made absolute against the current directory and have their
/// `..` components folded first, so `../build/A` and `/work/x/../bin/A` work
/// the same as plain absolute paths.
pub fn loader_relative_path(target: &Path, binary: &Path) -> Result<String> {
    let target = std::path::absolute(target)
        .map(|path| normalize(&path))
        .with_context(|| format!("Failed to make {} absolute", target.display()))?;
    let base = std::path::absolute(parent_dir(binary))
        .map(|path| normalize(&path))
        .with_context(|| format!("Failed to make {} absolute", binary.display()))?;
    let relative = pathdiff::diff_paths(&target, &base).with_context(|| {
        format!(
            "No relative path from {} to {}",
            base.display(),
            target.display()
        )
    })?;
    Ok(format!("@loader_path/{}", relative.display()))
}

/// Lexically drop `.` and fold `..` into its parent.
///
/// Symlinks are not consulted; `..` at the root stays at the root.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Directory containing `path`, with `.` for bare file names.
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
