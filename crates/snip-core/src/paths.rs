use std::path::{Component, Path, PathBuf};

use crate::error::StoreError;

/// Resolves `filename` beneath `root` (already canonical) and rejects
/// anything that would land outside it. Lexical first, then a canonical
/// re-check so symlinks cannot escape either.
pub(crate) fn resolve_under_root(root: &Path, filename: &str) -> Result<PathBuf, StoreError> {
    if filename.trim().is_empty() {
        return Err(StoreError::InvalidInput("filename must not be empty".into()));
    }

    let normalized = normalize_lexical(&root.join(filename))?;
    if !normalized.starts_with(root) {
        return Err(StoreError::InvalidInput(format!(
            "filename '{filename}' escapes the storage root"
        )));
    }

    ensure_existing_parent_within_root(root, &normalized)?;
    if normalized.exists() {
        ensure_canonical_within_root(root, &normalized)?;
    }

    Ok(normalized)
}

fn normalize_lexical(path: &Path) -> Result<PathBuf, StoreError> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return Err(StoreError::InvalidInput(format!(
                        "cannot resolve path '{}'",
                        path.to_string_lossy()
                    )));
                }
            }
            Component::Normal(value) => out.push(value),
        }
    }

    if !out.is_absolute() {
        return Err(StoreError::InvalidInput(format!(
            "path '{}' must resolve to an absolute path",
            path.to_string_lossy()
        )));
    }
    Ok(out)
}

fn ensure_existing_parent_within_root(root: &Path, path: &Path) -> Result<(), StoreError> {
    let mut probe = path.to_path_buf();
    while !probe.exists() {
        let Some(parent) = probe.parent() else {
            return Err(StoreError::InvalidInput(format!(
                "path '{}' has no resolvable parent",
                path.to_string_lossy()
            )));
        };
        probe = parent.to_path_buf();
    }

    ensure_canonical_within_root(root, &probe)
}

fn ensure_canonical_within_root(root: &Path, path: &Path) -> Result<(), StoreError> {
    let canonical = std::fs::canonicalize(path)?;
    if !canonical.starts_with(root) {
        return Err(StoreError::InvalidInput(format!(
            "path '{}' escapes the storage root via symlink traversal",
            path.to_string_lossy()
        )));
    }
    Ok(())
}
