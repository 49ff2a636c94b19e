//! On-disk snippet store: save, read, patch, soft-delete.
//!
//! The store holds nothing in memory beyond the canonicalized root path and
//! the save policy; every operation re-reads and re-writes the filesystem.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::directive::ReplaceDirective;
use crate::error::StoreError;
use crate::paths::resolve_under_root;
use crate::policy::ensure_allowed;
use crate::replace;

/// Subdirectory under the storage root holding soft-deleted files.
pub const TRASH_DIR: &str = ".trash";

/// Save semantics for an existing file, chosen per deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SavePolicy {
    /// Idempotent: saves succeed whether or not the file exists.
    #[default]
    Overwrite,
    /// Saves fail with `FileAlreadyExists` when the file is present.
    CreateOnly,
}

#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    save_policy: SavePolicy,
}

impl FileStore {
    /// Opens a store rooted at `root`, creating the directory if absent.
    pub fn open(root: impl Into<PathBuf>, save_policy: SavePolicy) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let root = fs::canonicalize(&root)?;
        Ok(Self { root, save_policy })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn save_policy(&self) -> SavePolicy {
        self.save_policy
    }

    /// Writes `content` to `filename`. Returns true when the file was
    /// created, false when an existing file was overwritten.
    pub fn save(&self, filename: &str, content: &str) -> Result<bool, StoreError> {
        let path = self.entry_path(filename)?;
        let existed = path.exists();
        if existed && self.save_policy == SavePolicy::CreateOnly {
            return Err(StoreError::FileAlreadyExists {
                filename: filename.to_string(),
            });
        }
        self.write_atomic(&path, content)?;
        tracing::debug!(filename, created = !existed, "saved snippet");
        Ok(!existed)
    }

    /// Returns the full file content as text.
    pub fn read(&self, filename: &str) -> Result<String, StoreError> {
        let path = self.existing_path(filename)?;
        Ok(fs::read_to_string(&path)?)
    }

    /// Applies a sed-style find/replace command to an existing file and
    /// persists the result. A command that changes nothing is rejected with
    /// `NoEffectiveChange` rather than silently accepted.
    pub fn patch(&self, filename: &str, command: &str) -> Result<String, StoreError> {
        let path = self.existing_path(filename)?;
        let directive = ReplaceDirective::parse(command)?;
        let current = fs::read_to_string(&path)?;
        let outcome = replace::apply(&directive, &current);
        if !outcome.changed {
            return Err(StoreError::NoEffectiveChange);
        }
        self.write_atomic(&path, &outcome.content)?;
        tracing::debug!(filename, command, "patched snippet");
        Ok(outcome.content)
    }

    /// Soft delete: renames the file into the trash namespace, creating it
    /// lazily. A same-named trash entry is never overwritten; the incoming
    /// file gets the first free numbered sibling name instead.
    pub fn trash(&self, filename: &str) -> Result<PathBuf, StoreError> {
        let path = self.existing_path(filename)?;
        let trash_dir = self.root.join(TRASH_DIR);
        fs::create_dir_all(&trash_dir)?;
        let target = free_trash_slot(&trash_dir, filename);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&path, &target)?;
        tracing::info!(filename, target = %target.display(), "moved snippet to trash");
        Ok(target)
    }

    /// Resolves an entry that must already exist, after the policy and
    /// confinement gates.
    pub fn existing_path(&self, filename: &str) -> Result<PathBuf, StoreError> {
        let path = self.entry_path(filename)?;
        if !path.is_file() {
            return Err(StoreError::FileNotFound {
                filename: filename.to_string(),
            });
        }
        Ok(path)
    }

    /// Absolute path for an entry, after the policy and confinement gates.
    /// The trash namespace is not addressable through the store.
    fn entry_path(&self, filename: &str) -> Result<PathBuf, StoreError> {
        ensure_allowed(filename)?;
        let path = resolve_under_root(&self.root, filename)?;
        if path.starts_with(self.root.join(TRASH_DIR)) {
            return Err(StoreError::InvalidInput(format!(
                "filename '{filename}' addresses the trash namespace"
            )));
        }
        Ok(path)
    }

    fn write_atomic(&self, path: &Path, content: &str) -> Result<(), StoreError> {
        let parent = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent)?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(path).map_err(|err| StoreError::Io(err.error))?;
        Ok(())
    }
}

fn free_trash_slot(trash_dir: &Path, filename: &str) -> PathBuf {
    let direct = trash_dir.join(filename);
    if !direct.exists() {
        return direct;
    }
    let (stem, ext) = split_suffix(filename);
    let mut n = 1u32;
    loop {
        let candidate = trash_dir.join(format!("{stem}.{n}{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Splits off the final `.ext` so numbered trash names keep the suffix.
fn split_suffix(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(idx) => (&filename[..idx], &filename[idx..]),
        None => (filename, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::split_suffix;

    #[test]
    fn split_suffix_keeps_extension() {
        assert_eq!(split_suffix("hello.jac"), ("hello", ".jac"));
        assert_eq!(split_suffix("a.b.py"), ("a.b", ".py"));
    }
}
