//! Filesystem collaborator for the container writer
//!
//! Owns the overwrite-or-abort decision and nested output directory
//! creation so the writer itself never talks to the user.

use crate::error::WriterError;
use std::io::{self, Write};
use std::path::Path;

/// Decides whether an existing file at the target path may be deleted.
pub trait OverwritePolicy {
    fn allow_overwrite(&self, path: &Path) -> bool;
}

/// Always overwrite without asking (the `silent` configuration flag).
pub struct SilentOverwrite;

impl OverwritePolicy for SilentOverwrite {
    fn allow_overwrite(&self, _path: &Path) -> bool {
        true
    }
}

/// Ask on the terminal; anything but an explicit yes declines.
pub struct InteractiveOverwrite;

impl OverwritePolicy for InteractiveOverwrite {
    fn allow_overwrite(&self, path: &Path) -> bool {
        eprint!("Delete the existing file '{}'? [y/N] ", path.display());
        let _ = io::stderr().flush();

        let mut answer = String::new();
        if io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

/// Make `path` writable as a fresh file: consult the policy for an existing
/// file (deleting it when allowed) and create missing parent directories.
pub fn prepare_path(path: &Path, policy: &dyn OverwritePolicy) -> Result<(), WriterError> {
    if path.exists() {
        if !policy.allow_overwrite(path) {
            return Err(WriterError::OverwriteDeclined {
                path: path.to_path_buf(),
            });
        }
        std::fs::remove_file(path).map_err(|source| WriterError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Deleted existing file {:?}", path);
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| WriterError::OpenFailed {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DeclineAll;
    impl OverwritePolicy for DeclineAll {
        fn allow_overwrite(&self, _path: &Path) -> bool {
            false
        }
    }

    #[test]
    fn prepare_creates_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a/b/c/out.wav");
        prepare_path(&target, &SilentOverwrite).unwrap();
        assert!(target.parent().unwrap().is_dir());
    }

    #[test]
    fn declined_overwrite_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.wav");
        std::fs::write(&target, b"keep me").unwrap();

        let err = prepare_path(&target, &DeclineAll).unwrap_err();
        assert!(matches!(err, WriterError::OverwriteDeclined { .. }));
        assert_eq!(std::fs::read(&target).unwrap(), b"keep me");
    }

    #[test]
    fn silent_overwrite_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.wav");
        std::fs::write(&target, b"old").unwrap();
        prepare_path(&target, &SilentOverwrite).unwrap();
        assert!(!target.exists());
    }
}
