//! Run-scoped temporary workspace.
//!
//! Each run gets its own uniquely named directory under a shared parent,
//! so concurrent builds never see each other's intermediate files. The
//! directory is removed when the run ends, whether it succeeded or not.

use crate::error::{BuildError, CleanupError};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Name of the tool subdirectory under the platform temp root.
pub const WORKSPACE_DIR_NAME: &str = "ironproto";

/// Returns the default parent for run workspaces.
#[must_use]
pub fn default_workspace_root() -> PathBuf {
    std::env::temp_dir().join(WORKSPACE_DIR_NAME)
}

/// A temporary directory owned by one build run.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    released: bool,
}

impl Workspace {
    /// Creates a fresh `run-*` directory under `parent`, creating `parent`
    /// if needed.
    ///
    /// # Errors
    /// Returns `BuildError::Workspace` if the directory cannot be created.
    pub fn create(parent: &Path) -> Result<Self, BuildError> {
        let to_error = |source| BuildError::Workspace {
            parent: parent.to_path_buf(),
            source,
        };
        std::fs::create_dir_all(parent).map_err(to_error)?;
        let dir = tempfile::Builder::new()
            .prefix("run-")
            .tempdir_in(parent)
            .map_err(to_error)?;
        let path = dir.keep();
        debug!(path = %path.display(), "created workspace");
        Ok(Self {
            path,
            released: false,
        })
    }

    /// Returns the workspace directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the workspace and everything in it.
    ///
    /// # Errors
    /// Returns `CleanupError` for the first entry that could not be removed.
    pub fn release(mut self) -> Result<(), CleanupError> {
        self.released = true;
        let result = remove_tree(&self.path);
        if result.is_ok() {
            debug!(path = %self.path.display(), "removed workspace");
        }
        result
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = remove_tree(&self.path) {
            warn!(error = %err, "failed to remove workspace");
        }
    }
}

/// Runs `f` inside a fresh workspace and removes the workspace afterwards.
///
/// Cleanup also happens if `f` panics. A cleanup failure is returned next to
/// the result instead of replacing it.
///
/// # Errors
/// Returns `BuildError::Workspace` if the workspace cannot be created; `f`
/// is not called in that case.
pub fn with_workspace<R, F>(parent: &Path, f: F) -> Result<(R, Option<CleanupError>), BuildError>
where
    F: FnOnce(&Workspace) -> R,
{
    let workspace = Workspace::create(parent)?;
    let result = f(&workspace);
    let cleanup = workspace.release().err();
    if let Some(err) = &cleanup {
        warn!(error = %err, "workspace cleanup failed");
    }
    Ok((result, cleanup))
}

/// Deletes `path` and everything below it, children before parents.
///
/// Stops at the first entry that cannot be removed; entries after it are
/// left in place.
///
/// # Errors
/// Returns `CleanupError` naming the entry that could not be removed.
pub fn remove_tree(path: &Path) -> Result<(), CleanupError> {
    for entry in WalkDir::new(path).follow_links(false).contents_first(true) {
        let entry = entry.map_err(|err| CleanupError {
            path: err.path().unwrap_or(path).to_path_buf(),
            source: err.into(),
        })?;
        let removed = if entry.file_type().is_dir() {
            std::fs::remove_dir(entry.path())
        } else {
            std::fs::remove_file(entry.path())
        };
        removed.map_err(|source| CleanupError {
            path: entry.path().to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_create_unique_directories() {
        let parent = tempfile::tempdir().unwrap();
        let first = Workspace::create(parent.path()).unwrap();
        let second = Workspace::create(parent.path()).unwrap();

        assert!(first.path().is_dir());
        assert!(second.path().is_dir());
        assert_ne!(first.path(), second.path());
        assert!(first.path().starts_with(parent.path()));
        let name = first.path().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("run-"));
    }

    #[test]
    fn test_create_makes_missing_parents() {
        let parent = tempfile::tempdir().unwrap();
        let nested = parent.path().join("a/b");
        let workspace = Workspace::create(&nested).unwrap();
        assert!(workspace.path().starts_with(&nested));
    }

    #[test]
    fn test_release_removes_contents() {
        let parent = tempfile::tempdir().unwrap();
        let workspace = Workspace::create(parent.path()).unwrap();
        let path = workspace.path().to_path_buf();
        fs::create_dir_all(path.join("x/y")).unwrap();
        fs::write(path.join("x/y/z.schema"), "{}").unwrap();
        fs::write(path.join("top.schema"), "{}").unwrap();

        workspace.release().unwrap();
        assert!(!path.exists());
        assert!(parent.path().exists());
    }

    #[test]
    fn test_drop_removes_directory() {
        let parent = tempfile::tempdir().unwrap();
        let path = {
            let workspace = Workspace::create(parent.path()).unwrap();
            fs::write(workspace.path().join("f"), "x").unwrap();
            workspace.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_with_workspace_cleans_up() {
        let parent = tempfile::tempdir().unwrap();
        let (seen, cleanup) = with_workspace(parent.path(), |workspace| {
            fs::write(workspace.path().join("a.schema"), "{}").unwrap();
            workspace.path().to_path_buf()
        })
        .unwrap();

        assert!(cleanup.is_none());
        assert!(!seen.exists());
    }

    #[test]
    fn test_with_workspace_cleans_up_on_panic() {
        let parent = tempfile::tempdir().unwrap();
        let parent_path = parent.path().to_path_buf();
        let result = std::panic::catch_unwind(|| {
            let _ = with_workspace(&parent_path, |_| -> u8 { panic!("boom") });
        });
        assert!(result.is_err());
        assert_eq!(fs::read_dir(parent.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_with_workspace_creation_failure() {
        let parent = tempfile::tempdir().unwrap();
        let blocker = parent.path().join("blocker");
        fs::write(&blocker, "file").unwrap();

        let mut called = false;
        let err = with_workspace(&blocker, |_| called = true).unwrap_err();
        assert!(matches!(err, BuildError::Workspace { .. }));
        assert!(!called);
    }

    #[test]
    fn test_remove_tree_missing_path_fails() {
        let parent = tempfile::tempdir().unwrap();
        let err = remove_tree(&parent.path().join("absent")).unwrap_err();
        assert_eq!(err.path, parent.path().join("absent"));
    }

    #[test]
    fn test_remove_tree_single_file() {
        let parent = tempfile::tempdir().unwrap();
        let file = parent.path().join("lone");
        fs::write(&file, "x").unwrap();
        remove_tree(&file).unwrap();
        assert!(!file.exists());
    }

    #[test]
    fn test_default_workspace_root() {
        assert!(default_workspace_root().ends_with(WORKSPACE_DIR_NAME));
    }
}
