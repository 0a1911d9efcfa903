//! Source file discovery over include/exclude patterns.

use crate::error::BuildError;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ironproto_schema::{IDL_EXTENSION, SCHEMA_EXTENSION};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Include patterns used when none are configured.
#[must_use]
pub fn default_includes() -> Vec<String> {
    vec![
        format!("**/*.{SCHEMA_EXTENSION}"),
        format!("**/*.{IDL_EXTENSION}"),
    ]
}

/// Where to look for protocol sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    root: PathBuf,
    includes: Vec<String>,
    excludes: Vec<String>,
}

impl SourceSpec {
    /// Creates a spec for `root` with the default patterns.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            includes: Vec::new(),
            excludes: Vec::new(),
        }
    }

    /// Adds an include pattern. The first one replaces the defaults.
    #[must_use]
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.includes.push(pattern.into());
        self
    }

    /// Adds an exclude pattern.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excludes.push(pattern.into());
        self
    }

    /// Adds several include patterns.
    #[must_use]
    pub fn includes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.includes.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Adds several exclude patterns.
    #[must_use]
    pub fn excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excludes.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Returns the source root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the effective include patterns.
    #[must_use]
    pub fn include_patterns(&self) -> Vec<String> {
        if self.includes.is_empty() {
            default_includes()
        } else {
            self.includes.clone()
        }
    }

    /// Returns the exclude patterns.
    #[must_use]
    pub fn exclude_patterns(&self) -> &[String] {
        &self.excludes
    }
}

/// A matched source file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CandidateFile {
    /// Path relative to the source root, `/`-separated.
    pub relative_path: String,
    /// Absolute (root-joined) path.
    pub absolute_path: PathBuf,
}

/// Resolves a source spec into candidate files, sorted by relative path.
///
/// A missing root is not an error: it yields no files.
///
/// # Errors
/// Returns `BuildError::Match` for malformed patterns and
/// `BuildError::Walk` if traversal fails.
pub fn discover(spec: &SourceSpec) -> Result<Vec<CandidateFile>, BuildError> {
    let root = spec.root();
    if !root.is_dir() {
        debug!(root = %root.display(), "source directory missing, nothing to do");
        return Ok(Vec::new());
    }

    let include = compile_globset(&spec.include_patterns())?;
    let exclude = compile_globset(spec.exclude_patterns())?;

    let mut collected = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry?;
        if !is_candidate_entry(&entry) {
            continue;
        }
        let Some(relative) = relative_path(entry.path(), root) else {
            continue;
        };
        if should_keep(&relative, include.as_ref(), exclude.as_ref()) {
            collected.push(CandidateFile {
                relative_path: relative,
                absolute_path: entry.path().to_path_buf(),
            });
        }
    }

    collected.sort();
    info!(
        root = %root.display(),
        files = collected.len(),
        "discovered protocol sources"
    );
    Ok(collected)
}

/// Regular files and symlinks to regular files. Symlinked directories are
/// never descended into.
fn is_candidate_entry(entry: &walkdir::DirEntry) -> bool {
    let file_type = entry.file_type();
    if file_type.is_file() {
        return true;
    }
    file_type.is_symlink()
        && std::fs::metadata(entry.path()).is_ok_and(|meta| meta.is_file())
}

/// Slash-joined path of `path` below `root`. Entries whose path is not
/// valid UTF-8 cannot be matched faithfully and are skipped with a warning.
fn relative_path(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut segments = Vec::new();
    for component in relative.components() {
        let Component::Normal(segment) = component else {
            continue;
        };
        let Some(segment) = segment.to_str() else {
            warn!(path = %path.display(), "skipping source with non-UTF-8 path");
            return None;
        };
        segments.push(segment);
    }
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

fn compile_globset(patterns: &[String]) -> Result<Option<GlobSet>, BuildError> {
    let mut builder = GlobSetBuilder::new();
    let mut added = false;

    for pattern in patterns {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            continue;
        }

        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| BuildError::Match {
                pattern: pattern.to_string(),
                source,
            })?;
        builder.add(glob);
        added = true;
    }

    if added {
        builder.build().map(Some).map_err(|source| BuildError::Match {
            pattern: patterns.join(", "),
            source,
        })
    } else {
        Ok(None)
    }
}

/// Excludes win over includes; no include set matches nothing.
fn should_keep(relative: &str, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    if exclude.is_some_and(|set| set.is_match(relative)) {
        return false;
    }
    include.is_some_and(|set| set.is_match(relative))
}
