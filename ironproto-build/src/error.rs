//! Error types for the protocol build pipeline.

use crate::stage::PipelineStage;
use ironproto_codegen::CodegenError;
use ironproto_schema::ParseError;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for a protocol build run.
///
/// A missing source directory is not an error; the run simply has nothing
/// to do.
#[derive(Debug, Error)]
pub enum BuildError {
    /// An include or exclude pattern is malformed.
    #[error("invalid glob pattern '{pattern}': {source}")]
    Match {
        /// The offending pattern.
        pattern: String,
        /// Underlying glob error.
        #[source]
        source: globset::Error,
    },

    /// Source tree traversal failed.
    #[error("failed to walk source directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// An interface-definition file could not be lowered.
    #[error(transparent)]
    Lowering(Box<CompilationFailure>),

    /// A canonical schema could not be turned into sources.
    #[error(transparent)]
    Generation(Box<CompilationFailure>),

    /// The temporary workspace could not be created.
    #[error("failed to create workspace under {}: {source}", .parent.display())]
    Workspace {
        /// Directory the workspace was to be created in.
        parent: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid build configuration.
    #[error("configuration error: {message}")]
    Config {
        /// Error message.
        message: String,
    },
}

impl BuildError {
    /// Creates a configuration error with the given message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns the failing file and stage for pipeline failures.
    #[must_use]
    pub fn failure(&self) -> Option<&CompilationFailure> {
        match self {
            Self::Lowering(failure) | Self::Generation(failure) => Some(failure),
            _ => None,
        }
    }
}

impl From<CompilationFailure> for BuildError {
    fn from(failure: CompilationFailure) -> Self {
        match failure.stage {
            PipelineStage::InterfaceDefinition => Self::Lowering(Box::new(failure)),
            PipelineStage::CanonicalSchema => Self::Generation(Box::new(failure)),
        }
    }
}

/// Why a single file failed to compile.
#[derive(Debug, Error)]
pub enum FailureCause {
    /// The interface-definition text did not parse.
    #[error(transparent)]
    Lowering(ParseError),

    /// Reading the source or writing the lowered schema failed.
    #[error(transparent)]
    Io(std::io::Error),

    /// The generator rejected the canonical schema or could not write.
    #[error(transparent)]
    Generation(CodegenError),
}

/// The first failure of a batch, with full context.
#[derive(Debug)]
pub struct CompilationFailure {
    /// Stage of the failing file.
    pub stage: PipelineStage,
    /// Path of the failing file relative to the source directory.
    pub filename: String,
    /// Output directory of the run.
    pub output_directory: PathBuf,
    /// Underlying cause.
    pub cause: FailureCause,
}

impl CompilationFailure {
    /// Creates a failure record.
    pub fn new(
        stage: PipelineStage,
        filename: impl Into<String>,
        output_directory: &Path,
        cause: FailureCause,
    ) -> Self {
        Self {
            stage,
            filename: filename.into(),
            output_directory: output_directory.to_path_buf(),
            cause,
        }
    }
}

impl fmt::Display for CompilationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self.cause {
            FailureCause::Lowering(_) => "error parsing interface definition",
            _ => "error compiling protocol file",
        };
        write!(
            f,
            "{} {} to {} ({} stage)",
            action,
            self.filename,
            self.output_directory.display(),
            self.stage
        )
    }
}

impl std::error::Error for CompilationFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

/// Workspace removal failed part way.
///
/// Never fatal: generated sources already exist by the time cleanup runs.
#[derive(Debug, Error)]
#[error("failed to remove {}: {source}", .path.display())]
pub struct CleanupError {
    /// Path that could not be removed.
    pub path: PathBuf,
    /// Underlying IO error.
    #[source]
    pub source: std::io::Error,
}
