//! Staged compilation of discovered protocol sources.
//!
//! Each file is classified by extension. Interface definitions are lowered
//! into a canonical schema inside the run workspace, then every file is
//! handed to the generator. The first failure ends the batch.

use crate::collaborators::{Generation, IdlLowering, Lowering, RustGeneration};
use crate::discover::CandidateFile;
use crate::error::{CompilationFailure, FailureCause};
use crate::stage::{PipelineStage, lowered_path};
use crate::workspace::Workspace;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// A file that made it through every applicable stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFile {
    /// Path relative to the source directory.
    pub relative_path: String,
    /// Stage the file entered the pipeline at.
    pub stage: PipelineStage,
    /// Canonical schema written to the workspace, for lowered files.
    pub lowered: Option<PathBuf>,
}

/// Result of compiling a batch.
#[derive(Debug)]
pub enum BatchOutcome {
    /// Every file compiled.
    Success {
        /// Files in processing order.
        compiled: Vec<CompiledFile>,
    },
    /// A file failed; files after it were not attempted.
    Failure {
        /// Files compiled before the failure.
        compiled: Vec<CompiledFile>,
        /// The failing file.
        failure: CompilationFailure,
    },
}

impl BatchOutcome {
    /// Returns the files that compiled.
    #[must_use]
    pub fn compiled(&self) -> &[CompiledFile] {
        match self {
            Self::Success { compiled } | Self::Failure { compiled, .. } => compiled,
        }
    }

    /// Returns true if the whole batch compiled.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Converts into a `Result`, dropping partial successes on failure.
    ///
    /// # Errors
    /// Returns the failure of a failed batch.
    pub fn into_result(self) -> Result<Vec<CompiledFile>, CompilationFailure> {
        match self {
            Self::Success { compiled } => Ok(compiled),
            Self::Failure { failure, .. } => Err(failure),
        }
    }
}

/// Drives files through lowering and generation, one at a time.
pub struct StagedCompiler<L = IdlLowering, G = RustGeneration> {
    lowering: L,
    generation: G,
}

impl StagedCompiler {
    /// Creates a compiler with the built-in IDL parser and Rust generator.
    #[must_use]
    pub fn new() -> Self {
        Self::with_collaborators(IdlLowering, RustGeneration)
    }
}

impl Default for StagedCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Lowering, G: Generation> StagedCompiler<L, G> {
    /// Creates a compiler with custom collaborators.
    #[must_use]
    pub fn with_collaborators(lowering: L, generation: G) -> Self {
        Self {
            lowering,
            generation,
        }
    }

    /// Compiles `files` in order, stopping at the first failure.
    ///
    /// # Arguments
    /// * `files` - Discovered sources, in processing order
    /// * `workspace` - Run workspace receiving lowered schemas
    /// * `output_dir` - Directory the generator writes into
    ///
    /// # Returns
    /// `BatchOutcome::Success` with every file, or `BatchOutcome::Failure`
    /// with the files compiled before the failing one.
    pub fn compile(
        &self,
        files: &[CandidateFile],
        workspace: &Workspace,
        output_dir: &Path,
    ) -> BatchOutcome {
        let mut compiled = Vec::with_capacity(files.len());

        for file in files {
            match self.compile_file(file, workspace, output_dir) {
                Ok(done) => compiled.push(done),
                Err(failure) => {
                    error!(
                        file = %failure.filename,
                        stage = %failure.stage,
                        error = %failure.cause,
                        "protocol compilation failed"
                    );
                    return BatchOutcome::Failure { compiled, failure };
                }
            }
        }

        info!(files = compiled.len(), output = %output_dir.display(), "compiled protocols");
        BatchOutcome::Success { compiled }
    }

    fn compile_file(
        &self,
        file: &CandidateFile,
        workspace: &Workspace,
        output_dir: &Path,
    ) -> Result<CompiledFile, CompilationFailure> {
        let stage = PipelineStage::for_path(Path::new(&file.relative_path));
        let fail = |cause| CompilationFailure::new(stage, &file.relative_path, output_dir, cause);
        debug!(file = %file.relative_path, %stage, "compiling");

        let lowered = match stage {
            PipelineStage::InterfaceDefinition => {
                Some(self.lower(file, workspace).map_err(fail)?)
            }
            PipelineStage::CanonicalSchema => None,
        };

        let input = lowered.as_deref().unwrap_or(&file.absolute_path);
        self.generation
            .generate(input, output_dir)
            .map_err(|err| fail(FailureCause::Generation(err)))?;

        Ok(CompiledFile {
            relative_path: file.relative_path.clone(),
            stage,
            lowered,
        })
    }

    /// Lowers one interface definition into the workspace and returns the
    /// written schema path.
    fn lower(&self, file: &CandidateFile, workspace: &Workspace) -> Result<PathBuf, FailureCause> {
        let text = std::fs::read_to_string(&file.absolute_path).map_err(FailureCause::Io)?;
        let protocol = self.lowering.lower(&text).map_err(FailureCause::Lowering)?;

        let target = workspace.path().join(lowered_path(&file.relative_path));
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(FailureCause::Io)?;
        }
        std::fs::write(&target, protocol.to_canonical_string()).map_err(FailureCause::Io)?;
        debug!(file = %file.relative_path, lowered = %target.display(), "lowered");
        Ok(target)
    }
}
