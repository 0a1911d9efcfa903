//! Pipeline stage classification.

use ironproto_schema::{IDL_EXTENSION, SCHEMA_EXTENSION};
use std::fmt;
use std::path::Path;

/// Where a source file enters the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    /// Interface-definition text that must be lowered first.
    InterfaceDefinition,
    /// Canonical schema, ready for generation.
    CanonicalSchema,
}

impl PipelineStage {
    /// Classifies a file by its extension.
    ///
    /// Only `.idl` files are lowered. Anything else an include pattern let
    /// through goes straight to the generator.
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext == IDL_EXTENSION => Self::InterfaceDefinition,
            _ => Self::CanonicalSchema,
        }
    }

    /// Returns true if files of this stage go through lowering.
    #[must_use]
    pub const fn needs_lowering(self) -> bool {
        matches!(self, Self::InterfaceDefinition)
    }

    /// Returns the stage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InterfaceDefinition => "interface-definition",
            Self::CanonicalSchema => "canonical-schema",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the workspace-relative path a lowered file is written to:
/// the source's relative path with its extension replaced.
#[must_use]
pub fn lowered_path(relative_path: &str) -> String {
    let (dir, file) = match relative_path.rfind('/') {
        Some(idx) => (&relative_path[..=idx], &relative_path[idx + 1..]),
        None => ("", relative_path),
    };
    let stem = match file.rfind('.') {
        Some(dot) if dot > 0 => &file[..dot],
        _ => file,
    };
    format!("{dir}{stem}.{SCHEMA_EXTENSION}")
}
