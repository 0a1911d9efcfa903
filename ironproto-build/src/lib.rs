//! # IronProto Build
//!
//! Build-time compilation of protocol sources into Rust.
//!
//! A run discovers `.idl` and `.schema` files under a source directory,
//! lowers interface definitions into canonical schemas inside a run-scoped
//! temporary workspace, and generates Rust sources for every schema. The
//! first failing file stops the run.
//!
//! This crate provides:
//! - File discovery over include/exclude globs
//! - The staged compiler and its collaborator traits
//! - The run-scoped workspace and its cleanup
//! - [`ProtocolCompiler`], the entry point for build scripts and the CLI

pub mod builder;
pub mod collaborators;
pub mod compiler;
pub mod discover;
pub mod error;
pub mod host;
pub mod stage;
pub mod workspace;

pub use builder::{BuildReport, DEFAULT_OUTPUT_DIR, DEFAULT_SOURCE_DIR, ProtocolCompiler};
pub use collaborators::{Generation, IdlLowering, Lowering, RustGeneration};
pub use compiler::{BatchOutcome, CompiledFile, StagedCompiler};
pub use discover::{CandidateFile, SourceSpec, discover};
pub use error::{BuildError, CleanupError, CompilationFailure, FailureCause};
pub use host::{BuildHost, CargoHost, NoopHost};
pub use stage::PipelineStage;
pub use workspace::{Workspace, remove_tree, with_workspace};
