//! Prelude module for convenient imports.
//!
//! ```ignore
//! use ironproto::prelude::*;
//! ```

// Schema types
pub use ironproto_schema::{
    Field, Message, ParseError, Protocol, ProtocolIr, Schema, SchemaError, TypeDef,
};
pub use ironproto_schema::{parse_idl, parse_protocol};

// Code generation
pub use ironproto_codegen::{CodegenError, Generator};

// Build pipeline
pub use ironproto_build::{
    BuildError, BuildHost, BuildReport, CargoHost, Generation, Lowering, NoopHost, PipelineStage,
    ProtocolCompiler, SourceSpec,
};
