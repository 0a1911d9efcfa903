//! The two transformation steps the staged compiler drives.

use ironproto_codegen::CodegenError;
use ironproto_schema::{ParseError, Protocol};
use std::path::Path;

/// Lowers interface-definition text into a protocol.
pub trait Lowering {
    /// Parses `text`, returning the protocol or a positioned parse error.
    ///
    /// # Errors
    /// Returns `ParseError` if the text is not a valid definition.
    fn lower(&self, text: &str) -> Result<Protocol, ParseError>;
}

/// Turns a canonical schema file into sources under an output directory.
pub trait Generation {
    /// Generates sources for `schema_file` into `output_dir`.
    ///
    /// # Errors
    /// Returns `CodegenError` if the schema is invalid or writing fails.
    fn generate(&self, schema_file: &Path, output_dir: &Path) -> Result<(), CodegenError>;
}

impl<T: Lowering + ?Sized> Lowering for &T {
    fn lower(&self, text: &str) -> Result<Protocol, ParseError> {
        (**self).lower(text)
    }
}

impl<T: Lowering + ?Sized> Lowering for Box<T> {
    fn lower(&self, text: &str) -> Result<Protocol, ParseError> {
        (**self).lower(text)
    }
}

impl<T: Generation + ?Sized> Generation for &T {
    fn generate(&self, schema_file: &Path, output_dir: &Path) -> Result<(), CodegenError> {
        (**self).generate(schema_file, output_dir)
    }
}

impl<T: Generation + ?Sized> Generation for Box<T> {
    fn generate(&self, schema_file: &Path, output_dir: &Path) -> Result<(), CodegenError> {
        (**self).generate(schema_file, output_dir)
    }
}

/// Lowering with the IDL parser from `ironproto-schema`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdlLowering;

impl Lowering for IdlLowering {
    fn lower(&self, text: &str) -> Result<Protocol, ParseError> {
        ironproto_schema::parse_idl(text)
    }
}

/// Generation with the Rust generator from `ironproto-codegen`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustGeneration;

impl Generation for RustGeneration {
    fn generate(&self, schema_file: &Path, output_dir: &Path) -> Result<(), CodegenError> {
        ironproto_codegen::generate_to_dir(schema_file, output_dir).map(|_| ())
    }
}
