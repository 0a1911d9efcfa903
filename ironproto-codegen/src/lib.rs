//! # IronProto Codegen
//!
//! Rust code generation from canonical protocol schemas.
//!
//! This crate provides:
//! - Rust type generation for records, errors, enums and fixed types
//! - A protocol trait per protocol with one method per message
//! - Writing generated sources into an output directory tree

pub mod error;
pub mod generator;
pub mod rust;

pub use error::CodegenError;
pub use generator::Generator;

use ironproto_schema::ProtocolIr;
use ironproto_schema::validation::is_identifier;
use std::path::{Path, PathBuf};

/// Generates Rust code from a canonical schema document.
///
/// # Arguments
/// * `json` - Canonical schema text
///
/// # Returns
/// Generated Rust code as a string.
///
/// # Errors
/// Returns `CodegenError` if parsing or validation fails.
pub fn generate_from_json(json: &str) -> Result<String, CodegenError> {
    let protocol = ironproto_schema::parse_protocol(json)?;
    let ir = ProtocolIr::from_protocol(&protocol);
    Ok(Generator::new(&ir).generate())
}

/// Generates Rust code from a canonical schema file.
///
/// # Errors
/// Returns `CodegenError` if reading, parsing, or generation fails.
pub fn generate_from_file(path: &Path) -> Result<String, CodegenError> {
    let json = std::fs::read_to_string(path)?;
    generate_from_json(&json)
}

/// Returns where the generated file for `ir` lives under `output_dir`.
///
/// Namespace segments become directories: `org.example.Greeter` maps to
/// `org/example/greeter.rs`.
///
/// # Errors
/// Returns `CodegenError::Generation` if a namespace segment or the module
/// name is not a plain identifier, since it would not stay under
/// `output_dir`.
pub fn output_path(ir: &ProtocolIr, output_dir: &Path) -> Result<PathBuf, CodegenError> {
    let mut path = output_dir.to_path_buf();
    if let Some(ns) = &ir.namespace {
        for segment in ns.split('.') {
            if !is_identifier(segment) {
                return Err(CodegenError::generation(format!(
                    "namespace '{}' of protocol '{}' does not map to a directory",
                    ns, ir.name
                )));
            }
            path.push(segment);
        }
    }
    let module = ir.module_name();
    if !is_identifier(&module) {
        return Err(CodegenError::generation(format!(
            "protocol '{}' does not map to a file name",
            ir.name
        )));
    }
    path.push(format!("{module}.rs"));
    Ok(path)
}

/// Generates Rust code for a canonical schema file and writes it under
/// `output_dir`.
///
/// Writing is skipped when the file already holds identical content, so
/// repeated builds leave timestamps untouched.
///
/// # Arguments
/// * `schema_file` - Canonical schema document to compile
/// * `output_dir` - Root of the generated source tree
///
/// # Returns
/// Path of the generated file.
///
/// # Errors
/// Returns `CodegenError` if the schema is invalid or the output cannot be
/// written.
pub fn generate_to_dir(schema_file: &Path, output_dir: &Path) -> Result<PathBuf, CodegenError> {
    let json = std::fs::read_to_string(schema_file)?;
    let protocol = ironproto_schema::parse_protocol(&json)?;
    let ir = ProtocolIr::from_protocol(&protocol);
    let code = Generator::new(&ir).generate();

    let target = output_path(&ir, output_dir)?;
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if std::fs::read_to_string(&target).is_ok_and(|existing| existing == code) {
        tracing::debug!(path = %target.display(), "generated source unchanged");
        return Ok(target);
    }

    std::fs::write(&target, code)?;
    tracing::debug!(
        schema = %schema_file.display(),
        path = %target.display(),
        "wrote generated source"
    );
    Ok(target)
}
