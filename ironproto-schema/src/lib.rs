//! # IronProto Schema
//!
//! Protocol schema model and its two textual forms.
//!
//! This crate provides:
//! - The canonical protocol representation (named types, fields, messages)
//! - Reading and writing the canonical JSON form
//! - Lowering of interface-definition (IDL) text into the canonical form
//! - Protocol validation
//! - Intermediate representation for code generation

pub mod canonical;
pub mod error;
pub mod idl;
pub mod ir;
pub mod parser;
pub mod types;
pub mod validation;

pub use error::{ParseError, SchemaError};
pub use idl::{parse_idl, parse_idl_file};
pub use ir::ProtocolIr;
pub use parser::parse_protocol;
pub use types::{
    EnumDef, Field, FixedDef, Message, Props, Protocol, RecordDef, Schema, TypeDef,
};
pub use validation::validate_protocol;

/// File extension of interface-definition sources.
pub const IDL_EXTENSION: &str = "idl";

/// File extension of canonical schema documents.
pub const SCHEMA_EXTENSION: &str = "schema";
